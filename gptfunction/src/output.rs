//! Conversion of function results into text for the model.
//!
//! Tool-calling interfaces expect text back. Results are serialized to JSON;
//! a JSON string is handed back as-is and `null` (from `()` or `None`)
//! becomes an empty string.

use std::fmt::Display;

use serde::Serialize;
use serde_json::Value;

use crate::error::InvocationError;

/// Renders a function's result for the model.
///
/// # Errors
///
/// Returns [`InvocationError::Serialization`] when the value cannot be
/// represented as JSON, e.g. a map with non-string keys.
pub fn render_output<T>(output: &T, function: &str) -> Result<String, InvocationError>
where
    T: Serialize + ?Sized,
{
    let value = serde_json::to_value(output).map_err(|err| InvocationError::Serialization {
        function: function.to_owned(),
        reason: err.to_string(),
    })?;

    Ok(match value {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Renders a fallible function's result, turning `Err` into a failure.
///
/// # Errors
///
/// Returns [`InvocationError::Failed`] carrying the error's message for
/// `Err`, otherwise as [`render_output`].
pub fn render_result<T, E>(result: Result<T, E>, function: &str) -> Result<String, InvocationError>
where
    T: Serialize,
    E: Display,
{
    match result {
        Ok(output) => render_output(&output, function),
        Err(err) => Err(InvocationError::Failed {
            function: function.to_owned(),
            reason: err.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    use serde_json::json;

    #[derive(Serialize)]
    struct Forecast {
        city: String,
        highs: Vec<i64>,
    }

    #[test]
    fn renders_plain_values() {
        assert_eq!(render_output("hi", "f").unwrap(), "hi");
        assert_eq!(render_output(&(), "f").unwrap(), "");
        assert_eq!(render_output(&5_i64, "f").unwrap(), "5");
        assert_eq!(render_output(&2.5_f64, "f").unwrap(), "2.5");
        assert_eq!(render_output(&true, "f").unwrap(), "true");
        assert_eq!(render_output(&Option::<String>::None, "f").unwrap(), "");
        assert_eq!(render_output(&json!({"ok": true}), "f").unwrap(), r#"{"ok":true}"#);
        assert_eq!(render_output(&json!("text"), "f").unwrap(), "text");
    }

    #[test]
    fn renders_collections_and_structs_as_json() {
        assert_eq!(render_output(&vec![1, 2, 3], "f").unwrap(), "[1,2,3]");

        let forecast = Forecast {
            city: "Oslo".into(),
            highs: vec![4, 6],
        };
        assert_eq!(
            render_output(&forecast, "f").unwrap(),
            r#"{"city":"Oslo","highs":[4,6]}"#
        );
    }

    #[test]
    fn unserializable_results_are_reported() {
        let mut grid = HashMap::new();
        grid.insert((0, 0), 1);

        let err = render_output(&grid, "grid").unwrap_err();
        assert!(matches!(
            err,
            InvocationError::Serialization { ref function, .. } if function == "grid"
        ));
    }

    #[test]
    fn errors_become_failures() {
        let result: Result<f64, String> = Err("Cannot divide by zero".into());
        assert_eq!(
            render_result(result, "divide").unwrap_err(),
            InvocationError::Failed {
                function: "divide".into(),
                reason: "Cannot divide by zero".into(),
            }
        );

        let result: Result<Vec<u8>, String> = Ok(vec![3]);
        assert_eq!(render_result(result, "divide").unwrap(), "[3]");
    }
}
