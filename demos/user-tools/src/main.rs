//! Describes a few functions as LLM tools and dispatches a sample call.

use anyhow::Result;
use gptfunction::{FunctionRegistry, SchemaEnum, gpt_function};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, SchemaEnum)]
enum Unit {
    Celsius,
    Fahrenheit,
}

/// Outputs a user's name and age to the console.
///
/// :param name: The name of the user.
/// :param age: The age of the user.
#[gpt_function]
fn output_user(name: String, age: i64) {
    println!("Name: {name}, Age: {age}");
}

/// Converts a temperature reading.
///
/// Args:
///     value: The temperature to convert.
///     to: Unit to convert into.
///     precision: Number of decimal places to keep.
#[gpt_function]
fn convert_temperature(value: f64, to: Unit, #[literal(0, 1, 2)] precision: Option<i64>) -> String {
    let converted = match to {
        Unit::Celsius => (value - 32.0) * 5.0 / 9.0,
        Unit::Fahrenheit => value * 9.0 / 5.0 + 32.0,
    };
    let digits = usize::try_from(precision.unwrap_or(1)).unwrap_or(1);
    format!("{converted:.digits$} {}", to.value())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    info!("=== gptfunction: user tools ===");

    // Direct calls pass through the wrapper.
    let output = output_user::wrap()?;
    output("Ada".to_owned(), 36);

    let registry = FunctionRegistry::new();
    registry.register(output_user::tool()?)?;
    registry.register(convert_temperature::tool()?)?;

    let tools = registry.tool_schemas(true);
    println!("{}", serde_json::to_string_pretty(&tools)?);

    let reply = registry.invoke_json(
        convert_temperature::NAME,
        r#"{"value": 212, "to": "celsius", "precision": 0}"#,
    )?;
    info!(function = convert_temperature::NAME, %reply, "tool call answered");

    match registry.invoke("convert_temperature", &json!({"value": 10, "to": "kelvin"})) {
        Ok(reply) => info!(%reply, "unexpected success"),
        Err(err) => info!(error = %err, "invalid call rejected"),
    }

    Ok(())
}
