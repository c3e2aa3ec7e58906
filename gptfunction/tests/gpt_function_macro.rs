use gptfunction::{
    ArgumentError, FunctionRegistry, InvocationError, SchemaEnum, SchemaError, SchemaOptions,
    TypeCategory, gpt_function,
};
use serde::Serialize;
use serde_json::json;

/// Outputs a user's name and age to the console.
///
/// :param name: The name of the user.
/// :param age: The age of the user.
#[gpt_function]
fn output_user(name: String, age: i64) -> String {
    format!("Name: {name}, Age: {age}")
}

/// Sets the verbosity.
///
/// :param level: Verbosity level.
#[gpt_function]
fn set_level(#[literal(1, 2, 3)] level: i64) -> i64 {
    level
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, SchemaEnum)]
enum Fruit {
    Orange,
    #[schema(value = "green_apple")]
    Apple,
}

/// Picks some fruit.
///
/// Args:
///     fruit: The fruit to pick.
///     count: How many to pick.
#[gpt_function]
fn pick(fruit: Fruit, count: Option<u32>) -> String {
    format!("{} x{}", fruit.value(), count.unwrap_or(1))
}

/// Divides two numbers.
///
/// # Arguments
///
/// * `dividend` - The number to divide.
/// * `divisor` - The number to divide by.
#[gpt_function]
fn divide(dividend: f64, divisor: f64) -> Result<f64, String> {
    if divisor == 0.0 {
        return Err("Cannot divide by zero".to_owned());
    }
    Ok(dividend / divisor)
}

/// Greets someone.
#[gpt_function(name = "say-hello", description = "Says hello to a person.")]
fn greet(
    /// Who to greet.
    person: &str,
) -> String {
    format!("Hello, {person}!")
}

#[gpt_function]
fn undocumented(mode: String) -> String {
    mode
}

/// Mixes text and numbers.
#[gpt_function]
fn mixed(#[literal("low", 1)] choice: String) -> String {
    choice
}

/// Lists the first numbers.
///
/// :param n: How many numbers.
#[gpt_function]
fn first_numbers(n: i64) -> Vec<i64> {
    (1..=n).collect()
}

#[derive(Debug, PartialEq, Serialize)]
struct Forecast {
    city: String,
    highs: Vec<i64>,
}

/// Looks up a forecast.
///
/// :param city: City name.
#[gpt_function]
fn forecast(city: &str) -> Forecast {
    Forecast {
        city: city.to_owned(),
        highs: vec![4, 6],
    }
}

/// Scales a value.
///
/// :param factor: Scale factor.
#[gpt_function]
fn scale(#[literal(1, 2)] factor: f64) -> f64 {
    factor * 2.0
}

#[test]
fn output_user_schema_matches_expected_json() {
    let wrapped = output_user::wrap().unwrap();

    assert_eq!(wrapped.name(), "output_user");
    assert_eq!(wrapped.description(), "Outputs a user's name and age to the console.");
    assert_eq!(
        wrapped.schema(true).to_value(),
        json!({
            "name": "output_user",
            "description": "Outputs a user's name and age to the console.",
            "parameters": {
                "type": "object",
                "properties": {
                    "name": {"type": "string", "description": "The name of the user."},
                    "age": {"type": "integer", "description": "The age of the user."}
                },
                "required": ["name", "age"]
            }
        })
    );
}

#[test]
fn schema_is_stable_across_calls() {
    let wrapped = output_user::wrap().unwrap();
    assert_eq!(wrapped.schema(true), wrapped.schema(true));
    assert_eq!(wrapped.schema(false), wrapped.schema(false));

    let property_names: Vec<_> = wrapped
        .descriptor()
        .parameters()
        .iter()
        .map(|parameter| parameter.name().to_owned())
        .collect();
    assert_eq!(property_names, ["name", "age"]);
}

#[test]
fn wrapped_function_calls_through() {
    let wrapped = output_user::wrap().unwrap();
    assert_eq!(
        wrapped("Ada".to_owned(), 36),
        output_user("Ada".to_owned(), 36)
    );

    let divide_wrapped = divide::wrap().unwrap();
    assert_eq!(divide_wrapped(10.0, 4.0), Ok(2.5));
    assert_eq!(
        divide_wrapped(1.0, 0.0),
        Err("Cannot divide by zero".to_owned())
    );
}

#[test]
fn literal_set_renders_enum_values() {
    let schema = set_level::wrap().unwrap().schema(true).to_value();
    assert_eq!(
        schema["parameters"]["properties"]["level"],
        json!({"type": "integer", "enum": [1, 2, 3], "description": "Verbosity level."})
    );

    let descriptor = set_level::descriptor().unwrap();
    assert_eq!(descriptor.parameters()[0].category(), TypeCategory::LiteralSet);
}

#[test]
fn enumeration_and_optional_parameters() {
    let wrapped = pick::wrap().unwrap();
    let schema = wrapped.schema(true).to_value();

    assert_eq!(
        schema["parameters"],
        json!({
            "type": "object",
            "properties": {
                "fruit": {
                    "type": "string",
                    "enum": ["orange", "green_apple"],
                    "description": "The fruit to pick."
                },
                "count": {"type": "integer", "description": "How many to pick."}
            },
            "required": ["fruit"]
        })
    );
    assert_eq!(
        wrapped.descriptor().parameter("fruit").unwrap().category(),
        TypeCategory::Enumeration
    );
}

#[test]
fn required_can_be_omitted() {
    let wrapped = output_user::wrap().unwrap();
    let schema = wrapped
        .schema_with(&SchemaOptions::new().with_required(false))
        .to_value();

    assert!(schema["parameters"].get("required").is_none());
    assert_eq!(schema["parameters"]["properties"].as_object().unwrap().len(), 2);
}

#[test]
fn attribute_arguments_override_name_and_description() {
    let wrapped = greet::wrap().unwrap();

    assert_eq!(greet::NAME, "say-hello");
    assert_eq!(wrapped.name(), "say-hello");
    assert_eq!(wrapped.description(), "Says hello to a person.");
    assert_eq!(
        wrapped.schema(true).to_value()["parameters"]["properties"]["person"],
        json!({"type": "string", "description": "Who to greet."})
    );
    assert_eq!(wrapped("Grace"), "Hello, Grace!");
}

#[test]
fn undocumented_functions_get_empty_descriptions() {
    let wrapped = undocumented::wrap().unwrap();

    assert_eq!(wrapped.description(), "");
    assert_eq!(
        wrapped.schema(true).to_value()["parameters"]["properties"]["mode"],
        json!({"type": "string", "description": ""})
    );
    assert_eq!(wrapped.descriptor().warnings().len(), 1);
}

#[test]
fn mixed_literal_kinds_fail_to_wrap() {
    let err = mixed::wrap().unwrap_err();
    assert!(matches!(
        err,
        SchemaError::UnsupportedType { ref parameter, .. } if parameter == "choice"
    ));
    assert!(mixed::tool().is_err());
}

#[test]
fn registry_dispatches_decoded_arguments() {
    let registry = FunctionRegistry::new();
    registry.register(output_user::tool().unwrap()).unwrap();
    registry.register(set_level::tool().unwrap()).unwrap();
    registry.register(pick::tool().unwrap()).unwrap();
    registry.register(divide::tool().unwrap()).unwrap();
    registry.register(greet::tool().unwrap()).unwrap();

    assert_eq!(
        registry.names(),
        ["output_user", "set_level", "pick", "divide", "say-hello"]
    );

    assert_eq!(
        registry
            .invoke("output_user", &json!({"name": "Ada", "age": 36}))
            .unwrap(),
        "Name: Ada, Age: 36"
    );
    assert_eq!(
        registry
            .invoke_json("pick", r#"{"fruit": "green_apple", "count": 3}"#)
            .unwrap(),
        "green_apple x3"
    );
    assert_eq!(
        registry.invoke("pick", &json!({"fruit": "orange"})).unwrap(),
        "orange x1"
    );
    assert_eq!(
        registry.invoke("say-hello", &json!({"person": "Lin"})).unwrap(),
        "Hello, Lin!"
    );
    assert_eq!(
        registry.invoke("divide", &json!({"dividend": 9, "divisor": 2})).unwrap(),
        "4.5"
    );
}

#[test]
fn registry_rejects_invalid_calls() {
    let registry = FunctionRegistry::new();
    registry.register(set_level::tool().unwrap()).unwrap();
    registry.register(pick::tool().unwrap()).unwrap();
    registry.register(divide::tool().unwrap()).unwrap();

    let err = registry.invoke("set_level", &json!({"level": 7})).unwrap_err();
    assert_eq!(
        err,
        InvocationError::InvalidArgument {
            name: "level".into(),
            source: ArgumentError::NotAllowed {
                value: "7".into(),
                allowed: "[1, 2, 3]".into(),
            },
        }
    );

    let err = registry.invoke("pick", &json!({"fruit": "banana"})).unwrap_err();
    assert!(matches!(
        err,
        InvocationError::InvalidArgument {
            source: ArgumentError::NotAllowed { .. },
            ..
        }
    ));

    let err = registry
        .invoke("divide", &json!({"dividend": 1, "divisor": 0}))
        .unwrap_err();
    assert_eq!(
        err,
        InvocationError::Failed {
            function: "divide".into(),
            reason: "Cannot divide by zero".into(),
        }
    );

    assert!(matches!(
        registry.invoke("missing", &json!({})),
        Err(InvocationError::UnknownFunction { .. })
    ));
    assert!(matches!(
        registry.register(pick::tool().unwrap()),
        Err(InvocationError::DuplicateFunction { .. })
    ));
}

#[test]
fn tool_schemas_use_function_envelope() {
    let registry = FunctionRegistry::new();
    registry.register(output_user::tool().unwrap()).unwrap();

    let tools = registry.tool_schemas(true);
    assert_eq!(tools.len(), 1);

    let value = tools[0].to_value();
    assert_eq!(value["type"], "function");
    assert_eq!(value["function"]["name"], "output_user");
}

#[test]
fn collection_and_struct_results_are_supported() {
    let numbers = first_numbers::wrap().unwrap();
    assert_eq!(numbers.name(), "first_numbers");
    assert_eq!(numbers.description(), "Lists the first numbers.");
    assert_eq!(numbers(3), vec![1, 2, 3]);

    let lookup = forecast::wrap().unwrap();
    assert_eq!(
        lookup("Oslo"),
        Forecast {
            city: "Oslo".into(),
            highs: vec![4, 6],
        }
    );

    let registry = FunctionRegistry::new();
    registry.register(first_numbers::tool().unwrap()).unwrap();
    registry.register(forecast::tool().unwrap()).unwrap();

    assert_eq!(
        registry.invoke("first_numbers", &json!({"n": 3})).unwrap(),
        "[1,2,3]"
    );
    assert_eq!(
        registry.invoke("forecast", &json!({"city": "Oslo"})).unwrap(),
        r#"{"city":"Oslo","highs":[4,6]}"#
    );
}

#[test]
fn float_parameter_with_integer_literals_accepts_float_values() {
    let wrapped = scale::wrap().unwrap();
    assert_eq!(
        wrapped.schema(true).to_value()["parameters"]["properties"]["factor"],
        json!({"type": "number", "enum": [1, 2], "description": "Scale factor."})
    );

    let registry = FunctionRegistry::new();
    registry.register(scale::tool().unwrap()).unwrap();
    assert_eq!(registry.invoke("scale", &json!({"factor": 1.0})).unwrap(), "2.0");
    assert_eq!(registry.invoke("scale", &json!({"factor": 2})).unwrap(), "4.0");
    assert!(registry.invoke("scale", &json!({"factor": 1.5})).is_err());
}
