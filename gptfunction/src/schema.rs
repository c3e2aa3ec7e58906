//! Rendering of calling schemas.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::descriptor::{CallableDescriptor, ParameterDescriptor};
use crate::types::{Literal, ParamType};

/// Options controlling schema rendering.
///
/// Deserializable so hosts can embed it in their own configuration; missing
/// fields take their defaults.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaOptions {
    use_required: bool,
}

impl Default for SchemaOptions {
    fn default() -> Self {
        Self { use_required: true }
    }
}

impl SchemaOptions {
    /// Creates the default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether the `required` list is emitted.
    #[must_use]
    pub const fn with_required(mut self, use_required: bool) -> Self {
        self.use_required = use_required;
        self
    }

    /// Whether the `required` list is emitted.
    #[must_use]
    pub const fn use_required(&self) -> bool {
        self.use_required
    }
}

impl From<bool> for SchemaOptions {
    fn from(use_required: bool) -> Self {
        Self::new().with_required(use_required)
    }
}

/// Schema fragment describing one parameter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertySchema {
    /// JSON schema primitive.
    #[serde(rename = "type")]
    pub schema_type: String,
    /// Allowed values for closed types.
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<Value>>,
    /// Parameter description, empty when undocumented.
    pub description: String,
}

impl PropertySchema {
    fn render(parameter: &ParameterDescriptor) -> Self {
        let param_type = parameter.param_type();
        let allowed = match param_type {
            ParamType::LiteralSet(set) => Some(set.values().iter().map(literal_value).collect()),
            ParamType::Enumeration(enumeration) => {
                Some(enumeration.values().map(Value::from).collect())
            }
            ParamType::String | ParamType::Integer | ParamType::Float => None,
        };

        Self {
            schema_type: param_type.primitive().as_str().to_owned(),
            allowed,
            description: parameter.description().to_owned(),
        }
    }
}

fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::String(value) => Value::from(value.as_str()),
        Literal::Integer(value) => Value::from(*value),
        Literal::Float(value) => Value::from(*value),
    }
}

/// The `parameters` object of a function schema.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParametersSchema {
    /// Always `"object"`.
    #[serde(rename = "type")]
    pub schema_type: String,
    /// Parameter fragments in declaration order.
    pub properties: IndexMap<String, PropertySchema>,
    /// Parameters without defaults, present only when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
}

/// Calling schema of a wrapped function.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionSchema {
    /// Function name.
    pub name: String,
    /// Summary of what the function does.
    pub description: String,
    /// Parameter object schema.
    pub parameters: ParametersSchema,
}

impl FunctionSchema {
    /// Renders the schema of a descriptor.
    #[must_use]
    pub fn render(descriptor: &CallableDescriptor, options: &SchemaOptions) -> Self {
        let properties = descriptor
            .parameters()
            .iter()
            .map(|parameter| (parameter.name().to_owned(), PropertySchema::render(parameter)))
            .collect();

        let required = options
            .use_required()
            .then(|| descriptor.required().map(str::to_owned).collect());

        Self {
            name: descriptor.name().to_owned(),
            description: descriptor.description().to_owned(),
            parameters: ParametersSchema {
                schema_type: "object".to_owned(),
                properties,
                required,
            },
        }
    }

    /// Converts the schema into a JSON value.
    ///
    /// # Panics
    ///
    /// Never in practice: every field serializes to JSON with string keys.
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).expect("function schema serializes to JSON")
    }

    /// Wraps the schema in the tool envelope.
    #[must_use]
    pub fn into_tool(self) -> ToolSchema {
        ToolSchema::new(self)
    }
}

/// Tool-calling envelope: `{"type": "function", "function": {...}}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Always `"function"`.
    #[serde(rename = "type")]
    pub tool_type: String,
    /// The wrapped function schema.
    pub function: FunctionSchema,
}

impl ToolSchema {
    /// Wraps a function schema.
    #[must_use]
    pub fn new(function: FunctionSchema) -> Self {
        Self {
            tool_type: "function".to_owned(),
            function,
        }
    }

    /// Converts the envelope into a JSON value.
    ///
    /// # Panics
    ///
    /// Never in practice: every field serializes to JSON with string keys.
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).expect("tool schema serializes to JSON")
    }
}
