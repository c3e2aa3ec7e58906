//! Decoding of model-provided arguments.

use serde_json::{Map, Value};

use crate::descriptor::CallableDescriptor;
use crate::error::{ArgumentError, InvocationError};
use crate::types::{ParamType, SchemaType};

/// A model-provided argument object, checked against a descriptor.
#[derive(Clone, Copy, Debug)]
pub struct Arguments<'a> {
    descriptor: &'a CallableDescriptor,
    values: Option<&'a Map<String, Value>>,
}

impl<'a> Arguments<'a> {
    /// Wraps a JSON argument payload. `null` is treated as an empty object.
    ///
    /// # Errors
    ///
    /// Returns [`InvocationError::ArgumentsNotObject`] for any other non-object payload.
    pub fn new(descriptor: &'a CallableDescriptor, payload: &'a Value) -> Result<Self, InvocationError> {
        let values = match payload {
            Value::Object(map) => Some(map),
            Value::Null => None,
            other => {
                return Err(InvocationError::ArgumentsNotObject {
                    found: other.to_string(),
                });
            }
        };

        Ok(Self { descriptor, values })
    }

    /// The descriptor the arguments are checked against.
    #[must_use]
    pub fn descriptor(&self) -> &'a CallableDescriptor {
        self.descriptor
    }

    /// Raw value of an argument, if present.
    #[must_use]
    pub fn raw(&self, name: &str) -> Option<&'a Value> {
        self.values.and_then(|values| values.get(name))
    }

    /// Decodes the named argument.
    ///
    /// Values outside a literal set or enumeration are rejected before decoding.
    ///
    /// # Errors
    ///
    /// Returns [`InvocationError::InvalidArgument`] when the argument is
    /// missing, has the wrong shape, or is not an allowed value.
    pub fn get<T: SchemaType>(&self, name: &str) -> Result<T, InvocationError> {
        let value = self.raw(name);
        if let (Some(value), Some(parameter)) = (value, self.descriptor.parameter(name)) {
            if !value.is_null() && !parameter.param_type().admits(value) {
                return Err(InvocationError::invalid_argument(
                    name,
                    ArgumentError::NotAllowed {
                        value: value.to_string(),
                        allowed: allowed_values(parameter.param_type()),
                    },
                ));
            }
        }

        T::from_argument(value).map_err(|source| InvocationError::invalid_argument(name, source))
    }
}

fn allowed_values(param_type: &ParamType) -> String {
    let values: Vec<String> = match param_type {
        ParamType::LiteralSet(set) => set.values().iter().map(ToString::to_string).collect(),
        ParamType::Enumeration(enumeration) => {
            enumeration.values().map(|value| format!("{value:?}")).collect()
        }
        ParamType::String | ParamType::Integer | ParamType::Float => Vec::new(),
    };
    format!("[{}]", values.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::descriptor::{CallableBuilder, ParamSpec};

    fn descriptor() -> CallableDescriptor {
        CallableBuilder::new("configure")
            .param_spec(ParamSpec::of::<i64>("level").literals([1, 2, 3]))
            .param_spec(ParamSpec::of::<Option<String>>("label"))
            .build()
            .unwrap()
    }

    #[test]
    fn decodes_present_and_optional_arguments() {
        let descriptor = descriptor();
        let payload = json!({"level": 2});
        let arguments = Arguments::new(&descriptor, &payload).unwrap();

        assert_eq!(arguments.get::<i64>("level").unwrap(), 2);
        assert_eq!(arguments.get::<Option<String>>("label").unwrap(), None);
    }

    #[test]
    fn rejects_values_outside_literal_set() {
        let descriptor = descriptor();
        let payload = json!({"level": 5});
        let arguments = Arguments::new(&descriptor, &payload).unwrap();

        let err = arguments.get::<i64>("level").unwrap_err();
        assert_eq!(
            err,
            InvocationError::InvalidArgument {
                name: "level".into(),
                source: ArgumentError::NotAllowed {
                    value: "5".into(),
                    allowed: "[1, 2, 3]".into(),
                },
            }
        );
    }

    #[test]
    fn null_payload_is_empty_and_arrays_are_rejected() {
        let descriptor = descriptor();
        let arguments = Arguments::new(&descriptor, &Value::Null).unwrap();
        let err = arguments.get::<i64>("level").unwrap_err();
        assert!(matches!(
            err,
            InvocationError::InvalidArgument {
                source: ArgumentError::Missing,
                ..
            }
        ));

        let payload = json!([1]);
        assert!(matches!(
            Arguments::new(&descriptor, &payload),
            Err(InvocationError::ArgumentsNotObject { .. })
        ));
    }
}
