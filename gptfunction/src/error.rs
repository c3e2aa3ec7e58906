//! Error and warning definitions shared by the schema builder.

use std::fmt;

use thiserror::Error;

/// Result alias used for wrap-time operations.
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Errors raised while building a [`CallableDescriptor`](crate::CallableDescriptor).
///
/// All of them are fatal to wrapping: no partial descriptor is produced.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    /// A parameter was declared without a type.
    #[error("parameter `{parameter}` of `{function}` has no type annotation")]
    MissingAnnotation {
        /// Name of the callable being wrapped.
        function: String,
        /// Name of the offending parameter.
        parameter: String,
    },

    /// A parameter's type falls outside the supported vocabulary.
    #[error("parameter `{parameter}` has unsupported type `{type_name}`: {reason}")]
    UnsupportedType {
        /// Name of the offending parameter.
        parameter: String,
        /// Human-readable rendering of the rejected type.
        type_name: String,
        /// Why the type was rejected.
        reason: String,
    },

    /// Two parameters share the same name.
    #[error("parameter `{parameter}` is declared more than once on `{function}`")]
    DuplicateParameter {
        /// Name of the callable being wrapped.
        function: String,
        /// The repeated parameter name.
        parameter: String,
    },

    /// The callable name cannot be used by a tool-calling interface.
    #[error("invalid function name `{name}`: {reason}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// Why the name was rejected.
        reason: String,
    },
}

impl SchemaError {
    /// Convenience constructor for unsupported types.
    #[must_use]
    pub fn unsupported_type(
        parameter: impl Into<String>,
        type_name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::UnsupportedType {
            parameter: parameter.into(),
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    /// Returns a copy of this error attributed to `parameter`.
    ///
    /// Type constructors run before the owning parameter is known, so they
    /// report an empty parameter name that the builder fills in.
    #[must_use]
    pub fn for_parameter(self, parameter: &str) -> Self {
        match self {
            Self::UnsupportedType {
                type_name, reason, ..
            } => Self::UnsupportedType {
                parameter: parameter.to_owned(),
                type_name,
                reason,
            },
            other => other,
        }
    }
}

/// Non-fatal mismatches between a signature and its documentation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DocstringWarning {
    /// The parameter has no description in the documentation.
    UndocumentedParameter {
        /// Parameter lacking a description.
        parameter: String,
    },

    /// The documentation describes a parameter the signature does not declare.
    UnknownParameter {
        /// Documented name with no matching parameter.
        parameter: String,
    },
}

impl fmt::Display for DocstringWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UndocumentedParameter { parameter } => write!(
                f,
                "parameter `{parameter}` has no description; document it for more accurate use by the model"
            ),
            Self::UnknownParameter { parameter } => write!(
                f,
                "documentation describes `{parameter}` which is not a parameter"
            ),
        }
    }
}

/// Errors produced while decoding a single argument.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ArgumentError {
    /// A required argument was absent or `null`.
    #[error("missing required argument")]
    Missing,

    /// The argument had the wrong JSON shape.
    #[error("expected {expected}, found {found}")]
    WrongType {
        /// Expected JSON shape.
        expected: &'static str,
        /// Rendering of the received value.
        found: String,
    },

    /// The argument did not fit the target numeric type.
    #[error("{value} is out of range for {target}")]
    OutOfRange {
        /// Received value.
        value: String,
        /// Name of the target Rust type.
        target: &'static str,
    },

    /// The argument is not one of the allowed values.
    #[error("{value} is not one of {allowed}")]
    NotAllowed {
        /// Received value.
        value: String,
        /// Rendering of the allowed set.
        allowed: String,
    },
}

/// Errors produced when invoking a wrapped function from model-provided arguments.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InvocationError {
    /// The argument payload was not valid JSON.
    #[error("malformed arguments: {reason}")]
    MalformedArguments {
        /// Parser error message.
        reason: String,
    },

    /// The argument payload was valid JSON but not an object.
    #[error("arguments must be a JSON object, found {found}")]
    ArgumentsNotObject {
        /// Rendering of the received value.
        found: String,
    },

    /// A named argument failed to decode.
    #[error("invalid argument `{name}`: {source}")]
    InvalidArgument {
        /// Parameter name.
        name: String,
        /// Underlying decoding failure.
        #[source]
        source: ArgumentError,
    },

    /// The wrapped function reported a failure.
    #[error("function `{function}` failed: {reason}")]
    Failed {
        /// Name of the function.
        function: String,
        /// Display rendering of the function's error.
        reason: String,
    },

    /// The function's result could not be serialized to JSON.
    #[error("result of `{function}` is not serializable: {reason}")]
    Serialization {
        /// Name of the function.
        function: String,
        /// Serializer error message.
        reason: String,
    },

    /// No function is registered under the requested name.
    #[error("function `{name}` is not registered")]
    UnknownFunction {
        /// Requested name.
        name: String,
    },

    /// A function with the same name is already registered.
    #[error("function `{name}` is already registered")]
    DuplicateFunction {
        /// Colliding name.
        name: String,
    },
}

impl InvocationError {
    /// Wraps an argument decoding failure with its parameter name.
    #[must_use]
    pub fn invalid_argument(name: impl Into<String>, source: ArgumentError) -> Self {
        Self::InvalidArgument {
            name: name.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn for_parameter_fills_in_name() {
        let err = SchemaError::unsupported_type("", "literal set", "literal set is empty")
            .for_parameter("level");
        assert_eq!(
            err,
            SchemaError::UnsupportedType {
                parameter: "level".into(),
                type_name: "literal set".into(),
                reason: "literal set is empty".into(),
            }
        );
    }

    #[test]
    fn messages_name_the_parameter() {
        let err = SchemaError::MissingAnnotation {
            function: "add".into(),
            parameter: "a".into(),
        };
        assert_eq!(err.to_string(), "parameter `a` of `add` has no type annotation");

        let err = InvocationError::invalid_argument("age", ArgumentError::Missing);
        assert_eq!(err.to_string(), "invalid argument `age`: missing required argument");
    }
}
