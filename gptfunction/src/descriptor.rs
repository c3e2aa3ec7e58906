//! Wrap-time construction of callable descriptors.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::docstring::Docstring;
use crate::error::{DocstringWarning, Result, SchemaError};
use crate::schema::{FunctionSchema, SchemaOptions, ToolSchema};
use crate::types::{LiteralSet, ParamType, SchemaType, TypeCategory};

const MAX_NAME_LEN: usize = 64;

/// Declaration of one parameter, as handed to [`CallableBuilder`].
#[derive(Clone, Debug, PartialEq)]
pub struct ParamSpec {
    name: String,
    param_type: Option<Result<ParamType>>,
    has_default: bool,
    description: Option<String>,
}

impl ParamSpec {
    /// Declares a parameter of the given type.
    #[must_use]
    pub fn new(name: impl Into<String>, param_type: ParamType) -> Self {
        Self {
            name: name.into(),
            param_type: Some(Ok(param_type)),
            has_default: false,
            description: None,
        }
    }

    /// Declares a parameter whose type is derived from a Rust type.
    ///
    /// `Option<T>` parameters are treated as having a default.
    #[must_use]
    pub fn of<T: SchemaType>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param_type: Some(T::param_type()),
            has_default: T::OPTIONAL,
            description: None,
        }
    }

    /// Declares a parameter without a type. Building a descriptor with it fails.
    #[must_use]
    pub fn untyped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param_type: None,
            has_default: false,
            description: None,
        }
    }

    /// Marks the parameter as having a default value.
    #[must_use]
    pub fn with_default(mut self) -> Self {
        self.has_default = true;
        self
    }

    /// Sets the description directly, taking precedence over the documentation.
    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Restricts the parameter to a closed set of literal values.
    ///
    /// On an untyped parameter the literal set becomes the declared type.
    #[must_use]
    pub fn literals<I, L>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<crate::types::Literal>,
    {
        let literals = LiteralSet::new(values);
        self.param_type = Some(match self.param_type {
            None => literals.map(ParamType::LiteralSet),
            Some(declared) => declared.and_then(|base| base.restrict(literals?)),
        });
        self
    }

    /// Parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Immutable description of one parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct ParameterDescriptor {
    name: String,
    param_type: ParamType,
    description: String,
    has_default: bool,
}

impl ParameterDescriptor {
    /// Parameter name, unique within its callable.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type.
    #[must_use]
    pub fn param_type(&self) -> &ParamType {
        &self.param_type
    }

    /// Category of the declared type.
    #[must_use]
    pub const fn category(&self) -> TypeCategory {
        self.param_type.category()
    }

    /// Documented description, empty when undocumented.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Whether the caller may omit this parameter.
    #[must_use]
    pub const fn has_default(&self) -> bool {
        self.has_default
    }
}

/// Immutable description of a callable, built once at wrap time.
#[derive(Clone, Debug, PartialEq)]
pub struct CallableDescriptor {
    name: String,
    description: String,
    long_description: Option<String>,
    returns: Option<String>,
    parameters: Vec<ParameterDescriptor>,
    warnings: Vec<DocstringWarning>,
}

impl CallableDescriptor {
    /// Starts describing a callable by hand.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> CallableBuilder {
        CallableBuilder::new(name)
    }

    /// Callable name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Summary line of the documentation; empty when undocumented.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Documentation beyond the summary line.
    #[must_use]
    pub fn long_description(&self) -> Option<&str> {
        self.long_description.as_deref()
    }

    /// Documented return value.
    #[must_use]
    pub fn returns(&self) -> Option<&str> {
        self.returns.as_deref()
    }

    /// Parameters in declaration order.
    #[must_use]
    pub fn parameters(&self) -> &[ParameterDescriptor] {
        &self.parameters
    }

    /// Looks up a parameter by name.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&ParameterDescriptor> {
        self.parameters.iter().find(|parameter| parameter.name == name)
    }

    /// Names of parameters without a default, in declaration order.
    pub fn required(&self) -> impl Iterator<Item = &str> {
        self.parameters
            .iter()
            .filter(|parameter| !parameter.has_default)
            .map(ParameterDescriptor::name)
    }

    /// Documentation mismatches found while building.
    #[must_use]
    pub fn warnings(&self) -> &[DocstringWarning] {
        &self.warnings
    }

    /// Renders the calling schema.
    #[must_use]
    pub fn schema(&self, use_required: bool) -> FunctionSchema {
        self.schema_with(&SchemaOptions::new().with_required(use_required))
    }

    /// Renders the calling schema with explicit options.
    #[must_use]
    pub fn schema_with(&self, options: &SchemaOptions) -> FunctionSchema {
        FunctionSchema::render(self, options)
    }

    /// Renders the schema wrapped in the `{"type": "function"}` tool envelope.
    #[must_use]
    pub fn tool_schema(&self, use_required: bool) -> ToolSchema {
        ToolSchema::new(self.schema(use_required))
    }
}

/// Declarative builder for [`CallableDescriptor`].
///
/// The `#[gpt_function]` attribute generates a builder call chain; it can also
/// be used directly to describe callables the macro cannot see.
#[derive(Clone, Debug)]
pub struct CallableBuilder {
    name: String,
    doc: Option<String>,
    description: Option<String>,
    params: Vec<ParamSpec>,
}

impl CallableBuilder {
    /// Starts describing a callable with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            doc: None,
            description: None,
            params: Vec::new(),
        }
    }

    /// Sets the documentation text.
    #[must_use]
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Sets the summary directly, taking precedence over the documentation.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Appends a required parameter.
    #[must_use]
    pub fn param(self, name: impl Into<String>, param_type: ParamType) -> Self {
        self.param_spec(ParamSpec::new(name, param_type))
    }

    /// Appends a parameter that has a default value.
    #[must_use]
    pub fn optional_param(self, name: impl Into<String>, param_type: ParamType) -> Self {
        self.param_spec(ParamSpec::new(name, param_type).with_default())
    }

    /// Appends a parameter with no declared type.
    #[must_use]
    pub fn untyped_param(self, name: impl Into<String>) -> Self {
        self.param_spec(ParamSpec::untyped(name))
    }

    /// Appends a parameter declaration.
    #[must_use]
    pub fn param_spec(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    /// Validates the declarations and builds the descriptor.
    ///
    /// Documentation mismatches do not fail the build; they are logged and
    /// recorded on the descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidName`] for names a tool-calling interface
    /// rejects, [`SchemaError::DuplicateParameter`] for repeated parameter
    /// names, [`SchemaError::MissingAnnotation`] for untyped parameters and
    /// [`SchemaError::UnsupportedType`] for malformed types.
    pub fn build(self) -> Result<CallableDescriptor> {
        let Self {
            name,
            doc,
            description,
            params,
        } = self;
        validate_name(&name)?;

        let docstring = doc.as_deref().map(Docstring::parse).unwrap_or_default();
        let mut seen = BTreeSet::new();
        let mut parameters = Vec::with_capacity(params.len());
        let mut warnings = Vec::new();

        for spec in params {
            if !seen.insert(spec.name.clone()) {
                return Err(SchemaError::DuplicateParameter {
                    function: name,
                    parameter: spec.name,
                });
            }

            let param_type = match spec.param_type {
                None => {
                    return Err(SchemaError::MissingAnnotation {
                        function: name,
                        parameter: spec.name,
                    });
                }
                Some(declared) => declared.map_err(|err| err.for_parameter(&spec.name))?,
            };

            let documented = spec
                .description
                .or_else(|| docstring.param(&spec.name).map(|param| param.description().to_owned()));
            let description = match documented {
                Some(text) => text,
                None => {
                    warnings.push(DocstringWarning::UndocumentedParameter {
                        parameter: spec.name.clone(),
                    });
                    String::new()
                }
            };

            parameters.push(ParameterDescriptor {
                name: spec.name,
                param_type,
                description,
                has_default: spec.has_default,
            });
        }

        for documented in docstring.params() {
            if !seen.contains(documented.name()) {
                warnings.push(DocstringWarning::UnknownParameter {
                    parameter: documented.name().to_owned(),
                });
            }
        }

        for warning in &warnings {
            warn!(function = %name, "{warning}");
        }

        let descriptor = CallableDescriptor {
            description: description
                .unwrap_or_else(|| docstring.short_description().unwrap_or_default().to_owned()),
            long_description: docstring.long_description().map(str::to_owned),
            returns: docstring.returns().map(str::to_owned),
            name,
            parameters,
            warnings,
        };

        debug!(
            function = %descriptor.name,
            parameters = descriptor.parameters.len(),
            "callable descriptor built"
        );

        Ok(descriptor)
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(SchemaError::InvalidName {
            name: String::new(),
            reason: "name cannot be empty".into(),
        });
    }

    if name.len() > MAX_NAME_LEN {
        return Err(SchemaError::InvalidName {
            name: name.into(),
            reason: format!("name length must be <= {MAX_NAME_LEN}"),
        });
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'))
    {
        return Err(SchemaError::InvalidName {
            name: name.into(),
            reason: "name must contain only ASCII letters, digits, underscore, or dash".into(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::types::{EnumMember, EnumType};

    const OUTPUT_USER_DOC: &str = "
        Outputs a user's name and age to the console.

        :param name: The name of the user.
        :param age: The age of the user.
        ";

    #[test]
    fn builds_parameters_in_declaration_order() {
        let descriptor = CallableBuilder::new("output_user")
            .doc(OUTPUT_USER_DOC)
            .param("name", ParamType::String)
            .param("age", ParamType::Integer)
            .build()
            .unwrap();

        assert_eq!(descriptor.name(), "output_user");
        assert_eq!(descriptor.description(), "Outputs a user's name and age to the console.");
        let names: Vec<_> = descriptor.parameters().iter().map(ParameterDescriptor::name).collect();
        assert_eq!(names, ["name", "age"]);
        assert_eq!(descriptor.parameter("age").unwrap().description(), "The age of the user.");
        assert_eq!(descriptor.parameter("age").unwrap().category(), TypeCategory::Integer);
        assert!(descriptor.warnings().is_empty());
    }

    #[test]
    fn required_skips_defaulted_parameters() {
        let descriptor = CallableBuilder::new("search")
            .param("query", ParamType::String)
            .optional_param("limit", ParamType::Integer)
            .param("scope", ParamType::String)
            .build()
            .unwrap();

        let required: Vec<_> = descriptor.required().collect();
        assert_eq!(required, ["query", "scope"]);
    }

    #[test]
    fn untyped_parameter_is_missing_annotation() {
        let err = CallableBuilder::new("add")
            .param("a", ParamType::Integer)
            .untyped_param("b")
            .build()
            .unwrap_err();

        assert_eq!(
            err,
            SchemaError::MissingAnnotation {
                function: "add".into(),
                parameter: "b".into(),
            }
        );
    }

    #[test]
    fn unsupported_type_names_the_parameter() {
        let err = CallableBuilder::new("pick")
            .param_spec(ParamSpec::new("level", ParamType::String).literals([1, 2]))
            .build()
            .unwrap_err();

        assert!(matches!(err, SchemaError::UnsupportedType { ref parameter, .. } if parameter == "level"));

        let err = CallableBuilder::new("pick")
            .param_spec(ParamSpec::untyped("level").literals(Vec::<i64>::new()))
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::UnsupportedType { ref parameter, .. } if parameter == "level"));
    }

    #[test]
    fn literals_on_untyped_parameter_declare_the_type() {
        let descriptor = CallableBuilder::new("pick")
            .param_spec(ParamSpec::untyped("level").literals([1, 2, 3]))
            .build()
            .unwrap();

        assert_eq!(descriptor.parameters()[0].category(), TypeCategory::LiteralSet);
    }

    #[test]
    fn duplicate_parameters_are_rejected() {
        let err = CallableBuilder::new("twice")
            .param("a", ParamType::Integer)
            .param("a", ParamType::String)
            .build()
            .unwrap_err();

        assert!(matches!(err, SchemaError::DuplicateParameter { ref parameter, .. } if parameter == "a"));
    }

    #[test]
    fn invalid_names_are_rejected() {
        for name in ["", "has space", "dotted.name"] {
            let err = CallableBuilder::new(name).build().unwrap_err();
            assert!(matches!(err, SchemaError::InvalidName { .. }), "{name:?}");
        }
        let long = "a".repeat(MAX_NAME_LEN + 1);
        assert!(CallableBuilder::new(long).build().is_err());
        assert!(CallableBuilder::new("get-weather_2").build().is_ok());
    }

    #[test]
    fn documentation_mismatches_become_warnings() {
        let descriptor = CallableBuilder::new("my_func")
            .doc(":param a: documented\n:param ghost: not a parameter")
            .param("a", ParamType::Integer)
            .param("b", ParamType::Integer)
            .build()
            .unwrap();

        assert_eq!(descriptor.parameter("b").unwrap().description(), "");
        assert_eq!(
            descriptor.warnings(),
            [
                DocstringWarning::UndocumentedParameter {
                    parameter: "b".into()
                },
                DocstringWarning::UnknownParameter {
                    parameter: "ghost".into()
                },
            ]
        );
    }

    #[test]
    fn explicit_descriptions_take_precedence() {
        let descriptor = CallableBuilder::new("greet")
            .doc("Says hello.\n\n:param who: from the docs")
            .description("Greets someone.")
            .param_spec(ParamSpec::of::<String>("who").describe("Person to greet."))
            .build()
            .unwrap();

        assert_eq!(descriptor.description(), "Greets someone.");
        assert_eq!(descriptor.parameters()[0].description(), "Person to greet.");
        assert!(descriptor.warnings().is_empty());
    }

    #[test]
    fn missing_documentation_yields_empty_descriptions() {
        let descriptor = CallableBuilder::new("bare")
            .param("a", ParamType::Float)
            .build()
            .unwrap();

        assert_eq!(descriptor.description(), "");
        assert_eq!(descriptor.long_description(), None);
        assert_eq!(descriptor.parameters()[0].description(), "");
    }

    #[test]
    fn non_ascii_indentation_does_not_fail_the_build() {
        let descriptor = CallableBuilder::new("f")
            .doc("Summary line.\n\u{a0}Detail with nbsp.\n more")
            .param("a", ParamType::Integer)
            .build()
            .unwrap();

        assert_eq!(descriptor.description(), "Summary line.");
        assert_eq!(descriptor.long_description(), Some("Detail with nbsp.\nmore"));
    }

    #[test]
    fn of_derives_type_and_default_from_rust_type() {
        let descriptor = CallableBuilder::new("typed")
            .param_spec(ParamSpec::of::<String>("name"))
            .param_spec(ParamSpec::of::<Option<f64>>("weight"))
            .param_spec(ParamSpec::new(
                "fruit",
                ParamType::Enumeration(
                    EnumType::new("Fruit", vec![EnumMember::new("Orange", "orange")]).unwrap(),
                ),
            ))
            .build()
            .unwrap();

        let parameters = descriptor.parameters();
        assert_eq!(parameters[0].param_type(), &ParamType::String);
        assert!(!parameters[0].has_default());
        assert_eq!(parameters[1].param_type(), &ParamType::Float);
        assert!(parameters[1].has_default());
        assert_eq!(parameters[2].category(), TypeCategory::Enumeration);
    }
}
