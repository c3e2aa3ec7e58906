//! Supported parameter types and their mapping from Rust types.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ArgumentError, Result, SchemaError};

/// Coarse classification of a parameter type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeCategory {
    /// Free-form text.
    String,
    /// Whole numbers.
    Integer,
    /// Floating point numbers.
    Float,
    /// A closed set of literal values.
    LiteralSet,
    /// A symbolic enumeration with string values.
    Enumeration,
}

/// JSON schema primitive a parameter renders as.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    /// `"string"`
    String,
    /// `"integer"`
    Integer,
    /// `"number"`
    Number,
}

impl PrimitiveType {
    /// Returns the JSON schema type keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single permissible value in a [`LiteralSet`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    /// Text literal.
    String(String),
    /// Integer literal.
    Integer(i64),
    /// Floating point literal.
    Float(f64),
}

impl Literal {
    fn primitive(&self) -> PrimitiveType {
        match self {
            Self::String(_) => PrimitiveType::String,
            Self::Integer(_) => PrimitiveType::Integer,
            Self::Float(_) => PrimitiveType::Number,
        }
    }

    /// Returns `true` when the JSON value equals this literal.
    #[must_use]
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::String(expected) => value.as_str() == Some(expected.as_str()),
            Self::Integer(expected) => value.as_i64() == Some(*expected),
            #[allow(clippy::float_cmp)]
            Self::Float(expected) => value.as_f64() == Some(*expected),
        }
    }

    /// Compares numerically, so `1` and `1.0` are the same value.
    #[allow(clippy::cast_precision_loss, clippy::float_cmp)]
    fn matches_number(&self, value: &Value) -> bool {
        match self {
            Self::String(_) => false,
            Self::Integer(expected) => value.as_f64() == Some(*expected as f64),
            Self::Float(expected) => value.as_f64() == Some(*expected),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(value) => write!(f, "{value:?}"),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

/// A closed, ordered set of literal values and the primitive they share.
#[derive(Clone, Debug, PartialEq)]
pub struct LiteralSet {
    values: Vec<Literal>,
    primitive: PrimitiveType,
}

impl LiteralSet {
    /// Validates the supplied literals and infers their primitive type.
    ///
    /// Integers mixed with floats widen to `number`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnsupportedType`] if the set is empty, repeats a
    /// value, or mixes text with numbers.
    pub fn new<I, L>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = L>,
        L: Into<Literal>,
    {
        let values: Vec<Literal> = values.into_iter().map(Into::into).collect();
        let Some(first) = values.first() else {
            return Err(SchemaError::unsupported_type(
                "",
                "literal set",
                "literal set must contain at least one value",
            ));
        };

        let mut primitive = first.primitive();
        for literal in &values[1..] {
            primitive = match (primitive, literal.primitive()) {
                (left, right) if left == right => left,
                (PrimitiveType::Integer | PrimitiveType::Number, PrimitiveType::Integer | PrimitiveType::Number) => {
                    PrimitiveType::Number
                }
                _ => {
                    return Err(SchemaError::unsupported_type(
                        "",
                        render_values(&values),
                        "literal values must all be text or all be numbers",
                    ));
                }
            };
        }

        let mut seen = BTreeSet::new();
        for literal in &values {
            if !seen.insert(literal.to_string()) {
                return Err(SchemaError::unsupported_type(
                    "",
                    render_values(&values),
                    format!("literal {literal} appears more than once"),
                ));
            }
        }

        Ok(Self { values, primitive })
    }

    /// Returns the literals in declaration order.
    #[must_use]
    pub fn values(&self) -> &[Literal] {
        &self.values
    }

    /// Returns the primitive type inferred from the literals.
    #[must_use]
    pub const fn primitive(&self) -> PrimitiveType {
        self.primitive
    }

    /// Returns `true` when `value` is one of the literals.
    #[must_use]
    pub fn admits(&self, value: &Value) -> bool {
        match self.primitive {
            PrimitiveType::Number => self.values.iter().any(|literal| literal.matches_number(value)),
            PrimitiveType::String | PrimitiveType::Integer => {
                self.values.iter().any(|literal| literal.matches(value))
            }
        }
    }

    /// Treats the literals as floats.
    fn into_number(mut self) -> Self {
        self.primitive = PrimitiveType::Number;
        self
    }
}

fn render_values(values: &[Literal]) -> String {
    let rendered: Vec<String> = values.iter().map(ToString::to_string).collect();
    format!("[{}]", rendered.join(", "))
}

/// One member of an [`EnumType`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumMember {
    name: String,
    value: String,
}

impl EnumMember {
    /// Creates a member with the given symbolic name and string value.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Symbolic member name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value sent to and received from the model.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// A symbolic enumeration whose members carry string values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumType {
    name: String,
    members: Vec<EnumMember>,
}

impl EnumType {
    /// Creates an enumeration after validating its members.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnsupportedType`] when there are no members or
    /// two members share a value.
    pub fn new(name: impl Into<String>, members: Vec<EnumMember>) -> Result<Self> {
        let name = name.into();
        if members.is_empty() {
            return Err(SchemaError::unsupported_type(
                "",
                name,
                "enumeration has no members",
            ));
        }

        let mut seen = BTreeSet::new();
        for member in &members {
            if !seen.insert(member.value.as_str()) {
                return Err(SchemaError::unsupported_type(
                    "",
                    name.clone(),
                    format!("enumeration value {:?} is used by more than one member", member.value),
                ));
            }
        }

        Ok(Self { name, members })
    }

    /// Name of the enumeration type.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Members in declaration order.
    #[must_use]
    pub fn members(&self) -> &[EnumMember] {
        &self.members
    }

    /// Member values in declaration order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(EnumMember::value)
    }

    /// Returns `true` when `value` is one of the member values.
    #[must_use]
    pub fn admits(&self, value: &Value) -> bool {
        value
            .as_str()
            .is_some_and(|candidate| self.values().any(|allowed| allowed == candidate))
    }
}

/// Declared type of a parameter.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamType {
    /// Free-form text.
    String,
    /// Whole numbers.
    Integer,
    /// Floating point numbers.
    Float,
    /// One of a closed set of literals.
    LiteralSet(LiteralSet),
    /// One of an enumeration's member values.
    Enumeration(EnumType),
}

impl ParamType {
    /// Builds a literal set type.
    ///
    /// # Errors
    ///
    /// See [`LiteralSet::new`].
    pub fn literal_set<I, L>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = L>,
        L: Into<Literal>,
    {
        LiteralSet::new(values).map(Self::LiteralSet)
    }

    /// Returns the category tag of this type.
    #[must_use]
    pub const fn category(&self) -> TypeCategory {
        match self {
            Self::String => TypeCategory::String,
            Self::Integer => TypeCategory::Integer,
            Self::Float => TypeCategory::Float,
            Self::LiteralSet(_) => TypeCategory::LiteralSet,
            Self::Enumeration(_) => TypeCategory::Enumeration,
        }
    }

    /// Returns the JSON schema primitive this type renders as.
    #[must_use]
    pub const fn primitive(&self) -> PrimitiveType {
        match self {
            Self::String | Self::Enumeration(_) => PrimitiveType::String,
            Self::Integer => PrimitiveType::Integer,
            Self::Float => PrimitiveType::Number,
            Self::LiteralSet(set) => set.primitive(),
        }
    }

    /// Returns `true` when `value` satisfies the closed value set, if any.
    ///
    /// Open types admit every value; shape checks happen during decoding.
    #[must_use]
    pub fn admits(&self, value: &Value) -> bool {
        match self {
            Self::LiteralSet(set) => set.admits(value),
            Self::Enumeration(enumeration) => enumeration.admits(value),
            Self::String | Self::Integer | Self::Float => true,
        }
    }

    /// Restricts this type to a set of literals.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnsupportedType`] when the literals do not fit
    /// the base type, e.g. text literals on an integer parameter, or when the
    /// base type is itself a closed set.
    pub fn restrict(self, literals: LiteralSet) -> Result<Self> {
        match (&self, literals.primitive()) {
            (Self::String, PrimitiveType::String) | (Self::Integer, PrimitiveType::Integer) => {
                Ok(Self::LiteralSet(literals))
            }
            (Self::Float, PrimitiveType::Integer | PrimitiveType::Number) => {
                Ok(Self::LiteralSet(literals.into_number()))
            }
            _ => Err(SchemaError::unsupported_type(
                "",
                render_values(literals.values()),
                format!("literals do not fit a {} parameter", self.primitive()),
            )),
        }
    }
}

impl FromStr for ParamType {
    type Err = SchemaError;

    /// Parses a type name such as `"str"`, `"int"` or `"f64"`.
    fn from_str(name: &str) -> Result<Self> {
        match name.trim() {
            "str" | "string" | "String" | "&str" => Ok(Self::String),
            "int" | "integer" | "i8" | "i16" | "i32" | "i64" | "u8" | "u16" | "u32" | "u64"
            | "isize" | "usize" => Ok(Self::Integer),
            "float" | "number" | "f32" | "f64" => Ok(Self::Float),
            other => Err(SchemaError::unsupported_type(
                "",
                other,
                "expected a string, integer or float type",
            )),
        }
    }
}

/// Rust types that can appear as parameters of a wrapped function.
///
/// Implemented for `String`, the primitive integer and float types,
/// `Option<T>` of those, and enums deriving
/// [`SchemaEnum`](macro@crate::SchemaEnum).
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a supported parameter type",
    note = "supported types are `String`, `&str`, integers, floats, `Option` of those, and enums deriving `SchemaEnum`"
)]
pub trait SchemaType: Sized {
    /// Whether the parameter may be omitted by the caller.
    const OPTIONAL: bool = false;

    /// Returns the declared parameter type.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnsupportedType`] when the type is malformed,
    /// e.g. an enumeration with duplicate values.
    fn param_type() -> Result<ParamType>;

    /// Decodes a model-provided argument. `None` means the argument is absent.
    ///
    /// # Errors
    ///
    /// Returns an [`ArgumentError`] when the value is missing or has the wrong shape.
    fn from_argument(value: Option<&Value>) -> std::result::Result<Self, ArgumentError>;
}

/// Enumerations usable as parameter types.
///
/// Usually implemented through `#[derive(SchemaEnum)]`.
pub trait SchemaEnum: Sized + 'static {
    /// Describes the enumeration and its members.
    ///
    /// # Errors
    ///
    /// See [`EnumType::new`].
    fn enum_type() -> Result<EnumType>;

    /// Looks up the member carrying `value`.
    fn from_value(value: &str) -> Option<Self>;

    /// Returns this member's value.
    fn value(&self) -> &'static str;
}

/// Decodes an enumeration argument by member value.
///
/// # Errors
///
/// Returns an [`ArgumentError`] when the value is missing, not a string, or not
/// a member value.
pub fn decode_enum<T: SchemaEnum>(value: Option<&Value>) -> std::result::Result<T, ArgumentError> {
    let text = require_str(value)?;
    T::from_value(text).ok_or_else(|| {
        let allowed = T::enum_type()
            .map(|enumeration| {
                let values: Vec<String> = enumeration.values().map(|value| format!("{value:?}")).collect();
                format!("[{}]", values.join(", "))
            })
            .unwrap_or_default();
        ArgumentError::NotAllowed {
            value: format!("{text:?}"),
            allowed,
        }
    })
}

fn present(value: Option<&Value>) -> std::result::Result<&Value, ArgumentError> {
    match value {
        None | Some(Value::Null) => Err(ArgumentError::Missing),
        Some(value) => Ok(value),
    }
}

fn require_str(value: Option<&Value>) -> std::result::Result<&str, ArgumentError> {
    let value = present(value)?;
    value.as_str().ok_or_else(|| ArgumentError::WrongType {
        expected: "a string",
        found: value.to_string(),
    })
}

impl SchemaType for String {
    fn param_type() -> Result<ParamType> {
        Ok(ParamType::String)
    }

    fn from_argument(value: Option<&Value>) -> std::result::Result<Self, ArgumentError> {
        require_str(value).map(str::to_owned)
    }
}

macro_rules! integer_schema_type {
    ($($ty:ty),* $(,)?) => {
        $(
            impl SchemaType for $ty {
                fn param_type() -> Result<ParamType> {
                    Ok(ParamType::Integer)
                }

                fn from_argument(value: Option<&Value>) -> std::result::Result<Self, ArgumentError> {
                    let value = present(value)?;
                    let out_of_range = || ArgumentError::OutOfRange {
                        value: value.to_string(),
                        target: stringify!($ty),
                    };
                    if let Some(signed) = value.as_i64() {
                        <$ty>::try_from(signed).map_err(|_| out_of_range())
                    } else if let Some(unsigned) = value.as_u64() {
                        <$ty>::try_from(unsigned).map_err(|_| out_of_range())
                    } else {
                        Err(ArgumentError::WrongType {
                            expected: "an integer",
                            found: value.to_string(),
                        })
                    }
                }
            }
        )*
    };
}

integer_schema_type!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl SchemaType for f64 {
    fn param_type() -> Result<ParamType> {
        Ok(ParamType::Float)
    }

    fn from_argument(value: Option<&Value>) -> std::result::Result<Self, ArgumentError> {
        let value = present(value)?;
        value.as_f64().ok_or_else(|| ArgumentError::WrongType {
            expected: "a number",
            found: value.to_string(),
        })
    }
}

impl SchemaType for f32 {
    fn param_type() -> Result<ParamType> {
        Ok(ParamType::Float)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn from_argument(value: Option<&Value>) -> std::result::Result<Self, ArgumentError> {
        f64::from_argument(value).map(|wide| wide as f32)
    }
}

impl<T: SchemaType> SchemaType for Option<T> {
    const OPTIONAL: bool = true;

    fn param_type() -> Result<ParamType> {
        T::param_type()
    }

    fn from_argument(value: Option<&Value>) -> std::result::Result<Self, ArgumentError> {
        match value {
            None | Some(Value::Null) => Ok(None),
            Some(_) => T::from_argument(value).map(Some),
        }
    }
}
