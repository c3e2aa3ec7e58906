//! Calling schemas for LLM function calling, derived from Rust functions.
//!
//! Annotate a function with [`gpt_function`] and its signature and doc comments
//! become a schema a tool-calling model understands:
//!
//! ```ignore
//! use gptfunction::gpt_function;
//!
//! /// Outputs a user's name and age to the console.
//! ///
//! /// :param name: The name of the user.
//! /// :param age: The age of the user.
//! #[gpt_function]
//! fn output_user(name: String, age: i64) {
//!     println!("Name: {name}, Age: {age}");
//! }
//!
//! let wrapped = output_user::wrap()?;
//! let tools = vec![wrapped.tool_schema(true)];
//! wrapped("Ada".to_owned(), 36);
//! ```
//!
//! Callables the macro cannot see are described with [`CallableBuilder`].

#![warn(missing_docs, clippy::pedantic)]

extern crate self as gptfunction;

mod arguments;
mod descriptor;
mod docstring;
mod error;
mod function;
mod output;
mod registry;
mod schema;
mod types;

/// Argument decoding for dispatched calls.
pub use arguments::Arguments;
/// Wrap-time descriptors and their builder.
pub use descriptor::{CallableBuilder, CallableDescriptor, ParamSpec, ParameterDescriptor};
/// Documentation parsing.
pub use docstring::{DocParam, Docstring};
/// Errors, warnings and the wrap-time result alias.
pub use error::{ArgumentError, DocstringWarning, InvocationError, Result, SchemaError};
/// The transparent function wrapper.
pub use function::{GptFunction, wrap};
/// Result rendering for dispatched calls.
pub use output::{render_output, render_result};
/// Type-erased functions and name-based dispatch.
pub use registry::{FunctionRegistry, FunctionTool, Invoker};
/// Rendered schemas and rendering options.
pub use schema::{FunctionSchema, ParametersSchema, PropertySchema, SchemaOptions, ToolSchema};
/// Supported parameter types.
pub use types::{
    EnumMember, EnumType, Literal, LiteralSet, ParamType, PrimitiveType, SchemaEnum, SchemaType,
    TypeCategory, decode_enum,
};

/// JSON value type used for arguments.
pub use serde_json::Value;

/// Attribute and derive macros (enabled by the `macros` feature).
#[cfg(feature = "macros")]
pub use gptfunction_macros::{SchemaEnum, gpt_function};
