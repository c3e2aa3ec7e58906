//! Procedural macros for gptfunction.
//!
//! `#[gpt_function]` reads a function's signature and doc comments and
//! generates the builder calls that describe it. `#[derive(SchemaEnum)]` lets
//! unit-only enums be used as enumerated parameter types.

use proc_macro::TokenStream;
use syn::{DeriveInput, ItemFn, parse_macro_input};

mod function;
mod schema_enum;

/// Generates calling schema support for a free function.
///
/// The function itself is emitted unchanged. Next to it a module with the same
/// name is generated, containing:
///
/// - `NAME`: the name used in the schema,
/// - `builder()`: a [`CallableBuilder`] describing the signature and docs,
/// - `descriptor()`: the built descriptor,
/// - `wrap()`: a `GptFunction` that derefs to the function,
/// - `tool()`: a type-erased `FunctionTool` for registry dispatch.
///
/// Parameters typed `Option<T>` are optional. `#[literal(..)]` restricts a
/// parameter to a closed set of values. The function must be declared at
/// module level.
///
/// # Example
///
/// ```rust,ignore
/// use gptfunction::gpt_function;
///
/// /// Outputs a user's name and age to the console.
/// ///
/// /// :param name: The name of the user.
/// /// :param age: The age of the user.
/// #[gpt_function]
/// fn output_user(name: String, #[literal(18, 21, 65)] age: i64) {
///     println!("Name: {name}, Age: {age}");
/// }
///
/// let schema = output_user::wrap()?.schema(true);
/// ```
///
/// [`CallableBuilder`]: https://docs.rs/gptfunction/latest/gptfunction/struct.CallableBuilder.html
#[proc_macro_attribute]
pub fn gpt_function(attr: TokenStream, item: TokenStream) -> TokenStream {
    let arguments = parse_macro_input!(attr as function::FunctionArguments);
    let input_function = parse_macro_input!(item as ItemFn);

    match function::expand(arguments, input_function) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Implements `SchemaEnum` and `SchemaType` for a unit-only enum.
///
/// Each variant's value defaults to its name in snake case and can be set
/// with `#[schema(value = "...")]`.
#[proc_macro_derive(SchemaEnum, attributes(schema))]
pub fn derive_schema_enum(item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);

    match schema_enum::expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
