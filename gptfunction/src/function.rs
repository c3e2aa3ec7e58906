//! Transparent wrapper pairing a function with its descriptor.

use std::fmt;
use std::ops::Deref;

use crate::descriptor::{CallableBuilder, CallableDescriptor};
use crate::error::Result;
use crate::schema::{FunctionSchema, SchemaOptions, ToolSchema};

/// A function together with its calling schema metadata.
///
/// Dereferences to the wrapped function, so `wrapped(a, b)` calls it with the
/// original arguments, return value and errors.
#[derive(Clone)]
pub struct GptFunction<F> {
    func: F,
    descriptor: CallableDescriptor,
}

impl<F> GptFunction<F> {
    /// Pairs a function with an already built descriptor.
    #[must_use]
    pub fn new(func: F, descriptor: CallableDescriptor) -> Self {
        Self { func, descriptor }
    }

    /// Declared function name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    /// Summary from the documentation; empty when undocumented.
    #[must_use]
    pub fn description(&self) -> &str {
        self.descriptor.description()
    }

    /// The immutable descriptor built at wrap time.
    #[must_use]
    pub fn descriptor(&self) -> &CallableDescriptor {
        &self.descriptor
    }

    /// Renders the calling schema, with or without the `required` list.
    #[must_use]
    pub fn schema(&self, use_required: bool) -> FunctionSchema {
        self.descriptor.schema(use_required)
    }

    /// Renders the calling schema with explicit options.
    #[must_use]
    pub fn schema_with(&self, options: &SchemaOptions) -> FunctionSchema {
        self.descriptor.schema_with(options)
    }

    /// Renders the schema inside the `{"type": "function"}` tool envelope.
    #[must_use]
    pub fn tool_schema(&self, use_required: bool) -> ToolSchema {
        self.descriptor.tool_schema(use_required)
    }

    /// Returns a reference to the wrapped function.
    #[must_use]
    pub fn get_ref(&self) -> &F {
        &self.func
    }

    /// Unwraps the function and its descriptor.
    #[must_use]
    pub fn into_parts(self) -> (F, CallableDescriptor) {
        (self.func, self.descriptor)
    }
}

impl<F> Deref for GptFunction<F> {
    type Target = F;

    fn deref(&self) -> &F {
        &self.func
    }
}

impl<F> fmt::Debug for GptFunction<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GptFunction")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// Wraps `func` with the descriptor produced by `builder`.
///
/// # Errors
///
/// Propagates any [`SchemaError`](crate::SchemaError) from
/// [`CallableBuilder::build`]; no wrapper is produced in that case.
pub fn wrap<F>(func: F, builder: CallableBuilder) -> Result<GptFunction<F>> {
    Ok(GptFunction::new(func, builder.build()?))
}
