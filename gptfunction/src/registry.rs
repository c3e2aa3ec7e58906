//! Type-erased functions and name-based dispatch.

use std::fmt;
use std::sync::{Arc, RwLock};

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, warn};

use crate::arguments::Arguments;
use crate::descriptor::CallableDescriptor;
use crate::error::InvocationError;
use crate::schema::{FunctionSchema, ToolSchema};

/// Invoker closure stored by [`FunctionTool`].
pub type Invoker = Arc<dyn Fn(&Arguments<'_>) -> Result<String, InvocationError> + Send + Sync>;

/// A descriptor paired with an invoker that decodes arguments and renders the result.
///
/// `#[gpt_function]` generates one through `<function>::tool()`.
#[derive(Clone)]
pub struct FunctionTool {
    descriptor: Arc<CallableDescriptor>,
    invoker: Invoker,
}

impl FunctionTool {
    /// Creates a tool from a descriptor and an invoker.
    pub fn new<I>(descriptor: CallableDescriptor, invoker: I) -> Self
    where
        I: Fn(&Arguments<'_>) -> Result<String, InvocationError> + Send + Sync + 'static,
    {
        Self {
            descriptor: Arc::new(descriptor),
            invoker: Arc::new(invoker),
        }
    }

    /// Function name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    /// The descriptor built at wrap time.
    #[must_use]
    pub fn descriptor(&self) -> &CallableDescriptor {
        &self.descriptor
    }

    /// Invokes the function with a JSON argument object.
    ///
    /// # Errors
    ///
    /// Returns [`InvocationError`] when the arguments fail to decode or the
    /// function reports a failure.
    pub fn invoke(&self, arguments: &Value) -> Result<String, InvocationError> {
        let arguments = Arguments::new(&self.descriptor, arguments)?;
        (self.invoker)(&arguments)
    }

    /// Invokes the function with arguments encoded as a JSON string.
    ///
    /// Blank input is treated as an empty argument object.
    ///
    /// # Errors
    ///
    /// Returns [`InvocationError::MalformedArguments`] when the text is not
    /// JSON, otherwise as [`FunctionTool::invoke`].
    pub fn invoke_json(&self, arguments: &str) -> Result<String, InvocationError> {
        let payload = parse_arguments(arguments)?;
        self.invoke(&payload)
    }
}

impl fmt::Debug for FunctionTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionTool")
            .field("name", &self.descriptor.name())
            .finish_non_exhaustive()
    }
}

fn parse_arguments(arguments: &str) -> Result<Value, InvocationError> {
    if arguments.trim().is_empty() {
        return Ok(Value::Object(serde_json::Map::new()));
    }

    serde_json::from_str(arguments).map_err(|err| InvocationError::MalformedArguments {
        reason: err.to_string(),
    })
}

/// Registry of functions keyed by name, kept in registration order.
#[derive(Default)]
pub struct FunctionRegistry {
    inner: RwLock<IndexMap<String, FunctionTool>>,
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read().expect("function registry poisoned");
        let names: Vec<_> = inner.keys().cloned().collect();
        f.debug_struct("FunctionRegistry")
            .field("registered", &names)
            .finish()
    }
}

impl FunctionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a function.
    ///
    /// # Errors
    ///
    /// Returns [`InvocationError::DuplicateFunction`] if the name is already present.
    ///
    /// # Panics
    ///
    /// Panics if the internal registry lock is poisoned.
    pub fn register(&self, tool: FunctionTool) -> Result<(), InvocationError> {
        let mut inner = self.inner.write().expect("function registry poisoned");
        let name = tool.name().to_owned();
        if inner.contains_key(&name) {
            return Err(InvocationError::DuplicateFunction { name });
        }

        debug!(function = %name, "function registered");
        inner.insert(name, tool);
        Ok(())
    }

    /// Returns the function registered under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<FunctionTool> {
        let inner = self.inner.read().ok()?;
        inner.get(name).cloned()
    }

    /// Invokes a registered function with a JSON argument object.
    ///
    /// # Errors
    ///
    /// Returns [`InvocationError::UnknownFunction`] when the name is not
    /// registered, or propagates the function's own [`InvocationError`].
    pub fn invoke(&self, name: &str, arguments: &Value) -> Result<String, InvocationError> {
        let tool = self.get(name).ok_or_else(|| InvocationError::UnknownFunction {
            name: name.to_owned(),
        })?;

        debug!(function = %name, "dispatching function call");
        tool.invoke(arguments).inspect_err(|err| {
            warn!(function = %name, error = %err, "function call failed");
        })
    }

    /// Invokes a registered function with arguments encoded as a JSON string.
    ///
    /// # Errors
    ///
    /// As [`FunctionRegistry::invoke`], plus
    /// [`InvocationError::MalformedArguments`] for invalid JSON.
    pub fn invoke_json(&self, name: &str, arguments: &str) -> Result<String, InvocationError> {
        let payload = parse_arguments(arguments)?;
        self.invoke(name, &payload)
    }

    /// Function names in registration order.
    ///
    /// # Panics
    ///
    /// Panics if the internal registry lock is poisoned.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let inner = self.inner.read().expect("function registry poisoned");
        inner.keys().cloned().collect()
    }

    /// Calling schemas of every registered function, in registration order.
    ///
    /// # Panics
    ///
    /// Panics if the internal registry lock is poisoned.
    #[must_use]
    pub fn schemas(&self, use_required: bool) -> Vec<FunctionSchema> {
        let inner = self.inner.read().expect("function registry poisoned");
        inner
            .values()
            .map(|tool| tool.descriptor().schema(use_required))
            .collect()
    }

    /// Tool envelopes of every registered function, in registration order.
    ///
    /// # Panics
    ///
    /// Panics if the internal registry lock is poisoned.
    #[must_use]
    pub fn tool_schemas(&self, use_required: bool) -> Vec<ToolSchema> {
        self.schemas(use_required)
            .into_iter()
            .map(ToolSchema::new)
            .collect()
    }

    /// Number of registered functions.
    ///
    /// # Panics
    ///
    /// Panics if the internal registry lock is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().expect("function registry poisoned").len()
    }

    /// Whether no functions are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::descriptor::{CallableBuilder, ParamSpec};
    use crate::output::render_output;

    fn add_tool() -> FunctionTool {
        let descriptor = CallableBuilder::new("add")
            .doc("Adds two integers.")
            .param_spec(ParamSpec::of::<i64>("a"))
            .param_spec(ParamSpec::of::<Option<i64>>("b"))
            .build()
            .unwrap();

        FunctionTool::new(descriptor, |arguments| {
            let a: i64 = arguments.get("a")?;
            let b: Option<i64> = arguments.get("b")?;
            render_output(&(a + b.unwrap_or(0)), "add")
        })
    }

    #[test]
    fn register_and_invoke_function() {
        let registry = FunctionRegistry::new();
        registry.register(add_tool()).unwrap();

        assert_eq!(registry.invoke("add", &json!({"a": 2, "b": 3})).unwrap(), "5");
        assert_eq!(registry.invoke_json("add", r#"{"a": 2}"#).unwrap(), "2");
    }

    #[test]
    fn duplicate_registration_errors() {
        let registry = FunctionRegistry::new();
        registry.register(add_tool()).unwrap();

        let err = registry
            .register(add_tool())
            .expect_err("duplicate registration should fail");
        assert!(matches!(err, InvocationError::DuplicateFunction { name } if name == "add"));
    }

    #[test]
    fn unknown_function_errors() {
        let registry = FunctionRegistry::new();
        let err = registry
            .invoke("missing", &Value::Null)
            .expect_err("unknown function should error");

        assert!(matches!(err, InvocationError::UnknownFunction { name } if name == "missing"));
    }

    #[test]
    fn malformed_json_is_reported() {
        let tool = add_tool();
        assert!(matches!(
            tool.invoke_json("{not json"),
            Err(InvocationError::MalformedArguments { .. })
        ));
        assert!(matches!(
            tool.invoke_json("  "),
            Err(InvocationError::InvalidArgument { ref name, .. }) if name == "a"
        ));
    }

    #[test]
    fn schemas_follow_registration_order() {
        let registry = FunctionRegistry::new();
        let echo = FunctionTool::new(
            CallableBuilder::new("echo").build().unwrap(),
            |_arguments| Ok(String::new()),
        );
        registry.register(echo).unwrap();
        registry.register(add_tool()).unwrap();

        assert_eq!(registry.names(), ["echo", "add"]);
        let tools = registry.tool_schemas(true);
        assert_eq!(tools[1].function.name, "add");
        assert_eq!(tools[1].function.parameters.required, Some(vec!["a".to_owned()]));
        assert_eq!(registry.len(), 2);
        assert!(!registry.is_empty());
    }
}
