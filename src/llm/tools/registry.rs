//! In-process tool registry

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::llm::core::{types::ToolDefinition, value::Value};

use super::backend::{BackendError, BackendResolver, ToolBackend, ToolCatalogSource, ToolOutput};

/// Type alias for boxed async functions
type AsyncToolFn = Box<
    dyn Fn(serde_json::Value) -> BoxFuture<'static, Result<String, BackendError>> + Send + Sync,
>;

/// A Rust function exposed as a tool backend
struct FunctionBackend {
    func: AsyncToolFn,
}

#[async_trait]
impl ToolBackend for FunctionBackend {
    async fn invoke(&self, arguments: Value) -> Result<ToolOutput, BackendError> {
        (self.func)(arguments.into()).await.map(ToolOutput::from)
    }
}

fn deserialize_args<Args: DeserializeOwned>(
    args_json: serde_json::Value,
) -> Result<Args, BackendError> {
    serde_json::from_value::<Args>(args_json)
        .map_err(|e| BackendError::InvalidArguments(format!("Failed to deserialize arguments: {}", e)))
}

fn serialize_result<R: Serialize>(result: Result<R, String>) -> Result<String, BackendError> {
    let value = result.map_err(BackendError::Application)?;
    serde_json::to_string(&value)
        .map_err(|e| BackendError::Application(format!("Failed to serialize result: {}", e)))
}

/// Registry of in-process tools
///
/// Rust functions are registered by name; arguments are deserialized from the
/// model's JSON and results serialized back to JSON text. Definitions
/// registered alongside make the registry a [`ToolCatalogSource`].
///
/// # Example
///
/// ```rust
/// use serde::{Deserialize, Serialize};
/// use toolrelay::llm::{FunctionRegistry, ToolCatalogSource, ToolDefinition, Value};
///
/// #[derive(Deserialize)]
/// struct WeatherArgs {
///     city: String,
/// }
///
/// #[derive(Serialize)]
/// struct WeatherResult {
///     temperature: f32,
/// }
///
/// let mut registry = FunctionRegistry::new();
/// registry.register_sync_tool(
///     ToolDefinition {
///         name: "get_weather".to_string(),
///         description: "Current weather for a city".to_string(),
///         input_schema: Value::empty_map(),
///     },
///     |args: WeatherArgs| {
///         let _ = args.city;
///         Ok(WeatherResult { temperature: 18.0 })
///     },
/// );
/// assert_eq!(registry.tool_definitions().len(), 1);
/// ```
#[derive(Default)]
pub struct FunctionRegistry {
    backends: HashMap<String, Arc<dyn ToolBackend>>,
    definitions: Vec<ToolDefinition>,
}

impl FunctionRegistry {
    /// Create a new empty function registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an async function that returns a serializable result
    pub fn register_async<F, Args, R, Fut>(&mut self, name: impl Into<String>, func: F)
    where
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Args: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
        Fut: Future<Output = Result<R, String>> + Send + 'static,
    {
        let wrapper = move |args_json: serde_json::Value| {
            let args = match deserialize_args::<Args>(args_json) {
                Ok(args) => args,
                Err(e) => return Box::pin(async move { Err(e) }) as BoxFuture<'static, _>,
            };

            let future = func(args);
            Box::pin(async move { serialize_result(future.await) }) as BoxFuture<'static, _>
        };

        self.register_backend(name, Arc::new(FunctionBackend {
            func: Box::new(wrapper),
        }));
    }

    /// Register a synchronous function that returns a serializable result
    pub fn register_sync<F, Args, R>(&mut self, name: impl Into<String>, func: F)
    where
        F: Fn(Args) -> Result<R, String> + Send + Sync + 'static,
        Args: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
    {
        let wrapper = move |args_json: serde_json::Value| {
            let result = deserialize_args::<Args>(args_json)
                .and_then(|args| serialize_result(func(args)));
            Box::pin(async move { result }) as BoxFuture<'static, _>
        };

        self.register_backend(name, Arc::new(FunctionBackend {
            func: Box::new(wrapper),
        }));
    }

    /// Register an async function together with its definition
    pub fn register_async_tool<F, Args, R, Fut>(&mut self, definition: ToolDefinition, func: F)
    where
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Args: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
        Fut: Future<Output = Result<R, String>> + Send + 'static,
    {
        self.register_async(definition.name.clone(), func);
        self.add_definition(definition);
    }

    /// Register a synchronous function together with its definition
    pub fn register_sync_tool<F, Args, R>(&mut self, definition: ToolDefinition, func: F)
    where
        F: Fn(Args) -> Result<R, String> + Send + Sync + 'static,
        Args: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
    {
        self.register_sync(definition.name.clone(), func);
        self.add_definition(definition);
    }

    /// Register any backend, e.g. a client for an out-of-process tool
    pub fn register_backend(&mut self, name: impl Into<String>, backend: Arc<dyn ToolBackend>) {
        self.backends.insert(name.into(), backend);
    }

    /// Offer a definition to the model, replacing one with the same name
    pub fn add_definition(&mut self, definition: ToolDefinition) {
        match self
            .definitions
            .iter_mut()
            .find(|existing| existing.name == definition.name)
        {
            Some(existing) => *existing = definition,
            None => self.definitions.push(definition),
        }
    }

    /// Check if a function is registered
    pub fn contains(&self, name: &str) -> bool {
        self.backends.contains_key(name)
    }

    /// Get the number of registered functions
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

impl BackendResolver for FunctionRegistry {
    fn resolve(&self, tool_name: &str) -> Option<Arc<dyn ToolBackend>> {
        self.backends.get(tool_name).cloned()
    }
}

impl ToolCatalogSource for FunctionRegistry {
    fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.definitions.clone()
    }
}
