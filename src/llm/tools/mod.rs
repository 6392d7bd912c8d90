//! Tool execution
//!
//! The [`ToolGateway`] turns a model's tool request into a result by finding
//! a [`ToolBackend`] through a [`BackendResolver`]. [`FunctionRegistry`] is
//! the in-process resolver for tools written in Rust.

pub mod backend;
pub mod declaration;
pub mod executor;
pub mod registry;

// Re-export commonly used types
pub use backend::{BackendError, BackendResolver, ToolBackend, ToolCatalogSource, ToolOutput};
pub use declaration::create_tool_definition;
pub use executor::{ToolExecutor, ToolGateway};
pub use registry::FunctionRegistry;
