//! Tool backends and how they are found

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::llm::core::{types::ToolDefinition, value::Value};

/// Output of a successful tool call, possibly in several parts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub parts: Vec<String>,
}

impl ToolOutput {
    pub fn new(parts: Vec<String>) -> Self {
        Self { parts }
    }

    /// All parts as one payload, newline separated
    pub fn text(&self) -> String {
        self.parts.join("\n")
    }
}

impl From<String> for ToolOutput {
    fn from(text: String) -> Self {
        Self { parts: vec![text] }
    }
}

impl From<&str> for ToolOutput {
    fn from(text: &str) -> Self {
        Self::from(text.to_string())
    }
}

impl From<Vec<String>> for ToolOutput {
    fn from(parts: Vec<String>) -> Self {
        Self { parts }
    }
}

/// Failures reported by a tool backend
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// Arguments did not match what the tool accepts
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// The backend could not be reached
    #[error("tool backend unreachable: {0}")]
    Unreachable(String),

    /// The tool ran and reported a failure
    #[error("tool error: {0}")]
    Application(String),

    #[error("tool timed out after {0:?}")]
    Timeout(Duration),
}

/// Something that can run one tool
#[async_trait]
pub trait ToolBackend: Send + Sync {
    async fn invoke(&self, arguments: Value) -> Result<ToolOutput, BackendError>;
}

/// Finds the backend for a tool name
pub trait BackendResolver: Send + Sync {
    fn resolve(&self, tool_name: &str) -> Option<Arc<dyn ToolBackend>>;
}

impl<T: BackendResolver + ?Sized> BackendResolver for Arc<T> {
    fn resolve(&self, tool_name: &str) -> Option<Arc<dyn ToolBackend>> {
        (**self).resolve(tool_name)
    }
}

/// Supplies the tool catalog offered to the model
pub trait ToolCatalogSource {
    /// Snapshot of the available tool definitions
    fn tool_definitions(&self) -> Vec<ToolDefinition>;
}
