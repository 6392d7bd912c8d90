//! Tool execution gateway

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use tracing::{debug, instrument, warn};

use crate::llm::core::types::{ToolInvocationRequest, ToolInvocationResult};

use super::backend::{BackendError, BackendResolver};

const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(30);

/// Executes tool requests from the model
///
/// Implementations never fail: every outcome, including unknown tools and
/// backend failures, is a [`ToolInvocationResult`] the model can read.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, request: &ToolInvocationRequest) -> ToolInvocationResult;
}

/// Resolves tool names to backends and runs them under a timeout
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use toolrelay::llm::{FunctionRegistry, ToolGateway};
///
/// let gateway = ToolGateway::new(FunctionRegistry::new())
///     .with_timeout(Duration::from_secs(10));
/// assert_eq!(gateway.timeout(), Duration::from_secs(10));
/// ```
pub struct ToolGateway<R> {
    resolver: R,
    timeout: Duration,
}

impl<R: BackendResolver> ToolGateway<R> {
    pub fn new(resolver: R) -> Self {
        Self {
            resolver,
            timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }

    /// Per-call timeout, 30 seconds unless set
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }
}

#[async_trait]
impl<R: BackendResolver> ToolExecutor for ToolGateway<R> {
    #[instrument(skip_all, fields(tool = %request.tool_name, request_id = %request.id))]
    async fn execute(&self, request: &ToolInvocationRequest) -> ToolInvocationResult {
        let Some(backend) = self.resolver.resolve(&request.tool_name) else {
            warn!("Model requested an unknown tool");
            return ToolInvocationResult::error(
                &request.id,
                format!("tool not found: {}", request.tool_name),
            );
        };

        let invocation = AssertUnwindSafe(backend.invoke(request.arguments.clone())).catch_unwind();
        let outcome = match tokio::time::timeout(self.timeout, invocation).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(payload)) => Err(BackendError::Application(format!(
                "tool panicked: {}",
                panic_message(payload.as_ref())
            ))),
            Err(_) => Err(BackendError::Timeout(self.timeout)),
        };

        match outcome {
            Ok(output) => {
                debug!(parts = output.parts.len(), "Tool succeeded");
                ToolInvocationResult::success(&request.id, output.text())
            }
            Err(err) => {
                warn!(error = %err, "Tool failed");
                ToolInvocationResult::error(&request.id, err.to_string())
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}
