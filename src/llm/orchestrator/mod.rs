//! Tool-calling conversation loop
//!
//! An [`Orchestrator`] run:
//! - Sends the conversation to the model through the selected adapter
//! - Stops when the model answers without requesting tools
//! - Otherwise runs every requested tool concurrently and folds the results
//!   back in request order
//! - Loops until the model stops or the iteration cap is reached

mod error;

pub use error::OrchestratorError;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tracing::{debug, info, instrument, warn};

use crate::llm::core::{
    config::{GenerationConfig, OrchestratorConfig},
    conversation::Conversation,
    provider::{create_adapter, ProtocolAdapter},
    transport::VendorTransport,
    types::{
        FinishReason, Message, Model, ModelResponse, ToolDefinition, ToolInvocationRequest,
        ToolInvocationResult, UsageMetadata,
    },
};
use crate::llm::tools::{ToolCatalogSource, ToolExecutor};

/// One tool call as it happened
#[derive(Debug, Clone, PartialEq)]
pub struct ToolExecutionRecord {
    pub request_id: String,
    pub tool_name: String,
    pub success: bool,
    /// Result content, truncated
    pub result_summary: String,
    pub latency: Duration,
}

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct OrchestrationResult {
    /// The model's last response, the one that ended the loop
    pub final_response: ModelResponse,
    /// Every tool call, in the order results were folded back
    pub tool_execution_trace: Vec<ToolExecutionRecord>,
    /// Vendor requests sent
    pub iterations_used: usize,
    /// The full conversation, ending with the final assistant turn
    pub conversation: Vec<Message>,
    /// Token usage summed over all vendor requests
    pub usage: UsageMetadata,
}

impl OrchestrationResult {
    /// Whether any tool call in the run failed
    pub fn had_tool_failures(&self) -> bool {
        self.tool_execution_trace.iter().any(|record| !record.success)
    }
}

/// Where a run is in the request/execute/resume loop
enum RunState {
    Requesting,
    Inspecting(ModelResponse),
    Executing(ModelResponse),
    Done(ModelResponse),
    Failed(OrchestratorError),
}

/// Everything a run accumulates
struct Run {
    conversation: Conversation,
    trace: Vec<ToolExecutionRecord>,
    iterations_used: usize,
    usage: UsageMetadata,
}

impl Run {
    fn finish(mut self, final_response: ModelResponse) -> OrchestrationResult {
        self.conversation.push(final_response.to_message());
        OrchestrationResult {
            final_response,
            tool_execution_trace: self.trace,
            iterations_used: self.iterations_used,
            conversation: self.conversation.into_messages(),
            usage: self.usage,
        }
    }
}

/// Drives a conversation with tool use to a final answer
///
/// The orchestrator holds no per-run state; one instance can serve
/// concurrent runs.
pub struct Orchestrator {
    transport: Arc<dyn VendorTransport>,
    executor: Arc<dyn ToolExecutor>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    /// Create an orchestrator with default settings
    pub fn new(transport: Arc<dyn VendorTransport>, executor: Arc<dyn ToolExecutor>) -> Self {
        Self {
            transport,
            executor,
            config: OrchestratorConfig::default(),
        }
    }

    /// Set the run bounds (default: 5 iterations)
    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Run the loop until the model stops requesting tools
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for an empty conversation, duplicate tool names, a
    ///   conversation with unanswered tool requests, or a zero cap
    /// - `Transport` when a vendor request fails
    /// - `IterationLimitExceeded` when the model still requests tools in the
    ///   response to the last allowed request
    #[instrument(skip_all, fields(vendor = ?model.vendor(), model = model.as_str()))]
    pub async fn orchestrate(
        &self,
        initial: Vec<Message>,
        catalog: &[ToolDefinition],
        model: &Model,
        params: &GenerationConfig,
    ) -> Result<OrchestrationResult, OrchestratorError> {
        let conversation = Conversation::new(initial);
        self.validate(&conversation, catalog)?;

        let adapter = create_adapter(model);
        let mut run = Run {
            conversation,
            trace: Vec::new(),
            iterations_used: 0,
            usage: UsageMetadata::default(),
        };
        let mut state = RunState::Requesting;

        loop {
            state = match state {
                RunState::Requesting => {
                    match self.request(adapter.as_ref(), &mut run, catalog, params).await {
                        Ok(response) => RunState::Inspecting(response),
                        Err(err) => RunState::Failed(err),
                    }
                }
                RunState::Inspecting(response) => self.inspect(response, run.iterations_used),
                RunState::Executing(response) => match self.execute_round(response, &mut run).await
                {
                    Ok(()) => RunState::Requesting,
                    Err(err) => RunState::Failed(err),
                },
                RunState::Done(response) => {
                    info!(
                        iterations = run.iterations_used,
                        tool_calls = run.trace.len(),
                        finish_reason = ?response.finish_reason,
                        "Orchestration completed"
                    );
                    return Ok(run.finish(response));
                }
                RunState::Failed(err) => {
                    warn!(iterations = run.iterations_used, error = %err, "Orchestration failed");
                    return Err(err);
                }
            };
        }
    }

    /// Same as [`orchestrate`](Self::orchestrate), with the catalog taken
    /// from a source once at the start of the run
    pub async fn orchestrate_with_source(
        &self,
        initial: Vec<Message>,
        source: &dyn ToolCatalogSource,
        model: &Model,
        params: &GenerationConfig,
    ) -> Result<OrchestrationResult, OrchestratorError> {
        let catalog = source.tool_definitions();
        self.orchestrate(initial, &catalog, model, params).await
    }

    fn validate(
        &self,
        conversation: &Conversation,
        catalog: &[ToolDefinition],
    ) -> Result<(), OrchestratorError> {
        if conversation.is_empty() {
            return Err(OrchestratorError::InvalidInput(
                "initial conversation is empty".to_string(),
            ));
        }

        if self.config.max_iterations == 0 {
            return Err(OrchestratorError::InvalidInput(
                "max_iterations must be at least 1".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for definition in catalog {
            if !names.insert(definition.name.as_str()) {
                return Err(OrchestratorError::InvalidInput(format!(
                    "duplicate tool name in catalog: {}",
                    definition.name
                )));
            }
        }

        let pending = conversation.pending_requests();
        if !pending.is_empty() {
            let ids: Vec<&str> = pending.iter().map(|request| request.id.as_str()).collect();
            return Err(OrchestratorError::InvalidInput(format!(
                "initial conversation has unanswered tool requests: {:?}",
                ids
            )));
        }

        Ok(())
    }

    async fn request(
        &self,
        adapter: &dyn ProtocolAdapter,
        run: &mut Run,
        catalog: &[ToolDefinition],
        params: &GenerationConfig,
    ) -> Result<ModelResponse, OrchestratorError> {
        let wire = adapter.encode_request(run.conversation.messages(), catalog, params)?;

        run.iterations_used += 1;
        debug!(
            iteration = run.iterations_used,
            messages = run.conversation.len(),
            "Sending model request"
        );

        let reply = self.transport.send(wire).await?;
        let response = adapter.decode_response(&reply)?;
        run.usage.add(&response.usage);

        debug!(
            iteration = run.iterations_used,
            finish_reason = ?response.finish_reason,
            tool_requests = response.tool_requests().len(),
            "Model responded"
        );
        Ok(response)
    }

    fn inspect(&self, response: ModelResponse, iterations_used: usize) -> RunState {
        if response.finish_reason != FinishReason::ToolUse {
            return RunState::Done(response);
        }

        if response.tool_requests().is_empty() {
            debug!("Tool use reported without tool requests");
            return RunState::Done(response);
        }

        if iterations_used >= self.config.max_iterations {
            return RunState::Failed(OrchestratorError::IterationLimitExceeded {
                max_iterations: self.config.max_iterations,
            });
        }

        RunState::Executing(response)
    }

    async fn execute_round(
        &self,
        response: ModelResponse,
        run: &mut Run,
    ) -> Result<(), OrchestratorError> {
        let requests = response.tool_requests();
        info!(count = requests.len(), "Executing tool requests");

        // join_all yields outputs in input order whatever order they finish in
        let outcomes = join_all(requests.iter().map(|request| self.dispatch(request))).await;

        let mut results = Vec::with_capacity(outcomes.len());
        for (request, (result, latency)) in requests.iter().zip(outcomes) {
            run.trace.push(ToolExecutionRecord {
                request_id: request.id.clone(),
                tool_name: request.tool_name.clone(),
                success: !result.is_error,
                result_summary: summarize(&result.content, self.config.summary_chars),
                latency,
            });
            results.push(result);
        }

        run.conversation
            .append_tool_round(response.to_message(), results)?;
        Ok(())
    }

    async fn dispatch(&self, request: &ToolInvocationRequest) -> (ToolInvocationResult, Duration) {
        let started = Instant::now();

        let result = match &request.decode_error {
            Some(detail) => {
                warn!(tool = %request.tool_name, request_id = %request.id, "Skipping tool call with undecodable arguments");
                ToolInvocationResult::error(
                    &request.id,
                    format!("invalid arguments for tool '{}': {}", request.tool_name, detail),
                )
            }
            None => self.executor.execute(request).await,
        };

        let result = if result.request_id == request.id {
            result
        } else {
            warn!(
                expected = %request.id,
                returned = %result.request_id,
                "Tool executor returned a foreign request id"
            );
            ToolInvocationResult {
                request_id: request.id.clone(),
                ..result
            }
        };

        (result, started.elapsed())
    }
}

/// First `max_chars` characters, with an ellipsis when cut
fn summarize(content: &str, max_chars: usize) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}…", head)
    } else {
        head
    }
}
