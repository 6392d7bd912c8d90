//! Tool-calling conversations across LLM vendors
//!
//! A vendor-neutral conversation model, protocol adapters for Anthropic
//! Claude, OpenAI and Google Gemini, a tool execution gateway, and the
//! orchestration loop that ties them together.

pub mod core;
pub mod auth;
pub mod claude;
pub mod gemini;
pub mod http;
pub mod openai;
pub mod orchestrator;
pub mod tools;

// Re-export commonly used types
pub use self::core::{
    config::{GenerationConfig, OrchestratorConfig},
    conversation::{Conversation, ConversationError},
    error::LlmError,
    provider::{create_adapter, ProtocolAdapter},
    transport::{VendorTransport, WireRequest, WireResponse},
    types::{
        Content, ContentBlock, FinishReason, Message, MessageRole, Model, ModelResponse,
        ToolDefinition, ToolInvocationRequest, ToolInvocationResult, UsageMetadata, Vendor,
    },
    value::Value,
};

pub use claude::{ClaudeAdapter, ClaudeModel};
pub use gemini::{GeminiAdapter, GeminiModel};
pub use http::{Endpoint, HttpTransport};
pub use openai::{OpenAiAdapter, OpenAiModel};
pub use orchestrator::{OrchestrationResult, Orchestrator, OrchestratorError, ToolExecutionRecord};
pub use tools::{
    create_tool_definition, BackendError, BackendResolver, FunctionRegistry, ToolBackend,
    ToolCatalogSource, ToolExecutor, ToolGateway, ToolOutput,
};
