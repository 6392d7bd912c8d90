//! Core types for the conversation model

use serde::{Deserialize, Serialize};

use super::value::Value;
use crate::llm::claude::ClaudeModel;
use crate::llm::gemini::GeminiModel;
use crate::llm::openai::OpenAiModel;

/// A single message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender
    pub role: MessageRole,
    /// Plain text or an ordered list of content blocks
    pub content: Content,
}

impl Message {
    /// Create a new user message with text content
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: Content::Plain(text.into()),
        }
    }

    /// Create a new assistant message with text content
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: Content::Plain(text.into()),
        }
    }

    /// Create a message from content blocks
    pub fn with_blocks(role: MessageRole, blocks: Vec<ContentBlock>) -> Self {
        Self {
            role,
            content: Content::Blocks(blocks),
        }
    }

    /// Create the user turn that carries tool results back to the model
    pub fn tool_results(results: Vec<ToolInvocationResult>) -> Self {
        Self::with_blocks(
            MessageRole::User,
            results.into_iter().map(ContentBlock::ToolResult).collect(),
        )
    }

    /// Content as a block list (plain text becomes a single text block)
    pub fn blocks(&self) -> Vec<ContentBlock> {
        self.content.to_blocks()
    }

    /// Tool requests carried by this message, in order
    pub fn tool_requests(&self) -> Vec<&ToolInvocationRequest> {
        match &self.content {
            Content::Plain(_) => Vec::new(),
            Content::Blocks(blocks) => blocks
                .iter()
                .filter_map(|block| match block {
                    ContentBlock::ToolRequest(request) => Some(request),
                    _ => None,
                })
                .collect(),
        }
    }

    /// Tool results carried by this message, in order
    pub fn tool_results_in(&self) -> Vec<&ToolInvocationResult> {
        match &self.content {
            Content::Plain(_) => Vec::new(),
            Content::Blocks(blocks) => blocks
                .iter()
                .filter_map(|block| match block {
                    ContentBlock::ToolResult(result) => Some(result),
                    _ => None,
                })
                .collect(),
        }
    }
}

/// Role of a message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Human input, also carries tool results
    User,
    /// Model output
    Assistant,
}

/// Message content: either plain text or interleaved blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    Plain(String),
    Blocks(Vec<ContentBlock>),
}

impl Content {
    pub fn to_blocks(&self) -> Vec<ContentBlock> {
        match self {
            Content::Plain(text) => vec![ContentBlock::Text { text: text.clone() }],
            Content::Blocks(blocks) => blocks.clone(),
        }
    }

    /// Concatenated text of all text blocks
    pub fn text(&self) -> String {
        match self {
            Content::Plain(text) => text.clone(),
            Content::Blocks(blocks) => blocks
                .iter()
                .filter_map(|block| match block {
                    ContentBlock::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect(),
        }
    }
}

/// Content block within a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text content
    Text { text: String },
    /// The model asks for a tool to run
    ToolRequest(ToolInvocationRequest),
    /// The outcome of a tool run, correlated by request id
    ToolResult(ToolInvocationResult),
}

/// A tool call requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocationRequest {
    /// Correlation id, unique within one assistant turn
    pub id: String,
    /// Name of the tool to run
    pub tool_name: String,
    /// Arguments, shaped by the tool's input schema
    pub arguments: Value,
    /// Set when the vendor's arguments could not be decoded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decode_error: Option<String>,
}

impl ToolInvocationRequest {
    pub fn new(id: impl Into<String>, tool_name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            tool_name: tool_name.into(),
            arguments,
            decode_error: None,
        }
    }
}

/// The result of one tool invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocationResult {
    /// Id of the request this result answers
    pub request_id: String,
    /// Text payload for the model
    pub content: String,
    #[serde(default)]
    pub is_error: bool,
}

impl ToolInvocationResult {
    pub fn success(request_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(request_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            content: content.into(),
            is_error: true,
        }
    }
}

/// Declaration of a tool available to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Function name, unique within one orchestration run
    pub name: String,
    /// What the tool does
    pub description: String,
    /// JSON Schema for the arguments
    pub input_schema: Value,
}

/// A decoded model turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    /// Vendor-reported response id
    pub id: String,
    /// Text and tool request blocks
    pub content: Vec<ContentBlock>,
    pub finish_reason: FinishReason,
    /// The vendor's own finish code, if it sent one
    pub raw_finish_reason: Option<String>,
    pub usage: UsageMetadata,
    /// Model identifier echoed by the vendor
    pub model: Option<String>,
}

impl ModelResponse {
    /// Concatenated text blocks
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Tool requests in the order the model issued them
    pub fn tool_requests(&self) -> Vec<&ToolInvocationRequest> {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::ToolRequest(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    /// The assistant message this response represents
    pub fn to_message(&self) -> Message {
        Message::with_blocks(MessageRole::Assistant, self.content.clone())
    }
}

/// Reason why generation finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural completion
    Stop,
    /// Hit token limit
    MaxTokens,
    /// Waiting for tool execution
    ToolUse,
    /// Refused, filtered or failed on the vendor side
    Error,
    /// Generation was cancelled before completion
    Cancelled,
}

/// Token usage information
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageMetadata {
    /// Prompt tokens consumed
    pub input_tokens: u32,
    /// Response tokens generated
    pub output_tokens: u32,
    /// Sum of input and output
    pub total_tokens: u32,
}

impl UsageMetadata {
    /// Create new usage metadata
    pub fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
        }
    }

    /// Add usage from another metadata
    pub fn add(&mut self, other: &UsageMetadata) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
        self.total_tokens = self.input_tokens + self.output_tokens;
    }
}

/// Vendor wire protocol family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vendor {
    Claude,
    OpenAi,
    Gemini,
}

/// Unified model enum for all supported LLM vendors
///
/// Selecting a model also selects the protocol adapter.
#[derive(Debug, Clone)]
pub enum Model {
    /// Anthropic Claude model
    Claude(ClaudeModel),
    /// OpenAI chat completions model
    OpenAi(OpenAiModel),
    /// Google Gemini model
    Gemini(GeminiModel),
}

impl Model {
    /// Get the model identifier as a string
    pub fn as_str(&self) -> &str {
        match self {
            Model::Claude(model) => model.as_str(),
            Model::OpenAi(model) => model.as_str(),
            Model::Gemini(model) => model.as_str(),
        }
    }

    pub fn vendor(&self) -> Vendor {
        match self {
            Model::Claude(_) => Vendor::Claude,
            Model::OpenAi(_) => Vendor::OpenAi,
            Model::Gemini(_) => Vendor::Gemini,
        }
    }
}
