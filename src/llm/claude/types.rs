//! Claude-specific request and response types
//!
//! These types map directly to the Anthropic Messages API schema as served
//! by Vertex AI `rawPredict`.

use serde::{Deserialize, Serialize};

/// Request to the Messages API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesRequest {
    /// Required API version for Vertex AI Claude
    pub anthropic_version: String,
    /// Maximum number of tokens to generate (required)
    pub max_tokens: u32,
    /// Array of messages in the conversation
    pub messages: Vec<ClaudeMessage>,
    /// System prompt (top-level field)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// Available tools for the model to use
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ClaudeTool>>,
    /// Temperature (0.0-1.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Top-p nucleus sampling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Top-k sampling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    /// Stop sequences
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
}

/// A single message in the Claude conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaudeMessage {
    /// Role: "user" or "assistant"
    pub role: String,
    /// Content (can be string or array of content blocks)
    pub content: ClaudeContent,
}

/// Content can be either a simple string or an array of content blocks
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClaudeContent {
    /// Simple text content
    Text(String),
    /// Array of content blocks
    Blocks(Vec<ClaudeContentBlock>),
}

/// A content block within a Claude message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClaudeContentBlock {
    /// Text content
    Text { text: String },
    /// Tool use block (model invoking a tool)
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: serde_json::Value,
    },
    /// Tool result block (application providing tool result)
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
    },
    /// Block kinds this client does not use (thinking, redacted_thinking, ...)
    #[serde(other)]
    Unsupported,
}

/// Tool definition for Claude
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaudeTool {
    /// Tool name
    pub name: String,
    /// Tool description
    pub description: String,
    /// Input schema (JSON Schema)
    pub input_schema: serde_json::Value,
}

/// Complete (non-streaming) response from the Messages API
#[derive(Debug, Clone, Deserialize)]
pub struct MessagesResponse {
    /// Message ID
    pub id: String,
    /// Message role (always "assistant" for responses)
    pub role: String,
    /// Generated content blocks
    #[serde(default)]
    pub content: Vec<ClaudeContentBlock>,
    /// Model identifier
    pub model: Option<String>,
    /// Why generation stopped
    pub stop_reason: Option<String>,
    /// Stop sequence that triggered stop (if any)
    pub stop_sequence: Option<String>,
    /// Token usage
    #[serde(default)]
    pub usage: ClaudeUsage,
}

/// Usage metadata
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClaudeUsage {
    #[serde(default)]
    pub input_tokens: u32,
    #[serde(default)]
    pub output_tokens: u32,
}

/// Error body: `{"type": "error", "error": {...}}`
#[derive(Debug, Clone, Deserialize)]
pub struct ClaudeErrorResponse {
    pub error: ClaudeErrorData,
}

/// Error data
#[derive(Debug, Clone, Deserialize)]
pub struct ClaudeErrorData {
    /// Error type
    #[serde(rename = "type")]
    pub error_type: String,
    /// Error message
    pub message: String,
}
