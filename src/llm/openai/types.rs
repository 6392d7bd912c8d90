//! OpenAI-specific request and response types
//!
//! These types map directly to the Chat Completions API schema.

use serde::{Deserialize, Serialize};

/// Request body for `POST /chat/completions`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    /// Model identifier
    pub model: String,
    /// Conversation, system prompt first
    pub messages: Vec<ChatMessage>,
    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Stop sequences
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
    /// Available tools for the model to use
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ChatTool>>,
}

/// A single message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// "system", "user", "assistant" or "tool"
    pub role: String,
    /// Text content (absent on assistant turns that only call tools)
    pub content: Option<String>,
    /// Tool calls made by the assistant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    /// Which call a "tool" message answers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    /// A message with only text content
    pub fn text(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

/// A tool call made by the assistant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    /// Always "function"
    #[serde(rename = "type", default = "function_type")]
    pub call_type: String,
    pub function: FunctionCall,
}

/// Function name and arguments of a tool call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// Arguments, normally a JSON-encoded string
    #[serde(default)]
    pub arguments: serde_json::Value,
}

/// Tool definition sent in the request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTool {
    /// Always "function"
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: FunctionDefinition,
}

/// Function tool definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    /// Parameters schema (JSON Schema)
    pub parameters: serde_json::Value,
}

/// Response from `POST /chat/completions`
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    /// Completion id
    pub id: String,
    pub model: Option<String>,
    pub choices: Vec<Choice>,
    pub usage: Option<ChatUsage>,
}

/// A single choice in the response
#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ChatMessage,
    pub finish_reason: Option<String>,
}

/// Token usage
#[derive(Debug, Clone, Deserialize)]
pub struct ChatUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

/// Error body: `{"error": {...}}`
#[derive(Debug, Clone, Deserialize)]
pub struct ChatErrorResponse {
    pub error: ChatErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatErrorDetail {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: Option<String>,
    pub code: Option<String>,
}

fn function_type() -> String {
    "function".to_string()
}
