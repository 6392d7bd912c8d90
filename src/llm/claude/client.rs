//! Claude protocol adapter

use crate::llm::core::{
    config::GenerationConfig,
    error::LlmError,
    provider::ProtocolAdapter,
    transport::{WireRequest, WireResponse},
    types::{Message, ModelResponse, ToolDefinition, Vendor},
};

use super::mapper::{from_claude_response, parse_claude_body, to_claude_request};

/// Claude model identifiers for Vertex AI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaudeModel {
    /// Claude Sonnet 4.5 (released 2025-09-29)
    Sonnet45,
    /// Claude Haiku 4.5 (released 2025-10-01)
    Haiku45,
    /// Any other model id
    Custom(String),
}

impl ClaudeModel {
    /// Get the model identifier string for Vertex AI
    pub fn as_str(&self) -> &str {
        match self {
            ClaudeModel::Sonnet45 => "claude-sonnet-4-5@20250929",
            ClaudeModel::Haiku45 => "claude-haiku-4-5@20251001",
            ClaudeModel::Custom(id) => id,
        }
    }
}

/// Speaks the Anthropic Messages API
#[derive(Debug, Clone)]
pub struct ClaudeAdapter {
    model: ClaudeModel,
}

impl ClaudeAdapter {
    pub fn new(model: ClaudeModel) -> Self {
        Self { model }
    }
}

impl ProtocolAdapter for ClaudeAdapter {
    fn vendor(&self) -> Vendor {
        Vendor::Claude
    }

    fn encode_request(
        &self,
        conversation: &[Message],
        tools: &[ToolDefinition],
        config: &GenerationConfig,
    ) -> Result<WireRequest, LlmError> {
        let request = to_claude_request(conversation, tools, config);
        Ok(WireRequest {
            vendor: Vendor::Claude,
            model: self.model.as_str().to_string(),
            body: serde_json::to_value(&request)?,
        })
    }

    fn decode_response(&self, response: &WireResponse) -> Result<ModelResponse, LlmError> {
        let parsed = parse_claude_body(&response.body)?;
        Ok(from_claude_response(parsed))
    }
}
