//! OpenAI protocol adapter

use crate::llm::core::{
    config::GenerationConfig,
    error::LlmError,
    provider::ProtocolAdapter,
    transport::{WireRequest, WireResponse},
    types::{Message, ModelResponse, ToolDefinition, Vendor},
};

use super::mapper::{from_openai_response, parse_openai_body, to_openai_request};

/// OpenAI model identifiers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenAiModel {
    Gpt4o,
    Gpt4oMini,
    Gpt41,
    /// Any other model id, including OpenAI-compatible servers
    Custom(String),
}

impl OpenAiModel {
    pub fn as_str(&self) -> &str {
        match self {
            OpenAiModel::Gpt4o => "gpt-4o",
            OpenAiModel::Gpt4oMini => "gpt-4o-mini",
            OpenAiModel::Gpt41 => "gpt-4.1",
            OpenAiModel::Custom(id) => id,
        }
    }
}

/// Speaks the Chat Completions API
#[derive(Debug, Clone)]
pub struct OpenAiAdapter {
    model: OpenAiModel,
}

impl OpenAiAdapter {
    pub fn new(model: OpenAiModel) -> Self {
        Self { model }
    }
}

impl ProtocolAdapter for OpenAiAdapter {
    fn vendor(&self) -> Vendor {
        Vendor::OpenAi
    }

    fn encode_request(
        &self,
        conversation: &[Message],
        tools: &[ToolDefinition],
        config: &GenerationConfig,
    ) -> Result<WireRequest, LlmError> {
        let request = to_openai_request(self.model.as_str(), conversation, tools, config);
        Ok(WireRequest {
            vendor: Vendor::OpenAi,
            model: self.model.as_str().to_string(),
            body: serde_json::to_value(&request)?,
        })
    }

    fn decode_response(&self, response: &WireResponse) -> Result<ModelResponse, LlmError> {
        from_openai_response(parse_openai_body(&response.body)?)
    }
}
