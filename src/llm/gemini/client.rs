//! Gemini protocol adapter

use crate::llm::core::{
    config::GenerationConfig,
    error::LlmError,
    provider::ProtocolAdapter,
    transport::{WireRequest, WireResponse},
    types::{Message, ModelResponse, ToolDefinition, Vendor},
};

use super::mapper::{from_gemini_response, parse_gemini_body, to_gemini_request};

/// Gemini model identifiers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeminiModel {
    /// Gemini 2.5 Pro
    Gemini25Pro,
    /// Gemini 2.5 Flash
    Gemini25Flash,
    /// Gemini 2.5 Flash Lite
    Gemini25FlashLite,
    /// Any other model id
    Custom(String),
}

impl GeminiModel {
    /// Get the model identifier string
    pub fn as_str(&self) -> &str {
        match self {
            GeminiModel::Gemini25Pro => "gemini-2.5-pro",
            GeminiModel::Gemini25Flash => "gemini-2.5-flash",
            GeminiModel::Gemini25FlashLite => "gemini-2.5-flash-lite",
            GeminiModel::Custom(id) => id,
        }
    }
}

/// Speaks the Vertex AI generateContent API
#[derive(Debug, Clone)]
pub struct GeminiAdapter {
    model: GeminiModel,
}

impl GeminiAdapter {
    pub fn new(model: GeminiModel) -> Self {
        Self { model }
    }
}

impl ProtocolAdapter for GeminiAdapter {
    fn vendor(&self) -> Vendor {
        Vendor::Gemini
    }

    fn encode_request(
        &self,
        conversation: &[Message],
        tools: &[ToolDefinition],
        config: &GenerationConfig,
    ) -> Result<WireRequest, LlmError> {
        let request = to_gemini_request(conversation, tools, config)?;
        Ok(WireRequest {
            vendor: Vendor::Gemini,
            model: self.model.as_str().to_string(),
            body: serde_json::to_value(&request)?,
        })
    }

    fn decode_response(&self, response: &WireResponse) -> Result<ModelResponse, LlmError> {
        let parsed = parse_gemini_body(&response.body)?;
        Ok(from_gemini_response(parsed))
    }
}
