//! Protocol adapter trait for LLM vendors

use super::{
    config::GenerationConfig,
    error::LlmError,
    transport::{WireRequest, WireResponse},
    types::{Message, Model, ModelResponse, ToolDefinition, Vendor},
    value::Value,
};
use crate::llm::claude::ClaudeAdapter;
use crate::llm::gemini::GeminiAdapter;
use crate::llm::openai::OpenAiAdapter;

/// Two-way translation between the conversation model and one vendor's schema
///
/// Adapters do no I/O. A [`VendorTransport`](super::transport::VendorTransport)
/// carries the encoded request.
pub trait ProtocolAdapter: Send + Sync {
    /// The wire protocol this adapter speaks
    fn vendor(&self) -> Vendor;

    /// Build the vendor request for a conversation and tool catalog
    ///
    /// # Errors
    ///
    /// Returns `LlmError::InvalidRequest` when the conversation cannot be
    /// expressed in the vendor's schema.
    fn encode_request(
        &self,
        conversation: &[Message],
        tools: &[ToolDefinition],
        config: &GenerationConfig,
    ) -> Result<WireRequest, LlmError>;

    /// Decode a vendor response
    ///
    /// Unparseable tool arguments do not fail the decode; the affected
    /// request carries a `decode_error` instead.
    ///
    /// # Errors
    ///
    /// Returns an error when the body is not a valid response at all, or when
    /// the vendor reported an error in it.
    fn decode_response(&self, response: &WireResponse) -> Result<ModelResponse, LlmError>;
}

/// Create the protocol adapter for a model
///
/// # Example
///
/// ```rust
/// use toolrelay::llm::{create_adapter, ClaudeModel, Model, Vendor};
///
/// let adapter = create_adapter(&Model::Claude(ClaudeModel::Sonnet45));
/// assert_eq!(adapter.vendor(), Vendor::Claude);
/// ```
pub fn create_adapter(model: &Model) -> Box<dyn ProtocolAdapter> {
    match model {
        Model::Claude(claude_model) => Box::new(ClaudeAdapter::new(claude_model.clone())),
        Model::OpenAi(openai_model) => Box::new(OpenAiAdapter::new(openai_model.clone())),
        Model::Gemini(gemini_model) => Box::new(GeminiAdapter::new(gemini_model.clone())),
    }
}

/// Decode tool arguments sent either as structured JSON or as a JSON string
///
/// Returns the decoded value and, on failure, an error marker. On failure the
/// raw text is kept as `Value::String` so it can be echoed back verbatim.
pub fn decode_arguments(raw: &serde_json::Value) -> (Value, Option<String>) {
    match raw {
        serde_json::Value::Null => (Value::empty_map(), None),
        serde_json::Value::Object(_) => (Value::from(raw.clone()), None),
        serde_json::Value::String(text) if text.trim().is_empty() => (Value::empty_map(), None),
        serde_json::Value::String(text) => match serde_json::from_str::<serde_json::Value>(text) {
            Ok(parsed @ serde_json::Value::Object(_)) => (Value::from(parsed), None),
            Ok(other) => (
                Value::String(text.clone()),
                Some(format!("expected a JSON object, got {}", json_kind(&other))),
            ),
            Err(e) => (
                Value::String(text.clone()),
                Some(format!("arguments are not valid JSON: {}", e)),
            ),
        },
        other => (
            Value::from(other.clone()),
            Some(format!("expected a JSON object, got {}", json_kind(other))),
        ),
    }
}

/// Arguments to put back on the wire for a request we previously decoded
///
/// Requests that failed to decode are echoed as an empty object, because
/// vendors reject non-object arguments in history.
pub fn encode_arguments(arguments: &Value, decode_error: &Option<String>) -> serde_json::Value {
    if decode_error.is_some() || !arguments.is_map() {
        return serde_json::Value::Object(serde_json::Map::new());
    }
    arguments.clone().into()
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
