//! Gemini-specific request and response types
//!
//! These types map directly to the Vertex AI Gemini API schema.

use serde::{Deserialize, Serialize};

/// Request to generate content from Gemini
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    /// Array of content items representing the conversation
    pub contents: Vec<Content>,
    /// Optional system instruction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<SystemInstruction>,
    /// Available tools for the model to use
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
    /// Generation configuration parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GeminiGenerationConfig>,
}

/// System instruction for the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInstruction {
    /// Parts of the system instruction
    pub parts: Vec<Part>,
}

/// A single content item in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    /// Role: "user" or "model"
    #[serde(default)]
    pub role: String,
    /// Parts of the content (may be empty when hitting limits like MAX_TOKENS)
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// A part of content (text, function call, or function response)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    /// Text content
    Text {
        text: String,
        /// Set on thought summaries
        #[serde(default, skip_serializing_if = "Option::is_none")]
        thought: Option<bool>,
    },
    /// Function call from the model
    FunctionCall {
        #[serde(rename = "functionCall")]
        function_call: FunctionCall,
    },
    /// Function response from the application
    FunctionResponse {
        #[serde(rename = "functionResponse")]
        function_response: FunctionResponse,
    },
    /// Part kinds this client does not use (inline data, code execution, ...)
    Other(serde_json::Value),
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text {
            text: text.into(),
            thought: None,
        }
    }
}

/// A function call made by the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Call id, only sent by newer API versions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Name of the function to call
    pub name: String,
    /// Arguments as a JSON object
    #[serde(default)]
    pub args: serde_json::Value,
}

/// A function response from the application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionResponse {
    /// Name of the function that was called
    pub name: String,
    /// Response data as a JSON object
    pub response: serde_json::Value,
}

/// Tool definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    /// Function declarations available to the model
    pub function_declarations: Vec<FunctionDeclaration>,
}

/// A function declaration describing a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDeclaration {
    /// Function name
    pub name: String,
    /// Function description
    pub description: String,
    /// Parameters schema (JSON Schema)
    pub parameters: serde_json::Value,
}

/// Generation configuration for Gemini
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiGenerationConfig {
    /// Maximum number of output tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    /// Temperature for sampling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Top-p for nucleus sampling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Top-k for top-k sampling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    /// Stop sequences
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
}

/// Response from Gemini's generateContent endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    /// Candidates (usually just one, none when the prompt was blocked)
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    /// Usage metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_metadata: Option<UsageMetadata>,
    /// Response id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_id: Option<String>,
    /// Model version that served the request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    /// Set when the prompt itself was blocked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_feedback: Option<PromptFeedback>,
}

/// A candidate response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// The generated content
    #[serde(default = "empty_content")]
    pub content: Content,
    /// Why the candidate finished
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Feedback about the prompt
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_reason: Option<String>,
}

/// Usage metadata from Gemini
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    /// Number of tokens in the prompt
    #[serde(default)]
    pub prompt_token_count: u32,
    /// Number of tokens in the response
    #[serde(default)]
    pub candidates_token_count: u32,
    /// Total token count
    #[serde(default)]
    pub total_token_count: u32,
}

/// Error body: `{"error": {"code": 400, "message": ..., "status": ...}}`
#[derive(Debug, Clone, Deserialize)]
pub struct GeminiErrorResponse {
    pub error: GeminiErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiErrorDetail {
    #[serde(default)]
    pub code: u16,
    pub message: String,
    pub status: Option<String>,
}

fn empty_content() -> Content {
    Content {
        role: "model".to_string(),
        parts: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_part_serialization() {
        let json = serde_json::to_string(&Part::text("Hello")).unwrap();
        assert_eq!(json, r#"{"text":"Hello"}"#);
    }

    #[test]
    fn test_function_call_serialization() {
        let part = Part::FunctionCall {
            function_call: FunctionCall {
                id: None,
                name: "get_weather".to_string(),
                args: serde_json::json!({"location": "SF"}),
            },
        };
        let json = serde_json::to_string(&part).unwrap();
        assert!(json.contains("\"functionCall\""));
        assert!(json.contains("\"get_weather\""));
        assert!(!json.contains("\"id\""));
    }

    #[test]
    fn test_unknown_part_is_kept() {
        let json = r#"{"inlineData": {"mimeType": "image/png", "data": "AAAA"}}"#;
        let part: Part = serde_json::from_str(json).unwrap();
        assert!(matches!(part, Part::Other(_)));
    }

    #[test]
    fn test_generation_config_serialization() {
        let config = GeminiGenerationConfig {
            max_output_tokens: Some(1024),
            temperature: Some(0.7),
            top_p: Some(0.9),
            top_k: Some(40),
            stop_sequences: None,
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"maxOutputTokens\":1024"));
        assert!(json.contains("\"temperature\":0.7"));
        assert!(!json.contains("\"stopSequences\""));
    }

    #[test]
    fn test_generate_content_response_deserialization() {
        let json = r#"{
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{"text": "Hello!"}]
                },
                "finishReason": "STOP"
            }],
            "usageMetadata": {
                "promptTokenCount": 10,
                "candidatesTokenCount": 5,
                "totalTokenCount": 15
            },
            "responseId": "resp-1"
        }"#;
        let response: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.candidates.len(), 1);
        assert_eq!(response.candidates[0].content.role, "model");
        assert_eq!(response.usage_metadata.as_ref().unwrap().total_token_count, 15);
        assert_eq!(response.response_id.as_deref(), Some("resp-1"));
    }

    #[test]
    fn test_blocked_prompt_deserialization() {
        let json = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        let response: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert!(response.candidates.is_empty());
        assert_eq!(
            response.prompt_feedback.unwrap().block_reason.as_deref(),
            Some("SAFETY")
        );
    }

    #[test]
    fn test_tool_declaration_serialization() {
        let tool = Tool {
            function_declarations: vec![FunctionDeclaration {
                name: "get_weather".to_string(),
                description: "Get the current weather".to_string(),
                parameters: serde_json::json!({"type": "object"}),
            }],
        };
        let json = serde_json::to_string(&tool).unwrap();
        assert!(json.contains("\"functionDeclarations\""));
        assert!(json.contains("\"get_weather\""));
    }
}
