//! Mapping between conversation types and Gemini types

use std::collections::HashMap;

use uuid::Uuid;

use crate::llm::core::{
    config::GenerationConfig,
    error::LlmError,
    provider::{decode_arguments, encode_arguments},
    types::{
        ContentBlock, FinishReason, Message, MessageRole, ModelResponse, ToolDefinition,
        ToolInvocationRequest, ToolInvocationResult, UsageMetadata,
    },
};

use super::types::{
    Content, FunctionCall, FunctionDeclaration, FunctionResponse, GeminiErrorResponse,
    GeminiGenerationConfig, GenerateContentRequest, GenerateContentResponse, Part,
    SystemInstruction, Tool,
};

/// Convert a conversation to Gemini's request format
///
/// # Errors
///
/// Gemini answers function calls by name, not id. A tool result whose id
/// matches no earlier tool request cannot be expressed and is rejected with
/// `LlmError::InvalidRequest`.
pub fn to_gemini_request(
    conversation: &[Message],
    tools: &[ToolDefinition],
    config: &GenerationConfig,
) -> Result<GenerateContentRequest, LlmError> {
    let mut names_by_id: HashMap<&str, &str> = HashMap::new();
    let mut contents = Vec::with_capacity(conversation.len());

    for message in conversation {
        for request in message.tool_requests() {
            names_by_id.insert(&request.id, &request.tool_name);
        }
        contents.push(to_gemini_content(message, &names_by_id)?);
    }

    Ok(GenerateContentRequest {
        contents,
        system_instruction: config.system.as_ref().map(|s| SystemInstruction {
            parts: vec![Part::text(s.clone())],
        }),
        tools: if tools.is_empty() {
            None
        } else {
            Some(vec![Tool {
                function_declarations: tools.iter().map(to_gemini_function_declaration).collect(),
            }])
        },
        generation_config: Some(to_gemini_generation_config(config)),
    })
}

/// Convert a message to Gemini's content format
fn to_gemini_content(
    message: &Message,
    names_by_id: &HashMap<&str, &str>,
) -> Result<Content, LlmError> {
    let role = match message.role {
        MessageRole::User => "user".to_string(),
        MessageRole::Assistant => "model".to_string(),
    };

    let parts = message
        .blocks()
        .iter()
        .map(|block| to_gemini_part(block, names_by_id))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Content { role, parts })
}

/// Convert a content block to a Gemini part
fn to_gemini_part(
    block: &ContentBlock,
    names_by_id: &HashMap<&str, &str>,
) -> Result<Part, LlmError> {
    match block {
        ContentBlock::Text { text } => Ok(Part::text(text.clone())),
        ContentBlock::ToolRequest(request) => Ok(Part::FunctionCall {
            function_call: FunctionCall {
                id: None,
                name: request.tool_name.clone(),
                args: encode_arguments(&request.arguments, &request.decode_error),
            },
        }),
        ContentBlock::ToolResult(result) => {
            let name = names_by_id.get(result.request_id.as_str()).ok_or_else(|| {
                LlmError::InvalidRequest(format!(
                    "tool result '{}' answers no earlier tool request",
                    result.request_id
                ))
            })?;

            Ok(Part::FunctionResponse {
                function_response: FunctionResponse {
                    name: name.to_string(),
                    response: to_function_response(result),
                },
            })
        }
    }
}

/// Gemini wants an object: parsed JSON output, or the text wrapped
fn to_function_response(result: &ToolInvocationResult) -> serde_json::Value {
    if result.is_error {
        return serde_json::json!({ "error": result.content });
    }

    match serde_json::from_str::<serde_json::Value>(&result.content) {
        Ok(value @ serde_json::Value::Object(_)) => value,
        _ => serde_json::json!({ "result": result.content }),
    }
}

/// Convert a tool definition to Gemini's function declaration
fn to_gemini_function_declaration(tool: &ToolDefinition) -> FunctionDeclaration {
    FunctionDeclaration {
        name: tool.name.clone(),
        description: tool.description.clone(),
        parameters: tool.input_schema.clone().into(),
    }
}

/// Convert generation config to Gemini's format
fn to_gemini_generation_config(config: &GenerationConfig) -> GeminiGenerationConfig {
    GeminiGenerationConfig {
        max_output_tokens: Some(config.max_tokens),
        temperature: config.temperature,
        top_p: config.top_p,
        top_k: config.top_k,
        stop_sequences: config.stop_sequences.clone(),
    }
}

/// Parse a raw Gemini response body
pub fn parse_gemini_body(body: &serde_json::Value) -> Result<GenerateContentResponse, LlmError> {
    if body.get("error").is_some_and(|e| !e.is_null()) {
        let error: GeminiErrorResponse = serde_json::from_value(body.clone())?;
        return Err(LlmError::ProviderError {
            code: error
                .error
                .status
                .unwrap_or_else(|| error.error.code.to_string()),
            message: error.error.message,
        });
    }

    Ok(serde_json::from_value(body.clone())?)
}

/// Convert a Gemini response to a ModelResponse
///
/// Gemini may omit call ids. Missing ids are derived from the response id,
/// position, name and arguments, so decoding the same body twice yields the
/// same ids.
pub fn from_gemini_response(response: GenerateContentResponse) -> ModelResponse {
    let response_id = response.response_id.unwrap_or_default();
    let usage = response
        .usage_metadata
        .map(|u| UsageMetadata::new(u.prompt_token_count, u.candidates_token_count))
        .unwrap_or_default();

    let Some(candidate) = response.candidates.into_iter().next() else {
        let block_reason = response.prompt_feedback.and_then(|f| f.block_reason);
        tracing::warn!(block_reason = ?block_reason, "Gemini returned no candidates");
        return ModelResponse {
            id: response_id,
            content: Vec::new(),
            finish_reason: FinishReason::Error,
            raw_finish_reason: block_reason,
            usage,
            model: response.model_version,
        };
    };

    let mut content = Vec::new();
    for (index, part) in candidate.content.parts.into_iter().enumerate() {
        match part {
            Part::Text { thought: Some(true), .. } => {}
            Part::Text { text, .. } => content.push(ContentBlock::Text { text }),
            Part::FunctionCall { function_call } => {
                let id = function_call
                    .id
                    .clone()
                    .unwrap_or_else(|| derive_call_id(&response_id, index, &function_call));
                let (arguments, decode_error) = decode_arguments(&function_call.args);
                content.push(ContentBlock::ToolRequest(ToolInvocationRequest {
                    id,
                    tool_name: function_call.name,
                    arguments,
                    decode_error,
                }));
            }
            // Function responses are not expected in model output
            Part::FunctionResponse { .. } | Part::Other(_) => {}
        }
    }

    let has_calls = content
        .iter()
        .any(|block| matches!(block, ContentBlock::ToolRequest(_)));
    // Gemini reports STOP even when it calls functions
    let finish_reason = if has_calls {
        FinishReason::ToolUse
    } else {
        candidate
            .finish_reason
            .as_deref()
            .map_or(FinishReason::Stop, map_finish_reason)
    };

    ModelResponse {
        id: response_id,
        content,
        finish_reason,
        raw_finish_reason: candidate.finish_reason,
        usage,
        model: response.model_version,
    }
}

fn derive_call_id(response_id: &str, index: usize, call: &FunctionCall) -> String {
    let seed = format!("{}:{}:{}:{}", response_id, index, call.name, call.args);
    format!(
        "call_{}",
        Uuid::new_v5(&Uuid::NAMESPACE_OID, seed.as_bytes()).simple()
    )
}

/// Map Gemini's finish reason to our abstraction
pub fn map_finish_reason(reason: &str) -> FinishReason {
    match reason {
        "STOP" => FinishReason::Stop,
        "MAX_TOKENS" => FinishReason::MaxTokens,
        "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT" | "SPII"
        | "MALFORMED_FUNCTION_CALL" | "LANGUAGE" => FinishReason::Error,
        other => {
            tracing::warn!(finish_reason = other, "Unexpected Gemini finish reason");
            FinishReason::Error
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::core::value::Value;
    use serde_json::json;

    fn weather_request(id: &str, city: &str) -> ContentBlock {
        ContentBlock::ToolRequest(ToolInvocationRequest::new(
            id,
            "get_weather",
            Value::from(json!({ "city": city })),
        ))
    }

    #[test]
    fn test_to_gemini_content_roles() {
        let request = to_gemini_request(
            &[Message::user("Hello"), Message::assistant("Hi there")],
            &[],
            &GenerationConfig::default(),
        )
        .unwrap();

        assert_eq!(request.contents[0].role, "user");
        assert_eq!(request.contents[1].role, "model");
        assert!(request.tools.is_none());
    }

    #[test]
    fn test_function_response_uses_requested_name() {
        let conversation = vec![
            Message::user("Weather?"),
            Message::with_blocks(MessageRole::Assistant, vec![weather_request("c1", "Paris")]),
            Message::tool_results(vec![
                ToolInvocationResult::success("c1", "{\"temp\": 18}"),
            ]),
        ];

        let request =
            to_gemini_request(&conversation, &[], &GenerationConfig::default()).unwrap();
        let json = serde_json::to_value(&request.contents[2]).unwrap();
        assert_eq!(
            json,
            json!({
                "role": "user",
                "parts": [{"functionResponse": {"name": "get_weather", "response": {"temp": 18}}}]
            })
        );
    }

    #[test]
    fn test_function_response_wraps_text_and_errors() {
        assert_eq!(
            to_function_response(&ToolInvocationResult::success("c1", "sunny")),
            json!({"result": "sunny"})
        );
        assert_eq!(
            to_function_response(&ToolInvocationResult::error("c1", "boom")),
            json!({"error": "boom"})
        );
    }

    #[test]
    fn test_orphan_tool_result_is_rejected() {
        let conversation = vec![Message::tool_results(vec![ToolInvocationResult::success(
            "nobody", "x",
        )])];
        let result = to_gemini_request(&conversation, &[], &GenerationConfig::default());
        assert!(matches!(result, Err(LlmError::InvalidRequest(_))));
    }

    #[test]
    fn test_to_gemini_request_with_tools() {
        let tools = vec![ToolDefinition {
            name: "get_weather".to_string(),
            description: "Get weather".to_string(),
            input_schema: Value::from(json!({"type": "object"})),
        }];
        let config = GenerationConfig::new(2048)
            .with_temperature(0.7)
            .with_top_k(40)
            .with_system("You are helpful");

        let request = to_gemini_request(&[Message::user("Weather?")], &tools, &config).unwrap();
        assert!(request.system_instruction.is_some());
        let tools = request.tools.unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].function_declarations[0].name, "get_weather");

        let generation = request.generation_config.unwrap();
        assert_eq!(generation.max_output_tokens, Some(2048));
        assert_eq!(generation.top_k, Some(40));
    }

    #[test]
    fn test_from_gemini_response_function_calls() {
        let body = json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        {"functionCall": {"name": "get_weather", "args": {"city": "Paris"}}},
                        {"functionCall": {"name": "get_weather", "args": {"city": "Rome"}}}
                    ]
                },
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 5, "totalTokenCount": 15},
            "responseId": "resp-1"
        });

        let response = from_gemini_response(parse_gemini_body(&body).unwrap());
        assert_eq!(response.finish_reason, FinishReason::ToolUse);
        assert_eq!(response.raw_finish_reason.as_deref(), Some("STOP"));
        assert_eq!(response.usage.total_tokens, 15);

        let requests = response.tool_requests();
        assert_eq!(requests.len(), 2);
        assert_ne!(requests[0].id, requests[1].id);
        assert!(requests[0].id.starts_with("call_"));

        // Same body, same ids
        let again = from_gemini_response(parse_gemini_body(&body).unwrap());
        assert_eq!(again, response);
    }

    #[test]
    fn test_from_gemini_response_keeps_vendor_call_id() {
        let body = json!({
            "candidates": [{
                "content": {"role": "model", "parts": [
                    {"functionCall": {"id": "fc-7", "name": "get_weather", "args": {}}}
                ]}
            }]
        });

        let response = from_gemini_response(parse_gemini_body(&body).unwrap());
        assert_eq!(response.tool_requests()[0].id, "fc-7");
    }

    #[test]
    fn test_from_gemini_response_skips_thoughts() {
        let body = json!({
            "candidates": [{
                "content": {"role": "model", "parts": [
                    {"text": "pondering", "thought": true},
                    {"text": "Done"}
                ]},
                "finishReason": "STOP"
            }]
        });

        let response = from_gemini_response(parse_gemini_body(&body).unwrap());
        assert_eq!(response.text(), "Done");
        assert_eq!(response.finish_reason, FinishReason::Stop);
    }

    #[test]
    fn test_blocked_prompt_is_error() {
        let body = json!({"promptFeedback": {"blockReason": "SAFETY"}, "responseId": "r"});
        let response = from_gemini_response(parse_gemini_body(&body).unwrap());
        assert_eq!(response.finish_reason, FinishReason::Error);
        assert_eq!(response.raw_finish_reason.as_deref(), Some("SAFETY"));
    }

    #[test]
    fn test_parse_gemini_error_body() {
        let body = json!({"error": {"code": 403, "message": "Permission denied", "status": "PERMISSION_DENIED"}});
        match parse_gemini_body(&body) {
            Err(LlmError::ProviderError { code, .. }) => assert_eq!(code, "PERMISSION_DENIED"),
            other => panic!("Expected provider error, got {:?}", other),
        }
    }

    #[test]
    fn test_map_finish_reason() {
        assert_eq!(map_finish_reason("STOP"), FinishReason::Stop);
        assert_eq!(map_finish_reason("MAX_TOKENS"), FinishReason::MaxTokens);
        assert_eq!(map_finish_reason("SAFETY"), FinishReason::Error);
        assert_eq!(map_finish_reason("RECITATION"), FinishReason::Error);
        assert_eq!(map_finish_reason("UNKNOWN"), FinishReason::Error);
    }
}
