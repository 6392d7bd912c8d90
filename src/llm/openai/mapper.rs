//! Mapping between conversation types and OpenAI-specific types

use crate::llm::core::{
    config::GenerationConfig,
    error::LlmError,
    provider::{decode_arguments, encode_arguments},
    types::{
        Content, ContentBlock, FinishReason, Message, MessageRole, ModelResponse,
        ToolDefinition, ToolInvocationRequest, UsageMetadata,
    },
    value::Value,
};

use super::types::{
    ChatCompletionRequest, ChatCompletionResponse, ChatErrorResponse, ChatMessage, ChatTool,
    FunctionCall, FunctionDefinition, ToolCall,
};

/// Convert a conversation to OpenAI's request format
pub fn to_openai_request(
    model: &str,
    conversation: &[Message],
    tools: &[ToolDefinition],
    config: &GenerationConfig,
) -> ChatCompletionRequest {
    let mut messages = Vec::with_capacity(conversation.len() + 1);
    if let Some(system) = &config.system {
        messages.push(ChatMessage::text("system", system.clone()));
    }
    for message in conversation {
        messages.extend(to_openai_messages(message));
    }

    ChatCompletionRequest {
        model: model.to_string(),
        messages,
        max_completion_tokens: Some(config.max_tokens),
        temperature: config.temperature,
        top_p: config.top_p,
        stop: config.stop_sequences.clone(),
        tools: if tools.is_empty() {
            None
        } else {
            Some(tools.iter().map(to_openai_tool).collect())
        },
    }
}

/// Convert one neutral message into one or more OpenAI messages
///
/// OpenAI gives every tool result its own "tool" message, so a user turn
/// carrying results expands to one message per result, followed by any text.
fn to_openai_messages(message: &Message) -> Vec<ChatMessage> {
    let blocks = match &message.content {
        Content::Plain(text) => {
            let role = match message.role {
                MessageRole::User => "user",
                MessageRole::Assistant => "assistant",
            };
            return vec![ChatMessage::text(role, text.clone())];
        }
        Content::Blocks(blocks) => blocks,
    };

    match message.role {
        MessageRole::Assistant => vec![to_openai_assistant(blocks)],
        MessageRole::User => {
            let mut messages = Vec::new();
            let mut text = String::new();
            for block in blocks {
                match block {
                    ContentBlock::Text { text: t } => text.push_str(t),
                    ContentBlock::ToolResult(result) => messages.push(ChatMessage {
                        role: "tool".to_string(),
                        content: Some(if result.is_error {
                            format!("Error: {}", result.content)
                        } else {
                            result.content.clone()
                        }),
                        tool_calls: None,
                        tool_call_id: Some(result.request_id.clone()),
                    }),
                    ContentBlock::ToolRequest(request) => {
                        tracing::warn!(id = %request.id, "Dropping tool request found in a user turn");
                    }
                }
            }
            if !text.is_empty() {
                messages.push(ChatMessage::text("user", text));
            }
            messages
        }
    }
}

fn to_openai_assistant(blocks: &[ContentBlock]) -> ChatMessage {
    let mut text = String::new();
    let mut tool_calls = Vec::new();

    for block in blocks {
        match block {
            ContentBlock::Text { text: t } => text.push_str(t),
            ContentBlock::ToolRequest(request) => tool_calls.push(to_openai_tool_call(request)),
            ContentBlock::ToolResult(_) => {}
        }
    }

    ChatMessage {
        role: "assistant".to_string(),
        content: if text.is_empty() { None } else { Some(text) },
        tool_calls: if tool_calls.is_empty() {
            None
        } else {
            Some(tool_calls)
        },
        tool_call_id: None,
    }
}

fn to_openai_tool_call(request: &ToolInvocationRequest) -> ToolCall {
    // Undecodable arguments go back exactly as the model sent them
    let arguments = match (&request.decode_error, &request.arguments) {
        (Some(_), Value::String(raw)) => raw.clone(),
        _ => encode_arguments(&request.arguments, &request.decode_error).to_string(),
    };

    ToolCall {
        id: request.id.clone(),
        call_type: "function".to_string(),
        function: FunctionCall {
            name: request.tool_name.clone(),
            arguments: serde_json::Value::String(arguments),
        },
    }
}

/// Convert our ToolDefinition to OpenAI's function tool
fn to_openai_tool(tool: &ToolDefinition) -> ChatTool {
    ChatTool {
        tool_type: "function".to_string(),
        function: FunctionDefinition {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters: tool.input_schema.clone().into(),
        },
    }
}

/// Parse a raw OpenAI response body
pub fn parse_openai_body(body: &serde_json::Value) -> Result<ChatCompletionResponse, LlmError> {
    if body.get("error").is_some_and(|e| !e.is_null()) {
        let error: ChatErrorResponse = serde_json::from_value(body.clone())?;
        return Err(LlmError::ProviderError {
            code: error
                .error
                .code
                .or(error.error.error_type)
                .unwrap_or_else(|| "unknown".to_string()),
            message: error.error.message,
        });
    }

    Ok(serde_json::from_value(body.clone())?)
}

/// Convert OpenAI's response to a ModelResponse
///
/// # Errors
///
/// Returns `LlmError::SerializationError` when the response has no choices.
pub fn from_openai_response(response: ChatCompletionResponse) -> Result<ModelResponse, LlmError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::SerializationError("response has no choices".to_string()))?;

    let mut content = Vec::new();
    if let Some(text) = choice.message.content {
        if !text.is_empty() {
            content.push(ContentBlock::Text { text });
        }
    }
    for call in choice.message.tool_calls.unwrap_or_default() {
        let (arguments, decode_error) = decode_arguments(&call.function.arguments);
        if let Some(error) = &decode_error {
            tracing::warn!(tool = %call.function.name, id = %call.id, %error, "Undecodable OpenAI tool arguments");
        }
        content.push(ContentBlock::ToolRequest(ToolInvocationRequest {
            id: call.id,
            tool_name: call.function.name,
            arguments,
            decode_error,
        }));
    }

    let usage = response
        .usage
        .map(|u| UsageMetadata::new(u.prompt_tokens, u.completion_tokens))
        .unwrap_or_default();

    Ok(ModelResponse {
        id: response.id,
        content,
        finish_reason: choice
            .finish_reason
            .as_deref()
            .map_or(FinishReason::Stop, map_finish_reason),
        raw_finish_reason: choice.finish_reason,
        usage,
        model: response.model,
    })
}

/// Map OpenAI's finish_reason to our abstraction
pub fn map_finish_reason(reason: &str) -> FinishReason {
    match reason {
        "stop" => FinishReason::Stop,
        "length" => FinishReason::MaxTokens,
        "tool_calls" | "function_call" => FinishReason::ToolUse,
        "content_filter" => FinishReason::Error,
        other => {
            tracing::warn!(finish_reason = other, "Unexpected OpenAI finish_reason");
            FinishReason::Error
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::core::types::ToolInvocationResult;
    use serde_json::json;

    fn weather_tool() -> ToolDefinition {
        ToolDefinition {
            name: "get_weather".to_string(),
            description: "Get weather".to_string(),
            input_schema: Value::from(json!({
                "type": "object",
                "properties": {"city": {"type": "string"}}
            })),
        }
    }

    #[test]
    fn test_request_puts_system_first_and_wraps_tools() {
        let config = GenerationConfig::new(256).with_system("Be brief");
        let request =
            to_openai_request("gpt-4o", &[Message::user("Hi")], &[weather_tool()], &config);

        assert_eq!(request.model, "gpt-4o");
        assert_eq!(request.max_completion_tokens, Some(256));
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, "system");
        assert_eq!(request.messages[1].role, "user");

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["tools"][0]["type"], "function");
        assert_eq!(json["tools"][0]["function"]["name"], "get_weather");
        assert_eq!(
            json["tools"][0]["function"]["parameters"]["properties"]["city"]["type"],
            "string"
        );
    }

    #[test]
    fn test_assistant_tool_calls_serialize_arguments_as_string() {
        let message = Message::with_blocks(
            MessageRole::Assistant,
            vec![ContentBlock::ToolRequest(ToolInvocationRequest::new(
                "call_1",
                "get_weather",
                Value::from(json!({"city": "Paris"})),
            ))],
        );

        let messages = to_openai_messages(&message);
        assert_eq!(messages.len(), 1);
        assert!(messages[0].content.is_none());

        let calls = messages[0].tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].id, "call_1");
        assert_eq!(
            calls[0].function.arguments,
            json!("{\"city\":\"Paris\"}")
        );
    }

    #[test]
    fn test_undecodable_arguments_echo_raw_text() {
        let request = ToolInvocationRequest {
            id: "call_1".to_string(),
            tool_name: "get_weather".to_string(),
            arguments: Value::from("{\"city\": "),
            decode_error: Some("truncated".to_string()),
        };

        let call = to_openai_tool_call(&request);
        assert_eq!(call.function.arguments, json!("{\"city\": "));
    }

    #[test]
    fn test_tool_results_become_tool_role_messages() {
        let message = Message::with_blocks(
            MessageRole::User,
            vec![
                ContentBlock::ToolResult(ToolInvocationResult::success("call_1", "18C")),
                ContentBlock::ToolResult(ToolInvocationResult::error("call_2", "timed out")),
                ContentBlock::Text {
                    text: "Thanks".to_string(),
                },
            ],
        );

        let messages = to_openai_messages(&message);
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, "tool");
        assert_eq!(messages[0].tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(messages[0].content.as_deref(), Some("18C"));
        assert_eq!(messages[1].tool_call_id.as_deref(), Some("call_2"));
        assert_eq!(messages[1].content.as_deref(), Some("Error: timed out"));
        assert_eq!(messages[2].role, "user");
    }

    #[test]
    fn test_from_openai_response_parses_string_arguments() {
        let body = json!({
            "id": "chatcmpl-1",
            "model": "gpt-4o",
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [
                        {"id": "call_1", "type": "function", "function": {"name": "get_weather", "arguments": "{\"city\":\"Paris\"}"}},
                        {"id": "call_2", "type": "function", "function": {"name": "get_weather", "arguments": "{\"city\":"}}
                    ]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 20, "completion_tokens": 8}
        });

        let response = from_openai_response(parse_openai_body(&body).unwrap()).unwrap();
        assert_eq!(response.finish_reason, FinishReason::ToolUse);
        assert_eq!(response.usage.total_tokens, 28);

        let requests = response.tool_requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].arguments.get("city"), Some(&Value::from("Paris")));
        assert!(requests[0].decode_error.is_none());
        // The broken call is kept, marked, and does not fail the decode
        assert_eq!(requests[1].id, "call_2");
        assert!(requests[1].decode_error.is_some());
    }

    #[test]
    fn test_from_openai_response_accepts_object_arguments() {
        let body = json!({
            "id": "chatcmpl-2",
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": "",
                    "tool_calls": [
                        {"id": "call_1", "function": {"name": "get_weather", "arguments": {"city": "Rome"}}}
                    ]
                },
                "finish_reason": "tool_calls"
            }]
        });

        let response = from_openai_response(parse_openai_body(&body).unwrap()).unwrap();
        assert!(response.content.len() == 1);
        assert_eq!(
            response.tool_requests()[0].arguments.get("city"),
            Some(&Value::from("Rome"))
        );
        assert_eq!(response.usage, UsageMetadata::default());
    }

    #[test]
    fn test_from_openai_response_without_choices() {
        let body = json!({"id": "chatcmpl-3", "choices": []});
        let result = from_openai_response(parse_openai_body(&body).unwrap());
        assert!(matches!(result, Err(LlmError::SerializationError(_))));
    }

    #[test]
    fn test_parse_openai_error_body() {
        let body = json!({
            "error": {"message": "Incorrect API key", "type": "invalid_request_error", "code": "invalid_api_key"}
        });

        match parse_openai_body(&body) {
            Err(LlmError::ProviderError { code, message }) => {
                assert_eq!(code, "invalid_api_key");
                assert_eq!(message, "Incorrect API key");
            }
            other => panic!("Expected provider error, got {:?}", other),
        }
    }

    #[test]
    fn test_map_finish_reason() {
        assert_eq!(map_finish_reason("stop"), FinishReason::Stop);
        assert_eq!(map_finish_reason("length"), FinishReason::MaxTokens);
        assert_eq!(map_finish_reason("tool_calls"), FinishReason::ToolUse);
        assert_eq!(map_finish_reason("function_call"), FinishReason::ToolUse);
        assert_eq!(map_finish_reason("content_filter"), FinishReason::Error);
        assert_eq!(map_finish_reason("weird"), FinishReason::Error);
    }
}
