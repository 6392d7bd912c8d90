//! Mapping between conversation types and Claude-specific types

use crate::llm::core::{
    config::GenerationConfig,
    error::LlmError,
    provider::{decode_arguments, encode_arguments},
    types::{
        Content, ContentBlock, FinishReason, Message, MessageRole, ModelResponse,
        ToolDefinition, ToolInvocationRequest, UsageMetadata,
    },
};

use super::types::{
    ClaudeContent, ClaudeContentBlock, ClaudeErrorResponse, ClaudeMessage, ClaudeTool,
    MessagesRequest, MessagesResponse,
};

/// API version Vertex AI expects in the body
pub const VERTEX_ANTHROPIC_VERSION: &str = "vertex-2023-10-16";

/// Convert a conversation to Claude's request format
pub fn to_claude_request(
    conversation: &[Message],
    tools: &[ToolDefinition],
    config: &GenerationConfig,
) -> MessagesRequest {
    MessagesRequest {
        anthropic_version: VERTEX_ANTHROPIC_VERSION.to_string(),
        max_tokens: config.max_tokens,
        messages: conversation.iter().map(to_claude_message).collect(),
        system: config.system.clone(),
        tools: if tools.is_empty() {
            None
        } else {
            Some(tools.iter().map(to_claude_tool).collect())
        },
        temperature: config.temperature,
        top_p: config.top_p,
        top_k: config.top_k,
        stop_sequences: config.stop_sequences.clone(),
    }
}

/// Convert our Message to Claude's ClaudeMessage
fn to_claude_message(message: &Message) -> ClaudeMessage {
    // Tool results travel inside user turns, so both roles map directly
    let role = match message.role {
        MessageRole::User => "user".to_string(),
        MessageRole::Assistant => "assistant".to_string(),
    };

    let content = match &message.content {
        Content::Plain(text) => ClaudeContent::Text(text.clone()),
        Content::Blocks(blocks) => match blocks.as_slice() {
            [ContentBlock::Text { text }] => ClaudeContent::Text(text.clone()),
            _ => ClaudeContent::Blocks(blocks.iter().map(to_claude_content_block).collect()),
        },
    };

    ClaudeMessage { role, content }
}

/// Convert our ContentBlock to Claude's ClaudeContentBlock
fn to_claude_content_block(block: &ContentBlock) -> ClaudeContentBlock {
    match block {
        ContentBlock::Text { text } => ClaudeContentBlock::Text { text: text.clone() },
        ContentBlock::ToolRequest(request) => ClaudeContentBlock::ToolUse {
            id: request.id.clone(),
            name: request.tool_name.clone(),
            input: encode_arguments(&request.arguments, &request.decode_error),
        },
        ContentBlock::ToolResult(result) => ClaudeContentBlock::ToolResult {
            tool_use_id: result.request_id.clone(),
            content: result.content.clone(),
            is_error: if result.is_error { Some(true) } else { None },
        },
    }
}

/// Convert our ToolDefinition to Claude's ClaudeTool
fn to_claude_tool(tool: &ToolDefinition) -> ClaudeTool {
    ClaudeTool {
        name: tool.name.clone(),
        description: tool.description.clone(),
        input_schema: tool.input_schema.clone().into(),
    }
}

/// Parse a raw Claude response body
pub fn parse_claude_body(body: &serde_json::Value) -> Result<MessagesResponse, LlmError> {
    if body.get("type").and_then(|t| t.as_str()) == Some("error") {
        let error: ClaudeErrorResponse = serde_json::from_value(body.clone())?;
        return Err(LlmError::ProviderError {
            code: error.error.error_type,
            message: error.error.message,
        });
    }

    Ok(serde_json::from_value(body.clone())?)
}

/// Convert Claude's response to a ModelResponse
pub fn from_claude_response(response: MessagesResponse) -> ModelResponse {
    let content = response
        .content
        .into_iter()
        .filter_map(|block| match block {
            ClaudeContentBlock::Text { text } => Some(ContentBlock::Text { text }),
            ClaudeContentBlock::ToolUse { id, name, input } => {
                let (arguments, decode_error) = decode_arguments(&input);
                if let Some(error) = &decode_error {
                    tracing::warn!(tool = %name, id = %id, %error, "Undecodable Claude tool input");
                }
                Some(ContentBlock::ToolRequest(ToolInvocationRequest {
                    id,
                    tool_name: name,
                    arguments,
                    decode_error,
                }))
            }
            // Results never come back from the model
            ClaudeContentBlock::ToolResult { .. } | ClaudeContentBlock::Unsupported => None,
        })
        .collect();

    let finish_reason = response
        .stop_reason
        .as_deref()
        .map_or(FinishReason::Stop, map_stop_reason);

    ModelResponse {
        id: response.id,
        content,
        finish_reason,
        raw_finish_reason: response.stop_reason,
        usage: UsageMetadata::new(response.usage.input_tokens, response.usage.output_tokens),
        model: response.model,
    }
}

/// Map Claude's stop_reason to our abstraction
pub fn map_stop_reason(reason: &str) -> FinishReason {
    match reason {
        "end_turn" | "stop_sequence" | "pause_turn" => FinishReason::Stop,
        "max_tokens" => FinishReason::MaxTokens,
        "tool_use" => FinishReason::ToolUse,
        "refusal" => FinishReason::Error,
        other => {
            tracing::warn!(stop_reason = other, "Unexpected Claude stop_reason");
            FinishReason::Error
        }
    }
}
