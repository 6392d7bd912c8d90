//! Shared fixtures for orchestration tests
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use toolrelay::llm::{
    create_tool_definition, FunctionRegistry, LlmError, ToolDefinition, VendorTransport,
    WireRequest, WireResponse,
};

/// Transport that replays scripted vendor bodies and records what was sent
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<serde_json::Value, LlmError>>>,
    /// Replayed forever once the script runs out
    repeat: Option<serde_json::Value>,
    requests: Mutex<Vec<WireRequest>>,
}

impl ScriptedTransport {
    pub fn new(bodies: Vec<serde_json::Value>) -> Self {
        Self::with_results(bodies.into_iter().map(Ok).collect())
    }

    pub fn with_results(script: Vec<Result<serde_json::Value, LlmError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            repeat: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always answer with the same body
    pub fn repeating(body: serde_json::Value) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            repeat: Some(body),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<WireRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl VendorTransport for ScriptedTransport {
    async fn send(&self, request: WireRequest) -> Result<WireResponse, LlmError> {
        self.requests.lock().unwrap().push(request);

        let next = self.script.lock().unwrap().pop_front();
        match (next, &self.repeat) {
            (Some(result), _) => result.map(WireResponse::new),
            (None, Some(body)) => Ok(WireResponse::new(body.clone())),
            (None, None) => Err(LlmError::HttpError {
                status: 500,
                body: "script exhausted".to_string(),
            }),
        }
    }
}

/// Claude reply with plain text
pub fn claude_text(text: &str) -> serde_json::Value {
    json!({
        "id": "msg_final",
        "type": "message",
        "role": "assistant",
        "content": [{"type": "text", "text": text}],
        "model": "claude-sonnet-4-5",
        "stop_reason": "end_turn",
        "stop_sequence": null,
        "usage": {"input_tokens": 40, "output_tokens": 12}
    })
}

/// Claude reply requesting tools: `(id, name, input)`
pub fn claude_tool_calls(calls: &[(&str, &str, serde_json::Value)]) -> serde_json::Value {
    let content: Vec<serde_json::Value> = calls
        .iter()
        .map(|(id, name, input)| {
            json!({"type": "tool_use", "id": id, "name": name, "input": input})
        })
        .collect();

    json!({
        "id": "msg_tools",
        "type": "message",
        "role": "assistant",
        "content": content,
        "model": "claude-sonnet-4-5",
        "stop_reason": "tool_use",
        "stop_sequence": null,
        "usage": {"input_tokens": 25, "output_tokens": 8}
    })
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct WeatherArgs {
    /// City name
    pub city: String,
}

#[derive(Debug, Serialize)]
pub struct WeatherReport {
    pub city: String,
    pub temperature_c: i32,
    pub conditions: String,
}

pub fn weather_definition() -> ToolDefinition {
    create_tool_definition::<WeatherArgs>("get_weather", "Current weather for a city")
}

/// Registry with a `get_weather` tool that knows Paris and Rome
pub fn weather_registry() -> FunctionRegistry {
    let mut registry = FunctionRegistry::new();
    registry.register_sync_tool(weather_definition(), |args: WeatherArgs| {
        let (temperature_c, conditions) = match args.city.as_str() {
            "Paris" => (18, "cloudy"),
            "Rome" => (27, "sunny"),
            other => return Err(format!("no station for {}", other)),
        };
        Ok(WeatherReport {
            city: args.city,
            temperature_c,
            conditions: conditions.to_string(),
        })
    });
    registry
}

/// Counts invocations of a shared tool
#[derive(Clone, Default)]
pub struct CallCounter(pub Arc<Mutex<usize>>);

impl CallCounter {
    pub fn bump(&self) {
        *self.0.lock().unwrap() += 1;
    }

    pub fn get(&self) -> usize {
        *self.0.lock().unwrap()
    }
}
