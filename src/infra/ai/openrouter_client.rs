use crate::core::ai::{
    models::{AiConfig, AiMessage, AiProviderResponse},
    AiProvider, ToolCall, ToolDescriptor,
};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::error::Error;

const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

pub struct OpenRouterClient {
    client: Client,
    api_key: String,
}

impl OpenRouterClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
        }
    }

    /// One message in the chat completions wire format. Tool calls are nested
    /// under `function` there, and assistant turns that only call tools may
    /// have null content.
    fn wire_message(message: &AiMessage) -> Value {
        let mut wire = json!({
            "role": message.role,
            "content": message.content,
        });

        if !message.tool_calls.is_empty() {
            let calls: Vec<Value> = message
                .tool_calls
                .iter()
                .map(|call| {
                    json!({
                        "id": call.id,
                        "type": "function",
                        "function": { "name": call.name, "arguments": call.arguments },
                    })
                })
                .collect();
            wire["tool_calls"] = json!(calls);
            if message.content.is_empty() {
                wire["content"] = Value::Null;
            }
        }
        if let Some(call_id) = &message.tool_call_id {
            wire["tool_call_id"] = json!(call_id);
        }

        wire
    }

    fn build_payload(messages: &[AiMessage], tools: &[ToolDescriptor], config: &AiConfig) -> Value {
        let messages: Vec<Value> = messages.iter().map(Self::wire_message).collect();
        let mut payload = json!({
            "model": config.model,
            "messages": messages,
            "temperature": config.temperature,
        });

        if let Some(max_tokens) = config.max_tokens {
            payload["max_tokens"] = json!(max_tokens);
        }
        if let Some(top_p) = config.top_p {
            payload["top_p"] = json!(top_p);
        }
        if let Some(penalty) = config.repetition_penalty {
            payload["repetition_penalty"] = json!(penalty);
        }

        if config.reasoning_enabled.is_some() || config.reasoning_effort.is_some() {
            let mut reasoning = json!({});
            if let Some(enabled) = config.reasoning_enabled {
                reasoning["enabled"] = json!(enabled);
            }
            if let Some(effort) = &config.reasoning_effort {
                reasoning["effort"] = json!(effort);
            }
            payload["reasoning"] = reasoning;
        }

        if !tools.is_empty() {
            let tools: Vec<Value> = tools
                .iter()
                .map(|tool| json!({ "type": "function", "function": tool }))
                .collect();
            payload["tools"] = json!(tools);
            payload["tool_choice"] = json!("auto");
        }

        payload
    }

    fn parse_response(response_json: &Value) -> Result<AiProviderResponse, Box<dyn Error + Send + Sync>> {
        let message = response_json["choices"][0]
            .get("message")
            .ok_or("Failed to parse response: no message in first choice")?;

        let tool_calls: Vec<ToolCall> = message["tool_calls"]
            .as_array()
            .map(|calls| {
                calls
                    .iter()
                    .filter_map(|call| {
                        Some(ToolCall {
                            id: call["id"].as_str().unwrap_or_default().to_string(),
                            name: call["function"]["name"].as_str()?.to_string(),
                            arguments: call["function"]["arguments"]
                                .as_str()
                                .unwrap_or_default()
                                .to_string(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        // Content is null when the model only asks for tools
        let content = match message["content"].as_str() {
            Some(text) => text.to_string(),
            None if !tool_calls.is_empty() => String::new(),
            None => return Err("Failed to parse response content".into()),
        };

        let thinking = message["reasoning"]
            .as_str()
            .filter(|r| !r.trim().is_empty())
            .map(str::to_string);

        Ok(AiProviderResponse {
            content,
            thinking,
            tool_calls,
        })
    }
}

#[async_trait]
impl AiProvider for OpenRouterClient {
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        tools: &[ToolDescriptor],
        config: &AiConfig,
    ) -> Result<AiProviderResponse, Box<dyn Error + Send + Sync>> {
        let payload = Self::build_payload(messages, tools, config);

        let response = self
            .client
            .post(OPENROUTER_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await?;
            return Err(format!("OpenRouter API error: {} - {}", status, text).into());
        }

        let response_json: Value = response.json().await?;
        let parsed = Self::parse_response(&response_json)?;

        tracing::debug!(
            model = %config.model,
            tool_calls = parsed.tool_calls.len(),
            "OpenRouter completion received"
        );

        Ok(parsed)
    }
}
