use super::models::{AiConfig, AiMessage, AiProviderResponse, AiResponse};
use super::tools::ToolDescriptor;
use async_trait::async_trait;
use std::error::Error;

#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Sends a chat completion request to the AI provider.
    ///
    /// `tools` lists the functions the model may call; pass an empty slice to
    /// disable function calling for this request.
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        tools: &[ToolDescriptor],
        config: &AiConfig,
    ) -> Result<AiProviderResponse, Box<dyn Error + Send + Sync>>;
}

pub struct AiService<P: AiProvider> {
    provider: P,
    system_prompt: String,
    config: AiConfig,
}

impl<P: AiProvider> AiService<P> {
    pub fn new(provider: P, system_prompt: String, config: AiConfig) -> Self {
        Self {
            provider,
            system_prompt,
            config,
        }
    }

    pub async fn chat(
        &self,
        context_messages: &[AiMessage],
        tools: &[ToolDescriptor],
    ) -> Result<AiResponse, Box<dyn Error + Send + Sync>> {
        // System prompt first, then the caller's context
        let mut messages = Vec::with_capacity(context_messages.len() + 1);
        messages.push(AiMessage::system(self.system_prompt.clone()));
        messages.extend(context_messages.iter().cloned());

        let provider_response = self
            .provider
            .chat_complete(&messages, tools, &self.config)
            .await?;

        // Some models wrap output in <answer>/<rationale> tags
        let (answer, xml_reasoning) = self.parse_response(&provider_response.content);

        // Prefer the provider's native reasoning over tag-parsed reasoning
        let reasoning = provider_response.thinking.or(xml_reasoning);

        Ok(AiResponse {
            answer,
            reasoning,
            tool_calls: provider_response.tool_calls,
        })
    }

    fn parse_response(&self, content: &str) -> (String, Option<String>) {
        let mut answer = content.to_string();
        let mut reasoning = None;

        if let Some(start_ans) = content.find("<answer>") {
            if let Some(end_ans) = content.find("</answer>") {
                if end_ans > start_ans {
                    answer = content[start_ans + 8..end_ans].trim().to_string();
                }
            }
        }

        if let Some(start_rat) = content.find("<rationale>") {
            if let Some(end_rat) = content.find("</rationale>") {
                if end_rat > start_rat {
                    reasoning = Some(content[start_rat + 11..end_rat].trim().to_string());
                }
            }
        }

        (answer, reasoning)
    }
}
