//! OpenAI chat-completions adapter.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::OpenAiConfig;
use crate::domain::ports::{ChatMessage, LanguageModel};
use crate::infrastructure::openai::{OpenAiClient, OpenAiError};

/// Chat model backed by `/v1/chat/completions`.
pub struct OpenAiChatModel {
    client: OpenAiClient,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiChatModel {
    pub fn new(client: OpenAiClient, model: impl Into<String>, temperature: f32, max_tokens: u32) -> Self {
        Self {
            client,
            model: model.into(),
            temperature,
            max_tokens,
        }
    }

    pub fn from_config(config: &OpenAiConfig) -> DomainResult<Self> {
        let client = OpenAiClient::from_config(config)?;
        Ok(Self::new(
            client,
            config.chat_model.clone(),
            config.temperature,
            config.max_tokens,
        ))
    }
}

#[async_trait]
impl LanguageModel for OpenAiChatModel {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn generate(&self, messages: &[ChatMessage]) -> DomainResult<String> {
        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response: ChatResponse = self.client.post_json("chat/completions", &request).await?;

        if let Some(usage) = &response.usage {
            debug!(
                model = %self.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Chat completion finished"
            );
        }

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| DomainError::from(OpenAiError::EmptyResponse("no completion choices".to_string())))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}
