//! Chat-completions backed [`Completer`].

use super::{ChatRole, ChatTurn, Completer};
use crate::config::LlmSettings;
use crate::error::{ClipscoutError, Result};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Completer for any OpenAI-compatible chat-completions endpoint.
pub struct OpenAICompleter {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAICompleter {
    /// Create a completer from settings. Fails if the API key is missing.
    pub fn from_settings(settings: &LlmSettings) -> Result<Self> {
        Ok(Self {
            client: create_client(settings)?,
            model: settings.model.clone(),
            temperature: settings.temperature,
        })
    }

    async fn send(&self, messages: Vec<ChatCompletionRequestMessage>) -> Result<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .build()
            .map_err(|e| ClipscoutError::LlmService(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            ClipscoutError::LlmService(format!("Failed to generate response: {}", e))
        })?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| ClipscoutError::LlmService("Empty response from LLM".to_string()))?
            .clone();

        debug!("LLM response: {}", truncate(&content, 500));
        Ok(content)
    }
}

#[async_trait]
impl Completer for OpenAICompleter {
    #[instrument(skip_all, fields(model = %self.model))]
    async fn complete(&self, prompt: &str) -> Result<String> {
        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|e| ClipscoutError::LlmService(e.to_string()))?;

        self.send(vec![message.into()]).await
    }

    #[instrument(skip_all, fields(model = %self.model, turns = turns.len()))]
    async fn converse(&self, system: &str, turns: &[ChatTurn]) -> Result<String> {
        let mut messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system)
                .build()
                .map_err(|e| ClipscoutError::LlmService(e.to_string()))?
                .into(),
        ];

        for turn in turns {
            let message: ChatCompletionRequestMessage = match turn.role {
                ChatRole::User => ChatCompletionRequestUserMessageArgs::default()
                    .content(turn.content.clone())
                    .build()
                    .map_err(|e| ClipscoutError::LlmService(e.to_string()))?
                    .into(),
                ChatRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                    .content(turn.content.clone())
                    .build()
                    .map_err(|e| ClipscoutError::LlmService(e.to_string()))?
                    .into(),
            };
            messages.push(message);
        }

        self.send(messages).await
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
