//! Text-completion service abstraction.

mod openai_chat;

pub use openai_chat::OpenAICompleter;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Who produced a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Trait for LLM text-completion services.
///
/// Transport failures are reported as [`crate::ClipscoutError::LlmService`].
/// Implementations do not retry.
#[async_trait]
pub trait Completer: Send + Sync {
    /// Complete a single prompt.
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Answer the last turn of a conversation under a system prompt.
    ///
    /// The default flattens the conversation into a single prompt.
    async fn converse(&self, system: &str, turns: &[ChatTurn]) -> Result<String> {
        self.complete(&flatten_conversation(system, turns)).await
    }
}

/// Render a system prompt and conversation as one prompt.
pub fn flatten_conversation(system: &str, turns: &[ChatTurn]) -> String {
    let mut prompt = system.to_string();
    for turn in turns {
        let label = match turn.role {
            ChatRole::User => "User",
            ChatRole::Assistant => "Assistant",
        };
        prompt.push_str(&format!("\n\n{}: {}", label, turn.content));
    }
    prompt
}
