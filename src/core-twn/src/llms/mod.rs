pub mod chat_completion;
pub mod mock;
pub mod prompts;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use chat_completion::ChatCompletionProvider;
pub use mock::MockLlmProvider;
pub use prompts::ANNOTATION_SYSTEM_PROMPT;

use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

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

/// Interface to a hosted chat model that lets us send a conversation and await the reply.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn complete_chat(&self, messages: &[ChatMessage]) -> Result<String, Error>;

    /// Single-turn convenience over `complete_chat`.
    async fn complete_prompt(&self, prompt: &str) -> Result<String, Error> {
        self.complete_chat(&[ChatMessage::user(prompt)]).await
    }

    /// Names of the models the endpoint offers.
    async fn list_models(&self) -> Result<Vec<String>, Error>;
}

/// A running conversation: every successful exchange is kept as context for the next one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new(system_prompt: &str) -> Self {
        Self {
            messages: vec![ChatMessage::system(system_prompt)],
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Sends `content` as the next user turn. On success the reply is appended as the assistant turn;
    /// on failure the user turn is dropped again so the history stays alternating.
    pub async fn ask<P: LlmProvider + ?Sized>(&mut self, provider: &P, content: &str) -> Result<String, Error> {
        self.messages.push(ChatMessage::user(content));
        match provider.complete_chat(&self.messages).await {
            Ok(reply) => {
                self.messages.push(ChatMessage::assistant(reply.clone()));
                Ok(reply)
            }
            Err(e) => {
                self.messages.pop();
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_conversation_keeps_successful_turns() {
        let provider = MockLlmProvider::with_default("ok");
        let mut conversation = Conversation::new("system");

        conversation.ask(&provider, "first").await.unwrap();
        conversation.ask(&provider, "second").await.unwrap();

        let roles: Vec<ChatRole> = conversation.messages().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                ChatRole::System,
                ChatRole::User,
                ChatRole::Assistant,
                ChatRole::User,
                ChatRole::Assistant
            ]
        );
        // The second call saw the first exchange as context.
        assert_eq!(provider.calls()[1].len(), 4);
    }

    #[tokio::test]
    async fn test_conversation_drops_failed_user_turn() {
        let provider = MockLlmProvider::with_default("ok").failing_on("boom");
        let mut conversation = Conversation::new("system");

        conversation.ask(&provider, "first").await.unwrap();
        assert!(conversation.ask(&provider, "boom").await.is_err());
        assert_eq!(conversation.messages().len(), 3);
        assert_eq!(conversation.messages().last().unwrap().role, ChatRole::Assistant);
    }

    #[tokio::test]
    async fn test_complete_prompt_is_a_single_user_turn() {
        let provider = MockLlmProvider::with_default("reply");
        assert_eq!(provider.complete_prompt("hello").await.unwrap(), "reply");
        assert_eq!(provider.calls(), vec![vec![ChatMessage::user("hello")]]);
    }
}
