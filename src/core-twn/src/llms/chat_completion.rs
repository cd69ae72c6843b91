use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
};
use async_trait::async_trait;
use data_model_twn::models::AiModel;

use crate::Error;
use crate::llms::{ChatMessage, ChatRole, LlmProvider};

pub const DEFAULT_LLM_API_BASE: &str = "http://localhost:3000/api";

/// Any OpenAI-compatible chat endpoint (Open WebUI, Ollama, vLLM, ...).
pub struct ChatCompletionProvider {
    client: Client<OpenAIConfig>,
    model: AiModel,
}

impl ChatCompletionProvider {
    pub fn new(api_base: &str, api_token: &str, model: AiModel) -> Self {
        let config = OpenAIConfig::new()
            .with_api_base(api_base.trim_end_matches('/'))
            .with_api_key(api_token);
        Self {
            client: Client::with_config(config),
            model,
        }
    }

    /// Reads LLM_API_BASE, LLM_API_TOKEN and LLM_MODEL. The model must be one we store annotations for.
    pub fn from_env() -> Result<Self, Error> {
        let api_base = env_or("LLM_API_BASE", DEFAULT_LLM_API_BASE);
        let api_token = env_or("LLM_API_TOKEN", "");
        let model_name = env_or("LLM_MODEL", AiModel::default().model_name());
        let model = AiModel::from_model_name(&model_name).ok_or_else(|| Error::InvalidConfig {
            var: "LLM_MODEL".to_string(),
            reason: format!("'{}' is not a supported model", model_name),
        })?;
        if api_token.is_empty() {
            tracing::warn!("LLM_API_TOKEN is not set, calling {} without a bearer token", api_base);
        }
        Ok(Self::new(&api_base, &api_token, model))
    }

    pub fn model(&self) -> AiModel {
        self.model
    }
}

fn env_or(var: &str, default: &str) -> String {
    match std::env::var(var) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => default.to_string(),
    }
}

fn to_request_message(message: &ChatMessage) -> Result<ChatCompletionRequestMessage, Error> {
    let content = message.content.as_str();
    Ok(match message.role {
        ChatRole::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(content)
            .build()?
            .into(),
        ChatRole::User => ChatCompletionRequestUserMessageArgs::default()
            .content(content)
            .build()?
            .into(),
        ChatRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
            .content(content)
            .build()?
            .into(),
    })
}

#[async_trait]
impl LlmProvider for ChatCompletionProvider {
    async fn complete_chat(&self, messages: &[ChatMessage]) -> Result<String, Error> {
        let messages = messages
            .iter()
            .map(to_request_message)
            .collect::<Result<Vec<_>, Error>>()?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(self.model.model_name())
            .messages(messages)
            .build()?;

        tracing::debug!("Sending {} messages to {}", request.messages.len(), self.model.model_name());
        let response = self.client.chat().create(request).await?;

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|content| !content.trim().is_empty())
            .ok_or(Error::EmptyCompletion)
    }

    async fn list_models(&self) -> Result<Vec<String>, Error> {
        let models = self.client.models().list().await?;
        Ok(models.data.into_iter().map(|m| m.id).collect())
    }
}
