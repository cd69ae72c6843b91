//! Mock LLM provider for testing
//!
//! Returns canned replies chosen by the content of the last user turn, and records every
//! conversation it was sent, without making real API calls.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::Error;
use crate::llms::{ChatMessage, ChatRole, LlmProvider};

/// Mock LLM provider for testing
///
/// Can be configured to:
/// - Return specific responses based on the last user message
/// - Return a default response for any message
/// - Fail every call, or only calls whose user message contains a marker
pub struct MockLlmProvider {
    /// If the last user message contains the key, return the corresponding response
    responses: HashMap<String, String>,
    default_response: Option<String>,
    should_fail: bool,
    fail_on: Vec<String>,
    models: Vec<String>,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl MockLlmProvider {
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
            default_response: None,
            should_fail: false,
            fail_on: Vec::new(),
            models: vec!["gemma3:12b-it-qat".to_string()],
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock with multiple configured responses
    pub fn with_responses(responses: Vec<(&str, &str)>) -> Self {
        let mut provider = Self::new();
        for (message_part, response) in responses {
            provider.add_response(message_part, response);
        }
        provider
    }

    pub fn with_default(response: &str) -> Self {
        let mut provider = Self::new();
        provider.default_response = Some(response.to_string());
        provider
    }

    /// Create a mock that always fails with an error
    pub fn with_failure() -> Self {
        let mut provider = Self::new();
        provider.should_fail = true;
        provider
    }

    /// Fail only when the last user message contains `marker`.
    pub fn failing_on(mut self, marker: &str) -> Self {
        self.fail_on.push(marker.to_string());
        self
    }

    pub fn add_response(&mut self, message_contains: &str, response: &str) {
        self.responses.insert(message_contains.to_string(), response.to_string());
    }

    /// Every conversation passed to `complete_chat`, in call order.
    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }
}

impl Default for MockLlmProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    async fn complete_chat(&self, messages: &[ChatMessage]) -> Result<String, Error> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(messages.to_vec());
        }

        if self.should_fail {
            return Err(Error::ProviderUnavailable(
                "Mock LLM provider configured to fail".to_string(),
            ));
        }

        let last_user = messages
            .iter()
            .rev()
            .find(|m| m.role == ChatRole::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default();

        if self.fail_on.iter().any(|marker| last_user.contains(marker)) {
            return Err(Error::ProviderUnavailable(format!(
                "Mock LLM provider configured to fail on: {}",
                last_user
            )));
        }

        for (key, response) in &self.responses {
            if last_user.contains(key) {
                return Ok(response.clone());
            }
        }

        if let Some(default) = &self.default_response {
            return Ok(default.clone());
        }

        Err(Error::ProviderUnavailable(
            "Mock LLM provider has no response configured for this message".to_string(),
        ))
    }

    async fn list_models(&self) -> Result<Vec<String>, Error> {
        if self.should_fail {
            return Err(Error::ProviderUnavailable("Mock LLM provider configured to fail".to_string()));
        }
        Ok(self.models.clone())
    }
}

//
// Test Fixtures
//

/// A reply in the shape the annotation prompt asks for.
pub fn sample_annotation_reply() -> &'static str {
    r#"好的，以下是分析結果：

```json
{"title": "立法院三讀通過總預算案", "category": ["政治"], "keyword": ["立法院", "總預算"], "sentiment_analysis": "中立"}
```
"#
}
