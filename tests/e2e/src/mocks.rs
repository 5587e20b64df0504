//! Mock LLM providers for scenario tests

use std::sync::Mutex;

use undermind_core::{ChatMessage, LlmProvider, ProviderError, ProviderResult};

/// Provider that answers every call with a canned response and records the
/// prompts it saw
pub struct MockProvider {
    response: String,
    pub calls: Mutex<Vec<String>>,
}

impl MockProvider {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Prompts and chat contexts observed so far
    pub fn seen(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl LlmProvider for MockProvider {
    fn model_name(&self) -> &str {
        "mock-model"
    }

    fn chat(
        &self,
        messages: &[ChatMessage],
        _temperature: f64,
        _max_tokens: u32,
    ) -> ProviderResult<String> {
        let last = messages.last().map(|m| m.content.clone()).unwrap_or_default();
        self.calls.lock().unwrap().push(last);
        Ok(self.response.clone())
    }

    fn embed(&self, text: &str) -> ProviderResult<Vec<f32>> {
        // Cheap deterministic embedding: character histogram over 8 buckets
        let mut vector = vec![0.0f32; 8];
        for (i, byte) in text.bytes().enumerate() {
            vector[(byte as usize + i) % 8] += 1.0;
        }
        Ok(vector)
    }
}

/// Provider whose every call fails, for degradation-path tests
pub struct FailingProvider;

impl LlmProvider for FailingProvider {
    fn model_name(&self) -> &str {
        "failing-model"
    }

    fn chat(
        &self,
        _messages: &[ChatMessage],
        _temperature: f64,
        _max_tokens: u32,
    ) -> ProviderResult<String> {
        Err(ProviderError::Http("connection refused".to_string()))
    }

    fn embed(&self, _text: &str) -> ProviderResult<Vec<f32>> {
        Err(ProviderError::Http("connection refused".to_string()))
    }
}
