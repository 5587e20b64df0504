//! LLM Provider Interface
//!
//! The core's only upward dependency: a narrow contract for text
//! generation, chat, embeddings, and streaming. The orchestrator, the
//! creative engine, and the semantic store all tolerate a missing or
//! failing provider and degrade to local code paths.

mod ollama;

pub use ollama::OllamaProvider;

use serde::{Deserialize, Serialize};

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Provider error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Transport-level failure (connection refused, timeout, TLS)
    #[error("HTTP error: {0}")]
    Http(String),
    /// The provider answered with a non-success status
    #[error("Provider returned status {0}: {1}")]
    Status(u16, String),
    /// The provider response could not be parsed
    #[error("Malformed provider response: {0}")]
    Parse(String),
}

/// Provider result type
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

// ============================================================================
// CHAT MESSAGES
// ============================================================================

/// Role in a chat conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// A single message in a chat conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: ChatRole::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: ChatRole::Assistant, content: content.into() }
    }
}

// ============================================================================
// PROVIDER CONTRACT
// ============================================================================

/// A lazily consumed, finite, single-pass stream of response chunks
pub type ChunkStream = Box<dyn Iterator<Item = ProviderResult<String>> + Send>;

/// Narrow LLM provider contract consumed by the cognitive core
///
/// Implementations must be cheap to share (`Send + Sync`); the orchestrator
/// holds one behind an `Arc` and calls it from foreground and background
/// threads alike.
pub trait LlmProvider: Send + Sync {
    /// Name of the model answering requests
    fn model_name(&self) -> &str;

    /// Chat-style completion over role-tagged messages
    fn chat(
        &self,
        messages: &[ChatMessage],
        temperature: f64,
        max_tokens: u32,
    ) -> ProviderResult<String>;

    /// Single-prompt completion; defaults to a chat call with an optional
    /// system message, mirroring how most chat-first backends expose it
    fn generate(
        &self,
        prompt: &str,
        system: &str,
        temperature: f64,
        max_tokens: u32,
    ) -> ProviderResult<String> {
        let mut messages = Vec::with_capacity(2);
        if !system.is_empty() {
            messages.push(ChatMessage::system(system));
        }
        messages.push(ChatMessage::user(prompt));
        self.chat(&messages, temperature, max_tokens)
    }

    /// Embed text into a vector. May legitimately return an empty vector
    /// when the backing model has no embedding endpoint; callers must
    /// tolerate that.
    fn embed(&self, text: &str) -> ProviderResult<Vec<f32>>;

    /// Stream a completion as chunks. The default implementation yields the
    /// whole non-streamed response as a single chunk.
    fn stream(
        &self,
        prompt: &str,
        system: &str,
        temperature: f64,
    ) -> ProviderResult<ChunkStream> {
        let full = self.generate(prompt, system, temperature, 2048)?;
        Ok(Box::new(std::iter::once(Ok(full))))
    }
}
