//! Ollama Provider
//!
//! Talks to a local Ollama server over its HTTP API:
//! - `/api/chat` for chat and generation (NDJSON when streaming)
//! - `/api/embed` for embeddings
//!
//! All calls are synchronous with a generous request timeout; failures map
//! onto [`ProviderError`] so callers can degrade.

use std::io::{BufRead, BufReader};
use std::time::Duration;

use serde_json::{Value, json};

use super::{ChatMessage, ChunkStream, LlmProvider, ProviderError, ProviderResult};
use crate::config::Settings;

/// Request timeout for completion calls; local models can be slow to warm up
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Ollama LLM provider
///
/// ```rust,ignore
/// let provider = OllamaProvider::new("llama3.1:8b", "http://localhost:11434");
/// let reply = provider.generate("Hello!", "", 0.7, 256)?;
/// ```
pub struct OllamaProvider {
    agent: ureq::Agent,
    base_url: String,
    model: String,
}

impl OllamaProvider {
    /// Create a provider for a specific model and server
    pub fn new(model: impl Into<String>, base_url: impl Into<String>) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build();
        Self {
            agent,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    /// Create a provider from settings (default model + base URL)
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.default_model, &settings.ollama_base_url)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn post(&self, path: &str, payload: Value) -> ProviderResult<ureq::Response> {
        match self.agent.post(&self.endpoint(path)).send_json(payload) {
            Ok(response) => Ok(response),
            Err(ureq::Error::Status(code, response)) => {
                let body = response.into_string().unwrap_or_default();
                Err(ProviderError::Status(code, body))
            }
            Err(e) => Err(ProviderError::Http(e.to_string())),
        }
    }

    fn chat_payload(
        &self,
        messages: &[ChatMessage],
        temperature: f64,
        max_tokens: u32,
        stream: bool,
    ) -> Value {
        json!({
            "model": self.model,
            "messages": messages,
            "stream": stream,
            "options": {
                "temperature": temperature,
                "num_predict": max_tokens,
            },
        })
    }
}

impl LlmProvider for OllamaProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn chat(
        &self,
        messages: &[ChatMessage],
        temperature: f64,
        max_tokens: u32,
    ) -> ProviderResult<String> {
        let payload = self.chat_payload(messages, temperature, max_tokens, false);
        let body: Value = self
            .post("api/chat", payload)?
            .into_json()
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        body.get("message")
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(str::to_string)
            .ok_or_else(|| ProviderError::Parse(format!("response missing message content: {body}")))
    }

    fn embed(&self, text: &str) -> ProviderResult<Vec<f32>> {
        let payload = json!({ "model": self.model, "input": text });
        let body: Value = self
            .post("api/embed", payload)?
            .into_json()
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        // Ollama answers {"embeddings": [[...]]}; a missing endpoint or an
        // embedding-less model yields an empty vector, which callers accept.
        let vector = body
            .get("embeddings")
            .and_then(|e| e.get(0))
            .and_then(|v| v.as_array())
            .map(|values| {
                values
                    .iter()
                    .filter_map(|x| x.as_f64())
                    .map(|x| x as f32)
                    .collect()
            })
            .unwrap_or_default();
        Ok(vector)
    }

    fn stream(
        &self,
        prompt: &str,
        system: &str,
        temperature: f64,
    ) -> ProviderResult<ChunkStream> {
        let mut messages = Vec::with_capacity(2);
        if !system.is_empty() {
            messages.push(ChatMessage::system(system));
        }
        messages.push(ChatMessage::user(prompt));

        let payload = self.chat_payload(&messages, temperature, 2048, true);
        let response = self.post("api/chat", payload)?;
        let reader = BufReader::new(response.into_reader());

        Ok(Box::new(NdjsonChunks { lines: reader.lines(), done: false }))
    }
}

/// Iterator over the `message.content` fields of an NDJSON chat stream
struct NdjsonChunks<R: BufRead> {
    lines: std::io::Lines<R>,
    done: bool,
}

impl<R: BufRead + Send> Iterator for NdjsonChunks<R> {
    type Item = ProviderResult<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => {
                    self.done = true;
                    return Some(Err(ProviderError::Http(e.to_string())));
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            let value: Value = match serde_json::from_str(&line) {
                Ok(value) => value,
                Err(e) => {
                    self.done = true;
                    return Some(Err(ProviderError::Parse(e.to_string())));
                }
            };
            if value.get("done").and_then(Value::as_bool).unwrap_or(false) {
                self.done = true;
            }
            let content = value
                .get("message")
                .and_then(|m| m.get("content"))
                .and_then(Value::as_str)
                .unwrap_or("");
            if content.is_empty() {
                if self.done {
                    return None;
                }
                continue;
            }
            return Some(Ok(content.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let p = OllamaProvider::new("llama3.1:8b", "http://localhost:11434/");
        assert_eq!(p.endpoint("api/chat"), "http://localhost:11434/api/chat");
    }

    #[test]
    fn test_chat_payload_shape() {
        let p = OllamaProvider::new("m", "http://localhost:11434");
        let payload = p.chat_payload(&[ChatMessage::user("hi")], 0.7, 64, false);
        assert_eq!(payload["model"], "m");
        assert_eq!(payload["stream"], false);
        assert_eq!(payload["options"]["num_predict"], 64);
        assert_eq!(payload["messages"][0]["role"], "user");
    }

    #[test]
    fn test_ndjson_chunks_parse_until_done() {
        let body = concat!(
            "{\"message\":{\"content\":\"Hel\"},\"done\":false}\n",
            "\n",
            "{\"message\":{\"content\":\"lo\"},\"done\":false}\n",
            "{\"message\":{\"content\":\"\"},\"done\":true}\n",
        );
        let chunks = NdjsonChunks {
            lines: BufReader::new(body.as_bytes()).lines(),
            done: false,
        };
        let collected: Vec<String> = chunks.map(|c| c.unwrap()).collect();
        assert_eq!(collected, vec!["Hel", "lo"]);
    }

    #[test]
    fn test_ndjson_chunks_surface_parse_errors() {
        let body = "not-json\n";
        let mut chunks = NdjsonChunks {
            lines: BufReader::new(body.as_bytes()).lines(),
            done: false,
        };
        assert!(matches!(chunks.next(), Some(Err(ProviderError::Parse(_)))));
        assert!(chunks.next().is_none());
    }
}
