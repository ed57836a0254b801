//! LLM Client Abstraction
//!
//! Text-completion collaborator used by the router and both pipelines.
//! Prompts are templates with `{name}` placeholders; the client renders them
//! and returns the model's plain-text output.
//! Supports real HTTP backends (Ollama, OpenAI-compatible) and a fake client for testing.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// LLM configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama3".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            endpoint: default_endpoint(),
            model: default_model(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// LLM errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LlmError {
    #[error("LLM is disabled in configuration")]
    Disabled,

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request timeout after {0} seconds")]
    Timeout(u64),

    #[error("LLM returned empty response")]
    EmptyResponse,
}

// ============================================================================
// Prompt templates
// ============================================================================

/// A named prompt with `{variable}` placeholders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTemplate {
    pub name: &'static str,
    pub text: &'static str,
}

impl PromptTemplate {
    pub const fn new(name: &'static str, text: &'static str) -> Self {
        Self { name, text }
    }

    /// Substitute variables in a single left-to-right pass.
    ///
    /// Substituted values are never re-scanned, so a question that itself
    /// contains `{schema}` is passed through literally. Unknown placeholders
    /// are left as they are.
    pub fn render(&self, vars: &PromptVars) -> String {
        let mut out = String::with_capacity(self.text.len());
        let mut rest = self.text;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            match after.find('}') {
                Some(close) => {
                    let key = &after[..close];
                    match vars.get(key) {
                        Some(value) => out.push_str(value),
                        None => {
                            out.push('{');
                            out.push_str(key);
                            out.push('}');
                        }
                    }
                    rest = &after[close + 1..];
                }
                None => {
                    out.push_str(&rest[open..]);
                    rest = "";
                }
            }
        }

        out.push_str(rest);
        out
    }
}

/// Variables for a prompt template
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptVars {
    entries: Vec<(String, String)>,
}

impl PromptVars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a variable
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
        } else {
            self.entries.push((key, value));
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Text-completion collaborator
pub trait TextCompletion: Send + Sync {
    /// Render `template` with `vars` and return the model's text output
    fn complete(&self, template: &PromptTemplate, vars: &PromptVars) -> Result<String, LlmError>;
}

// ============================================================================
// HTTP client
// ============================================================================

/// Real LLM client implementation using HTTP
pub struct HttpCompletionClient {
    config: LlmConfig,
    client: reqwest::blocking::Client,
}

impl HttpCompletionClient {
    pub fn new(config: LlmConfig) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self { config, client })
    }

    /// Check if endpoint is Ollama-style
    fn is_ollama_endpoint(&self) -> bool {
        self.config.endpoint.contains("11434") || self.config.endpoint.contains("ollama")
    }

    fn endpoint_url(&self, path: &str) -> String {
        format!("{}{}", self.config.endpoint.trim_end_matches('/'), path)
    }

    fn map_send_error(&self, e: reqwest::Error) -> LlmError {
        if e.is_timeout() {
            LlmError::Timeout(self.config.timeout_secs)
        } else {
            LlmError::HttpError(format!("Request failed: {}", e))
        }
    }

    /// Call Ollama-style API
    fn call_ollama(&self, prompt: &str) -> Result<String, LlmError> {
        let request_body = serde_json::json!({
            "model": self.config.model,
            "prompt": prompt,
            "stream": false,
        });

        let response = self
            .client
            .post(self.endpoint_url("/api/generate"))
            .json(&request_body)
            .send()
            .map_err(|e| self.map_send_error(e))?;

        if !response.status().is_success() {
            return Err(LlmError::HttpError(format!(
                "HTTP {} from Ollama",
                response.status()
            )));
        }

        let response_json: serde_json::Value = response
            .json()
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        response_json
            .get("response")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or(LlmError::EmptyResponse)
    }

    /// Call OpenAI-compatible API
    fn call_openai_compatible(&self, prompt: &str) -> Result<String, LlmError> {
        let request_body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                {"role": "user", "content": prompt},
            ],
        });

        let mut request = self
            .client
            .post(self.endpoint_url("/v1/chat/completions"))
            .json(&request_body);

        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().map_err(|e| self.map_send_error(e))?;

        if !response.status().is_success() {
            return Err(LlmError::HttpError(format!(
                "HTTP {} from OpenAI-compatible API",
                response.status()
            )));
        }

        let response_json: serde_json::Value = response
            .json()
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        response_json
            .get("choices")
            .and_then(|v| v.get(0))
            .and_then(|v| v.get("message"))
            .and_then(|v| v.get("content"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or(LlmError::EmptyResponse)
    }
}

impl TextCompletion for HttpCompletionClient {
    fn complete(&self, template: &PromptTemplate, vars: &PromptVars) -> Result<String, LlmError> {
        if !self.config.enabled {
            return Err(LlmError::Disabled);
        }

        let prompt = template.render(vars);
        tracing::debug!(template = template.name, model = %self.config.model, "LLM completion");

        // Try Ollama-style API first
        if self.is_ollama_endpoint() {
            match self.call_ollama(&prompt) {
                Ok(text) => return Ok(text),
                Err(e) => {
                    tracing::debug!("Ollama API failed, trying OpenAI-compatible: {}", e);
                }
            }
        }

        // Fall back to OpenAI-compatible API
        self.call_openai_compatible(&prompt)
    }
}

// ============================================================================
// Fake client
// ============================================================================

/// Fake LLM client for testing
///
/// Replies are consumed in order; the final reply repeats once the queue is
/// down to one entry. Every rendered prompt is recorded.
pub struct FakeCompletionClient {
    responses: Mutex<VecDeque<Result<String, LlmError>>>,
    prompts: Mutex<Vec<(String, String)>>,
}

impl FakeCompletionClient {
    /// Create a fake client with pre-defined responses
    pub fn new(responses: Vec<Result<String, LlmError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Create a fake client from plain text replies
    pub fn with_replies(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    /// Create a fake client that always returns an error
    pub fn always_error(error: LlmError) -> Self {
        Self::new(vec![Err(error)])
    }

    /// Get the number of calls made
    pub fn call_count(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or(0)
    }

    /// Template names in call order
    pub fn templates_used(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.iter().map(|(name, _)| name.clone()).collect())
            .unwrap_or_default()
    }

    /// Rendered prompts in call order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.iter().map(|(_, prompt)| prompt.clone()).collect())
            .unwrap_or_default()
    }
}

impl TextCompletion for FakeCompletionClient {
    fn complete(&self, template: &PromptTemplate, vars: &PromptVars) -> Result<String, LlmError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push((template.name.to_string(), template.render(vars)));
        }

        let mut responses = self
            .responses
            .lock()
            .map_err(|_| LlmError::HttpError("fake client poisoned".to_string()))?;

        match responses.len() {
            0 => Err(LlmError::EmptyResponse),
            // Keep returning the same response
            1 => responses[0].clone(),
            _ => responses.pop_front().unwrap_or(Err(LlmError::EmptyResponse)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GREETING: PromptTemplate = PromptTemplate::new("greeting", "Hello {name}, meet {other}.");

    #[test]
    fn test_llm_config_default() {
        let config = LlmConfig::default();
        assert!(config.enabled);
        assert_eq!(config.endpoint, "http://localhost:11434");
        assert_eq!(config.model, "llama3");
        assert!(config.api_key.is_none());
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn test_render_substitutes_variables() {
        let vars = PromptVars::new().with("name", "Ada").with("other", "Grace");
        assert_eq!(GREETING.render(&vars), "Hello Ada, meet Grace.");
    }

    #[test]
    fn test_render_keeps_unknown_placeholders() {
        let vars = PromptVars::new().with("name", "Ada");
        assert_eq!(GREETING.render(&vars), "Hello Ada, meet {other}.");
    }

    #[test]
    fn test_render_does_not_rescan_values() {
        let vars = PromptVars::new().with("name", "{other}").with("other", "Grace");
        assert_eq!(GREETING.render(&vars), "Hello {other}, meet Grace.");
    }

    #[test]
    fn test_render_unclosed_brace() {
        let template = PromptTemplate::new("t", "value: {name");
        let vars = PromptVars::new().with("name", "x");
        assert_eq!(template.render(&vars), "value: {name");
    }

    #[test]
    fn test_prompt_vars_replace() {
        let vars = PromptVars::new().with("a", "1").with("a", "2");
        assert_eq!(vars.get("a"), Some("2"));
        assert_eq!(vars.get("b"), None);
    }

    #[test]
    fn test_fake_client_sequence_then_repeat() {
        let client = FakeCompletionClient::with_replies(&["first", "second"]);
        let vars = PromptVars::new().with("name", "x").with("other", "y");

        assert_eq!(client.complete(&GREETING, &vars).unwrap(), "first");
        assert_eq!(client.complete(&GREETING, &vars).unwrap(), "second");
        assert_eq!(client.complete(&GREETING, &vars).unwrap(), "second");
        assert_eq!(client.call_count(), 3);
        assert_eq!(client.templates_used(), vec!["greeting"; 3]);
        assert_eq!(client.prompts()[0], "Hello x, meet y.");
    }

    #[test]
    fn test_fake_client_always_error() {
        let client = FakeCompletionClient::always_error(LlmError::Disabled);
        let result = client.complete(&GREETING, &PromptVars::new());
        assert_eq!(result, Err(LlmError::Disabled));
        assert_eq!(client.call_count(), 1);
    }

    #[test]
    fn test_http_client_disabled() {
        let config = LlmConfig {
            enabled: false,
            ..LlmConfig::default()
        };
        let client = HttpCompletionClient::new(config).unwrap();
        let result = client.complete(&GREETING, &PromptVars::new());
        assert_eq!(result, Err(LlmError::Disabled));
    }
}
