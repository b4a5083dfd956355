//! Chat backends reached over HTTP.

use super::backend::ChatBackend;
use crate::config::AnalysisConfig;
use crate::error::{ContextError, Result};
use serde_json::{json, Value};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Wire protocol spoken by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// OpenAI-compatible `/chat/completions` (OpenAI, DeepSeek).
    ChatCompletions,
    /// Anthropic `/messages`.
    Messages,
    /// Ollama `/api/generate`.
    Generate,
}

/// A blocking HTTP chat backend.
pub struct HttpBackend {
    name: &'static str,
    dialect: Dialect,
    model: String,
    base_url: String,
    api_key: Option<String>,
    temperature: f64,
    max_tokens: u32,
    agent: ureq::Agent,
}

impl HttpBackend {
    /// OpenAI chat completions.
    pub fn openai(config: &AnalysisConfig) -> Self {
        Self::build(
            "openai",
            Dialect::ChatCompletions,
            "gpt-4-turbo-preview",
            "https://api.openai.com/v1",
            config,
        )
    }

    /// DeepSeek (OpenAI-compatible).
    pub fn deepseek(config: &AnalysisConfig) -> Self {
        Self::build(
            "deepseek",
            Dialect::ChatCompletions,
            "deepseek-chat",
            "https://api.deepseek.com/v1",
            config,
        )
    }

    /// Anthropic messages.
    pub fn anthropic(config: &AnalysisConfig) -> Self {
        Self::build(
            "anthropic",
            Dialect::Messages,
            "claude-3-opus-20240229",
            "https://api.anthropic.com/v1",
            config,
        )
    }

    /// Local Ollama server. Needs no credential.
    pub fn ollama(config: &AnalysisConfig) -> Self {
        Self::build(
            "ollama",
            Dialect::Generate,
            "llama3",
            "http://localhost:11434",
            config,
        )
    }

    fn build(
        name: &'static str,
        dialect: Dialect,
        default_model: &str,
        default_url: &str,
        config: &AnalysisConfig,
    ) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(config.timeout()))
            .build()
            .new_agent();

        Self {
            name,
            dialect,
            model: config
                .model
                .clone()
                .unwrap_or_else(|| default_model.to_string()),
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| default_url.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_key: config.api_key.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            agent,
        }
    }

    /// Model the requests are sent to.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        match self.dialect {
            Dialect::ChatCompletions => format!("{}/chat/completions", self.base_url),
            Dialect::Messages => format!("{}/messages", self.base_url),
            Dialect::Generate => format!("{}/api/generate", self.base_url),
        }
    }

    fn request_body(&self, prompt: &str) -> Value {
        match self.dialect {
            Dialect::ChatCompletions => json!({
                "model": self.model,
                "messages": [{"role": "user", "content": prompt}],
                "temperature": self.temperature,
                "max_tokens": self.max_tokens,
            }),
            Dialect::Messages => json!({
                "model": self.model,
                "max_tokens": self.max_tokens,
                "temperature": self.temperature,
                "messages": [{"role": "user", "content": prompt}],
            }),
            Dialect::Generate => json!({
                "model": self.model,
                "prompt": prompt,
                "stream": false,
                "options": {
                    "temperature": self.temperature,
                    "num_predict": self.max_tokens,
                },
            }),
        }
    }

    fn reply_text(&self, body: &Value) -> Option<String> {
        let text = match self.dialect {
            Dialect::ChatCompletions => body
                .pointer("/choices/0/message/content")
                .and_then(Value::as_str),
            Dialect::Messages => body.pointer("/content/0/text").and_then(Value::as_str),
            Dialect::Generate => body.get("response").and_then(Value::as_str),
        };
        text.map(str::to_string)
    }

    fn failure(&self, reason: impl std::fmt::Display) -> ContextError {
        ContextError::Analysis {
            provider: self.name.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl ChatBackend for HttpBackend {
    fn name(&self) -> &str {
        self.name
    }

    fn complete(&self, prompt: &str) -> Result<String> {
        let mut request = self
            .agent
            .post(&self.endpoint())
            .header("Content-Type", "application/json");

        match (self.dialect, &self.api_key) {
            (Dialect::Generate, _) => {}
            (_, None) => {
                let var = AnalysisConfig::api_key_var(self.name).unwrap_or("API key");
                return Err(self.failure(format!("missing credential; set {var}")));
            }
            (Dialect::ChatCompletions, Some(key)) => {
                request = request.header("Authorization", &format!("Bearer {key}"));
            }
            (Dialect::Messages, Some(key)) => {
                request = request
                    .header("x-api-key", key)
                    .header("anthropic-version", ANTHROPIC_VERSION);
            }
        }

        let mut response = request
            .send(self.request_body(prompt).to_string())
            .map_err(|e| self.failure(e))?;
        let text = response
            .body_mut()
            .read_to_string()
            .map_err(|e| self.failure(e))?;
        let body: Value = serde_json::from_str(&text)
            .map_err(|e| self.failure(format!("malformed response: {e}")))?;

        self.reply_text(&body)
            .ok_or_else(|| self.failure("response has no message content"))
    }
}
