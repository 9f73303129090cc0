//! Chat-completion clients for the daily summarizer.
//!
//! Two backends: a local Ollama server and OpenRouter.  Both sit behind the
//! [`ChatModel`] trait so the pipeline (and its tests) never touch HTTP.
//! There is deliberately no retry and no streaming — a failed call fails
//! the whole summarization attempt and the next scheduled run retries with
//! the accumulated logs.

use anyhow::{Result, bail};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use recap_config::LlmConfig;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Ollama,
    OpenRouter,
}

impl Provider {
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "ollama" => Ok(Provider::Ollama),
            "openrouter" => Ok(Provider::OpenRouter),
            other => bail!("unknown LLM provider {other:?} (expected \"ollama\" or \"openrouter\")"),
        }
    }
}

/// One system+user chat turn against an external model.  An `Err` is the
/// failure sentinel the pipeline aborts on.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn chat(&self, system_prompt: &str, user_content: &str) -> Result<String>;
}

/// Build the configured backend.  Unknown providers and a missing
/// OpenRouter key are hard errors, surfaced at startup rather than at the
/// run hour.
pub fn client_from_config(config: &LlmConfig) -> Result<Box<dyn ChatModel>> {
    match Provider::parse(&config.provider)? {
        Provider::Ollama => Ok(Box::new(OllamaClient::new(
            &config.ollama_base_url,
            &config.ollama_model,
        ))),
        Provider::OpenRouter => {
            if config.api_key.trim().is_empty() {
                bail!("provider is openrouter but no API key is set ([llm] api_key or RECAP_API_KEY)");
            }
            Ok(Box::new(OpenRouterClient::new(
                &config.api_key,
                &config.openrouter_model,
            )))
        }
    }
}

// ── Ollama ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl ChatModel for OllamaClient {
    async fn chat(&self, system_prompt: &str, user_content: &str) -> Result<String> {
        let endpoint = format!("{}/api/chat", self.base_url);
        let payload = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_content}
            ],
            "stream": false
        });

        debug!(model = %self.model, endpoint = %endpoint, "ollama chat request");
        let response = self.client.post(&endpoint).json(&payload).send().await?;
        let status = response.status();
        let body: serde_json::Value = response.json().await?;
        if !status.is_success() {
            bail!("ollama error ({status}): {body}");
        }

        match content_from_ollama(&body) {
            Some(content) => Ok(content),
            None => bail!("ollama response missing message content: {body}"),
        }
    }
}

/// Extract the assistant text from an Ollama `/api/chat` response body.
pub fn content_from_ollama(body: &serde_json::Value) -> Option<String> {
    body.get("message")
        .and_then(|message| message.get("content"))
        .and_then(|content| content.as_str())
        .map(str::to_string)
}

// ── OpenRouter ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenRouterClient {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl ChatModel for OpenRouterClient {
    async fn chat(&self, system_prompt: &str, user_content: &str) -> Result<String> {
        let payload = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_content}
            ]
        });

        debug!(model = %self.model, "openrouter chat request");
        let response = self
            .client
            .post("https://openrouter.ai/api/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", "https://recap.local")
            .header("X-Title", "Recap")
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body: serde_json::Value = response.json().await?;
        if !status.is_success() {
            bail!("openrouter error ({status}): {body}");
        }

        match content_from_chat_completion(&body) {
            Some(content) => Ok(content),
            None => bail!("openrouter response missing message content: {body}"),
        }
    }
}

/// Extract the assistant text from an OpenAI-style chat-completions body.
pub fn content_from_chat_completion(body: &serde_json::Value) -> Option<String> {
    body.get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(|content| content.as_str())
        .map(str::to_string)
}

// ── Tests ────────────────────────────────────────────────────────────────────
