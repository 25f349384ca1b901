use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::OpenAiConfig;

/// A single prompt in, a single completion out.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> anyhow::Result<String>;
}

/// OpenAI-compatible `/chat/completions` client.
#[derive(Clone)]
pub struct OpenAiClient {
    http: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(http: Client, cfg: &OpenAiConfig) -> Self {
        Self {
            http,
            api_key: cfg.api_key.clone(),
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            model: cfg.model.clone(),
        }
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> anyhow::Result<String> {
        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "messages": [{ "role": "user", "content": prompt }],
                "max_tokens": max_tokens,
            }))
            .send()
            .await
            .context("send chat completion request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("API request failed: status {}, body: {}", status, body));
        }

        let body: Value = response.json().await.context("decode chat completion")?;
        if let Some(error) = body.get("error") {
            return Err(anyhow!("API returned error: {}", error));
        }

        let content = body
            .get("choices")
            .and_then(|choices| choices.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("no completion content in response"))?;

        debug!(model = %self.model, chars = content.len(), "completion received");
        Ok(content.trim().to_string())
    }
}

/// Replays queued replies and records every prompt it was given.
#[cfg(test)]
#[derive(Default)]
pub struct ScriptedCompletion {
    replies: std::sync::Mutex<std::collections::VecDeque<Result<String, String>>>,
    prompts: std::sync::Mutex<Vec<(String, u32)>>,
}

#[cfg(test)]
impl ScriptedCompletion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ok(&self, reply: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Ok(reply.into()));
    }

    pub fn push_err(&self, reason: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Err(reason.into()));
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<(String, u32)> {
        self.prompts.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl CompletionClient for ScriptedCompletion {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> anyhow::Result<String> {
        self.prompts.lock().unwrap().push((prompt.to_string(), max_tokens));
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(reason)) => Err(anyhow!(reason)),
            None => Err(anyhow!("no scripted reply left")),
        }
    }
}
