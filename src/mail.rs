use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::info;

use crate::config::MailConfig;

pub const RESET_SUBJECT: &str = "Password Reset Request for NutriTrack";

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_password_reset(
        &self,
        to: &str,
        username: &str,
        reset_url: &str,
    ) -> anyhow::Result<()>;
}

pub fn reset_body(username: &str, reset_url: &str) -> String {
    format!(
        "Hello {username},\n\nPlease click the following link to reset your password: {reset_url}\n\n\
         The link expires in 30 minutes. If you did not request this, please ignore this email."
    )
}

/// Used when no mail relay is configured.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_password_reset(
        &self,
        to: &str,
        _username: &str,
        reset_url: &str,
    ) -> anyhow::Result<()> {
        info!(%to, %reset_url, "mail relay not configured; password reset link logged");
        Ok(())
    }
}

/// Posts messages to a JSON mail relay.
pub struct HttpMailer {
    http: Client,
    cfg: MailConfig,
}

impl HttpMailer {
    pub fn new(http: Client, cfg: MailConfig) -> Self {
        Self { http, cfg }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send_password_reset(
        &self,
        to: &str,
        username: &str,
        reset_url: &str,
    ) -> anyhow::Result<()> {
        let mut req = self.http.post(&self.cfg.api_url).json(&json!({
            "from": self.cfg.from,
            "to": [to],
            "subject": RESET_SUBJECT,
            "text": reset_body(username, reset_url),
        }));
        if let Some(key) = &self.cfg.api_key {
            req = req.bearer_auth(key);
        }
        let response = req.send().await.context("send reset mail")?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("mail relay rejected message: {} {}", status, body));
        }
        info!(%to, "password reset mail sent");
        Ok(())
    }
}

#[cfg(test)]
#[derive(Debug, Clone, PartialEq)]
pub struct SentMail {
    pub to: String,
    pub username: String,
    pub reset_url: String,
}

#[cfg(test)]
#[derive(Default)]
pub struct RecordingMailer {
    sent: std::sync::Mutex<Vec<SentMail>>,
}

#[cfg(test)]
impl RecordingMailer {
    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_password_reset(
        &self,
        to: &str,
        username: &str,
        reset_url: &str,
    ) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(SentMail {
            to: to.into(),
            username: username.into(),
            reset_url: reset_url.into(),
        });
        Ok(())
    }
}
