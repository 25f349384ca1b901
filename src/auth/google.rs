use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::GoogleConfig;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";
const SCOPE: &str = "openid email profile";

/// Profile returned by the identity provider after a successful login.
#[derive(Debug, Clone, Deserialize)]
pub struct ExternalIdentity {
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn authorize_url(&self, state: &str) -> String;
    async fn exchange_code(&self, code: &str) -> anyhow::Result<ExternalIdentity>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

pub struct GoogleProvider {
    http: Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    auth_url: String,
    token_url: String,
    userinfo_url: String,
}

impl GoogleProvider {
    pub fn new(http: Client, cfg: &GoogleConfig, public_base_url: &str) -> Self {
        Self {
            http,
            client_id: cfg.client_id.clone(),
            client_secret: cfg.client_secret.clone(),
            redirect_uri: format!("{public_base_url}/api/v1/auth/google/callback"),
            auth_url: GOOGLE_AUTH_URL.into(),
            token_url: GOOGLE_TOKEN_URL.into(),
            userinfo_url: GOOGLE_USERINFO_URL.into(),
        }
    }

    /// Points token and userinfo calls at another host.
    #[cfg(test)]
    pub fn with_endpoints(mut self, token_url: String, userinfo_url: String) -> Self {
        self.token_url = token_url;
        self.userinfo_url = userinfo_url;
        self
    }
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn authorize_url(&self, state: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}",
            self.auth_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(SCOPE),
            urlencoding::encode(state)
        )
    }

    async fn exchange_code(&self, code: &str) -> anyhow::Result<ExternalIdentity> {
        let params = [
            ("code", code),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];
        let response = self
            .http
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .context("google token exchange")?;
        if !response.status().is_success() {
            return Err(anyhow!("google token exchange failed: {}", response.status()));
        }
        let token: TokenResponse = response.json().await.context("decode google token")?;

        let response = self
            .http
            .get(&self.userinfo_url)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .context("google userinfo")?;
        if !response.status().is_success() {
            return Err(anyhow!("google userinfo failed: {}", response.status()));
        }
        let identity: ExternalIdentity = response.json().await.context("decode google userinfo")?;
        debug!(email = %identity.email, "google identity resolved");
        Ok(identity)
    }
}

/// Returns a fixed identity for any code.
#[cfg(test)]
pub struct FakeIdentityProvider(pub ExternalIdentity);

#[cfg(test)]
#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    fn authorize_url(&self, state: &str) -> String {
        format!("https://idp.test/authorize?state={state}")
    }

    async fn exchange_code(&self, code: &str) -> anyhow::Result<ExternalIdentity> {
        if code.is_empty() {
            anyhow::bail!("empty code");
        }
        Ok(self.0.clone())
    }
}
