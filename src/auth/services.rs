use axum::http::StatusCode;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::warn;
use uuid::Uuid;

use super::{
    dto::{AuthResponse, PublicUser},
    jwt::JwtKeys,
    repo_types::Account,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex =
            Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex");
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Access + refresh pair for a freshly authenticated account.
pub(crate) fn issue_tokens(keys: &JwtKeys, account: &Account) -> anyhow::Result<AuthResponse> {
    Ok(AuthResponse {
        access_token: keys.sign_access(account.id)?,
        refresh_token: keys.sign_refresh(account.id)?,
        user: PublicUser::from(account),
    })
}

/// Rejects actions on records the acting account does not own.
pub(crate) fn ensure_owner(owner: Uuid, acting: Uuid) -> Result<(), (StatusCode, String)> {
    if owner != acting {
        warn!(%owner, %acting, "ownership check failed");
        return Err((StatusCode::FORBIDDEN, "Unauthorized".into()));
    }
    Ok(())
}

/// Display name for accounts created through an external login.
pub(crate) fn external_username(name: Option<&str>, email: &str) -> String {
    match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(n) => n.to_string(),
        None => email.split('@').next().unwrap_or(email).to_string(),
    }
}
