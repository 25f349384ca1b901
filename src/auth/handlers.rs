use axum::{
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    app::internal,
    auth::{
        claims::TokenKind,
        dto::{
            AuthResponse, ForgotPasswordRequest, LoginRequest, MessageResponse, OAuthCallback,
            PublicUser, RefreshRequest, RegisterRequest, ResetPasswordRequest,
        },
        jwt::{AuthUser, JwtKeys},
        password::{hash_password, validate_new_password, verify_password},
        repo::{AccountRepo, DuplicateEmail},
        repo_types::NewAccount,
        services::{external_username, is_valid_email, issue_tokens, normalize_email},
    },
    state::AppState,
};

const FORGOT_PASSWORD_MESSAGE: &str =
    "If an account with that email exists, a password reset link has been sent.";

/// Maps a failed insert to 409 when the email was taken concurrently.
fn create_account_error(e: anyhow::Error) -> (StatusCode, String) {
    if e.is::<DuplicateEmail>() {
        warn!(error = %e, "email registered concurrently");
        return (StatusCode::CONFLICT, "Email already registered".into());
    }
    internal(e)
}

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/google/login", get(google_login))
        .route("/auth/google/callback", get(google_callback))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", post(reset_password))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), (StatusCode, String)> {
    let email = normalize_email(&payload.email);
    let username = payload.username.trim();

    if username.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Username is required.".into()));
    }
    if !is_valid_email(&email) {
        warn!(%email, "invalid email");
        return Err((StatusCode::BAD_REQUEST, "Invalid email".into()));
    }
    if let Err(msg) = validate_new_password(&payload.password, &payload.password2) {
        return Err((StatusCode::BAD_REQUEST, msg.into()));
    }

    match state.store.find_account_by_email(&email).await {
        Ok(Some(_)) => {
            warn!(%email, "email already registered");
            return Err((StatusCode::CONFLICT, "Email already registered".into()));
        }
        Ok(None) => {}
        Err(e) => return Err(internal(e)),
    }

    let hash = hash_password(&payload.password).map_err(internal)?;
    let account = state
        .store
        .create_account(NewAccount {
            username,
            email: &email,
            password_hash: Some(&hash),
            profile_pic_url: None,
        })
        .await
        .map_err(create_account_error)?;

    let tokens = issue_tokens(&JwtKeys::from_ref(&state), &account).map_err(internal)?;
    info!(user_id = %account.id, email = %account.email, "user registered");
    Ok((StatusCode::CREATED, Json(tokens)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    let email = normalize_email(&payload.email);
    let invalid = || (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string());

    let account = match state.store.find_account_by_email(&email).await {
        Ok(Some(a)) => a,
        Ok(None) => {
            warn!(%email, "login unknown email");
            return Err(invalid());
        }
        Err(e) => return Err(internal(e)),
    };

    let Some(hash) = account.password_hash.as_deref() else {
        warn!(user_id = %account.id, "password login for external account");
        return Err(invalid());
    };

    if !verify_password(&payload.password, hash).map_err(internal)? {
        warn!(user_id = %account.id, "login invalid password");
        return Err(invalid());
    }

    let tokens = issue_tokens(&JwtKeys::from_ref(&state), &account).map_err(internal)?;
    info!(user_id = %account.id, "user logged in");
    Ok(Json(tokens))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| (StatusCode::UNAUTHORIZED, e.to_string()))?;

    let account = state
        .store
        .find_account(claims.sub)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::UNAUTHORIZED, "User not found".to_string()))?;

    Ok(Json(issue_tokens(&keys, &account).map_err(internal)?))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, (StatusCode, String)> {
    let account = state
        .store
        .find_account(user_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| {
            error!(%user_id, "user not found");
            (StatusCode::UNAUTHORIZED, "User not found".to_string())
        })?;
    Ok(Json(PublicUser::from(&account)))
}

#[instrument(skip(state))]
pub async fn google_login(State(state): State<AppState>) -> Result<Redirect, (StatusCode, String)> {
    let Some(identity) = state.identity.as_ref() else {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            "Google login is not configured.".into(),
        ));
    };
    let oauth_state = JwtKeys::from_ref(&state).sign_oauth_state().map_err(internal)?;
    Ok(Redirect::to(&identity.authorize_url(&oauth_state)))
}

#[instrument(skip(state, params))]
pub async fn google_callback(
    State(state): State<AppState>,
    Query(params): Query<OAuthCallback>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    let Some(identity) = state.identity.as_ref() else {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            "Google login is not configured.".into(),
        ));
    };
    let keys = JwtKeys::from_ref(&state);
    if keys.verify_kind(&params.state, TokenKind::OAuthState).is_err() {
        warn!("oauth state rejected");
        return Err((StatusCode::BAD_REQUEST, "Invalid login state.".into()));
    }

    let profile = identity.exchange_code(&params.code).await.map_err(|e| {
        warn!(error = %e, "google exchange failed");
        (
            StatusCode::BAD_GATEWAY,
            "Could not retrieve user information from Google.".to_string(),
        )
    })?;
    let email = normalize_email(&profile.email);

    let account = match state.store.find_account_by_email(&email).await.map_err(internal)? {
        Some(existing) => existing,
        None => {
            let username = external_username(profile.name.as_deref(), &email);
            let created = state
                .store
                .create_account(NewAccount {
                    username: &username,
                    email: &email,
                    password_hash: None,
                    profile_pic_url: profile.picture.as_deref(),
                })
                .await
                .map_err(create_account_error)?;
            info!(user_id = %created.id, "account created from google login");
            created
        }
    };

    info!(user_id = %account.id, "user logged in with google");
    Ok(Json(issue_tokens(&keys, &account).map_err(internal)?))
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, (StatusCode, String)> {
    let email = normalize_email(&payload.email);
    if let Some(account) = state.store.find_account_by_email(&email).await.map_err(internal)? {
        let token = JwtKeys::from_ref(&state)
            .sign_password_reset(account.id)
            .map_err(internal)?;
        let reset_url = format!(
            "{}/reset-password?token={}",
            state.config.public_base_url,
            urlencoding::encode(&token)
        );
        if let Err(e) = state
            .mailer
            .send_password_reset(&account.email, &account.username, &reset_url)
            .await
        {
            error!(error = %e, user_id = %account.id, "password reset mail failed");
        }
    }
    Ok(Json(MessageResponse {
        message: FORGOT_PASSWORD_MESSAGE.into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, (StatusCode, String)> {
    let claims = JwtKeys::from_ref(&state)
        .verify_kind(&payload.token, TokenKind::PasswordReset)
        .map_err(|_| {
            (
                StatusCode::BAD_REQUEST,
                "The password reset link is invalid or has expired.".to_string(),
            )
        })?;

    let account = state
        .store
        .find_account(claims.sub)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "User not found.".to_string()))?;

    if let Err(msg) = validate_new_password(&payload.password, &payload.password2) {
        return Err((StatusCode::BAD_REQUEST, msg.into()));
    }

    let hash = hash_password(&payload.password).map_err(internal)?;
    state
        .store
        .update_password_hash(account.id, &hash)
        .await
        .map_err(internal)?;

    info!(user_id = %account.id, "password reset");
    Ok(Json(MessageResponse {
        message: "Your password has been successfully updated! You can now log in.".into(),
    }))
}
