use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use bytes::Bytes;
use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{
        AvatarResponse, ChangePasswordRequest, HealthRequest, HealthResponse, ProfileResponse,
        UsernameRequest,
    },
    services::{avatar_url, delete_account, health_summary, update_health, validate_health},
};
use crate::{
    app::internal,
    auth::{
        dto::MessageResponse,
        jwt::AuthUser,
        password::{hash_password, validate_new_password, verify_password},
        repo::AccountRepo,
        repo_types::Account,
    },
    nutrition::{aggregate::total_calories, repo::HistoryRepo},
    plans::repo::MealPlanRepo,
    state::AppState,
    storage::{avatar_key, avatar_kind},
};

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile))
        .route("/profile/username", put(change_username))
        .route("/profile/password", put(change_password))
        .route("/profile/health", get(get_health).put(put_health))
        .route("/account", delete(remove_account))
}

pub fn upload_routes() -> Router<AppState> {
    Router::new()
        .route("/profile/avatar", post(upload_avatar))
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
}

async fn load_account(state: &AppState, user_id: Uuid) -> Result<Account, (StatusCode, String)> {
    state
        .store
        .find_account(user_id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::UNAUTHORIZED, "User not found".to_string()))
}

fn local_today(state: &AppState, now: OffsetDateTime) -> time::Date {
    now.to_offset(state.config.utc_offset).date()
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ProfileResponse>, (StatusCode, String)> {
    let account = load_account(&state, user_id).await?;
    let history = state.store.list_history(user_id).await.map_err(internal)?;
    let meals_count = state.store.count_plans(user_id).await.map_err(internal)?;
    let profile_pic = avatar_url(&*state.storage, &account).await;

    Ok(Json(ProfileResponse {
        history_count: history.len() as i64,
        meals_count,
        total_calories: total_calories(&history),
        profile_pic,
        user: account,
    }))
}

/// POST /profile/avatar (multipart `profile_pic`)
#[instrument(skip(state, mp))]
pub async fn upload_avatar(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut mp: Multipart,
) -> Result<Json<AvatarResponse>, (StatusCode, String)> {
    let mut upload: Option<(String, Bytes)> = None;
    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?
    {
        if field.name() == Some("profile_pic") {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
            upload = Some((file_name, data));
        }
    }
    let Some((file_name, data)) = upload else {
        return Err((StatusCode::BAD_REQUEST, "profile_pic is required".into()));
    };
    let Some((ext, content_type)) = avatar_kind(&file_name).filter(|_| !data.is_empty()) else {
        warn!(%user_id, %file_name, "rejected avatar upload");
        return Err((
            StatusCode::BAD_REQUEST,
            "Invalid file type. Only PNG/JPG allowed.".into(),
        ));
    };

    let account = load_account(&state, user_id).await?;
    let key = avatar_key(user_id, ext);
    state
        .storage
        .put_object(&key, data, content_type)
        .await
        .map_err(internal)?;
    state
        .store
        .update_avatar_key(user_id, &key)
        .await
        .map_err(internal)?;

    if let Some(old) = account.avatar_key.as_deref().filter(|old| *old != key) {
        if let Err(e) = state.storage.delete_object(old).await {
            warn!(%user_id, error = %e, "old avatar not removed");
        }
    }

    let updated = Account {
        avatar_key: Some(key),
        ..account
    };
    info!(%user_id, "profile picture updated");
    Ok(Json(AvatarResponse {
        profile_pic: avatar_url(&*state.storage, &updated).await,
    }))
}

#[instrument(skip(state, payload))]
pub async fn change_username(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UsernameRequest>,
) -> Result<Json<MessageResponse>, (StatusCode, String)> {
    let username = payload.username.trim();
    if username.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Username cannot be empty.".into()));
    }
    state
        .store
        .update_username(user_id, username)
        .await
        .map_err(internal)?;
    Ok(Json(MessageResponse {
        message: "Username updated.".into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, (StatusCode, String)> {
    let account = load_account(&state, user_id).await?;
    let Some(current_hash) = account.password_hash.as_deref() else {
        return Err((
            StatusCode::BAD_REQUEST,
            "Password cannot be changed for accounts signed in with Google.".into(),
        ));
    };
    if !verify_password(&payload.current_password, current_hash).map_err(internal)? {
        warn!(%user_id, "incorrect current password");
        return Err((StatusCode::UNAUTHORIZED, "Incorrect current password.".into()));
    }
    if let Err(msg) = validate_new_password(&payload.new_password, &payload.new_password) {
        return Err((StatusCode::BAD_REQUEST, msg.into()));
    }

    let hash = hash_password(&payload.new_password).map_err(internal)?;
    state
        .store
        .update_password_hash(user_id, &hash)
        .await
        .map_err(internal)?;
    info!(%user_id, "password changed");
    Ok(Json(MessageResponse {
        message: "Password changed successfully.".into(),
    }))
}

#[instrument(skip(state))]
pub async fn get_health(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<HealthResponse>, (StatusCode, String)> {
    let account = load_account(&state, user_id).await?;
    Ok(Json(health_summary(&account, local_today(&state, OffsetDateTime::now_utc()))))
}

#[instrument(skip(state, payload))]
pub async fn put_health(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<HealthRequest>,
) -> Result<Json<HealthResponse>, (StatusCode, String)> {
    let now = OffsetDateTime::now_utc();
    let today = local_today(&state, now);
    if let Err(msg) = validate_health(&payload, today) {
        return Err((StatusCode::BAD_REQUEST, msg.into()));
    }

    let account = load_account(&state, user_id).await?;
    let account = update_health(&*state.store, &*state.llm, account, &payload, now, today)
        .await
        .map_err(internal)?;
    info!(%user_id, "health details updated");
    Ok(Json(health_summary(&account, today)))
}

#[instrument(skip(state))]
pub async fn remove_account(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<StatusCode, (StatusCode, String)> {
    let account = load_account(&state, user_id).await?;
    delete_account(&*state.store, &*state.storage, &account)
        .await
        .map_err(internal)?;
    Ok(StatusCode::NO_CONTENT)
}
