use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use time::OffsetDateTime;
use tracing::instrument;

use super::{dto::DashboardResponse, services::build_dashboard};
use crate::{
    app::internal,
    auth::{jwt::AuthUser, repo::AccountRepo},
    state::AppState,
};

pub fn dashboard_routes() -> Router<AppState> {
    Router::new().route("/dashboard", get(get_dashboard))
}

#[instrument(skip(state))]
pub async fn get_dashboard(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<DashboardResponse>, (StatusCode, String)> {
    let account = state
        .store
        .find_account(user_id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::UNAUTHORIZED, "User not found".to_string()))?;

    let dashboard = build_dashboard(
        &*state.store,
        &*state.llm,
        &account,
        OffsetDateTime::now_utc(),
        state.config.utc_offset,
    )
    .await
    .map_err(internal)?;
    Ok(Json(dashboard))
}
