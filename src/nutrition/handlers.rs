use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{FoodForm, HistoryItem, LoggedFoodResponse},
    repo::HistoryRepo,
    services::{log_food, LogFoodError},
};
use crate::{
    app::internal,
    auth::{jwt::AuthUser, repo::AccountRepo, services::ensure_owner},
    state::AppState,
};

const ANALYZE_FAILED: &str = "Failed to analyze nutrition. Please try again.";

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/history", get(list_history))
        .route("/history/:id", delete(delete_history))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/nutrition", post(analyze_food))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // photos
}

async fn read_food_form(mut mp: Multipart) -> Result<FoodForm, (StatusCode, String)> {
    let bad =
        |e: axum::extract::multipart::MultipartError| (StatusCode::BAD_REQUEST, e.to_string());
    let mut form = FoodForm::default();
    while let Some(field) = mp.next_field().await.map_err(bad)? {
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("food_name") => {
                form.food_name = field.text().await.map_err(bad)?.trim().to_string()
            }
            Some("ingredients") => {
                form.ingredients = field.text().await.map_err(bad)?.trim().to_string()
            }
            Some("preparation") => {
                form.preparation = field.text().await.map_err(bad)?.trim().to_string()
            }
            Some("photo") => form.photo_bytes = field.bytes().await.map_err(bad)?.len(),
            _ => {}
        }
    }
    Ok(form)
}

/// POST /nutrition (multipart)
#[instrument(skip(state, mp))]
pub async fn analyze_food(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mp: Multipart,
) -> Result<(StatusCode, Json<LoggedFoodResponse>), (StatusCode, String)> {
    let form = read_food_form(mp).await?;
    if form.food_name.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Please enter a food name.".into()));
    }
    if form.photo_bytes > 0 {
        info!(%user_id, bytes = form.photo_bytes, "photo received, not analyzed");
    }

    let goal = state
        .store
        .find_account(user_id)
        .await
        .map_err(internal)?
        .and_then(|a| a.goal);

    match log_food(&*state.store, &*state.llm, user_id, goal, &form).await {
        Ok((record, result)) => Ok((
            StatusCode::CREATED,
            Json(LoggedFoodResponse {
                id: record.id,
                food_name: record.food_name,
                created_at: record.created_at,
                result,
            }),
        )),
        Err(LogFoodError::Unavailable) => Err((StatusCode::BAD_GATEWAY, ANALYZE_FAILED.into())),
        Err(LogFoodError::Store(e)) => Err(internal(e)),
    }
}

#[instrument(skip(state))]
pub async fn list_history(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<HistoryItem>>, (StatusCode, String)> {
    let records = state.store.list_history(user_id).await.map_err(internal)?;
    Ok(Json(records.into_iter().map(HistoryItem::from).collect()))
}

#[instrument(skip(state))]
pub async fn delete_history(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let Some(record) = state.store.find_history(id).await.map_err(internal)? else {
        warn!(%user_id, %id, "history record not found");
        return Err((StatusCode::NOT_FOUND, "Record not found".into()));
    };
    ensure_owner(record.user_id, user_id)?;

    state.store.delete_history(id).await.map_err(internal)?;
    info!(%user_id, %id, "history record deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use super::*;
    use crate::{
        app::build_app,
        nutrition::repo_types::NewHistory,
        test_support::{call, multipart_call, register},
    };

    const OATS: &str = r#"{"calories": {"value": 500, "unit": "kcal"}, "protein": {"value": 20, "unit": "g"}, "carbohydrates": {"value": 60, "unit": "g"}, "fats": {"value": 12, "unit": "g"}, "sugars": {"value": 8, "unit": "g"}, "fibre": {"value": 9, "unit": "g"}, "vitamins": [{"name": "Vitamin B1", "value": 0.4, "unit": "mg"}]}"#;

    #[tokio::test]
    async fn logging_food_stores_and_lists_it() {
        let (state, handles) = AppState::fake();
        let app = build_app(state);
        let token = register(&app, "a@b.co").await;
        handles.llm.push_ok(OATS);

        let (status, body) = multipart_call(
            &app,
            "/api/v1/nutrition",
            &token,
            &[("food_name", "Oats"), ("ingredients", "oats, milk"), ("preparation", "")],
            Some(("photo", "bowl.jpg", b"jpeg-bytes".as_slice())),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["result"]["calories"]["value"], 500);

        let (status, body) = call(&app, "GET", "/api/v1/history", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let items = body.as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["fully_parsed"], true);
        assert_eq!(
            items[0]["parsed"]["vitamins"],
            json!({"Vitamin B1": {"value": 0.4, "unit": "mg"}})
        );
    }

    #[tokio::test]
    async fn missing_food_name_is_rejected_before_the_service() {
        let (state, handles) = AppState::fake();
        let app = build_app(state);
        let token = register(&app, "a@b.co").await;

        let (status, _) = multipart_call(
            &app,
            "/api/v1/nutrition",
            &token,
            &[("food_name", "  "), ("ingredients", "oats")],
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(handles.llm.calls(), 0);
    }

    #[tokio::test]
    async fn unusable_estimate_is_bad_gateway() {
        let (state, handles) = AppState::fake();
        let app = build_app(state);
        let token = register(&app, "a@b.co").await;
        handles.llm.push_ok("not json at all");

        let (status, _) = multipart_call(
            &app,
            "/api/v1/nutrition",
            &token,
            &[("food_name", "Oats"), ("ingredients", "oats")],
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);

        let (_, body) = call(&app, "GET", "/api/v1/history", Some(&token), None).await;
        assert!(body.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn partial_record_is_listed_but_not_fully_parsed() {
        let (state, handles) = AppState::fake();
        let app = build_app(state);
        let token = register(&app, "a@b.co").await;
        handles.llm.push_ok(r#"{"calories": {"value": 90, "unit": "kcal"}}"#);

        let apple = [("food_name", "Apple"), ("ingredients", "apple")];
        multipart_call(&app, "/api/v1/nutrition", &token, &apple, None).await;
        let (_, body) = call(&app, "GET", "/api/v1/history", Some(&token), None).await;
        assert_eq!(body[0]["fully_parsed"], false);
        assert!(body[0]["parsed"].is_null());
    }

    #[tokio::test]
    async fn deleting_someone_elses_record_is_forbidden() {
        let (state, handles) = AppState::fake();
        let app = build_app(state);
        let alice = register(&app, "alice@b.co").await;
        let _bob = register(&app, "bob@b.co").await;
        let bob_id = handles
            .store
            .find_account_by_email("bob@b.co")
            .await
            .unwrap()
            .unwrap()
            .id;
        let record = handles
            .store
            .insert_history(NewHistory {
                user_id: bob_id,
                food_name: "Toast",
                ingredients: "bread",
                preparation: None,
                nutrition_result: OATS,
            })
            .await
            .unwrap();

        let uri = format!("/api/v1/history/{}", record.id);
        let (status, _) = call(&app, "DELETE", &uri, Some(&alice), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(handles.store.find_history(record.id).await.unwrap().is_some());

        let missing = format!("/api/v1/history/{}", Uuid::new_v4());
        let (status, _) = call(&app, "DELETE", &missing, Some(&alice), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn owner_can_delete_record() {
        let (state, handles) = AppState::fake();
        let app = build_app(state);
        let token = register(&app, "a@b.co").await;
        handles.llm.push_ok(OATS);
        let oats = [("food_name", "Oats")];
        let (_, body) = multipart_call(&app, "/api/v1/nutrition", &token, &oats, None).await;

        let uri = format!("/api/v1/history/{}", body["id"].as_str().unwrap());
        let (status, _) = call(&app, "DELETE", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, body) = call(&app, "GET", "/api/v1/history", Some(&token), None).await;
        assert!(body.as_array().unwrap().is_empty());
    }
}
