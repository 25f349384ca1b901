use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{PlanItem, PlanRequest},
    repo::MealPlanRepo,
    repo_types::NewMealPlan,
};
use crate::{
    ai::generate_meal_plan,
    app::internal,
    auth::{jwt::AuthUser, repo::AccountRepo, services::ensure_owner},
    state::AppState,
};

const PLAN_FAILED: &str = "Failed to generate meal plan. Please try again.";

pub fn plan_routes() -> Router<AppState> {
    Router::new()
        .route("/plans", get(list_plans).post(create_plan))
        .route("/plans/:id", delete(delete_plan))
}

#[instrument(skip(state, payload))]
pub async fn create_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<PlanRequest>,
) -> Result<(StatusCode, Json<PlanItem>), (StatusCode, String)> {
    let requirements = payload.requirements.trim();
    if requirements.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Please describe your requirements.".into()));
    }

    let goal = state
        .store
        .find_account(user_id)
        .await
        .map_err(internal)?
        .and_then(|a| a.goal);

    let raw = generate_meal_plan(&*state.llm, requirements, goal)
        .await
        .map_err(|_| (StatusCode::BAD_GATEWAY, PLAN_FAILED.to_string()))?;
    let raw = raw.trim();
    if serde_json::from_str::<serde_json::Value>(raw).is_err() {
        warn!(%user_id, "meal plan is not JSON");
        return Err((StatusCode::BAD_GATEWAY, PLAN_FAILED.into()));
    }

    let record = state
        .store
        .insert_plan(NewMealPlan {
            user_id,
            requirements,
            meal_plan_result: raw,
        })
        .await
        .map_err(internal)?;
    info!(%user_id, plan_id = %record.id, "meal plan created");
    Ok((StatusCode::CREATED, Json(PlanItem::from(record))))
}

#[instrument(skip(state))]
pub async fn list_plans(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<PlanItem>>, (StatusCode, String)> {
    let plans = state.store.list_plans(user_id).await.map_err(internal)?;
    Ok(Json(plans.into_iter().map(PlanItem::from).collect()))
}

#[instrument(skip(state))]
pub async fn delete_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let Some(plan) = state.store.find_plan(id).await.map_err(internal)? else {
        return Err((StatusCode::NOT_FOUND, "Meal plan not found".into()));
    };
    ensure_owner(plan.user_id, user_id)?;

    state.store.delete_plan(id).await.map_err(internal)?;
    info!(%user_id, %id, "meal plan deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use super::*;
    use crate::{
        app::build_app,
        test_support::{call, register},
    };

    const PLAN: &str = r#"{"meal_name": "Chickpea bowl", "ingredients": ["chickpeas", "rice"], "preparation": "Simmer.", "nutrition": {"calories": 610, "protein": 25, "carbs": 80, "fats": 14, "sugars": 6, "fibre": 12}, "insights": "Good fibre."}"#;

    #[tokio::test]
    async fn create_list_and_delete_plan() {
        let (state, handles) = AppState::fake();
        let app = build_app(state);
        let token = register(&app, "a@b.co").await;
        handles.llm.push_ok(PLAN);

        let (status, created) = call(
            &app,
            "POST",
            "/api/v1/plans",
            Some(&token),
            Some(json!({"requirements": "vegetarian lunch"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["plan"]["meal_name"], "Chickpea bowl");

        let (_, list) = call(&app, "GET", "/api/v1/plans", Some(&token), None).await;
        assert_eq!(list.as_array().unwrap().len(), 1);

        let uri = format!("/api/v1/plans/{}", created["id"].as_str().unwrap());
        let (status, _) = call(&app, "DELETE", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, list) = call(&app, "GET", "/api/v1/plans", Some(&token), None).await;
        assert!(list.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_generation_persists_nothing() {
        let (state, handles) = AppState::fake();
        let app = build_app(state);
        let token = register(&app, "a@b.co").await;
        handles.llm.push_err("rate limited");
        handles.llm.push_ok("Here is your plan: eat well");

        for _ in 0..2 {
            let (status, body) = call(
                &app,
                "POST",
                "/api/v1/plans",
                Some(&token),
                Some(json!({"requirements": "low carb"})),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_GATEWAY);
            assert_eq!(body, json!(PLAN_FAILED));
        }
        let (_, list) = call(&app, "GET", "/api/v1/plans", Some(&token), None).await;
        assert!(list.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn plans_of_other_accounts_cannot_be_deleted() {
        let (state, handles) = AppState::fake();
        let app = build_app(state);
        let alice = register(&app, "alice@b.co").await;
        let bob = register(&app, "bob@b.co").await;
        handles.llm.push_ok(PLAN);
        let (_, created) = call(
            &app,
            "POST",
            "/api/v1/plans",
            Some(&bob),
            Some(json!({"requirements": "anything"})),
        )
        .await;

        let uri = format!("/api/v1/plans/{}", created["id"].as_str().unwrap());
        let (status, _) = call(&app, "DELETE", &uri, Some(&alice), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (_, list) = call(&app, "GET", "/api/v1/plans", Some(&bob), None).await;
        assert_eq!(list.as_array().unwrap().len(), 1);
    }
}
