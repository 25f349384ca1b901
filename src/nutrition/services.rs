use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::FoodForm,
    repo::HistoryRepo,
    repo_types::{HistoryRecord, NewHistory},
};
use crate::{
    ai::{analyze_nutrition, CompletionClient, FoodDescription},
    auth::repo_types::Goal,
};

#[derive(Debug, thiserror::Error)]
pub enum LogFoodError {
    #[error("nutrition estimate unavailable")]
    Unavailable,
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Asks for an estimate and stores it only when it parses as JSON.
pub async fn log_food<S: HistoryRepo + ?Sized>(
    store: &S,
    llm: &dyn CompletionClient,
    user_id: Uuid,
    goal: Option<Goal>,
    form: &FoodForm,
) -> Result<(HistoryRecord, Value), LogFoodError> {
    let food = FoodDescription {
        food_name: &form.food_name,
        ingredients: &form.ingredients,
        preparation: &form.preparation,
        goal,
    };
    let raw = analyze_nutrition(llm, &food)
        .await
        .map_err(|_| LogFoodError::Unavailable)?;

    let parsed: Value = serde_json::from_str(raw.trim()).map_err(|e| {
        warn!(%user_id, error = %e, "nutrition estimate is not JSON");
        LogFoodError::Unavailable
    })?;

    let preparation = Some(form.preparation.as_str()).filter(|p| !p.is_empty());
    let record = store
        .insert_history(NewHistory {
            user_id,
            food_name: &form.food_name,
            ingredients: &form.ingredients,
            preparation,
            nutrition_result: raw.trim(),
        })
        .await?;
    info!(%user_id, record_id = %record.id, "food logged");
    Ok((record, parsed))
}
