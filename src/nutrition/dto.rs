use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{aggregate::display_result, repo_types::HistoryRecord};

/// Fields collected from the food form.
#[derive(Debug, Default)]
pub struct FoodForm {
    pub food_name: String,
    pub ingredients: String,
    pub preparation: String,
    /// Read and dropped; image analysis is not performed.
    pub photo_bytes: usize,
}

#[derive(Debug, Serialize)]
pub struct LoggedFoodResponse {
    pub id: Uuid,
    pub food_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub result: Value,
}

#[derive(Debug, Serialize)]
pub struct HistoryItem {
    pub id: Uuid,
    pub food_name: String,
    pub ingredients: String,
    pub preparation: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub parsed: Option<Value>,
    pub fully_parsed: bool,
}

impl From<HistoryRecord> for HistoryItem {
    fn from(r: HistoryRecord) -> Self {
        let parsed = display_result(&r.nutrition_result);
        Self {
            id: r.id,
            fully_parsed: parsed.is_some(),
            parsed,
            food_name: r.food_name,
            ingredients: r.ingredients,
            preparation: r.preparation,
            created_at: r.created_at,
        }
    }
}
