use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// One stored nutrition estimate; `nutrition_result` is the completion text verbatim.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct HistoryRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub food_name: String,
    pub ingredients: String,
    pub preparation: Option<String>,
    pub nutrition_result: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

pub struct NewHistory<'a> {
    pub user_id: Uuid,
    pub food_name: &'a str,
    pub ingredients: &'a str,
    pub preparation: Option<&'a str>,
    pub nutrition_result: &'a str,
}
