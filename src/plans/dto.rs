use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::MealPlanRecord;

#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    pub requirements: String,
}

#[derive(Debug, Serialize)]
pub struct PlanItem {
    pub id: Uuid,
    pub requirements: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Stored plan as JSON; `{}` when it no longer parses.
    pub plan: Value,
}

impl From<MealPlanRecord> for PlanItem {
    fn from(r: MealPlanRecord) -> Self {
        Self {
            plan: parse_plan(&r.meal_plan_result),
            id: r.id,
            requirements: r.requirements,
            created_at: r.created_at,
        }
    }
}

pub fn parse_plan(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::Object(Default::default()))
}
