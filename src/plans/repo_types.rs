use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MealPlanRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub requirements: String,
    pub meal_plan_result: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

pub struct NewMealPlan<'a> {
    pub user_id: Uuid,
    pub requirements: &'a str,
    pub meal_plan_result: &'a str,
}
