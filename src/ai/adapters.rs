use serde_json::Value;
use time::Date;
use tracing::{info, warn};

use super::{
    client::CompletionClient,
    prompts::{
        calorie_prompt, insight_prompt, meal_plan_prompt, nutrition_prompt, CalorieInputs,
        CALORIE_MAX_TOKENS, INSIGHT_MAX_TOKENS, MEAL_PLAN_MAX_TOKENS, NUTRITION_MAX_TOKENS,
    },
    AdapterError,
};
use crate::{
    auth::repo_types::{Account, Goal},
    nutrition::aggregate::Totals,
    profile::health::{age_on, bmi},
};

/// Free-text description of something the user ate.
pub struct FoodDescription<'a> {
    pub food_name: &'a str,
    pub ingredients: &'a str,
    pub preparation: &'a str,
    pub goal: Option<Goal>,
}

pub struct InsightRequest<'a> {
    pub totals: &'a Totals,
    pub food_count: usize,
    pub calorie_target: Option<i32>,
    pub goal: Option<Goal>,
}

async fn ask(
    llm: &dyn CompletionClient,
    what: &'static str,
    prompt: &str,
    max_tokens: u32,
) -> Result<String, AdapterError> {
    match llm.complete(prompt, max_tokens).await {
        Ok(text) if text.trim().is_empty() => {
            warn!(adapter = what, "empty completion");
            Err(AdapterError::Malformed("empty completion".into()))
        }
        Ok(text) => Ok(text),
        Err(e) => {
            warn!(adapter = what, error = %e, "completion failed");
            Err(AdapterError::Service(e.to_string()))
        }
    }
}

/// Raw JSON text describing the food's nutrition. The text is not validated.
pub async fn analyze_nutrition(
    llm: &dyn CompletionClient,
    food: &FoodDescription<'_>,
) -> Result<String, AdapterError> {
    let prompt = nutrition_prompt(food.food_name, food.ingredients, food.preparation, food.goal);
    ask(llm, "nutrition", &prompt, NUTRITION_MAX_TOKENS).await
}

pub async fn generate_meal_plan(
    llm: &dyn CompletionClient,
    requirements: &str,
    goal: Option<Goal>,
) -> Result<String, AdapterError> {
    let prompt = meal_plan_prompt(requirements, goal);
    ask(llm, "meal_plan", &prompt, MEAL_PLAN_MAX_TOKENS).await
}

/// Raw JSON text with `food_insight`, `calorie_insight` and `tip`; callers supply defaults.
pub async fn daily_insight(
    llm: &dyn CompletionClient,
    req: &InsightRequest<'_>,
) -> Result<String, AdapterError> {
    let prompt = insight_prompt(req.totals, req.food_count, req.calorie_target, req.goal);
    ask(llm, "daily_insight", &prompt, INSIGHT_MAX_TOKENS).await
}

/// Recommended daily calories for the account, computed as of `today`.
///
/// Returns [`AdapterError::Incomplete`] without contacting the service when any
/// physiological field is missing.
pub async fn recommend_calories(
    llm: &dyn CompletionClient,
    account: &Account,
    today: Date,
) -> Result<i32, AdapterError> {
    let weight_kg = account
        .weight_kg
        .filter(|w| *w > 0.0)
        .ok_or(AdapterError::Incomplete("weight"))?;
    let height_cm = account
        .height_cm
        .filter(|h| *h > 0.0)
        .ok_or(AdapterError::Incomplete("height"))?;
    let dob = account.dob.ok_or(AdapterError::Incomplete("date of birth"))?;
    let activity_level =
        non_blank(&account.activity_level).ok_or(AdapterError::Incomplete("activity level"))?;
    let gender = non_blank(&account.gender).ok_or(AdapterError::Incomplete("gender"))?;
    let goal = account.goal.ok_or(AdapterError::Incomplete("goal"))?;

    let prompt = calorie_prompt(&CalorieInputs {
        age: age_on(dob, today),
        gender,
        height_cm,
        weight_kg,
        bmi: bmi(Some(weight_kg), Some(height_cm)),
        activity_level,
        goal,
    });
    let raw = ask(llm, "calorie_target", &prompt, CALORIE_MAX_TOKENS).await?;
    let calories = parse_recommendation(&raw)?;
    info!(user_id = %account.id, calories, "calorie target computed");
    Ok(calories)
}

fn non_blank(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Reads `recommended_calories` as an integer; floats truncate, numeric strings are accepted.
fn parse_recommendation(raw: &str) -> Result<i32, AdapterError> {
    let data: Value = serde_json::from_str(raw)
        .map_err(|e| AdapterError::Malformed(format!("invalid JSON: {e}")))?;
    let field = data
        .get("recommended_calories")
        .ok_or_else(|| AdapterError::Malformed("recommended_calories missing".into()))?;
    let number = match field {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number
        .filter(|n| n.is_finite())
        .map(|n| n.trunc() as i32)
        .ok_or_else(|| AdapterError::Malformed(format!("not a number: {field}")))
}
