use time::{Date, OffsetDateTime};
use tracing::{error, info, warn};

use super::{
    dto::{HealthRequest, HealthResponse},
    health::bmi,
};
use crate::{
    ai::{recommend_calories, CompletionClient},
    auth::{
        repo::AccountRepo,
        repo_types::{Account, HealthUpdate},
    },
    nutrition::repo::HistoryRepo,
    plans::repo::MealPlanRepo,
    storage::{StorageClient, AVATAR_URL_TTL_SECS},
    store::Store,
};

pub const DEFAULT_AVATAR: &str = "/static/profile_pics/default.png";

/// Uploaded picture first, then the external login's picture, then the default.
pub async fn avatar_url(storage: &dyn StorageClient, account: &Account) -> String {
    if let Some(key) = account.avatar_key.as_deref() {
        match storage.presign_get(key, AVATAR_URL_TTL_SECS).await {
            Ok(url) => return url,
            Err(e) => warn!(user_id = %account.id, error = %e, "avatar presign failed"),
        }
    }
    account
        .profile_pic_url
        .clone()
        .unwrap_or_else(|| DEFAULT_AVATAR.to_string())
}

pub fn health_summary(account: &Account, today: Date) -> HealthResponse {
    HealthResponse {
        bmi: bmi(account.weight_kg, account.height_cm),
        recommended_calories: account.recommended_calories,
        max_date: today,
    }
}

pub fn validate_health(req: &HealthRequest, today: Date) -> Result<(), &'static str> {
    if !(req.height_cm.is_finite() && req.height_cm > 0.0) {
        return Err("Height must be a positive number.");
    }
    if !(req.weight_kg.is_finite() && req.weight_kg > 0.0) {
        return Err("Weight must be a positive number.");
    }
    if req.dob > today {
        return Err("Date of birth cannot be in the future.");
    }
    if req.gender.trim().is_empty() || req.activity_level.trim().is_empty() {
        return Err("Please fill in all health details.");
    }
    Ok(())
}

/// Stores the new attributes, then refreshes the calorie target when the model gives one.
pub async fn update_health(
    store: &dyn Store,
    llm: &dyn CompletionClient,
    mut account: Account,
    req: &HealthRequest,
    now: OffsetDateTime,
    today: Date,
) -> anyhow::Result<Account> {
    let update = HealthUpdate {
        dob: req.dob,
        gender: req.gender.trim().to_string(),
        height_cm: req.height_cm,
        weight_kg: req.weight_kg,
        activity_level: req.activity_level.trim().to_string(),
        goal: req.goal,
        updated_at: now,
    };
    store.update_health(account.id, &update).await?;
    account.apply_health(&update);

    match recommend_calories(llm, &account, today).await {
        Ok(calories) => {
            store.set_recommended_calories(account.id, calories).await?;
            account.recommended_calories = Some(calories);
        }
        Err(e) => warn!(user_id = %account.id, error = %e, "keeping previous calorie target"),
    }
    Ok(account)
}

/// History, then meal plans, then the avatar object, then the account row.
pub async fn delete_account(
    store: &dyn Store,
    storage: &dyn StorageClient,
    account: &Account,
) -> anyhow::Result<()> {
    let history = store.delete_history_for_user(account.id).await?;
    let plans = store.delete_plans_for_user(account.id).await?;

    if let Some(key) = account.avatar_key.as_deref() {
        if let Err(e) = storage.delete_object(key).await {
            error!(user_id = %account.id, error = %e, "avatar delete failed");
        }
    }

    store.delete_account(account.id).await?;
    info!(user_id = %account.id, history, plans, "account deleted");
    Ok(())
}
