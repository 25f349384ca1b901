use time::{Duration, OffsetDateTime, UtcOffset};
use tracing::warn;

use super::dto::{DailyInsight, DashboardResponse};
use crate::{
    ai::{daily_insight, CompletionClient, InsightRequest},
    auth::repo_types::Account,
    nutrition::{
        aggregate::{day_bounds, summarize_day},
        repo::HistoryRepo,
    },
    plans::{dto::PlanItem, repo::MealPlanRepo},
    store::Store,
};

/// Health data older than this prompts the user to update it.
pub const HEALTH_REFRESH_AFTER: Duration = Duration::days(7);

impl DailyInsight {
    /// Defaults for anything missing; the whole completion is ignored when it is not a JSON object.
    pub fn from_completion(raw: &str) -> Self {
        serde_json::from_str(raw.trim()).unwrap_or_else(|e| {
            warn!(error = %e, "insight completion unusable");
            Self::default()
        })
    }
}

pub fn needs_setup(account: &Account) -> bool {
    account.weight_kg.map_or(true, |w| w == 0.0)
}

pub fn needs_update(account: &Account, now: OffsetDateTime) -> bool {
    account
        .last_health_update
        .is_some_and(|at| now - at >= HEALTH_REFRESH_AFTER)
}

pub async fn build_dashboard(
    store: &dyn Store,
    llm: &dyn CompletionClient,
    account: &Account,
    now: OffsetDateTime,
    offset: UtcOffset,
) -> anyhow::Result<DashboardResponse> {
    let (from, to) = day_bounds(now, offset);
    let today = store.list_history_between(account.id, from, to).await?;
    let summary = summarize_day(&today, offset);

    let insight = if summary.total_count > 0 {
        let req = InsightRequest {
            totals: &summary.totals,
            food_count: summary.total_count,
            calorie_target: account.recommended_calories,
            goal: account.goal,
        };
        match daily_insight(llm, &req).await {
            Ok(raw) => DailyInsight::from_completion(&raw),
            Err(_) => DailyInsight::default(),
        }
    } else {
        DailyInsight::default()
    };

    let recent_meal = store.latest_plan(account.id).await?.map(PlanItem::from);

    Ok(DashboardResponse {
        username: account.username.clone(),
        totals: summary.totals,
        total_count: summary.total_count,
        recent_entries: summary.recent_entries,
        insight,
        recommended_calories: account.recommended_calories,
        recent_meal,
        show_setup_prompt: needs_setup(account),
        show_update_prompt: needs_update(account, now),
    })
}
