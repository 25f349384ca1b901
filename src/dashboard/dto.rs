use serde::{Deserialize, Serialize};

use crate::{
    nutrition::aggregate::{RecentEntry, Totals},
    plans::dto::PlanItem,
};

/// Insight texts shown on the dashboard; any key the model leaves out keeps its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyInsight {
    #[serde(default = "default_food_insight")]
    pub food_insight: String,
    #[serde(default = "default_calorie_insight")]
    pub calorie_insight: String,
    #[serde(default = "default_tip")]
    pub tip: String,
}

fn default_food_insight() -> String {
    "Log your first food to get a daily insight!".into()
}

fn default_calorie_insight() -> String {
    "Your calorie summary will appear here.".into()
}

fn default_tip() -> String {
    "Ready for a new day! Analyze a meal to get started.".into()
}

impl Default for DailyInsight {
    fn default() -> Self {
        Self {
            food_insight: default_food_insight(),
            calorie_insight: default_calorie_insight(),
            tip: default_tip(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub username: String,
    pub totals: Totals,
    pub total_count: usize,
    pub recent_entries: Vec<RecentEntry>,
    pub insight: DailyInsight,
    pub recommended_calories: Option<i32>,
    pub recent_meal: Option<PlanItem>,
    pub show_setup_prompt: bool,
    pub show_update_prompt: bool,
}
