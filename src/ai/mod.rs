//! Adapters over the external text-generation service.

mod adapters;
mod client;
mod prompts;

pub use adapters::{
    analyze_nutrition, daily_insight, generate_meal_plan, recommend_calories, FoodDescription,
    InsightRequest,
};
#[cfg(test)]
pub use client::ScriptedCompletion;
pub use client::{CompletionClient, OpenAiClient};

/// Why an adapter produced no result.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("profile incomplete: {0} missing")]
    Incomplete(&'static str),
    #[error("completion service failed: {0}")]
    Service(String),
    #[error("unusable completion: {0}")]
    Malformed(String),
}
