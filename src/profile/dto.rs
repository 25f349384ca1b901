use serde::{Deserialize, Serialize};
use time::Date;

use crate::auth::repo_types::{Account, Goal};

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: Account,
    pub history_count: i64,
    pub meals_count: i64,
    pub total_calories: f64,
    pub profile_pic: String,
}

#[derive(Debug, Deserialize)]
pub struct UsernameRequest {
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct HealthRequest {
    #[serde(with = "crate::iso_date")]
    pub dob: Date,
    pub gender: String,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub activity_level: String,
    pub goal: Goal,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub bmi: Option<f64>,
    pub recommended_calories: Option<i32>,
    /// Latest selectable birth date.
    #[serde(with = "crate::iso_date")]
    pub max_date: Date,
}

#[derive(Debug, Serialize)]
pub struct AvatarResponse {
    pub profile_pic: String,
}
