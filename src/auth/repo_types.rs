use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use tracing::warn;
use uuid::Uuid;

/// Dietary objective that steers prompts and calorie targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Goal {
    #[serde(rename = "Weight Loss")]
    WeightLoss,
    #[serde(rename = "Weight Gain")]
    WeightGain,
    #[serde(rename = "Maintain Weight")]
    MaintainWeight,
}

impl Goal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Goal::WeightLoss => "Weight Loss",
            Goal::WeightGain => "Weight Gain",
            Goal::MaintainWeight => "Maintain Weight",
        }
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Goal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Weight Loss" => Ok(Goal::WeightLoss),
            "Weight Gain" => Ok(Goal::WeightGain),
            "Maintain Weight" => Ok(Goal::MaintainWeight),
            other => anyhow::bail!("unknown goal {other:?}"),
        }
    }
}

/// Account as the rest of the service sees it.
#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>, // None for Google-created accounts
    pub profile_pic_url: Option<String>,
    #[serde(skip_serializing)]
    pub avatar_key: Option<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    #[serde(with = "crate::iso_date::option")]
    pub dob: Option<Date>,
    pub gender: Option<String>,
    pub activity_level: Option<String>,
    pub goal: Option<Goal>,
    pub recommended_calories: Option<i32>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_health_update: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// `users` row; `goal` is free text in the table.
#[derive(Debug, FromRow)]
pub struct AccountRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub profile_pic_url: Option<String>,
    pub avatar_key: Option<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub dob: Option<Date>,
    pub gender: Option<String>,
    pub activity_level: Option<String>,
    pub goal: Option<String>,
    pub recommended_calories: Option<i32>,
    pub last_health_update: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

impl From<AccountRow> for Account {
    fn from(r: AccountRow) -> Self {
        let goal = r.goal.as_deref().and_then(|g| match g.parse::<Goal>() {
            Ok(goal) => Some(goal),
            Err(e) => {
                warn!(user_id = %r.id, error = %e, "ignoring stored goal");
                None
            }
        });
        Self {
            id: r.id,
            username: r.username,
            email: r.email,
            password_hash: r.password_hash,
            profile_pic_url: r.profile_pic_url,
            avatar_key: r.avatar_key,
            height_cm: r.height_cm,
            weight_kg: r.weight_kg,
            dob: r.dob,
            gender: r.gender,
            activity_level: r.activity_level,
            goal,
            recommended_calories: r.recommended_calories,
            last_health_update: r.last_health_update,
            created_at: r.created_at,
        }
    }
}

pub struct NewAccount<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: Option<&'a str>,
    pub profile_pic_url: Option<&'a str>,
}

/// Physiological attributes submitted from the health-details form.
#[derive(Debug, Clone)]
pub struct HealthUpdate {
    pub dob: Date,
    pub gender: String,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub activity_level: String,
    pub goal: Goal,
    pub updated_at: OffsetDateTime,
}

impl Account {
    pub fn apply_health(&mut self, update: &HealthUpdate) {
        self.dob = Some(update.dob);
        self.gender = Some(update.gender.clone());
        self.height_cm = Some(update.height_cm);
        self.weight_kg = Some(update.weight_kg);
        self.activity_level = Some(update.activity_level.clone());
        self.goal = Some(update.goal);
        self.last_health_update = Some(update.updated_at);
    }
}
