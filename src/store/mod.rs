use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::warn;

use crate::{auth::repo::AccountRepo, nutrition::repo::HistoryRepo, plans::repo::MealPlanRepo};

#[cfg(test)]
pub mod memory;

/// Everything handlers persist goes through this.
pub trait Store: AccountRepo + HistoryRepo + MealPlanRepo {}

impl<T> Store for T where T: AccountRepo + HistoryRepo + MealPlanRepo {}

/// Postgres-backed store; the repository impls live next to their domain types.
#[derive(Clone)]
pub struct PgStore {
    pub db: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { db })
    }

    pub async fn migrate(&self) {
        if let Err(e) = sqlx::migrate!("./migrations").run(&self.db).await {
            warn!(error = %e, "migration failed; continuing");
        }
    }
}
