use anyhow::Context;
use async_trait::async_trait;
use uuid::Uuid;

use super::repo_types::{Account, AccountRow, HealthUpdate, NewAccount};
use crate::store::PgStore;

const ACCOUNT_COLUMNS: &str = r#"
    id, username, email, password_hash, profile_pic_url, avatar_key,
    height_cm, weight_kg, dob, gender, activity_level, goal,
    recommended_calories, last_health_update, created_at
"#;

/// Another account already holds the email.
#[derive(Debug, thiserror::Error)]
#[error("email already registered: {0}")]
pub struct DuplicateEmail(pub String);

#[async_trait]
pub trait AccountRepo: Send + Sync {
    async fn find_account(&self, id: Uuid) -> anyhow::Result<Option<Account>>;
    async fn find_account_by_email(&self, email: &str) -> anyhow::Result<Option<Account>>;
    async fn create_account(&self, new: NewAccount<'_>) -> anyhow::Result<Account>;
    async fn update_username(&self, id: Uuid, username: &str) -> anyhow::Result<()>;
    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> anyhow::Result<()>;
    async fn update_avatar_key(&self, id: Uuid, key: &str) -> anyhow::Result<()>;
    async fn update_health(&self, id: Uuid, update: &HealthUpdate) -> anyhow::Result<()>;
    async fn set_recommended_calories(&self, id: Uuid, calories: i32) -> anyhow::Result<()>;
    async fn delete_account(&self, id: Uuid) -> anyhow::Result<()>;
}

#[async_trait]
impl AccountRepo for PgStore {
    async fn find_account(&self, id: Uuid) -> anyhow::Result<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find account")?;
        Ok(row.map(Account::from))
    }

    async fn find_account_by_email(&self, email: &str) -> anyhow::Result<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find account by email")?;
        Ok(row.map(Account::from))
    }

    async fn create_account(&self, new: NewAccount<'_>) -> anyhow::Result<Account> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            r#"
            INSERT INTO users (username, email, password_hash, profile_pic_url)
            VALUES ($1, $2, $3, $4)
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(new.username)
        .bind(new.email)
        .bind(new.password_hash)
        .bind(new.profile_pic_url)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    return anyhow::Error::new(DuplicateEmail(new.email.to_string()));
                }
            }
            anyhow::Error::new(e).context("insert account")
        })?;
        Ok(row.into())
    }

    async fn update_username(&self, id: Uuid, username: &str) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET username = $2 WHERE id = $1")
            .bind(id)
            .bind(username)
            .execute(&self.db)
            .await
            .context("update username")?;
        Ok(())
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.db)
            .await
            .context("update password hash")?;
        Ok(())
    }

    async fn update_avatar_key(&self, id: Uuid, key: &str) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET avatar_key = $2 WHERE id = $1")
            .bind(id)
            .bind(key)
            .execute(&self.db)
            .await
            .context("update avatar key")?;
        Ok(())
    }

    async fn update_health(&self, id: Uuid, update: &HealthUpdate) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
               SET dob = $2, gender = $3, height_cm = $4, weight_kg = $5,
                   activity_level = $6, goal = $7, last_health_update = $8
             WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(update.dob)
        .bind(&update.gender)
        .bind(update.height_cm)
        .bind(update.weight_kg)
        .bind(&update.activity_level)
        .bind(update.goal.as_str())
        .bind(update.updated_at)
        .execute(&self.db)
        .await
        .context("update health details")?;
        Ok(())
    }

    async fn set_recommended_calories(&self, id: Uuid, calories: i32) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET recommended_calories = $2 WHERE id = $1")
            .bind(id)
            .bind(calories)
            .execute(&self.db)
            .await
            .context("update recommended calories")?;
        Ok(())
    }

    async fn delete_account(&self, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete account")?;
        Ok(())
    }
}
