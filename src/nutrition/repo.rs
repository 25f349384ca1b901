use anyhow::Context;
use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{HistoryRecord, NewHistory};
use crate::store::PgStore;

#[async_trait]
pub trait HistoryRepo: Send + Sync {
    async fn insert_history(&self, new: NewHistory<'_>) -> anyhow::Result<HistoryRecord>;
    /// Newest first.
    async fn list_history(&self, user_id: Uuid) -> anyhow::Result<Vec<HistoryRecord>>;
    /// Records with `from <= created_at < to`, newest first.
    async fn list_history_between(
        &self,
        user_id: Uuid,
        from: OffsetDateTime,
        to: OffsetDateTime,
    ) -> anyhow::Result<Vec<HistoryRecord>>;
    async fn find_history(&self, id: Uuid) -> anyhow::Result<Option<HistoryRecord>>;
    async fn count_history(&self, user_id: Uuid) -> anyhow::Result<i64>;
    async fn delete_history(&self, id: Uuid) -> anyhow::Result<()>;
    async fn delete_history_for_user(&self, user_id: Uuid) -> anyhow::Result<u64>;
}

#[async_trait]
impl HistoryRepo for PgStore {
    async fn insert_history(&self, new: NewHistory<'_>) -> anyhow::Result<HistoryRecord> {
        let rec = sqlx::query_as::<_, HistoryRecord>(
            r#"
            INSERT INTO history (user_id, food_name, ingredients, preparation, nutrition_result)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, food_name, ingredients, preparation, nutrition_result, created_at
            "#,
        )
        .bind(new.user_id)
        .bind(new.food_name)
        .bind(new.ingredients)
        .bind(new.preparation)
        .bind(new.nutrition_result)
        .fetch_one(&self.db)
        .await
        .context("insert history")?;
        Ok(rec)
    }

    async fn list_history(&self, user_id: Uuid) -> anyhow::Result<Vec<HistoryRecord>> {
        let rows = sqlx::query_as::<_, HistoryRecord>(
            r#"
            SELECT id, user_id, food_name, ingredients, preparation, nutrition_result, created_at
              FROM history
             WHERE user_id = $1
             ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .context("list history")?;
        Ok(rows)
    }

    async fn list_history_between(
        &self,
        user_id: Uuid,
        from: OffsetDateTime,
        to: OffsetDateTime,
    ) -> anyhow::Result<Vec<HistoryRecord>> {
        let rows = sqlx::query_as::<_, HistoryRecord>(
            r#"
            SELECT id, user_id, food_name, ingredients, preparation, nutrition_result, created_at
              FROM history
             WHERE user_id = $1 AND created_at >= $2 AND created_at < $3
             ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.db)
        .await
        .context("list history in window")?;
        Ok(rows)
    }

    async fn find_history(&self, id: Uuid) -> anyhow::Result<Option<HistoryRecord>> {
        let row = sqlx::query_as::<_, HistoryRecord>(
            r#"
            SELECT id, user_id, food_name, ingredients, preparation, nutrition_result, created_at
              FROM history
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find history")?;
        Ok(row)
    }

    async fn count_history(&self, user_id: Uuid) -> anyhow::Result<i64> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM history WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.db)
            .await
            .context("count history")?;
        Ok(n)
    }

    async fn delete_history(&self, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM history WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete history")?;
        Ok(())
    }

    async fn delete_history_for_user(&self, user_id: Uuid) -> anyhow::Result<u64> {
        let res = sqlx::query("DELETE FROM history WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.db)
            .await
            .context("delete history for user")?;
        Ok(res.rows_affected())
    }
}
