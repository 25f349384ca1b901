use anyhow::Context;
use async_trait::async_trait;
use uuid::Uuid;

use super::repo_types::{MealPlanRecord, NewMealPlan};
use crate::store::PgStore;

#[async_trait]
pub trait MealPlanRepo: Send + Sync {
    async fn insert_plan(&self, new: NewMealPlan<'_>) -> anyhow::Result<MealPlanRecord>;
    /// Newest first.
    async fn list_plans(&self, user_id: Uuid) -> anyhow::Result<Vec<MealPlanRecord>>;
    async fn latest_plan(&self, user_id: Uuid) -> anyhow::Result<Option<MealPlanRecord>>;
    async fn find_plan(&self, id: Uuid) -> anyhow::Result<Option<MealPlanRecord>>;
    async fn count_plans(&self, user_id: Uuid) -> anyhow::Result<i64>;
    async fn delete_plan(&self, id: Uuid) -> anyhow::Result<()>;
    async fn delete_plans_for_user(&self, user_id: Uuid) -> anyhow::Result<u64>;
}

#[async_trait]
impl MealPlanRepo for PgStore {
    async fn insert_plan(&self, new: NewMealPlan<'_>) -> anyhow::Result<MealPlanRecord> {
        let rec = sqlx::query_as::<_, MealPlanRecord>(
            r#"
            INSERT INTO meal_plans (user_id, requirements, meal_plan_result)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, requirements, meal_plan_result, created_at
            "#,
        )
        .bind(new.user_id)
        .bind(new.requirements)
        .bind(new.meal_plan_result)
        .fetch_one(&self.db)
        .await
        .context("insert meal plan")?;
        Ok(rec)
    }

    async fn list_plans(&self, user_id: Uuid) -> anyhow::Result<Vec<MealPlanRecord>> {
        let rows = sqlx::query_as::<_, MealPlanRecord>(
            r#"
            SELECT id, user_id, requirements, meal_plan_result, created_at
              FROM meal_plans
             WHERE user_id = $1
             ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .context("list meal plans")?;
        Ok(rows)
    }

    async fn latest_plan(&self, user_id: Uuid) -> anyhow::Result<Option<MealPlanRecord>> {
        let row = sqlx::query_as::<_, MealPlanRecord>(
            r#"
            SELECT id, user_id, requirements, meal_plan_result, created_at
              FROM meal_plans
             WHERE user_id = $1
             ORDER BY created_at DESC
             LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .context("latest meal plan")?;
        Ok(row)
    }

    async fn find_plan(&self, id: Uuid) -> anyhow::Result<Option<MealPlanRecord>> {
        let row = sqlx::query_as::<_, MealPlanRecord>(
            r#"
            SELECT id, user_id, requirements, meal_plan_result, created_at
              FROM meal_plans
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find meal plan")?;
        Ok(row)
    }

    async fn count_plans(&self, user_id: Uuid) -> anyhow::Result<i64> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM meal_plans WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.db)
            .await
            .context("count meal plans")?;
        Ok(n)
    }

    async fn delete_plan(&self, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM meal_plans WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete meal plan")?;
        Ok(())
    }

    async fn delete_plans_for_user(&self, user_id: Uuid) -> anyhow::Result<u64> {
        let res = sqlx::query("DELETE FROM meal_plans WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.db)
            .await
            .context("delete meal plans for user")?;
        Ok(res.rows_affected())
    }
}
