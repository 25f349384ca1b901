use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    auth::{
        repo::{AccountRepo, DuplicateEmail},
        repo_types::{Account, HealthUpdate, NewAccount},
    },
    nutrition::{
        repo::HistoryRepo,
        repo_types::{HistoryRecord, NewHistory},
    },
    plans::{
        repo::MealPlanRepo,
        repo_types::{MealPlanRecord, NewMealPlan},
    },
};

#[derive(Default)]
struct Tables {
    accounts: Vec<Account>,
    history: Vec<HistoryRecord>,
    plans: Vec<MealPlanRecord>,
}

/// In-process store for handler tests.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, f: impl FnOnce(&mut Tables) -> R) -> R {
        let mut guard = self.tables.lock().expect("memory store poisoned");
        f(&mut guard)
    }

    fn with_account(&self, id: Uuid, f: impl FnOnce(&mut Account)) -> anyhow::Result<()> {
        self.with(|t| match t.accounts.iter_mut().find(|a| a.id == id) {
            Some(account) => {
                f(account);
                Ok(())
            }
            None => anyhow::bail!("account {id} not found"),
        })
    }

    /// Inserts a history record with an explicit timestamp.
    pub fn insert_history_at(
        &self,
        new: NewHistory<'_>,
        created_at: OffsetDateTime,
    ) -> HistoryRecord {
        let rec = HistoryRecord {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            food_name: new.food_name.to_string(),
            ingredients: new.ingredients.to_string(),
            preparation: new.preparation.map(str::to_string),
            nutrition_result: new.nutrition_result.to_string(),
            created_at,
        };
        self.with(|t| t.history.push(rec.clone()));
        rec
    }
}

fn newest_first<T>(mut rows: Vec<T>, at: impl Fn(&T) -> OffsetDateTime) -> Vec<T> {
    rows.sort_by_key(|r| std::cmp::Reverse(at(r)));
    rows
}

#[async_trait]
impl AccountRepo for MemoryStore {
    async fn find_account(&self, id: Uuid) -> anyhow::Result<Option<Account>> {
        Ok(self.with(|t| t.accounts.iter().find(|a| a.id == id).cloned()))
    }

    async fn find_account_by_email(&self, email: &str) -> anyhow::Result<Option<Account>> {
        Ok(self.with(|t| t.accounts.iter().find(|a| a.email == email).cloned()))
    }

    async fn create_account(&self, new: NewAccount<'_>) -> anyhow::Result<Account> {
        self.with(|t| {
            if t.accounts.iter().any(|a| a.email == new.email) {
                return Err(DuplicateEmail(new.email.to_string()).into());
            }
            let account = Account {
                id: Uuid::new_v4(),
                username: new.username.to_string(),
                email: new.email.to_string(),
                password_hash: new.password_hash.map(str::to_string),
                profile_pic_url: new.profile_pic_url.map(str::to_string),
                avatar_key: None,
                height_cm: None,
                weight_kg: None,
                dob: None,
                gender: None,
                activity_level: None,
                goal: Some(crate::auth::repo_types::Goal::MaintainWeight),
                recommended_calories: None,
                last_health_update: None,
                created_at: OffsetDateTime::now_utc(),
            };
            t.accounts.push(account.clone());
            Ok(account)
        })
    }

    async fn update_username(&self, id: Uuid, username: &str) -> anyhow::Result<()> {
        self.with_account(id, |a| a.username = username.to_string())
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> anyhow::Result<()> {
        self.with_account(id, |a| a.password_hash = Some(password_hash.to_string()))
    }

    async fn update_avatar_key(&self, id: Uuid, key: &str) -> anyhow::Result<()> {
        self.with_account(id, |a| a.avatar_key = Some(key.to_string()))
    }

    async fn update_health(&self, id: Uuid, update: &HealthUpdate) -> anyhow::Result<()> {
        self.with_account(id, |a| a.apply_health(update))
    }

    async fn set_recommended_calories(&self, id: Uuid, calories: i32) -> anyhow::Result<()> {
        self.with_account(id, |a| a.recommended_calories = Some(calories))
    }

    async fn delete_account(&self, id: Uuid) -> anyhow::Result<()> {
        self.with(|t| t.accounts.retain(|a| a.id != id));
        Ok(())
    }
}

#[async_trait]
impl HistoryRepo for MemoryStore {
    async fn insert_history(&self, new: NewHistory<'_>) -> anyhow::Result<HistoryRecord> {
        Ok(self.insert_history_at(new, OffsetDateTime::now_utc()))
    }

    async fn list_history(&self, user_id: Uuid) -> anyhow::Result<Vec<HistoryRecord>> {
        let rows = self.with(|t| {
            t.history
                .iter()
                .filter(|r| r.user_id == user_id)
                .cloned()
                .collect()
        });
        Ok(newest_first(rows, |r: &HistoryRecord| r.created_at))
    }

    async fn list_history_between(
        &self,
        user_id: Uuid,
        from: OffsetDateTime,
        to: OffsetDateTime,
    ) -> anyhow::Result<Vec<HistoryRecord>> {
        let rows = self.with(|t| {
            t.history
                .iter()
                .filter(|r| r.user_id == user_id && r.created_at >= from && r.created_at < to)
                .cloned()
                .collect()
        });
        Ok(newest_first(rows, |r: &HistoryRecord| r.created_at))
    }

    async fn find_history(&self, id: Uuid) -> anyhow::Result<Option<HistoryRecord>> {
        Ok(self.with(|t| t.history.iter().find(|r| r.id == id).cloned()))
    }

    async fn count_history(&self, user_id: Uuid) -> anyhow::Result<i64> {
        Ok(self.with(|t| t.history.iter().filter(|r| r.user_id == user_id).count() as i64))
    }

    async fn delete_history(&self, id: Uuid) -> anyhow::Result<()> {
        self.with(|t| t.history.retain(|r| r.id != id));
        Ok(())
    }

    async fn delete_history_for_user(&self, user_id: Uuid) -> anyhow::Result<u64> {
        Ok(self.with(|t| {
            let before = t.history.len();
            t.history.retain(|r| r.user_id != user_id);
            (before - t.history.len()) as u64
        }))
    }
}

#[async_trait]
impl MealPlanRepo for MemoryStore {
    async fn insert_plan(&self, new: NewMealPlan<'_>) -> anyhow::Result<MealPlanRecord> {
        let rec = MealPlanRecord {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            requirements: new.requirements.to_string(),
            meal_plan_result: new.meal_plan_result.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        self.with(|t| t.plans.push(rec.clone()));
        Ok(rec)
    }

    async fn list_plans(&self, user_id: Uuid) -> anyhow::Result<Vec<MealPlanRecord>> {
        let rows = self.with(|t| {
            t.plans
                .iter()
                .filter(|r| r.user_id == user_id)
                .cloned()
                .collect()
        });
        Ok(newest_first(rows, |r: &MealPlanRecord| r.created_at))
    }

    async fn latest_plan(&self, user_id: Uuid) -> anyhow::Result<Option<MealPlanRecord>> {
        Ok(self.list_plans(user_id).await?.into_iter().next())
    }

    async fn find_plan(&self, id: Uuid) -> anyhow::Result<Option<MealPlanRecord>> {
        Ok(self.with(|t| t.plans.iter().find(|r| r.id == id).cloned()))
    }

    async fn count_plans(&self, user_id: Uuid) -> anyhow::Result<i64> {
        Ok(self.with(|t| t.plans.iter().filter(|r| r.user_id == user_id).count() as i64))
    }

    async fn delete_plan(&self, id: Uuid) -> anyhow::Result<()> {
        self.with(|t| t.plans.retain(|r| r.id != id));
        Ok(())
    }

    async fn delete_plans_for_user(&self, user_id: Uuid) -> anyhow::Result<u64> {
        Ok(self.with(|t| {
            let before = t.plans.len();
            t.plans.retain(|r| r.user_id != user_id);
            (before - t.plans.len()) as u64
        }))
    }
}
