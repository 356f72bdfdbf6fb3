use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::subscriptions::{InsertSubscriptionEntity, SubscriptionEntity};

#[async_trait]
#[automock]
pub trait SubscriptionRepository {
    /// Inserts the subscription unless the user already holds an active one
    /// on the insert's start date; returns None in that case. The check and
    /// the insert are atomic.
    async fn subscribe(
        &self,
        insert_subscription_entity: InsertSubscriptionEntity,
    ) -> Result<Option<SubscriptionEntity>>;
    async fn find_by_id(&self, subscription_id: i64) -> Result<Option<SubscriptionEntity>>;
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<SubscriptionEntity>>;
    async fn list_active_by_user(
        &self,
        user_id: Uuid,
        as_of: NaiveDate,
    ) -> Result<Vec<SubscriptionEntity>>;
    async fn delete(&self, subscription_id: i64) -> Result<()>;
}
