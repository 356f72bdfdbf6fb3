use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::visits::VisitEntity,
    value_objects::{plans::VisitPricing, visits::NewVisitModel},
};

#[async_trait]
#[automock]
pub trait VisitRepository {
    /// Counts the subscription's visits in the current calendar month and
    /// inserts the new visit with the priced cost, both inside one
    /// transaction. Returns the stored visit together with the month's
    /// visit count before it was recorded.
    async fn record_costed(
        &self,
        new_visit: NewVisitModel,
        pricing: VisitPricing,
    ) -> Result<(VisitEntity, i64)>;
    async fn count_for_subscription(&self, subscription_id: i64) -> Result<i64>;
    async fn count_for_subscription_since(
        &self,
        subscription_id: i64,
        since: DateTime<Utc>,
    ) -> Result<i64>;
    async fn sum_charges_since(&self, subscription_id: i64, since: DateTime<Utc>) -> Result<i64>;
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<VisitEntity>>;
}
