use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::{RunQueryDsl, delete, insert_into, prelude::*};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{
        entities::subscriptions::{InsertSubscriptionEntity, SubscriptionEntity},
        repositories::subscriptions::SubscriptionRepository,
    },
    infrastructure::postgres::{postgres_connection::PgPoolSquad, schema::subscriptions},
};

pub struct SubscriptionPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl SubscriptionPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl SubscriptionRepository for SubscriptionPostgres {
    async fn subscribe(
        &self,
        insert_subscription_entity: InsertSubscriptionEntity,
    ) -> Result<Option<SubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        // The active-check and the insert must observe one snapshot, or two
        // concurrent subscribes for the same user could both pass the check.
        let result = conn.build_transaction().serializable().run(|conn| {
            let existing = subscriptions::table
                .filter(subscriptions::user_id.eq(insert_subscription_entity.user_id))
                .filter(subscriptions::end_date.ge(insert_subscription_entity.start_date))
                .select(subscriptions::id)
                .first::<i64>(conn)
                .optional()?;

            if existing.is_some() {
                return Ok::<Option<SubscriptionEntity>, anyhow::Error>(None);
            }

            let subscription = insert_into(subscriptions::table)
                .values(&insert_subscription_entity)
                .returning(SubscriptionEntity::as_returning())
                .get_result::<SubscriptionEntity>(conn)?;

            Ok(Some(subscription))
        })?;

        Ok(result)
    }

    async fn find_by_id(&self, subscription_id: i64) -> Result<Option<SubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let subscription = subscriptions::table
            .filter(subscriptions::id.eq(subscription_id))
            .select(SubscriptionEntity::as_select())
            .first::<SubscriptionEntity>(&mut conn)
            .optional()?;

        Ok(subscription)
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<SubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = subscriptions::table
            .filter(subscriptions::user_id.eq(user_id))
            .order(subscriptions::start_date.desc())
            .select(SubscriptionEntity::as_select())
            .load::<SubscriptionEntity>(&mut conn)?;

        Ok(results)
    }

    async fn list_active_by_user(
        &self,
        user_id: Uuid,
        as_of: NaiveDate,
    ) -> Result<Vec<SubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = subscriptions::table
            .filter(subscriptions::user_id.eq(user_id))
            .filter(subscriptions::end_date.ge(as_of))
            .order(subscriptions::start_date.desc())
            .select(SubscriptionEntity::as_select())
            .load::<SubscriptionEntity>(&mut conn)?;

        Ok(results)
    }

    async fn delete(&self, subscription_id: i64) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        delete(subscriptions::table.filter(subscriptions::id.eq(subscription_id)))
            .execute(&mut conn)?;

        Ok(())
    }
}
