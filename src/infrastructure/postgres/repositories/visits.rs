use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{RunQueryDsl, insert_into, prelude::*};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{
        entities::visits::{InsertVisitEntity, VisitEntity},
        repositories::visits::VisitRepository,
        value_objects::{
            plans::VisitPricing,
            visits::{NewVisitModel, start_of_month_utc},
        },
    },
    infrastructure::postgres::{postgres_connection::PgPoolSquad, schema::visits},
};

pub struct VisitPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl VisitPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl VisitRepository for VisitPostgres {
    async fn record_costed(
        &self,
        new_visit: NewVisitModel,
        pricing: VisitPricing,
    ) -> Result<(VisitEntity, i64)> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let now = Utc::now();
        let month_start = start_of_month_utc(now);

        // Count and insert share one serializable transaction so two visits
        // racing over the last free slot cannot both be priced as free.
        let result = conn.build_transaction().serializable().run(|conn| {
            let visits_before = visits::table
                .filter(visits::subscription_id.eq(new_visit.subscription_id))
                .filter(visits::visit_date.ge(month_start))
                .count()
                .get_result::<i64>(conn)?;

            let cost_minor = pricing.cost_for_next_minor(visits_before);

            let visit = insert_into(visits::table)
                .values(&InsertVisitEntity {
                    user_id: new_visit.user_id,
                    subscription_id: new_visit.subscription_id,
                    visit_date: now,
                    cost_minor,
                    notes: new_visit.notes.clone(),
                })
                .returning(VisitEntity::as_returning())
                .get_result::<VisitEntity>(conn)?;

            Ok::<(VisitEntity, i64), anyhow::Error>((visit, visits_before))
        })?;

        Ok(result)
    }

    async fn count_for_subscription(&self, subscription_id: i64) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let count = visits::table
            .filter(visits::subscription_id.eq(subscription_id))
            .count()
            .get_result::<i64>(&mut conn)?;

        Ok(count)
    }

    async fn count_for_subscription_since(
        &self,
        subscription_id: i64,
        since: DateTime<Utc>,
    ) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let count = visits::table
            .filter(visits::subscription_id.eq(subscription_id))
            .filter(visits::visit_date.ge(since))
            .count()
            .get_result::<i64>(&mut conn)?;

        Ok(count)
    }

    async fn sum_charges_since(&self, subscription_id: i64, since: DateTime<Utc>) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let total = visits::table
            .filter(visits::subscription_id.eq(subscription_id))
            .filter(visits::visit_date.ge(since))
            .filter(visits::cost_minor.gt(0))
            .select(diesel::dsl::sum(visits::cost_minor))
            .first::<Option<i64>>(&mut conn)?;

        Ok(total.unwrap_or(0))
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<VisitEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = visits::table
            .filter(visits::user_id.eq(user_id))
            .order(visits::visit_date.desc())
            .select(VisitEntity::as_select())
            .load::<VisitEntity>(&mut conn)?;

        Ok(results)
    }
}
