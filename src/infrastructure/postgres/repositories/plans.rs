use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, insert_into, prelude::*};
use std::sync::Arc;

use crate::{
    domain::{
        entities::plans::{InsertPlanEntity, PlanEntity, PlanRow},
        repositories::plans::PlanRepository,
    },
    infrastructure::postgres::{postgres_connection::PgPoolSquad, schema::plans},
};

pub struct PlanPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PlanPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PlanRepository for PlanPostgres {
    async fn find_by_id(&self, plan_id: i64) -> Result<Option<PlanEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let row = plans::table
            .filter(plans::id.eq(plan_id))
            .select(PlanRow::as_select())
            .first::<PlanRow>(&mut conn)
            .optional()?;

        Ok(row.map(PlanEntity::from))
    }

    async fn list_plans(&self) -> Result<Vec<PlanEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let rows = plans::table
            .order(plans::id.asc())
            .select(PlanRow::as_select())
            .load::<PlanRow>(&mut conn)?;

        Ok(rows.into_iter().map(PlanEntity::from).collect())
    }

    async fn count_plans(&self) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let count = plans::table.count().get_result::<i64>(&mut conn)?;

        Ok(count)
    }

    async fn insert_plans(&self, insert_plan_entities: Vec<InsertPlanEntity>) -> Result<usize> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let inserted = insert_into(plans::table)
            .values(&insert_plan_entities)
            .execute(&mut conn)?;

        Ok(inserted)
    }
}
