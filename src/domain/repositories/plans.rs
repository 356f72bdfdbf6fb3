use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::entities::plans::{InsertPlanEntity, PlanEntity};

#[async_trait]
#[automock]
pub trait PlanRepository {
    async fn find_by_id(&self, plan_id: i64) -> Result<Option<PlanEntity>>;
    async fn list_plans(&self) -> Result<Vec<PlanEntity>>;
    async fn count_plans(&self) -> Result<i64>;
    async fn insert_plans(&self, insert_plan_entities: Vec<InsertPlanEntity>) -> Result<usize>;
}
