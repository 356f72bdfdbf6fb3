use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::visits;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = visits)]
pub struct VisitEntity {
    pub id: i64,
    pub user_id: Uuid,
    pub subscription_id: i64,
    pub visit_date: DateTime<Utc>,
    pub cost_minor: i32,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = visits)]
pub struct InsertVisitEntity {
    pub user_id: Uuid,
    pub subscription_id: i64,
    pub visit_date: DateTime<Utc>,
    pub cost_minor: i32,
    pub notes: Option<String>,
}
