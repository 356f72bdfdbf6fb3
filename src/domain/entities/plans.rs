use diesel::prelude::*;

use crate::{
    domain::value_objects::plans::{VisitAllowance, VisitPricing},
    infrastructure::postgres::schema::plans,
};

#[derive(Debug, Clone, PartialEq)]
pub struct PlanEntity {
    pub id: i64,
    pub name: String,
    pub price_minor: i32,
    pub included_visits: VisitAllowance,
    pub extra_visit_price_minor: i32,
    pub services: Vec<String>,
}

impl PlanEntity {
    pub fn pricing(&self) -> VisitPricing {
        VisitPricing {
            allowance: self.included_visits,
            extra_visit_price_minor: self.extra_visit_price_minor,
        }
    }
}

/// Raw row used for Diesel queries. The allowance stays as a nullable count
/// (NULL = unlimited) and services as JSON.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = plans)]
pub struct PlanRow {
    pub id: i64,
    pub name: String,
    pub price_minor: i32,
    pub included_visits: Option<i32>,
    pub extra_visit_price_minor: i32,
    pub services: serde_json::Value,
}

impl From<PlanRow> for PlanEntity {
    fn from(value: PlanRow) -> Self {
        let services = serde_json::from_value(value.services).unwrap_or_default();

        Self {
            id: value.id,
            name: value.name,
            price_minor: value.price_minor,
            included_visits: VisitAllowance::from_stored(value.included_visits),
            extra_visit_price_minor: value.extra_visit_price_minor,
            services,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = plans)]
pub struct InsertPlanEntity {
    pub name: String,
    pub price_minor: i32,
    pub included_visits: Option<i32>,
    pub extra_visit_price_minor: i32,
    pub services: serde_json::Value,
}
