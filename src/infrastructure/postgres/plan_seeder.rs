use anyhow::Result;
use serde_json::json;
use tracing::info;

use crate::domain::{entities::plans::InsertPlanEntity, repositories::plans::PlanRepository};

/// Seeds the fixed plan catalog at startup. Idempotent: an already populated
/// catalog is left untouched.
pub async fn seed_default_plans(plan_repo: &impl PlanRepository) -> Result<()> {
    let existing = plan_repo.count_plans().await?;
    if existing > 0 {
        info!(existing, "plan_seeder: catalog already populated, skipping seed");
        return Ok(());
    }

    let inserted = plan_repo.insert_plans(default_catalog()).await?;
    info!(inserted, "plan_seeder: default plan catalog seeded");

    Ok(())
}

fn default_catalog() -> Vec<InsertPlanEntity> {
    vec![
        InsertPlanEntity {
            name: "Lite Care Pack".to_string(),
            price_minor: 2500,
            included_visits: Some(2),
            extra_visit_price_minor: 1500,
            services: json!(["Basic check-up"]),
        },
        InsertPlanEntity {
            name: "Standard Health Pack".to_string(),
            price_minor: 4500,
            included_visits: Some(4),
            extra_visit_price_minor: 2000,
            services: json!(["Check-up", "Blood analysis"]),
        },
        InsertPlanEntity {
            name: "Chronic Care Pack".to_string(),
            price_minor: 8000,
            included_visits: Some(8),
            extra_visit_price_minor: 1800,
            services: json!(["Blood tests", "X-ray", "ECG"]),
        },
        InsertPlanEntity {
            name: "Unlimited Premium Pack".to_string(),
            price_minor: 12000,
            included_visits: None,
            extra_visit_price_minor: 0,
            services: json!(["All diagnostics", "X-ray", "Ultrasound"]),
        },
    ]
}
