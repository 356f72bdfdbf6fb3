pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::infrastructure::postgres::{
    plan_seeder, postgres_connection, repositories::plans::PlanPostgres,
};

pub async fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let dotenvy_env = config::config_loader::load()?;
    info!("ENV has been loaded");

    let postgres_pool = postgres_connection::establish_connection(&dotenvy_env.database.url)?;
    info!("Postgres connection has been established");

    let db_pool = Arc::new(postgres_pool);

    let plan_repository = PlanPostgres::new(Arc::clone(&db_pool));
    plan_seeder::seed_default_plans(&plan_repository).await?;
    info!("Plan catalog is ready");

    infrastructure::axum_http::http_serve::start(Arc::new(dotenvy_env), db_pool).await?;

    Ok(())
}
