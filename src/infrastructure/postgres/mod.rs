pub mod plan_seeder;
pub mod postgres_connection;
pub mod repositories;
pub mod schema;
