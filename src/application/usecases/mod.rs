pub mod auth;
pub mod subscriptions;
pub mod visits;
