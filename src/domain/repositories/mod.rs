pub mod plans;
pub mod subscriptions;
pub mod users;
pub mod visits;
