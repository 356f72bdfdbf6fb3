use crate::{
    application::usecases::subscriptions::SubscriptionUseCase,
    domain::repositories::{plans::PlanRepository, subscriptions::SubscriptionRepository},
    infrastructure::{
        axum_http::{auth::AuthUser, error_responses},
        postgres::{
            postgres_connection::PgPoolSquad,
            repositories::{plans::PlanPostgres, subscriptions::SubscriptionPostgres},
        },
    },
};
use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use std::sync::Arc;
use tracing::error;

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let plan_repository = PlanPostgres::new(Arc::clone(&db_pool));
    let subscription_repository = SubscriptionPostgres::new(Arc::clone(&db_pool));
    let subscription_usecase =
        SubscriptionUseCase::new(Arc::new(plan_repository), Arc::new(subscription_repository));

    Router::new()
        .route("/", get(list_plans))
        .with_state(Arc::new(subscription_usecase))
}

pub async fn list_plans<P, S>(
    State(subscription_usecase): State<Arc<SubscriptionUseCase<P, S>>>,
    _auth: AuthUser,
) -> impl IntoResponse
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
{
    match subscription_usecase.list_plans().await {
        Ok(plans) => Json(plans).into_response(),
        Err(err) => {
            error!(error = %err, "plans: failed to list plans");
            error_responses::usecase_error_response(err.status_code(), err)
        }
    }
}
