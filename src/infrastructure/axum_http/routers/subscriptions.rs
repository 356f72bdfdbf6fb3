use crate::{
    application::usecases::subscriptions::SubscriptionUseCase,
    domain::{
        repositories::{plans::PlanRepository, subscriptions::SubscriptionRepository},
        value_objects::subscriptions::InsertSubscriptionModel,
    },
    infrastructure::{
        axum_http::{auth::AuthUser, error_responses},
        postgres::{
            postgres_connection::PgPoolSquad,
            repositories::{plans::PlanPostgres, subscriptions::SubscriptionPostgres},
        },
    },
};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
};
use std::sync::Arc;
use tracing::{error, warn};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let plan_repository = PlanPostgres::new(Arc::clone(&db_pool));
    let subscription_repository = SubscriptionPostgres::new(Arc::clone(&db_pool));
    let subscription_usecase =
        SubscriptionUseCase::new(Arc::new(plan_repository), Arc::new(subscription_repository));

    Router::new()
        .route("/", get(list_user_subscriptions).post(subscribe))
        .route("/:subscription_id", delete(cancel_subscription))
        .with_state(Arc::new(subscription_usecase))
}

pub async fn list_user_subscriptions<P, S>(
    State(subscription_usecase): State<Arc<SubscriptionUseCase<P, S>>>,
    AuthUser { user_id }: AuthUser,
) -> impl IntoResponse
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
{
    match subscription_usecase.list_user_subscriptions(user_id).await {
        Ok(subscriptions) => Json(subscriptions).into_response(),
        Err(err) => {
            error!(%user_id, error = %err, "subscriptions: failed to list subscriptions");
            error_responses::usecase_error_response(err.status_code(), err)
        }
    }
}

pub async fn subscribe<P, S>(
    State(subscription_usecase): State<Arc<SubscriptionUseCase<P, S>>>,
    AuthUser { user_id }: AuthUser,
    Json(insert_subscription_model): Json<InsertSubscriptionModel>,
) -> impl IntoResponse
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
{
    match subscription_usecase
        .subscribe(user_id, insert_subscription_model)
        .await
    {
        Ok(subscribed) => (StatusCode::CREATED, Json(subscribed)).into_response(),
        Err(err) => {
            warn!(%user_id, error = %err, "subscriptions: subscribe rejected");
            error_responses::usecase_error_response(err.status_code(), err)
        }
    }
}

pub async fn cancel_subscription<P, S>(
    State(subscription_usecase): State<Arc<SubscriptionUseCase<P, S>>>,
    AuthUser { user_id }: AuthUser,
    Path(subscription_id): Path<i64>,
) -> impl IntoResponse
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
{
    match subscription_usecase.cancel(user_id, subscription_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            warn!(%user_id, subscription_id, error = %err, "subscriptions: cancel rejected");
            error_responses::usecase_error_response(err.status_code(), err)
        }
    }
}
