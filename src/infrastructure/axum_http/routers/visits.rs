use crate::{
    application::usecases::visits::VisitUseCase,
    domain::{
        repositories::{
            plans::PlanRepository, subscriptions::SubscriptionRepository, visits::VisitRepository,
        },
        value_objects::visits::RecordVisitModel,
    },
    infrastructure::{
        axum_http::{auth::AuthUser, error_responses},
        postgres::{
            postgres_connection::PgPoolSquad,
            repositories::{
                plans::PlanPostgres, subscriptions::SubscriptionPostgres, visits::VisitPostgres,
            },
        },
    },
};
use axum::{
    Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get,
};
use std::sync::Arc;
use tracing::{error, warn};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let plan_repository = PlanPostgres::new(Arc::clone(&db_pool));
    let subscription_repository = SubscriptionPostgres::new(Arc::clone(&db_pool));
    let visit_repository = VisitPostgres::new(Arc::clone(&db_pool));
    let visit_usecase = VisitUseCase::new(
        Arc::new(plan_repository),
        Arc::new(subscription_repository),
        Arc::new(visit_repository),
    );

    Router::new()
        .route("/", get(visit_history).post(record_visit))
        .route("/summary", get(usage_summary))
        .with_state(Arc::new(visit_usecase))
}

pub async fn record_visit<P, S, V>(
    State(visit_usecase): State<Arc<VisitUseCase<P, S, V>>>,
    AuthUser { user_id }: AuthUser,
    Json(record_visit_model): Json<RecordVisitModel>,
) -> impl IntoResponse
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    V: VisitRepository + Send + Sync + 'static,
{
    match visit_usecase.record_visit(user_id, record_visit_model).await {
        Ok(recorded) => (StatusCode::CREATED, Json(recorded)).into_response(),
        Err(err) => {
            warn!(%user_id, error = %err, "visits: record visit rejected");
            error_responses::usecase_error_response(err.status_code(), err)
        }
    }
}

pub async fn usage_summary<P, S, V>(
    State(visit_usecase): State<Arc<VisitUseCase<P, S, V>>>,
    AuthUser { user_id }: AuthUser,
) -> impl IntoResponse
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    V: VisitRepository + Send + Sync + 'static,
{
    match visit_usecase.usage_summary(user_id).await {
        Ok(summary) => Json(summary).into_response(),
        Err(err) => {
            error!(%user_id, error = %err, "visits: failed to build usage summary");
            error_responses::usecase_error_response(err.status_code(), err)
        }
    }
}

pub async fn visit_history<P, S, V>(
    State(visit_usecase): State<Arc<VisitUseCase<P, S, V>>>,
    AuthUser { user_id }: AuthUser,
) -> impl IntoResponse
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    V: VisitRepository + Send + Sync + 'static,
{
    match visit_usecase.visit_history(user_id).await {
        Ok(history) => Json(history).into_response(),
        Err(err) => {
            error!(%user_id, error = %err, "visits: failed to load visit history");
            error_responses::usecase_error_response(err.status_code(), err)
        }
    }
}
