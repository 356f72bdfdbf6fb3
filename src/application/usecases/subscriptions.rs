use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::{
    entities::{plans::PlanEntity, subscriptions::InsertSubscriptionEntity},
    repositories::{plans::PlanRepository, subscriptions::SubscriptionRepository},
    value_objects::{
        plans::{AllowanceLabel, VisitAllowance},
        subscriptions::InsertSubscriptionModel,
    },
};

#[derive(Debug, Error)]
pub enum SubscriptionError {
    #[error("Plan not found")]
    PlanNotFound,
    #[error("You already have an active subscription")]
    AlreadySubscribed,
    #[error("Subscription not found")]
    SubscriptionNotFound,
    #[error("Subscription does not belong to the requesting user")]
    NotOwner,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl SubscriptionError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            SubscriptionError::PlanNotFound | SubscriptionError::SubscriptionNotFound => {
                StatusCode::NOT_FOUND
            }
            SubscriptionError::AlreadySubscribed => StatusCode::CONFLICT,
            SubscriptionError::NotOwner => StatusCode::FORBIDDEN,
            SubscriptionError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, SubscriptionError>;

#[derive(Debug, Serialize)]
pub struct PlanDto {
    pub id: i64,
    pub name: String,
    pub price_minor: i32,
    pub included_visits: AllowanceLabel,
    pub extra_visit_price_minor: i32,
    pub services: Vec<String>,
}

impl From<PlanEntity> for PlanDto {
    fn from(value: PlanEntity) -> Self {
        let included_visits = match value.included_visits {
            VisitAllowance::Finite(count) => AllowanceLabel::Count(count.into()),
            VisitAllowance::Unlimited => AllowanceLabel::Label("Unlimited"),
        };

        Self {
            id: value.id,
            name: value.name,
            price_minor: value.price_minor,
            included_visits,
            extra_visit_price_minor: value.extra_visit_price_minor,
            services: value.services,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubscriptionDto {
    pub id: i64,
    pub plan_id: i64,
    pub plan_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub active: bool,
}

#[derive(Debug, Serialize)]
pub struct SubscribedDto {
    pub subscription_id: i64,
    pub plan_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

pub struct SubscriptionUseCase<P, S>
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
{
    plan_repo: Arc<P>,
    subscription_repo: Arc<S>,
}

impl<P, S> SubscriptionUseCase<P, S>
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
{
    pub fn new(plan_repo: Arc<P>, subscription_repo: Arc<S>) -> Self {
        Self {
            plan_repo,
            subscription_repo,
        }
    }

    pub async fn list_plans(&self) -> UseCaseResult<Vec<PlanDto>> {
        let plans = self.plan_repo.list_plans().await.map_err(|err| {
            error!(db_error = ?err, "subscriptions: failed to list plans");
            SubscriptionError::Internal(err)
        })?;

        let plan_count = plans.len();
        info!(plan_count, "subscriptions: plans loaded");

        Ok(plans.into_iter().map(PlanDto::from).collect())
    }

    pub async fn list_user_subscriptions(
        &self,
        user_id: Uuid,
    ) -> UseCaseResult<Vec<SubscriptionDto>> {
        let today = Utc::now().date_naive();

        let subscriptions = self
            .subscription_repo
            .list_by_user(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "subscriptions: failed to list subscriptions");
                SubscriptionError::Internal(err)
            })?;

        let mut out = Vec::with_capacity(subscriptions.len());
        for subscription in subscriptions {
            let plan_name = match self
                .plan_repo
                .find_by_id(subscription.plan_id)
                .await
                .map_err(|err| {
                    error!(
                        %user_id,
                        plan_id = subscription.plan_id,
                        db_error = ?err,
                        "subscriptions: failed to resolve plan"
                    );
                    SubscriptionError::Internal(err)
                })? {
                Some(plan) => plan.name,
                None => "Unknown".to_string(),
            };

            out.push(SubscriptionDto {
                id: subscription.id,
                plan_id: subscription.plan_id,
                plan_name,
                start_date: subscription.start_date,
                end_date: subscription.end_date,
                active: subscription.is_active_on(today),
            });
        }

        Ok(out)
    }

    pub async fn subscribe(
        &self,
        user_id: Uuid,
        insert_subscription_model: InsertSubscriptionModel,
    ) -> UseCaseResult<SubscribedDto> {
        let plan_id = insert_subscription_model.plan_id;
        info!(%user_id, plan_id, "subscriptions: subscribe requested");

        let plan = self
            .plan_repo
            .find_by_id(plan_id)
            .await
            .map_err(|err| {
                error!(%user_id, plan_id, db_error = ?err, "subscriptions: failed to load plan");
                SubscriptionError::Internal(err)
            })?
            .ok_or_else(|| {
                warn!(%user_id, plan_id, "subscriptions: plan not found");
                SubscriptionError::PlanNotFound
            })?;

        let start_date = Utc::now().date_naive();
        let end_date = start_date + Duration::days(insert_subscription_model.duration_days);

        let subscription = self
            .subscription_repo
            .subscribe(InsertSubscriptionEntity {
                user_id,
                plan_id: plan.id,
                start_date,
                end_date,
            })
            .await
            .map_err(|err| {
                error!(%user_id, plan_id, db_error = ?err, "subscriptions: failed to subscribe");
                SubscriptionError::Internal(err)
            })?
            .ok_or_else(|| {
                warn!(
                    %user_id,
                    plan_id,
                    "subscriptions: user already holds an active subscription"
                );
                SubscriptionError::AlreadySubscribed
            })?;

        info!(
            %user_id,
            subscription_id = subscription.id,
            end_date = %subscription.end_date,
            "subscriptions: subscription created"
        );

        Ok(SubscribedDto {
            subscription_id: subscription.id,
            plan_name: plan.name,
            start_date: subscription.start_date,
            end_date: subscription.end_date,
        })
    }

    pub async fn cancel(&self, user_id: Uuid, subscription_id: i64) -> UseCaseResult<()> {
        info!(%user_id, subscription_id, "subscriptions: cancel requested");

        let subscription = self
            .subscription_repo
            .find_by_id(subscription_id)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    subscription_id,
                    db_error = ?err,
                    "subscriptions: failed to load subscription"
                );
                SubscriptionError::Internal(err)
            })?
            .ok_or_else(|| {
                warn!(%user_id, subscription_id, "subscriptions: subscription not found");
                SubscriptionError::SubscriptionNotFound
            })?;

        if subscription.user_id != user_id {
            warn!(
                %user_id,
                subscription_id,
                owner_id = %subscription.user_id,
                "subscriptions: cancel rejected for non-owner"
            );
            return Err(SubscriptionError::NotOwner);
        }

        // Hard delete. Visit records keep their subscription_id and may
        // dangle afterwards.
        self.subscription_repo
            .delete(subscription_id)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    subscription_id,
                    db_error = ?err,
                    "subscriptions: failed to delete subscription"
                );
                SubscriptionError::Internal(err)
            })?;

        info!(%user_id, subscription_id, "subscriptions: subscription cancelled");

        Ok(())
    }
}
