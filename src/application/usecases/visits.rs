use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::{
    repositories::{
        plans::PlanRepository, subscriptions::SubscriptionRepository, visits::VisitRepository,
    },
    value_objects::{
        plans::{AllowanceLabel, VisitAllowance},
        visits::{NewVisitModel, RecordVisitModel, month_label, start_of_month_utc},
    },
};

#[derive(Debug, Error)]
pub enum VisitError {
    #[error("Subscription not found")]
    SubscriptionNotFound,
    #[error("Subscription does not belong to the requesting user")]
    NotOwner,
    #[error("Subscription has expired")]
    SubscriptionExpired,
    #[error("Plan referenced by subscription {0} no longer exists")]
    DanglingPlan(i64),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl VisitError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            VisitError::SubscriptionNotFound => StatusCode::NOT_FOUND,
            VisitError::NotOwner => StatusCode::FORBIDDEN,
            VisitError::SubscriptionExpired => StatusCode::BAD_REQUEST,
            VisitError::DanglingPlan(_) | VisitError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, VisitError>;

#[derive(Debug, Serialize)]
pub struct VisitRecordedDto {
    pub visit_id: i64,
    pub visit_date: DateTime<Utc>,
    pub cost_minor: i32,
    pub charged: bool,
    pub visits_used_this_month: i64,
    pub remaining_free_visits: AllowanceLabel,
    pub plan_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageStatus {
    Unlimited,
    WithinLimit,
    Exceeded,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionUsageDto {
    pub subscription_id: i64,
    pub plan_name: String,
    pub plan_price_minor: i32,
    pub included_visits: AllowanceLabel,
    pub visits_used_this_month: i64,
    pub total_visits_all_time: i64,
    pub remaining_free_visits: AllowanceLabel,
    pub extra_visit_price_minor: i32,
    pub charges_this_month_minor: i64,
    pub status: UsageStatus,
    pub active_until: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct UsageSummaryDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub subscriptions: Vec<SubscriptionUsageDto>,
    pub total_extra_charges_minor: i64,
    pub month: String,
}

#[derive(Debug, Serialize)]
pub struct VisitHistoryEntryDto {
    pub visit_id: i64,
    pub visit_date: DateTime<Utc>,
    pub subscription_id: i64,
    pub plan_name: String,
    pub cost_minor: i32,
    pub was_charged: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VisitHistoryDto {
    pub visits: Vec<VisitHistoryEntryDto>,
    pub total_visits: usize,
}

pub struct VisitUseCase<P, S, V>
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    V: VisitRepository + Send + Sync + 'static,
{
    plan_repo: Arc<P>,
    subscription_repo: Arc<S>,
    visit_repo: Arc<V>,
}

impl<P, S, V> VisitUseCase<P, S, V>
where
    P: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    V: VisitRepository + Send + Sync + 'static,
{
    pub fn new(plan_repo: Arc<P>, subscription_repo: Arc<S>, visit_repo: Arc<V>) -> Self {
        Self {
            plan_repo,
            subscription_repo,
            visit_repo,
        }
    }

    pub async fn record_visit(
        &self,
        user_id: Uuid,
        record_visit_model: RecordVisitModel,
    ) -> UseCaseResult<VisitRecordedDto> {
        let subscription_id = record_visit_model.subscription_id;
        info!(%user_id, subscription_id, "visits: record visit requested");

        let subscription = self
            .subscription_repo
            .find_by_id(subscription_id)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    subscription_id,
                    db_error = ?err,
                    "visits: failed to load subscription"
                );
                VisitError::Internal(err)
            })?
            .ok_or_else(|| {
                warn!(%user_id, subscription_id, "visits: subscription not found");
                VisitError::SubscriptionNotFound
            })?;

        if subscription.user_id != user_id {
            warn!(
                %user_id,
                subscription_id,
                owner_id = %subscription.user_id,
                "visits: subscription owned by another user"
            );
            return Err(VisitError::NotOwner);
        }

        let today = Utc::now().date_naive();
        if !subscription.is_active_on(today) {
            warn!(
                %user_id,
                subscription_id,
                end_date = %subscription.end_date,
                "visits: subscription has expired"
            );
            return Err(VisitError::SubscriptionExpired);
        }

        let plan = self
            .plan_repo
            .find_by_id(subscription.plan_id)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    subscription_id,
                    plan_id = subscription.plan_id,
                    db_error = ?err,
                    "visits: failed to load plan"
                );
                VisitError::Internal(err)
            })?
            .ok_or_else(|| {
                // Not a user error: the ledger points at a plan that is gone.
                error!(
                    %user_id,
                    subscription_id,
                    plan_id = subscription.plan_id,
                    "visits: subscription references a missing plan"
                );
                VisitError::DanglingPlan(subscription_id)
            })?;

        let (visit, visits_before) = self
            .visit_repo
            .record_costed(
                NewVisitModel {
                    user_id,
                    subscription_id,
                    notes: record_visit_model.notes,
                },
                plan.pricing(),
            )
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    subscription_id,
                    db_error = ?err,
                    "visits: failed to record visit"
                );
                VisitError::Internal(err)
            })?;

        // The visit just recorded counts against the month as well.
        let remaining_free_visits = match plan.included_visits.remaining_free(visits_before + 1) {
            Some(remaining) => AllowanceLabel::Count(remaining),
            None => AllowanceLabel::Label("unlimited"),
        };

        info!(
            %user_id,
            subscription_id,
            visit_id = visit.id,
            cost_minor = visit.cost_minor,
            "visits: visit recorded"
        );

        Ok(VisitRecordedDto {
            visit_id: visit.id,
            visit_date: visit.visit_date,
            cost_minor: visit.cost_minor,
            charged: visit.cost_minor > 0,
            visits_used_this_month: visits_before + 1,
            remaining_free_visits,
            plan_name: plan.name,
        })
    }

    pub async fn usage_summary(&self, user_id: Uuid) -> UseCaseResult<UsageSummaryDto> {
        let now = Utc::now();
        let today = now.date_naive();
        let month_start = start_of_month_utc(now);

        info!(%user_id, "visits: usage summary requested");

        let active_subscriptions = self
            .subscription_repo
            .list_active_by_user(user_id, today)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "visits: failed to list active subscriptions");
                VisitError::Internal(err)
            })?;

        if active_subscriptions.is_empty() {
            info!(%user_id, "visits: no active subscriptions to summarize");
            return Ok(UsageSummaryDto {
                message: Some("No active subscriptions".to_string()),
                subscriptions: Vec::new(),
                total_extra_charges_minor: 0,
                month: month_label(now),
            });
        }

        let mut summaries = Vec::with_capacity(active_subscriptions.len());
        let mut total_extra_charges_minor = 0_i64;

        for subscription in active_subscriptions {
            let plan = match self
                .plan_repo
                .find_by_id(subscription.plan_id)
                .await
                .map_err(|err| {
                    error!(
                        %user_id,
                        plan_id = subscription.plan_id,
                        db_error = ?err,
                        "visits: failed to resolve plan for summary"
                    );
                    VisitError::Internal(err)
                })? {
                Some(plan) => plan,
                None => {
                    // A dangling plan degrades this one entry, not the whole
                    // summary.
                    warn!(
                        %user_id,
                        subscription_id = subscription.id,
                        plan_id = subscription.plan_id,
                        "visits: skipping subscription with missing plan"
                    );
                    continue;
                }
            };

            let visits_this_month = self
                .visit_repo
                .count_for_subscription_since(subscription.id, month_start)
                .await
                .map_err(|err| {
                    error!(
                        %user_id,
                        subscription_id = subscription.id,
                        db_error = ?err,
                        "visits: failed to count monthly visits"
                    );
                    VisitError::Internal(err)
                })?;
            let total_visits = self
                .visit_repo
                .count_for_subscription(subscription.id)
                .await
                .map_err(|err| {
                    error!(
                        %user_id,
                        subscription_id = subscription.id,
                        db_error = ?err,
                        "visits: failed to count lifetime visits"
                    );
                    VisitError::Internal(err)
                })?;
            let charges_this_month_minor = self
                .visit_repo
                .sum_charges_since(subscription.id, month_start)
                .await
                .map_err(|err| {
                    error!(
                        %user_id,
                        subscription_id = subscription.id,
                        db_error = ?err,
                        "visits: failed to sum monthly charges"
                    );
                    VisitError::Internal(err)
                })?;

            total_extra_charges_minor += charges_this_month_minor;

            let (included_visits, remaining_free_visits, status) = match plan.included_visits {
                VisitAllowance::Unlimited => (
                    AllowanceLabel::Label("unlimited"),
                    AllowanceLabel::Label("unlimited"),
                    UsageStatus::Unlimited,
                ),
                VisitAllowance::Finite(included) => {
                    let status = if visits_this_month <= i64::from(included) {
                        UsageStatus::WithinLimit
                    } else {
                        UsageStatus::Exceeded
                    };
                    (
                        AllowanceLabel::Count(included.into()),
                        AllowanceLabel::Count(
                            (i64::from(included) - visits_this_month).max(0),
                        ),
                        status,
                    )
                }
            };

            summaries.push(SubscriptionUsageDto {
                subscription_id: subscription.id,
                plan_name: plan.name,
                plan_price_minor: plan.price_minor,
                included_visits,
                visits_used_this_month: visits_this_month,
                total_visits_all_time: total_visits,
                remaining_free_visits,
                extra_visit_price_minor: plan.extra_visit_price_minor,
                charges_this_month_minor,
                status,
                active_until: subscription.end_date,
            });
        }

        Ok(UsageSummaryDto {
            message: None,
            subscriptions: summaries,
            total_extra_charges_minor,
            month: month_label(now),
        })
    }

    pub async fn visit_history(&self, user_id: Uuid) -> UseCaseResult<VisitHistoryDto> {
        info!(%user_id, "visits: history requested");

        let visits = self.visit_repo.list_by_user(user_id).await.map_err(|err| {
            error!(%user_id, db_error = ?err, "visits: failed to list visits");
            VisitError::Internal(err)
        })?;

        let mut history = Vec::with_capacity(visits.len());
        for visit in visits {
            let plan_name = self.plan_name_for_subscription(visit.subscription_id).await?;

            history.push(VisitHistoryEntryDto {
                visit_id: visit.id,
                visit_date: visit.visit_date,
                subscription_id: visit.subscription_id,
                plan_name,
                cost_minor: visit.cost_minor,
                was_charged: visit.cost_minor > 0,
                notes: visit.notes,
            });
        }

        let total_visits = history.len();

        Ok(VisitHistoryDto {
            visits: history,
            total_visits,
        })
    }

    /// Cancelled subscriptions leave visits behind, so either link may be
    /// gone by the time history is rendered.
    async fn plan_name_for_subscription(&self, subscription_id: i64) -> UseCaseResult<String> {
        let subscription = match self
            .subscription_repo
            .find_by_id(subscription_id)
            .await
            .map_err(|err| {
                error!(
                    subscription_id,
                    db_error = ?err,
                    "visits: failed to resolve subscription for history"
                );
                VisitError::Internal(err)
            })? {
            Some(subscription) => subscription,
            None => return Ok("Unknown".to_string()),
        };

        let plan_name = self
            .plan_repo
            .find_by_id(subscription.plan_id)
            .await
            .map_err(|err| {
                error!(
                    subscription_id,
                    plan_id = subscription.plan_id,
                    db_error = ?err,
                    "visits: failed to resolve plan for history"
                );
                VisitError::Internal(err)
            })?
            .map(|plan| plan.name)
            .unwrap_or_else(|| "Unknown".to_string());

        Ok(plan_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        entities::{
            plans::PlanEntity, subscriptions::SubscriptionEntity, visits::VisitEntity,
        },
        repositories::{
            plans::MockPlanRepository, subscriptions::MockSubscriptionRepository,
            visits::MockVisitRepository,
        },
    };
    use chrono::Duration;
    use mockall::predicate::eq;

    fn sample_plan(id: i64, included_visits: VisitAllowance) -> PlanEntity {
        PlanEntity {
            id,
            name: "Lite Care Pack".to_string(),
            price_minor: 2500,
            included_visits,
            extra_visit_price_minor: 1500,
            services: vec!["Basic check-up".to_string()],
        }
    }

    fn sample_subscription(
        id: i64,
        user_id: Uuid,
        plan_id: i64,
        days_left: i64,
    ) -> SubscriptionEntity {
        let today = Utc::now().date_naive();
        SubscriptionEntity {
            id,
            user_id,
            plan_id,
            start_date: today - Duration::days(10),
            end_date: today + Duration::days(days_left),
            created_at: Utc::now(),
        }
    }

    fn sample_visit(id: i64, user_id: Uuid, subscription_id: i64, cost_minor: i32) -> VisitEntity {
        VisitEntity {
            id,
            user_id,
            subscription_id,
            visit_date: Utc::now(),
            cost_minor,
            notes: None,
        }
    }

    fn usecase_with(
        plan_repo: MockPlanRepository,
        subscription_repo: MockSubscriptionRepository,
        visit_repo: MockVisitRepository,
    ) -> VisitUseCase<MockPlanRepository, MockSubscriptionRepository, MockVisitRepository> {
        VisitUseCase::new(
            Arc::new(plan_repo),
            Arc::new(subscription_repo),
            Arc::new(visit_repo),
        )
    }

    #[tokio::test]
    async fn record_visit_rejects_unknown_subscription() {
        let user_id = Uuid::new_v4();
        let plan_repo = MockPlanRepository::new();
        let mut subscription_repo = MockSubscriptionRepository::new();
        let visit_repo = MockVisitRepository::new();

        subscription_repo
            .expect_find_by_id()
            .with(eq(1))
            .returning(|_| Box::pin(async { Ok(None) }));

        let usecase = usecase_with(plan_repo, subscription_repo, visit_repo);
        let result = usecase
            .record_visit(
                user_id,
                RecordVisitModel {
                    subscription_id: 1,
                    notes: None,
                },
            )
            .await;

        assert!(matches!(result, Err(VisitError::SubscriptionNotFound)));
    }

    #[tokio::test]
    async fn record_visit_rejects_foreign_subscription() {
        let user_id = Uuid::new_v4();
        let other_user_id = Uuid::new_v4();
        let plan_repo = MockPlanRepository::new();
        let mut subscription_repo = MockSubscriptionRepository::new();
        let visit_repo = MockVisitRepository::new();

        let subscription = sample_subscription(1, other_user_id, 1, 10);
        subscription_repo
            .expect_find_by_id()
            .with(eq(1))
            .returning(move |_| {
                let subscription = subscription.clone();
                Box::pin(async move { Ok(Some(subscription)) })
            });

        let usecase = usecase_with(plan_repo, subscription_repo, visit_repo);
        let result = usecase
            .record_visit(
                user_id,
                RecordVisitModel {
                    subscription_id: 1,
                    notes: None,
                },
            )
            .await;

        assert!(matches!(result, Err(VisitError::NotOwner)));
    }

    #[tokio::test]
    async fn record_visit_rejects_expired_subscription() {
        let user_id = Uuid::new_v4();
        let plan_repo = MockPlanRepository::new();
        let mut subscription_repo = MockSubscriptionRepository::new();
        let visit_repo = MockVisitRepository::new();

        let subscription = sample_subscription(1, user_id, 1, -1);
        subscription_repo
            .expect_find_by_id()
            .with(eq(1))
            .returning(move |_| {
                let subscription = subscription.clone();
                Box::pin(async move { Ok(Some(subscription)) })
            });

        let usecase = usecase_with(plan_repo, subscription_repo, visit_repo);
        let result = usecase
            .record_visit(
                user_id,
                RecordVisitModel {
                    subscription_id: 1,
                    notes: None,
                },
            )
            .await;

        assert!(matches!(result, Err(VisitError::SubscriptionExpired)));
    }

    #[tokio::test]
    async fn record_visit_flags_missing_plan_as_integrity_error() {
        let user_id = Uuid::new_v4();
        let mut plan_repo = MockPlanRepository::new();
        let mut subscription_repo = MockSubscriptionRepository::new();
        let visit_repo = MockVisitRepository::new();

        let subscription = sample_subscription(1, user_id, 77, 10);
        subscription_repo
            .expect_find_by_id()
            .with(eq(1))
            .returning(move |_| {
                let subscription = subscription.clone();
                Box::pin(async move { Ok(Some(subscription)) })
            });
        plan_repo
            .expect_find_by_id()
            .with(eq(77))
            .returning(|_| Box::pin(async { Ok(None) }));

        let usecase = usecase_with(plan_repo, subscription_repo, visit_repo);
        let result = usecase
            .record_visit(
                user_id,
                RecordVisitModel {
                    subscription_id: 1,
                    notes: None,
                },
            )
            .await;

        let err = result.unwrap_err();
        assert!(matches!(err, VisitError::DanglingPlan(1)));
        assert_eq!(err.status_code(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn record_visit_within_allowance_is_free() {
        let user_id = Uuid::new_v4();
        let mut plan_repo = MockPlanRepository::new();
        let mut subscription_repo = MockSubscriptionRepository::new();
        let mut visit_repo = MockVisitRepository::new();

        let subscription = sample_subscription(1, user_id, 1, 10);
        subscription_repo
            .expect_find_by_id()
            .with(eq(1))
            .returning(move |_| {
                let subscription = subscription.clone();
                Box::pin(async move { Ok(Some(subscription)) })
            });

        let plan = sample_plan(1, VisitAllowance::Finite(2));
        plan_repo.expect_find_by_id().with(eq(1)).returning(move |_| {
            let plan = plan.clone();
            Box::pin(async move { Ok(Some(plan)) })
        });

        visit_repo
            .expect_record_costed()
            .withf(move |new_visit, pricing| {
                new_visit.subscription_id == 1
                    && pricing.allowance == VisitAllowance::Finite(2)
                    && pricing.extra_visit_price_minor == 1500
            })
            .returning(move |new_visit, pricing| {
                let visits_before = 0;
                let visit = sample_visit(
                    10,
                    new_visit.user_id,
                    new_visit.subscription_id,
                    pricing.cost_for_next_minor(visits_before),
                );
                Box::pin(async move { Ok((visit, visits_before)) })
            });

        let usecase = usecase_with(plan_repo, subscription_repo, visit_repo);
        let recorded = usecase
            .record_visit(
                user_id,
                RecordVisitModel {
                    subscription_id: 1,
                    notes: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(recorded.cost_minor, 0);
        assert!(!recorded.charged);
        assert_eq!(recorded.visits_used_this_month, 1);
        assert_eq!(recorded.remaining_free_visits, AllowanceLabel::Count(1));
        assert_eq!(recorded.plan_name, "Lite Care Pack");
    }

    #[tokio::test]
    async fn record_visit_charges_once_allowance_is_used_up() {
        let user_id = Uuid::new_v4();
        let mut plan_repo = MockPlanRepository::new();
        let mut subscription_repo = MockSubscriptionRepository::new();
        let mut visit_repo = MockVisitRepository::new();

        let subscription = sample_subscription(1, user_id, 1, 10);
        subscription_repo
            .expect_find_by_id()
            .with(eq(1))
            .returning(move |_| {
                let subscription = subscription.clone();
                Box::pin(async move { Ok(Some(subscription)) })
            });

        let plan = sample_plan(1, VisitAllowance::Finite(2));
        plan_repo.expect_find_by_id().with(eq(1)).returning(move |_| {
            let plan = plan.clone();
            Box::pin(async move { Ok(Some(plan)) })
        });

        visit_repo.expect_record_costed().returning(move |new_visit, pricing| {
            let visits_before = 2;
            let visit = sample_visit(
                11,
                new_visit.user_id,
                new_visit.subscription_id,
                pricing.cost_for_next_minor(visits_before),
            );
            Box::pin(async move { Ok((visit, visits_before)) })
        });

        let usecase = usecase_with(plan_repo, subscription_repo, visit_repo);
        let recorded = usecase
            .record_visit(
                user_id,
                RecordVisitModel {
                    subscription_id: 1,
                    notes: Some("follow-up".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(recorded.cost_minor, 1500);
        assert!(recorded.charged);
        assert_eq!(recorded.visits_used_this_month, 3);
        assert_eq!(recorded.remaining_free_visits, AllowanceLabel::Count(0));
    }

    #[tokio::test]
    async fn record_visit_on_unlimited_plan_is_always_free() {
        let user_id = Uuid::new_v4();
        let mut plan_repo = MockPlanRepository::new();
        let mut subscription_repo = MockSubscriptionRepository::new();
        let mut visit_repo = MockVisitRepository::new();

        let subscription = sample_subscription(1, user_id, 4, 10);
        subscription_repo
            .expect_find_by_id()
            .with(eq(1))
            .returning(move |_| {
                let subscription = subscription.clone();
                Box::pin(async move { Ok(Some(subscription)) })
            });

        let plan = PlanEntity {
            id: 4,
            name: "Unlimited Premium Pack".to_string(),
            price_minor: 12000,
            included_visits: VisitAllowance::Unlimited,
            extra_visit_price_minor: 0,
            services: vec!["All diagnostics".to_string()],
        };
        plan_repo.expect_find_by_id().with(eq(4)).returning(move |_| {
            let plan = plan.clone();
            Box::pin(async move { Ok(Some(plan)) })
        });

        visit_repo.expect_record_costed().returning(move |new_visit, pricing| {
            let visits_before = 9;
            let visit = sample_visit(
                12,
                new_visit.user_id,
                new_visit.subscription_id,
                pricing.cost_for_next_minor(visits_before),
            );
            Box::pin(async move { Ok((visit, visits_before)) })
        });

        let usecase = usecase_with(plan_repo, subscription_repo, visit_repo);
        let recorded = usecase
            .record_visit(
                user_id,
                RecordVisitModel {
                    subscription_id: 1,
                    notes: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(recorded.cost_minor, 0);
        assert!(!recorded.charged);
        assert_eq!(
            recorded.remaining_free_visits,
            AllowanceLabel::Label("unlimited")
        );
    }

    #[tokio::test]
    async fn usage_summary_without_active_subscriptions_is_not_an_error() {
        let user_id = Uuid::new_v4();
        let plan_repo = MockPlanRepository::new();
        let mut subscription_repo = MockSubscriptionRepository::new();
        let visit_repo = MockVisitRepository::new();

        subscription_repo
            .expect_list_active_by_user()
            .returning(|_, _| Box::pin(async { Ok(Vec::new()) }));

        let usecase = usecase_with(plan_repo, subscription_repo, visit_repo);
        let summary = usecase.usage_summary(user_id).await.unwrap();

        assert_eq!(summary.message.as_deref(), Some("No active subscriptions"));
        assert!(summary.subscriptions.is_empty());
        assert_eq!(summary.total_extra_charges_minor, 0);
    }

    #[tokio::test]
    async fn usage_summary_skips_subscriptions_with_missing_plans() {
        let user_id = Uuid::new_v4();
        let mut plan_repo = MockPlanRepository::new();
        let mut subscription_repo = MockSubscriptionRepository::new();
        let mut visit_repo = MockVisitRepository::new();

        let good = sample_subscription(1, user_id, 1, 10);
        let dangling = sample_subscription(2, user_id, 99, 10);
        subscription_repo
            .expect_list_active_by_user()
            .returning(move |_, _| {
                let subscriptions = vec![good.clone(), dangling.clone()];
                Box::pin(async move { Ok(subscriptions) })
            });

        let plan = sample_plan(1, VisitAllowance::Finite(2));
        plan_repo.expect_find_by_id().with(eq(1)).returning(move |_| {
            let plan = plan.clone();
            Box::pin(async move { Ok(Some(plan)) })
        });
        plan_repo
            .expect_find_by_id()
            .with(eq(99))
            .returning(|_| Box::pin(async { Ok(None) }));

        visit_repo
            .expect_count_for_subscription_since()
            .withf(|subscription_id, _| *subscription_id == 1)
            .returning(|_, _| Box::pin(async { Ok(1) }));
        visit_repo
            .expect_count_for_subscription()
            .with(eq(1))
            .returning(|_| Box::pin(async { Ok(5) }));
        visit_repo
            .expect_sum_charges_since()
            .withf(|subscription_id, _| *subscription_id == 1)
            .returning(|_, _| Box::pin(async { Ok(0) }));

        let usecase = usecase_with(plan_repo, subscription_repo, visit_repo);
        let summary = usecase.usage_summary(user_id).await.unwrap();

        assert_eq!(summary.subscriptions.len(), 1);
        assert_eq!(summary.subscriptions[0].subscription_id, 1);
    }

    #[tokio::test]
    async fn usage_summary_aggregates_charges_and_status_labels() {
        let user_id = Uuid::new_v4();
        let mut plan_repo = MockPlanRepository::new();
        let mut subscription_repo = MockSubscriptionRepository::new();
        let mut visit_repo = MockVisitRepository::new();

        let exceeded = sample_subscription(1, user_id, 1, 10);
        let unlimited = sample_subscription(2, user_id, 4, 20);
        subscription_repo
            .expect_list_active_by_user()
            .returning(move |_, _| {
                let subscriptions = vec![exceeded.clone(), unlimited.clone()];
                Box::pin(async move { Ok(subscriptions) })
            });

        let lite = sample_plan(1, VisitAllowance::Finite(2));
        plan_repo.expect_find_by_id().with(eq(1)).returning(move |_| {
            let plan = lite.clone();
            Box::pin(async move { Ok(Some(plan)) })
        });
        let premium = PlanEntity {
            id: 4,
            name: "Unlimited Premium Pack".to_string(),
            price_minor: 12000,
            included_visits: VisitAllowance::Unlimited,
            extra_visit_price_minor: 0,
            services: vec!["All diagnostics".to_string()],
        };
        plan_repo.expect_find_by_id().with(eq(4)).returning(move |_| {
            let plan = premium.clone();
            Box::pin(async move { Ok(Some(plan)) })
        });

        visit_repo
            .expect_count_for_subscription_since()
            .withf(|subscription_id, _| *subscription_id == 1)
            .returning(|_, _| Box::pin(async { Ok(3) }));
        visit_repo
            .expect_count_for_subscription()
            .with(eq(1))
            .returning(|_| Box::pin(async { Ok(3) }));
        visit_repo
            .expect_sum_charges_since()
            .withf(|subscription_id, _| *subscription_id == 1)
            .returning(|_, _| Box::pin(async { Ok(1500) }));

        visit_repo
            .expect_count_for_subscription_since()
            .withf(|subscription_id, _| *subscription_id == 2)
            .returning(|_, _| Box::pin(async { Ok(10) }));
        visit_repo
            .expect_count_for_subscription()
            .with(eq(2))
            .returning(|_| Box::pin(async { Ok(42) }));
        visit_repo
            .expect_sum_charges_since()
            .withf(|subscription_id, _| *subscription_id == 2)
            .returning(|_, _| Box::pin(async { Ok(0) }));

        let usecase = usecase_with(plan_repo, subscription_repo, visit_repo);
        let summary = usecase.usage_summary(user_id).await.unwrap();

        assert_eq!(summary.subscriptions.len(), 2);
        assert_eq!(summary.total_extra_charges_minor, 1500);

        let first = &summary.subscriptions[0];
        assert_eq!(first.status, UsageStatus::Exceeded);
        assert_eq!(first.remaining_free_visits, AllowanceLabel::Count(0));
        assert_eq!(first.charges_this_month_minor, 1500);

        let second = &summary.subscriptions[1];
        assert_eq!(second.status, UsageStatus::Unlimited);
        assert_eq!(second.included_visits, AllowanceLabel::Label("unlimited"));
        assert_eq!(second.total_visits_all_time, 42);
    }

    #[tokio::test]
    async fn usage_summary_counts_full_allowance_as_within_limit() {
        let user_id = Uuid::new_v4();
        let mut plan_repo = MockPlanRepository::new();
        let mut subscription_repo = MockSubscriptionRepository::new();
        let mut visit_repo = MockVisitRepository::new();

        let subscription = sample_subscription(1, user_id, 1, 10);
        subscription_repo
            .expect_list_active_by_user()
            .returning(move |_, _| {
                let subscriptions = vec![subscription.clone()];
                Box::pin(async move { Ok(subscriptions) })
            });

        let plan = sample_plan(1, VisitAllowance::Finite(2));
        plan_repo.expect_find_by_id().with(eq(1)).returning(move |_| {
            let plan = plan.clone();
            Box::pin(async move { Ok(Some(plan)) })
        });

        visit_repo
            .expect_count_for_subscription_since()
            .returning(|_, _| Box::pin(async { Ok(2) }));
        visit_repo
            .expect_count_for_subscription()
            .returning(|_| Box::pin(async { Ok(2) }));
        visit_repo
            .expect_sum_charges_since()
            .returning(|_, _| Box::pin(async { Ok(0) }));

        let usecase = usecase_with(plan_repo, subscription_repo, visit_repo);
        let summary = usecase.usage_summary(user_id).await.unwrap();

        assert_eq!(summary.subscriptions[0].status, UsageStatus::WithinLimit);
        assert_eq!(
            summary.subscriptions[0].remaining_free_visits,
            AllowanceLabel::Count(0)
        );
    }

    #[tokio::test]
    async fn visit_history_labels_unresolvable_sources_unknown() {
        let user_id = Uuid::new_v4();
        let mut plan_repo = MockPlanRepository::new();
        let mut subscription_repo = MockSubscriptionRepository::new();
        let mut visit_repo = MockVisitRepository::new();

        let visits = vec![
            sample_visit(1, user_id, 1, 1500),
            sample_visit(2, user_id, 9, 0),
        ];
        visit_repo
            .expect_list_by_user()
            .with(eq(user_id))
            .returning(move |_| {
                let visits = visits.clone();
                Box::pin(async move { Ok(visits) })
            });

        let subscription = sample_subscription(1, user_id, 1, 10);
        subscription_repo
            .expect_find_by_id()
            .with(eq(1))
            .returning(move |_| {
                let subscription = subscription.clone();
                Box::pin(async move { Ok(Some(subscription)) })
            });
        subscription_repo
            .expect_find_by_id()
            .with(eq(9))
            .returning(|_| Box::pin(async { Ok(None) }));

        let plan = sample_plan(1, VisitAllowance::Finite(2));
        plan_repo.expect_find_by_id().with(eq(1)).returning(move |_| {
            let plan = plan.clone();
            Box::pin(async move { Ok(Some(plan)) })
        });

        let usecase = usecase_with(plan_repo, subscription_repo, visit_repo);
        let history = usecase.visit_history(user_id).await.unwrap();

        assert_eq!(history.total_visits, 2);
        assert_eq!(history.visits[0].plan_name, "Lite Care Pack");
        assert!(history.visits[0].was_charged);
        assert_eq!(history.visits[1].plan_name, "Unknown");
        assert!(!history.visits[1].was_charged);
    }
}
