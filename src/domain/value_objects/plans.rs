use serde::{Deserialize, Serialize};

/// Monthly visit allowance attached to a plan.
///
/// Stored as a nullable count in Postgres (NULL = unlimited) and kept as a
/// tagged enum in the domain so the pricing rules never compare against a
/// numeric sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisitAllowance {
    Finite(i32),
    Unlimited,
}

impl VisitAllowance {
    pub fn from_stored(included_visits: Option<i32>) -> Self {
        match included_visits {
            Some(count) => VisitAllowance::Finite(count),
            None => VisitAllowance::Unlimited,
        }
    }

    pub fn to_stored(self) -> Option<i32> {
        match self {
            VisitAllowance::Finite(count) => Some(count),
            VisitAllowance::Unlimited => None,
        }
    }

    pub fn is_unlimited(self) -> bool {
        matches!(self, VisitAllowance::Unlimited)
    }

    /// Free visits left after `visits_this_month` have been taken, clamped
    /// at zero. None means the allowance never runs out.
    pub fn remaining_free(self, visits_this_month: i64) -> Option<i64> {
        match self {
            VisitAllowance::Finite(included) => {
                Some((i64::from(included) - visits_this_month).max(0))
            }
            VisitAllowance::Unlimited => None,
        }
    }
}

/// Pricing rule for a single visit, detached from the plan row so the
/// storage layer can apply it inside the same transaction as the monthly
/// visit count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisitPricing {
    pub allowance: VisitAllowance,
    pub extra_visit_price_minor: i32,
}

impl VisitPricing {
    /// Cost of the next visit given how many were already taken this
    /// calendar month. The count excludes the visit being recorded, so a
    /// plan with an allowance of N charges from the (N+1)th visit on.
    pub fn cost_for_next_minor(&self, visits_this_month: i64) -> i32 {
        match self.allowance {
            VisitAllowance::Unlimited => 0,
            VisitAllowance::Finite(included) if visits_this_month < i64::from(included) => 0,
            VisitAllowance::Finite(_) => self.extra_visit_price_minor,
        }
    }
}

/// Count-or-label rendering used by the plan catalog and usage summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AllowanceLabel {
    Count(i64),
    Label(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lite_pricing() -> VisitPricing {
        VisitPricing {
            allowance: VisitAllowance::Finite(2),
            extra_visit_price_minor: 1500,
        }
    }

    #[test]
    fn visits_within_allowance_are_free() {
        let pricing = lite_pricing();

        assert_eq!(pricing.cost_for_next_minor(0), 0);
        assert_eq!(pricing.cost_for_next_minor(1), 0);
    }

    #[test]
    fn visit_beyond_allowance_is_charged() {
        let pricing = lite_pricing();

        assert_eq!(pricing.cost_for_next_minor(2), 1500);
        assert_eq!(pricing.cost_for_next_minor(3), 1500);
    }

    #[test]
    fn three_visits_in_a_month_cost_free_free_charged() {
        let pricing = lite_pricing();

        let costs: Vec<i32> = (0..3).map(|taken| pricing.cost_for_next_minor(taken)).collect();

        assert_eq!(costs, vec![0, 0, 1500]);
    }

    #[test]
    fn unlimited_allowance_never_charges() {
        let pricing = VisitPricing {
            allowance: VisitAllowance::Unlimited,
            extra_visit_price_minor: 1500,
        };

        assert_eq!(pricing.cost_for_next_minor(0), 0);
        assert_eq!(pricing.cost_for_next_minor(50), 0);
    }

    #[test]
    fn remaining_free_clamps_at_zero() {
        let allowance = VisitAllowance::Finite(2);

        assert_eq!(allowance.remaining_free(0), Some(2));
        assert_eq!(allowance.remaining_free(1), Some(1));
        assert_eq!(allowance.remaining_free(2), Some(0));
        assert_eq!(allowance.remaining_free(3), Some(0));
        assert_eq!(VisitAllowance::Unlimited.remaining_free(10), None);
    }

    #[test]
    fn allowance_round_trips_through_storage() {
        assert_eq!(
            VisitAllowance::from_stored(Some(4)),
            VisitAllowance::Finite(4)
        );
        assert_eq!(VisitAllowance::from_stored(None), VisitAllowance::Unlimited);
        assert_eq!(VisitAllowance::Finite(4).to_stored(), Some(4));
        assert_eq!(VisitAllowance::Unlimited.to_stored(), None);
    }
}
