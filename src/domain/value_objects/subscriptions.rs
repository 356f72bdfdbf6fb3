use serde::{Deserialize, Serialize};

pub const DEFAULT_DURATION_DAYS: i64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertSubscriptionModel {
    pub plan_id: i64,
    #[serde(default = "default_duration_days")]
    pub duration_days: i64,
}

fn default_duration_days() -> i64 {
    DEFAULT_DURATION_DAYS
}
