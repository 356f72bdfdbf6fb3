use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordVisitModel {
    pub subscription_id: i64,
    #[serde(default)]
    pub notes: Option<String>,
}

/// New visit waiting to be priced and persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVisitModel {
    pub user_id: Uuid,
    pub subscription_id: i64,
    pub notes: Option<String>,
}

/// First instant of the calendar month containing `now`, in UTC. Usage
/// windows follow calendar months, not rolling 30-day windows.
pub fn start_of_month_utc(now: DateTime<Utc>) -> DateTime<Utc> {
    // Midnight on the 1st is always a valid, unambiguous UTC instant.
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}

/// Human label for the month of `now`, e.g. "August 2026".
pub fn month_label(now: DateTime<Utc>) -> String {
    now.format("%B %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
            .single()
            .unwrap()
    }

    #[test]
    fn start_of_month_drops_day_and_time() {
        assert_eq!(
            start_of_month_utc(utc(2026, 8, 6, 14, 30)),
            utc(2026, 8, 1, 0, 0)
        );
    }

    #[test]
    fn start_of_month_keeps_year_at_december_end() {
        assert_eq!(
            start_of_month_utc(utc(2025, 12, 31, 23, 59)),
            utc(2025, 12, 1, 0, 0)
        );
    }

    #[test]
    fn start_of_month_handles_leap_february() {
        assert_eq!(
            start_of_month_utc(utc(2024, 2, 29, 8, 0)),
            utc(2024, 2, 1, 0, 0)
        );
    }

    #[test]
    fn month_label_is_name_and_year() {
        assert_eq!(month_label(utc(2026, 8, 6, 10, 0)), "August 2026");
        assert_eq!(month_label(utc(2025, 1, 1, 0, 0)), "January 2025");
    }
}
