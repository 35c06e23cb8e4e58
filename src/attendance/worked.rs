use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::time_utils::parse_timestamp;
use crate::model::attendance::Timestamp;

/// Elapsed time of one session. Never negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WorkedDuration {
    #[schema(example = 8)]
    pub hours: i64,
    #[schema(example = 30)]
    pub minutes: i64,
    #[schema(example = 510)]
    pub total_minutes: i64,
    #[schema(example = 8.5)]
    pub total_hours: f64,
}

impl WorkedDuration {
    pub fn from_minutes(total_minutes: i64) -> Self {
        let total_minutes = total_minutes.max(0);
        WorkedDuration {
            hours: total_minutes / 60,
            minutes: total_minutes % 60,
            total_minutes,
            total_hours: total_minutes as f64 / 60.0,
        }
    }
}

/// Worked time between arrival and departure, floored to whole minutes.
///
/// Unreadable timestamps and departures before arrivals count as zero so a
/// bad row cannot pull aggregate totals negative.
pub fn compute_worked_duration(arrival: &Timestamp, departure: &Timestamp) -> WorkedDuration {
    match (parse_timestamp(arrival), parse_timestamp(departure)) {
        (Some(arrival), Some(departure)) => worked_between(arrival, departure),
        _ => WorkedDuration::default(),
    }
}

pub fn worked_between(arrival: NaiveDateTime, departure: NaiveDateTime) -> WorkedDuration {
    WorkedDuration::from_minutes((departure - arrival).num_minutes())
}

/// Worked time of a still open session, measured against `now`.
pub fn live_worked_duration(arrival: &Timestamp, now: NaiveDateTime) -> WorkedDuration {
    parse_timestamp(arrival)
        .map(|arrival| worked_between(arrival, now))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(time: &str) -> Timestamp {
        Timestamp::Text(format!("2026-01-05 {time}"))
    }

    #[test]
    fn full_day_with_half_hour() {
        let worked = compute_worked_duration(&at("09:00:00"), &at("17:30:00"));
        assert_eq!(
            worked,
            WorkedDuration {
                hours: 8,
                minutes: 30,
                total_minutes: 510,
                total_hours: 8.5,
            }
        );
    }

    #[test]
    fn departure_before_arrival_clamps_to_zero() {
        let worked = compute_worked_duration(&at("09:00:00"), &at("08:00:00"));
        assert_eq!(worked, WorkedDuration::default());
        assert!(worked.total_hours >= 0.0);
    }

    #[test]
    fn partial_minutes_are_floored() {
        let worked = compute_worked_duration(&at("09:00:30"), &at("10:00:00"));
        assert_eq!(worked.total_minutes, 59);
    }

    #[test]
    fn whole_minute_differences_are_exact() {
        let start = NaiveDate::from_ymd_opt(2026, 1, 5)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap();

        for m in [0_i64, 1, 59, 60, 61, 479, 721, 1439] {
            let end = start + chrono::Duration::minutes(m);
            let worked = compute_worked_duration(&start.into(), &end.into());
            assert_eq!(worked.total_minutes, m);
            assert_eq!(worked.hours * 60 + worked.minutes, m);
        }
    }

    #[test]
    fn unreadable_input_counts_as_zero() {
        let worked = compute_worked_duration(&Timestamp::from("n/a"), &at("17:00:00"));
        assert_eq!(worked.total_minutes, 0);
    }

    #[test]
    fn live_duration_runs_against_now() {
        let now = NaiveDate::from_ymd_opt(2026, 1, 5)
            .unwrap()
            .and_hms_opt(11, 15, 0)
            .unwrap();
        let worked = live_worked_duration(&at("09:00:00"), now);
        assert_eq!((worked.hours, worked.minutes), (2, 15));
    }
}
