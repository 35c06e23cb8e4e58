use serde::Serialize;
use utoipa::ToSchema;

use super::lateness::{ArrivalStatus, DEFAULT_TOLERANCE_MINUTES, classify_arrival};
use super::worked::{WorkedDuration, compute_worked_duration};
use crate::model::{attendance::ClockRecord, schedule::ExpectedSchedule};

/// Used when a user has no schedule for the day.
pub const DEFAULT_EXPECTED_ARRIVAL: &str = "09:00:00";

/// Arrival classification and worked time of one record, as shown on dashboards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct DetailedStatus {
    #[schema(nullable = true)]
    pub arrival_status: Option<ArrivalStatus>,
    /// Only set once the session is closed.
    #[schema(nullable = true)]
    pub worked_hours: Option<WorkedDuration>,
    #[schema(example = "09:00:00", nullable = true)]
    pub expected_arrival: Option<String>,
}

pub fn get_detailed_status(
    record: Option<&ClockRecord>,
    schedule: Option<&ExpectedSchedule>,
) -> DetailedStatus {
    get_detailed_status_with_tolerance(record, schedule, DEFAULT_TOLERANCE_MINUTES)
}

pub fn get_detailed_status_with_tolerance(
    record: Option<&ClockRecord>,
    schedule: Option<&ExpectedSchedule>,
    tolerance_minutes: i64,
) -> DetailedStatus {
    let Some(record) = record else {
        return DetailedStatus::default();
    };

    let expected_arrival = schedule
        .and_then(|s| s.expected_arrival.clone())
        .unwrap_or_else(|| DEFAULT_EXPECTED_ARRIVAL.to_string());
    let lunch_break = schedule.and_then(|s| s.lunch_break.as_ref());

    let arrival_status = classify_arrival(
        &expected_arrival,
        &record.arrival_time,
        tolerance_minutes,
        lunch_break,
    );
    let worked_hours = record
        .departure_time
        .as_ref()
        .map(|departure| compute_worked_duration(&record.arrival_time, departure));

    DetailedStatus {
        arrival_status,
        worked_hours,
        expected_arrival: Some(expected_arrival),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::lateness::ArrivalKind;
    use crate::model::{attendance::Timestamp, schedule::LunchBreak};

    fn record(arrival: &str, departure: Option<&str>) -> ClockRecord {
        ClockRecord {
            id: 1,
            user_id: 1,
            arrival_time: Timestamp::from(arrival),
            departure_time: departure.map(Timestamp::from),
        }
    }

    #[test]
    fn missing_record_reports_nothing() {
        assert_eq!(get_detailed_status(None, None), DetailedStatus::default());
    }

    #[test]
    fn defaults_to_nine_without_schedule() {
        let status = get_detailed_status(Some(&record("2026-01-05 09:20:00", None)), None);

        assert_eq!(status.expected_arrival.as_deref(), Some("09:00:00"));
        let arrival = status.arrival_status.unwrap();
        assert_eq!(arrival.status, ArrivalKind::Late);
        assert_eq!(arrival.late_minutes, Some(20));
        assert_eq!(status.worked_hours, None);
    }

    #[test]
    fn closed_record_gets_worked_hours() {
        let schedule = ExpectedSchedule {
            expected_arrival: Some("08:00:00".into()),
            lunch_break: None,
        };
        let status = get_detailed_status(
            Some(&record("2026-01-05 08:02:00", Some("2026-01-05 16:32:00"))),
            Some(&schedule),
        );

        assert_eq!(status.arrival_status.unwrap().status, ArrivalKind::OnTime);
        assert_eq!(status.worked_hours.unwrap().total_minutes, 510);
    }

    #[test]
    fn lunch_break_from_schedule_is_applied() {
        let schedule = ExpectedSchedule {
            expected_arrival: None,
            lunch_break: Some(LunchBreak {
                start: "12:00".into(),
                end: "13:30".into(),
            }),
        };
        let status =
            get_detailed_status(Some(&record("2026-01-05 12:10:00", None)), Some(&schedule));

        assert_eq!(status.expected_arrival.as_deref(), Some("09:00:00"));
        assert!(status.arrival_status.unwrap().during_break);
    }

    #[test]
    fn wider_tolerance_changes_classification() {
        let late = record("2026-01-05 09:08:00", None);
        let strict = get_detailed_status_with_tolerance(Some(&late), None, 5);
        let lenient = get_detailed_status_with_tolerance(Some(&late), None, 10);

        assert_eq!(strict.arrival_status.unwrap().status, ArrivalKind::Late);
        assert_eq!(lenient.arrival_status.unwrap().status, ArrivalKind::OnTime);
    }

    #[test]
    fn absurd_expected_arrival_cannot_be_classified() {
        let schedule = ExpectedSchedule {
            expected_arrival: Some("1000000000000000000:00".into()),
            lunch_break: None,
        };
        let status = get_detailed_status(
            Some(&record("2026-01-05 09:00:00", Some("2026-01-05 17:00:00"))),
            Some(&schedule),
        );

        assert_eq!(status.arrival_status, None);
        assert_eq!(status.worked_hours.unwrap().total_minutes, 480);
    }
}
