use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

use super::time_utils::{time_to_minutes, to_time_of_day};
use crate::model::{attendance::Timestamp, schedule::LunchBreak};

pub const DEFAULT_TOLERANCE_MINUTES: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ArrivalKind {
    Late,
    Early,
    OnTime,
}

/// Classification of one arrival against the expected time of day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ArrivalStatus {
    pub status: ArrivalKind,

    /// Actual minus expected, in minutes. Positive means later than expected.
    #[schema(example = 6)]
    pub offset_minutes: i64,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = 6, nullable = true)]
    pub late_minutes: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(nullable = true)]
    pub early_minutes: Option<i64>,

    /// The arrival fell inside the lunch window. Does not affect `status`.
    pub during_break: bool,
}

impl ArrivalStatus {
    pub fn is_late(&self) -> bool {
        self.status == ArrivalKind::Late
    }

    pub fn is_early(&self) -> bool {
        self.status == ArrivalKind::Early
    }
}

/// Classifies an arrival as late, early or on time.
///
/// The tolerance is inclusive on both sides: exactly `tolerance_minutes` late
/// is still on time. Returns `None` when either time cannot be read, which
/// callers treat as "cannot classify".
pub fn classify_arrival(
    expected_time_of_day: &str,
    actual: &Timestamp,
    tolerance_minutes: i64,
    lunch_break: Option<&LunchBreak>,
) -> Option<ArrivalStatus> {
    let actual_minutes = time_to_minutes(&to_time_of_day(actual)?)?;
    let expected_minutes = time_to_minutes(expected_time_of_day)?;
    let diff = actual_minutes - expected_minutes;

    let (status, late_minutes, early_minutes) = if diff > tolerance_minutes {
        (ArrivalKind::Late, Some(diff), None)
    } else if diff < -tolerance_minutes {
        (ArrivalKind::Early, None, Some(diff.abs()))
    } else {
        (ArrivalKind::OnTime, None, None)
    };

    Some(ArrivalStatus {
        status,
        offset_minutes: diff,
        late_minutes,
        early_minutes,
        during_break: lunch_break.is_some_and(|lunch| within_break(actual_minutes, lunch)),
    })
}

fn within_break(minutes: i64, lunch: &LunchBreak) -> bool {
    match (time_to_minutes(&lunch.start), time_to_minutes(&lunch.end)) {
        (Some(start), Some(end)) => (start..=end).contains(&minutes),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arrival_at(time: &str) -> Timestamp {
        Timestamp::Text(format!("2026-01-05 {time}"))
    }

    fn lunch() -> LunchBreak {
        LunchBreak {
            start: "12:00:00".into(),
            end: "13:00:00".into(),
        }
    }

    #[test]
    fn tolerance_boundary_is_on_time() {
        let status = classify_arrival("09:00:00", &arrival_at("09:05:00"), 5, None).unwrap();
        assert_eq!(status.status, ArrivalKind::OnTime);
        assert_eq!(status.offset_minutes, 5);
        assert_eq!(status.late_minutes, None);

        let status = classify_arrival("09:00:00", &arrival_at("08:55:00"), 5, None).unwrap();
        assert_eq!(status.status, ArrivalKind::OnTime);
    }

    #[test]
    fn one_minute_past_tolerance_is_late() {
        let status = classify_arrival("09:00:00", &arrival_at("09:06:00"), 5, None).unwrap();
        assert_eq!(status.status, ArrivalKind::Late);
        assert_eq!(status.late_minutes, Some(6));
        assert!(status.is_late());
    }

    #[test]
    fn well_before_expected_is_early() {
        let status = classify_arrival("09:00:00", &arrival_at("08:50:00"), 5, None).unwrap();
        assert_eq!(status.status, ArrivalKind::Early);
        assert_eq!(status.early_minutes, Some(10));
        assert_eq!(status.offset_minutes, -10);
    }

    #[test]
    fn lunch_window_sets_flag_only() {
        let lunch = lunch();
        let status =
            classify_arrival("09:00:00", &arrival_at("12:30:00"), 5, Some(&lunch)).unwrap();
        assert!(status.during_break);
        assert_eq!(status.status, ArrivalKind::Late);

        let edge = classify_arrival("09:00:00", &arrival_at("13:00:00"), 5, Some(&lunch)).unwrap();
        assert!(edge.during_break);

        let after = classify_arrival("09:00:00", &arrival_at("13:01:00"), 5, Some(&lunch)).unwrap();
        assert!(!after.during_break);
    }

    #[test]
    fn unreadable_times_cannot_be_classified() {
        assert_eq!(
            classify_arrival("nine", &arrival_at("09:00:00"), 5, None),
            None
        );
        assert_eq!(
            classify_arrival("09:00:00", &Timestamp::from("garbage"), 5, None),
            None
        );
    }

    #[test]
    fn kind_renders_kebab_case() {
        assert_eq!(ArrivalKind::OnTime.to_string(), "on-time");
        assert_eq!(
            serde_json::to_value(ArrivalKind::OnTime).unwrap(),
            serde_json::json!("on-time")
        );
    }
}
