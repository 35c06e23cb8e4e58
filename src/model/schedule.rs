use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const TIME_OF_DAY: &str = "%H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LunchBreak {
    #[schema(example = "12:00:00")]
    pub start: String,
    #[schema(example = "13:00:00")]
    pub end: String,
}

/// Expected arrival and lunch window for one user on one day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ExpectedSchedule {
    #[schema(example = "09:00:00", nullable = true)]
    pub expected_arrival: Option<String>,
    #[schema(nullable = true)]
    pub lunch_break: Option<LunchBreak>,
}

/// Row of `schedules`. `weekday` is 0 (Monday) to 6; NULL marks the user's default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow, ToSchema)]
pub struct ScheduleRow {
    pub id: u64,
    pub user_id: u64,

    #[schema(example = 0, nullable = true)]
    pub weekday: Option<u8>,

    #[schema(value_type = Option<String>, example = "09:00:00", nullable = true)]
    pub expected_arrival: Option<NaiveTime>,

    #[schema(value_type = Option<String>, example = "12:00:00", nullable = true)]
    pub lunch_start: Option<NaiveTime>,

    #[schema(value_type = Option<String>, example = "13:00:00", nullable = true)]
    pub lunch_end: Option<NaiveTime>,
}

impl ScheduleRow {
    pub fn to_schedule(&self) -> ExpectedSchedule {
        let lunch_break = match (self.lunch_start, self.lunch_end) {
            (Some(start), Some(end)) => Some(LunchBreak {
                start: start.format(TIME_OF_DAY).to_string(),
                end: end.format(TIME_OF_DAY).to_string(),
            }),
            _ => None,
        };

        ExpectedSchedule {
            expected_arrival: self
                .expected_arrival
                .map(|t| t.format(TIME_OF_DAY).to_string()),
            lunch_break,
        }
    }
}

/// Picks the schedule that applies on `date`: a weekday-specific row wins over
/// the user's default row. `None` when the user has neither.
pub fn pick_schedule(rows: &[ScheduleRow], date: NaiveDate) -> Option<ExpectedSchedule> {
    let weekday = date.weekday().num_days_from_monday() as u8;

    rows.iter()
        .find(|row| row.weekday == Some(weekday))
        .or_else(|| rows.iter().find(|row| row.weekday.is_none()))
        .map(ScheduleRow::to_schedule)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: u64, weekday: Option<u8>, arrival: (u32, u32)) -> ScheduleRow {
        ScheduleRow {
            id,
            user_id: 1,
            weekday,
            expected_arrival: NaiveTime::from_hms_opt(arrival.0, arrival.1, 0),
            lunch_start: NaiveTime::from_hms_opt(12, 0, 0),
            lunch_end: NaiveTime::from_hms_opt(12, 45, 0),
        }
    }

    #[test]
    fn weekday_row_wins_over_default() {
        // 2026-01-05 is a Monday
        let monday = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let rows = vec![row(1, None, (9, 0)), row(2, Some(0), (7, 30))];

        let schedule = pick_schedule(&rows, monday).unwrap();
        assert_eq!(schedule.expected_arrival.as_deref(), Some("07:30:00"));
        assert_eq!(
            schedule.lunch_break,
            Some(LunchBreak {
                start: "12:00:00".into(),
                end: "12:45:00".into()
            })
        );
    }

    #[test]
    fn falls_back_to_default_row() {
        let tuesday = NaiveDate::from_ymd_opt(2026, 1, 6).unwrap();
        let rows = vec![row(1, None, (8, 15)), row(2, Some(0), (7, 30))];

        let schedule = pick_schedule(&rows, tuesday).unwrap();
        assert_eq!(schedule.expected_arrival.as_deref(), Some("08:15:00"));
    }

    #[test]
    fn no_rows_means_no_schedule() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 6).unwrap();
        assert_eq!(pick_schedule(&[], date), None);
    }

    #[test]
    fn half_configured_lunch_is_dropped() {
        let mut only_start = row(1, None, (9, 0));
        only_start.lunch_end = None;
        assert_eq!(only_start.to_schedule().lunch_break, None);
    }
}
