use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

use super::lateness::DEFAULT_TOLERANCE_MINUTES;
use super::status::get_detailed_status_with_tolerance;
use super::time_utils::{DATE_KEY_FORMAT, to_date_key};
use crate::model::{attendance::ClockRecord, schedule::ExpectedSchedule};

pub const DEFAULT_OVERTIME_THRESHOLD_MINUTES: i64 = 7 * 60;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Period {
    Day,
    #[default]
    Week,
    Month,
}

impl Period {
    /// Bucket key: `YYYY-MM-DD`, ISO `YYYY-Www`, or `YYYY-MM`.
    pub fn key(&self, date: NaiveDate) -> String {
        match self {
            Period::Day => date.format(DATE_KEY_FORMAT).to_string(),
            Period::Week => {
                let week = date.iso_week();
                format!("{}-W{:02}", week.year(), week.week())
            }
            Period::Month => date.format("%Y-%m").to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ReportOptions {
    pub tolerance_minutes: i64,
    /// Daily worked minutes beyond this count as overtime.
    pub overtime_threshold_minutes: i64,
}

impl Default for ReportOptions {
    fn default() -> Self {
        ReportOptions {
            tolerance_minutes: DEFAULT_TOLERANCE_MINUTES,
            overtime_threshold_minutes: DEFAULT_OVERTIME_THRESHOLD_MINUTES,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct PeriodSummary {
    #[schema(example = "2026-W02")]
    pub period: String,
    pub days_worked: u32,
    pub total_minutes: i64,
    pub total_hours: f64,
    pub late_count: u32,
    pub early_count: u32,
    /// Sessions still open; counted but not summed.
    pub open_sessions: u32,
    pub overtime_minutes: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct Report {
    pub period: Period,
    pub summaries: Vec<PeriodSummary>,
    /// Records left out because their arrival could not be dated.
    pub skipped_records: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct UserReport {
    pub user_id: u64,
    pub report: Report,
}

#[derive(Default)]
struct Bucket {
    summary: PeriodSummary,
    minutes_per_day: BTreeMap<NaiveDate, i64>,
    days: BTreeSet<NaiveDate>,
}

/// Aggregates records into period buckets sorted by key.
///
/// `schedule_for` gives the schedule that applied on a record's date; `None`
/// falls back to the 09:00:00 default.
pub fn summarize<F>(
    records: &[ClockRecord],
    schedule_for: F,
    period: Period,
    options: &ReportOptions,
) -> Report
where
    F: Fn(NaiveDate) -> Option<ExpectedSchedule>,
{
    let mut buckets: BTreeMap<String, Bucket> = BTreeMap::new();
    let mut skipped_records = 0;

    for record in records {
        let Some(date) = record_date(record) else {
            skipped_records += 1;
            continue;
        };

        let schedule = schedule_for(date);
        let status = get_detailed_status_with_tolerance(
            Some(record),
            schedule.as_ref(),
            options.tolerance_minutes,
        );

        let bucket = buckets.entry(period.key(date)).or_default();
        bucket.days.insert(date);

        match &status.arrival_status {
            Some(arrival) if arrival.is_late() => bucket.summary.late_count += 1,
            Some(arrival) if arrival.is_early() => bucket.summary.early_count += 1,
            _ => {}
        }

        match status.worked_hours {
            Some(worked) => {
                bucket.summary.total_minutes += worked.total_minutes;
                *bucket.minutes_per_day.entry(date).or_default() += worked.total_minutes;
            }
            None => bucket.summary.open_sessions += 1,
        }
    }

    let summaries = buckets
        .into_iter()
        .map(|(key, bucket)| {
            let mut summary = bucket.summary;
            summary.period = key;
            summary.days_worked = bucket.days.len() as u32;
            summary.total_hours = summary.total_minutes as f64 / 60.0;
            summary.overtime_minutes = bucket
                .minutes_per_day
                .values()
                .map(|minutes| (minutes - options.overtime_threshold_minutes).max(0))
                .sum();
            summary
        })
        .collect();

    Report {
        period,
        summaries,
        skipped_records,
    }
}

/// Groups records per user (ascending id) and summarises each group.
pub fn summarize_by_user<F>(
    records: &[ClockRecord],
    schedule_for: F,
    period: Period,
    options: &ReportOptions,
) -> Vec<UserReport>
where
    F: Fn(u64, NaiveDate) -> Option<ExpectedSchedule>,
{
    let mut per_user: BTreeMap<u64, Vec<ClockRecord>> = BTreeMap::new();
    for record in records {
        per_user.entry(record.user_id).or_default().push(record.clone());
    }

    per_user
        .into_iter()
        .map(|(user_id, records)| UserReport {
            user_id,
            report: summarize(&records, |date| schedule_for(user_id, date), period, options),
        })
        .collect()
}

fn record_date(record: &ClockRecord) -> Option<NaiveDate> {
    let key = to_date_key(&record.arrival_time)?;
    NaiveDate::parse_from_str(&key, DATE_KEY_FORMAT).ok()
}
