use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::attendance::Timestamp;

pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";
pub const TIME_OF_DAY_FORMAT: &str = "%H:%M:%S";

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

static HH_MM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{2}):(\d{2})").expect("HH:MM pattern is valid"));

/// Resolves a timestamp to a local wall-clock datetime.
///
/// Offset-carrying strings (RFC 3339) are converted to the local zone so that
/// date keys near midnight land on the local calendar day.
pub fn parse_timestamp(ts: &Timestamp) -> Option<NaiveDateTime> {
    match ts {
        Timestamp::Native(dt) => Some(*dt),
        Timestamp::Text(text) => parse_text(text.trim()),
    }
}

fn parse_text(text: &str) -> Option<NaiveDateTime> {
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Local).naive_local());
    }

    DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, DATE_KEY_FORMAT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Local `YYYY-MM-DD` for a timestamp.
///
/// An unparseable string of at least 10 characters yields its first 10
/// characters verbatim (already formatted date strings).
pub fn to_date_key(ts: &Timestamp) -> Option<String> {
    if let Some(dt) = parse_timestamp(ts) {
        return Some(dt.format(DATE_KEY_FORMAT).to_string());
    }

    match ts {
        Timestamp::Text(text) if text.chars().count() >= 10 => {
            Some(text.chars().take(10).collect())
        }
        _ => None,
    }
}

/// Local `HH:MM:SS` for a timestamp, or the first `HH:MM` found in an
/// unparseable string with seconds set to `00`.
pub fn to_time_of_day(ts: &Timestamp) -> Option<String> {
    if let Some(dt) = parse_timestamp(ts) {
        return Some(dt.format(TIME_OF_DAY_FORMAT).to_string());
    }

    let Timestamp::Text(text) = ts else {
        return None;
    };

    HH_MM.captures_iter(text).find_map(|caps| {
        let hours: u32 = caps[1].parse().ok()?;
        let minutes: u32 = caps[2].parse().ok()?;
        (hours < 24 && minutes < 60).then(|| format!("{hours:02}:{minutes:02}:00"))
    })
}

/// Minutes since midnight for `HH:MM[:SS]`. Seconds are validated but do not
/// count. Any non-numeric or out-of-range component gives `None`.
pub fn time_to_minutes(time: &str) -> Option<i64> {
    let mut parts = time.trim().split(':');

    let hours = numeric(parts.next()?, 24)?;
    let minutes = numeric(parts.next()?, 60)?;
    if let Some(seconds) = parts.next() {
        numeric(seconds, 60)?;
    }
    if parts.next().is_some() {
        return None;
    }

    Some(hours * 60 + minutes)
}

/// Digits only, below `limit`.
fn numeric(part: &str, limit: i64) -> Option<i64> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok().filter(|value| *value < limit)
}

/// Local date key of an already resolved date.
pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}
