use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A point in time as it reaches the attendance core.
///
/// Rows read through sqlx arrive as native local datetimes; imported legacy
/// data may still carry loosely formatted strings, which the time utilities
/// degrade on gracefully instead of rejecting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Native(NaiveDateTime),
    Text(String),
}

impl From<NaiveDateTime> for Timestamp {
    fn from(value: NaiveDateTime) -> Self {
        Timestamp::Native(value)
    }
}

impl From<&str> for Timestamp {
    fn from(value: &str) -> Self {
        Timestamp::Text(value.to_string())
    }
}

/// One attendance session of one user. No departure means the session is open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "id": 42,
        "user_id": 7,
        "arrival_time": "2026-01-05T09:02:11",
        "departure_time": null
    })
)]
pub struct ClockRecord {
    pub id: u64,
    pub user_id: u64,

    #[schema(value_type = String, example = "2026-01-05T09:02:11")]
    pub arrival_time: Timestamp,

    #[schema(value_type = Option<String>, nullable = true)]
    pub departure_time: Option<Timestamp>,
}

impl ClockRecord {
    pub fn is_open(&self) -> bool {
        self.departure_time.is_none()
    }
}

/// Row shape of `clock_records`; normalised into [`ClockRecord`] before use.
#[derive(Debug, sqlx::FromRow)]
pub struct ClockRow {
    pub id: u64,
    pub user_id: u64,
    pub arrival_time: NaiveDateTime,
    pub departure_time: Option<NaiveDateTime>,
}

impl From<ClockRow> for ClockRecord {
    fn from(row: ClockRow) -> Self {
        ClockRecord {
            id: row.id,
            user_id: row.user_id,
            arrival_time: row.arrival_time.into(),
            departure_time: row.departure_time.map(Timestamp::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn row_without_departure_becomes_open_record() {
        let arrival = NaiveDate::from_ymd_opt(2026, 1, 5)
            .unwrap()
            .and_hms_opt(9, 2, 11)
            .unwrap();
        let record: ClockRecord = ClockRow {
            id: 1,
            user_id: 7,
            arrival_time: arrival,
            departure_time: None,
        }
        .into();

        assert!(record.is_open());
        assert_eq!(record.arrival_time, Timestamp::Native(arrival));
    }

    #[test]
    fn timestamp_deserializes_native_before_text() {
        let native: Timestamp = serde_json::from_str("\"2026-01-05T09:02:11\"").unwrap();
        assert!(matches!(native, Timestamp::Native(_)));

        let text: Timestamp = serde_json::from_str("\"05/01/2026 09:02\"").unwrap();
        assert_eq!(text, Timestamp::Text("05/01/2026 09:02".to_string()));
    }
}
