use chrono::{Local, NaiveDate};
use serde::Serialize;
use strum_macros::Display;
use utoipa::ToSchema;

use super::time_utils::{date_key, to_date_key};
use crate::model::attendance::ClockRecord;

/// Where a user stands today: `Absent -> Open -> Closed`, Closed until midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ClockPhase {
    Absent,
    Open,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ClockState {
    pub phase: ClockPhase,
    pub can_clock_in: bool,
    pub can_clock_out: bool,
    /// Today's record, open or closed.
    #[schema(nullable = true)]
    pub current_record: Option<ClockRecord>,
}

impl ClockState {
    fn absent() -> Self {
        ClockState {
            phase: ClockPhase::Absent,
            can_clock_in: true,
            can_clock_out: false,
            current_record: None,
        }
    }

    fn from_record(record: &ClockRecord) -> Self {
        let open = record.is_open();
        ClockState {
            phase: if open { ClockPhase::Open } else { ClockPhase::Closed },
            can_clock_in: false,
            can_clock_out: open,
            current_record: Some(record.clone()),
        }
    }
}

/// Resolves today's clock state of `user_id` from the local date at call time.
pub fn resolve_clock_state(user_id: u64, records: &[ClockRecord]) -> ClockState {
    resolve_clock_state_on(user_id, records, Local::now().date_naive())
}

/// Resolves the clock state of `user_id` on `today`.
///
/// Only the first of the user's records arriving on `today` counts, in input
/// order; a second session on the same day is never considered. Records whose
/// arrival cannot be dated are ignored.
pub fn resolve_clock_state_on(user_id: u64, records: &[ClockRecord], today: NaiveDate) -> ClockState {
    let today = date_key(today);

    records
        .iter()
        .filter(|record| record.user_id == user_id)
        .find(|record| to_date_key(&record.arrival_time).as_deref() == Some(today.as_str()))
        .map(ClockState::from_record)
        .unwrap_or_else(ClockState::absent)
}

/// What a clock toggle does for a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleDecision {
    ClockIn,
    /// Close today's open record.
    ClockOut(ClockRecord),
    /// Close a record left open on an earlier day instead of opening a second one.
    CloseStale(ClockRecord),
    AlreadyClosed,
}

/// Decides a clock toggle from the user's records of `today` and every record
/// of theirs that is still open, whatever day it started on.
///
/// A user holds at most one open record. When nothing is open today but an
/// older record is, the toggle closes that one; the next toggle clocks in.
pub fn decide_toggle(
    user_id: u64,
    today_records: &[ClockRecord],
    open_records: &[ClockRecord],
    today: NaiveDate,
) -> ToggleDecision {
    let state = resolve_clock_state_on(user_id, today_records, today);

    match (state.phase, state.current_record) {
        (ClockPhase::Open, Some(record)) => ToggleDecision::ClockOut(record),
        (ClockPhase::Closed, _) => ToggleDecision::AlreadyClosed,
        _ => open_records
            .iter()
            .find(|record| record.user_id == user_id && record.is_open())
            .cloned()
            .map(ToggleDecision::CloseStale)
            .unwrap_or(ToggleDecision::ClockIn),
    }
}
