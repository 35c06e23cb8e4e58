//! Attendance-state core: pure functions over clock records and schedules.
//!
//! Nothing here does I/O or holds shared state. Handlers fetch records and
//! schedules, feed them through these functions and render the results.

pub mod clock_state;
pub mod lateness;
pub mod report;
pub mod status;
pub mod time_utils;
pub mod worked;
