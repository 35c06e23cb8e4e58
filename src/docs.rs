use crate::api::attendance::{
    ClockAction, ClockToggleResponse, HistoryEntry, HistoryResponse, TodayStatusResponse,
};
use crate::api::report::{MemberToday, TeamReportResponse, TeamTodayResponse, UserReportResponse};
use crate::api::schedule::{ScheduleListResponse, UpsertSchedule};
use crate::attendance::{
    clock_state::{ClockPhase, ClockState},
    lateness::{ArrivalKind, ArrivalStatus},
    report::{Period, PeriodSummary, Report, UserReport},
    status::DetailedStatus,
    worked::WorkedDuration,
};
use crate::model::{
    attendance::ClockRecord,
    schedule::{ExpectedSchedule, LunchBreak, ScheduleRow},
};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Timeclock API",
        version = "1.0.0",
        description = r#"
## Attendance time clock

Employees clock in and out; managers, HR and admins follow attendance of
users and teams.

### 🔹 Key Features
- **Clock toggle**
  - One endpoint: clocks in when absent today, out when clocked in
- **Status**
  - Late / early / on-time classification against the expected arrival,
    worked time, lunch-break flag
- **Reports**
  - Daily, weekly (ISO) and monthly totals, late counts and overtime
- **Schedules**
  - Per-user expected arrival and lunch window, optionally per weekday

### 🔐 Security
Every endpoint requires a **JWT Bearer** access token.
Team views are limited to the team's manager, **HR** and **Admin**.
"#,
    ),
    paths(
        crate::api::attendance::clock_toggle,
        crate::api::attendance::today_status,
        crate::api::attendance::history,

        crate::api::report::user_report,
        crate::api::report::team_report,
        crate::api::report::team_today,

        crate::api::schedule::get_schedules,
        crate::api::schedule::put_schedule
    ),
    components(
        schemas(
            ClockRecord,
            ClockAction,
            ClockToggleResponse,
            ClockPhase,
            ClockState,
            ArrivalKind,
            ArrivalStatus,
            WorkedDuration,
            DetailedStatus,
            TodayStatusResponse,
            HistoryEntry,
            HistoryResponse,
            Period,
            PeriodSummary,
            Report,
            UserReport,
            UserReportResponse,
            TeamReportResponse,
            MemberToday,
            TeamTodayResponse,
            LunchBreak,
            ExpectedSchedule,
            ScheduleRow,
            ScheduleListResponse,
            UpsertSchedule
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Attendance", description = "Clock in/out and personal attendance"),
        (name = "Reports", description = "User and team attendance reports"),
        (name = "Schedules", description = "Expected arrival and lunch windows"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_clock_endpoint_and_bearer_scheme() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/attendance/clock"));
        assert!(
            doc.components
                .unwrap()
                .security_schemes
                .contains_key("bearer_auth")
        );
    }
}
