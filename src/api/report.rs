use actix_web::{HttpResponse, web};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use utoipa::{IntoParams, ToSchema};

use super::{DateRangeQuery, load_schedules};
use crate::{
    attendance::{
        clock_state::{ClockState, resolve_clock_state_on},
        report::{Period, Report, UserReport, summarize, summarize_by_user},
        status::{DetailedStatus, get_detailed_status_with_tolerance},
    },
    auth::auth::AuthUser,
    config::Config,
    db,
    error::ApiError,
    model::{
        schedule::{ScheduleRow, pick_schedule},
        team::Team,
    },
};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReportQuery {
    /// `day`, `week` (default) or `month`
    #[param(value_type = Option<String>, example = "week")]
    pub period: Option<Period>,
    #[param(value_type = Option<String>, format = Date)]
    pub from: Option<NaiveDate>,
    #[param(value_type = Option<String>, format = Date)]
    pub to: Option<NaiveDate>,
}

impl ReportQuery {
    fn range(&self) -> Result<(NaiveDate, NaiveDate), ApiError> {
        DateRangeQuery {
            from: self.from,
            to: self.to,
        }
        .resolve()
    }
}

#[derive(Serialize, ToSchema)]
pub struct UserReportResponse {
    pub user_id: u64,
    #[schema(value_type = String, format = "date")]
    pub from: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub to: NaiveDate,
    pub report: Report,
}

#[derive(Serialize, ToSchema)]
pub struct TeamReportResponse {
    pub team_id: u64,
    pub team_name: String,
    #[schema(value_type = String, format = "date")]
    pub from: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub to: NaiveDate,
    pub members: Vec<UserReport>,
}

#[derive(Serialize, ToSchema)]
pub struct MemberToday {
    pub user_id: u64,
    pub username: String,
    pub state: ClockState,
    pub status: DetailedStatus,
}

#[derive(Serialize, ToSchema)]
pub struct TeamTodayResponse {
    pub team_id: u64,
    pub team_name: String,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub members: Vec<MemberToday>,
}

async fn team_or_404(pool: &MySqlPool, team_id: u64) -> Result<Team, ApiError> {
    db::find_team(pool, team_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Team not found".into()))
}

/// Users see themselves; HR/admin see everyone; managers see their team.
async fn require_user_access(
    auth: &AuthUser,
    pool: &MySqlPool,
    user_id: u64,
) -> Result<(), ApiError> {
    if auth.user_id == user_id || auth.is_hr_or_admin() {
        return Ok(());
    }

    match db::team_of_user(pool, user_id).await? {
        Some(team) if auth.can_view_team(&team) => Ok(()),
        _ => Err(ApiError::Forbidden("Not allowed to view this user".into())),
    }
}

/// Period report of one user
#[utoipa::path(
    get,
    path = "/api/attendance/users/{user_id}/report",
    params(
        ("user_id", description = "User ID"),
        ReportQuery
    ),
    responses(
        (status = 200, body = UserReportResponse),
        (status = 400, description = "Invalid period or date range"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn user_report(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
    query: web::Query<ReportQuery>,
) -> Result<HttpResponse, ApiError> {
    let user_id = path.into_inner();
    require_user_access(&auth, pool.get_ref(), user_id).await?;

    let (from, to) = query.range()?;
    let period = query.period.unwrap_or_default();

    let records = db::user_records(pool.get_ref(), user_id, from, to).await?;
    let schedules = load_schedules(pool.get_ref(), user_id).await?;

    let report = summarize(
        &records,
        |date| pick_schedule(&schedules, date),
        period,
        &config.report_options(),
    );

    debug!(
        user_id,
        records = records.len(),
        skipped = report.skipped_records,
        "User report built"
    );

    Ok(HttpResponse::Ok().json(UserReportResponse {
        user_id,
        from,
        to,
        report,
    }))
}

/// Per-member period report of a team
#[utoipa::path(
    get,
    path = "/api/teams/{team_id}/report",
    params(
        ("team_id", description = "Team ID"),
        ReportQuery
    ),
    responses(
        (status = 200, body = TeamReportResponse),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Team not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn team_report(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
    query: web::Query<ReportQuery>,
) -> Result<HttpResponse, ApiError> {
    let team = team_or_404(pool.get_ref(), path.into_inner()).await?;
    auth.require_team_access(&team)?;

    let (from, to) = query.range()?;
    let period = query.period.unwrap_or_default();

    let records = db::team_records(pool.get_ref(), team.id, from, to).await?;

    let mut schedules: HashMap<u64, Arc<Vec<ScheduleRow>>> = HashMap::new();
    for record in &records {
        if !schedules.contains_key(&record.user_id) {
            let rows = load_schedules(pool.get_ref(), record.user_id).await?;
            schedules.insert(record.user_id, rows);
        }
    }

    let members = summarize_by_user(
        &records,
        |user_id, date| {
            schedules
                .get(&user_id)
                .and_then(|rows| pick_schedule(rows, date))
        },
        period,
        &config.report_options(),
    );

    Ok(HttpResponse::Ok().json(TeamReportResponse {
        team_id: team.id,
        team_name: team.name,
        from,
        to,
        members,
    }))
}

/// Clock state of every active team member today
#[utoipa::path(
    get,
    path = "/api/teams/{team_id}/today",
    params(
        ("team_id", description = "Team ID")
    ),
    responses(
        (status = 200, body = TeamTodayResponse),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Team not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn team_today(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let team = team_or_404(pool.get_ref(), path.into_inner()).await?;
    auth.require_team_access(&team)?;

    let today = Local::now().date_naive();
    let users = db::active_team_members(pool.get_ref(), team.id).await?;
    let records = db::team_records(pool.get_ref(), team.id, today, today).await?;

    let mut members = Vec::with_capacity(users.len());
    for user in users {
        let state = resolve_clock_state_on(user.id, &records, today);
        let schedules = load_schedules(pool.get_ref(), user.id).await?;
        let schedule = pick_schedule(&schedules, today);
        let status = get_detailed_status_with_tolerance(
            state.current_record.as_ref(),
            schedule.as_ref(),
            config.arrival_tolerance_minutes,
        );

        members.push(MemberToday {
            user_id: user.id,
            username: user.username,
            state,
            status,
        });
    }

    Ok(HttpResponse::Ok().json(TeamTodayResponse {
        team_id: team.id,
        team_name: team.name,
        date: today,
        members,
    }))
}
