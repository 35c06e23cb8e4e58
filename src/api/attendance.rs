use actix_web::{HttpResponse, web};
use chrono::{Local, NaiveDate, NaiveDateTime, SubsecRound};
use serde::Serialize;
use sqlx::{MySql, MySqlPool, Transaction};
use strum_macros::Display;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use super::{DateRangeQuery, load_schedules};
use crate::{
    attendance::{
        clock_state::{ClockState, ToggleDecision, decide_toggle, resolve_clock_state_on},
        status::{DetailedStatus, get_detailed_status_with_tolerance},
        time_utils::{DATE_KEY_FORMAT, to_date_key},
        worked::{WorkedDuration, compute_worked_duration, live_worked_duration},
    },
    auth::auth::AuthUser,
    config::Config,
    db,
    error::ApiError,
    model::{
        attendance::{ClockRecord, Timestamp},
        schedule::pick_schedule,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ClockAction {
    ClockIn,
    ClockOut,
}

#[derive(Serialize, ToSchema)]
pub struct ClockToggleResponse {
    pub action: ClockAction,
    pub record: ClockRecord,
    /// Set on clock-out.
    #[schema(nullable = true)]
    pub worked_hours: Option<WorkedDuration>,
}

#[derive(Serialize, ToSchema)]
pub struct TodayStatusResponse {
    #[schema(value_type = String, format = "date", example = "2026-01-05")]
    pub date: NaiveDate,
    pub state: ClockState,
    pub status: DetailedStatus,
    /// Worked so far while the session is open.
    #[schema(nullable = true)]
    pub live_worked: Option<WorkedDuration>,
}

#[derive(Serialize, ToSchema)]
pub struct HistoryEntry {
    #[schema(example = "2026-01-05", nullable = true)]
    pub date: Option<String>,
    pub record: ClockRecord,
    pub status: DetailedStatus,
}

#[derive(Serialize, ToSchema)]
pub struct HistoryResponse {
    #[schema(value_type = String, format = "date")]
    pub from: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub to: NaiveDate,
    pub data: Vec<HistoryEntry>,
}

fn now() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(0)
}

/// Clock toggle endpoint
///
/// Clocks the caller in when they have no record today, out when today's
/// record is open. A closed record blocks both until the next day. A record
/// left open on an earlier day is closed before a new one can be opened.
#[utoipa::path(
    post,
    path = "/api/attendance/clock",
    responses(
        (status = 200, description = "Clocked in or out", body = ClockToggleResponse),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Already clocked out today, or a concurrent toggle", body = Object, example = json!({
            "error": "Already clocked out today"
        })),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
#[instrument(name = "clock_toggle", skip(auth, pool), fields(user_id = auth.user_id))]
pub async fn clock_toggle(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, ApiError> {
    let now = now();
    let today = now.date();

    let mut tx = pool.begin().await.map_err(toggle_error)?;
    let today_records = db::user_records_for_update(&mut *tx, auth.user_id, today)
        .await
        .map_err(toggle_error)?;
    let open_records = db::open_records_for_update(&mut *tx, auth.user_id)
        .await
        .map_err(toggle_error)?;

    let response = match decide_toggle(auth.user_id, &today_records, &open_records, today) {
        ToggleDecision::ClockIn => {
            let result = sqlx::query(
                r#"
                INSERT INTO clock_records (user_id, arrival_time)
                VALUES (?, ?)
                "#,
            )
            .bind(auth.user_id)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(toggle_error)?;

            ClockToggleResponse {
                action: ClockAction::ClockIn,
                record: ClockRecord {
                    id: result.last_insert_id(),
                    user_id: auth.user_id,
                    arrival_time: now.into(),
                    departure_time: None,
                },
                worked_hours: None,
            }
        }
        ToggleDecision::ClockOut(record) => close_record(&mut tx, record, now).await?,
        ToggleDecision::CloseStale(record) => {
            warn!(record_id = record.id, "Closing session left open on an earlier day");
            close_record(&mut tx, record, now).await?
        }
        ToggleDecision::AlreadyClosed => {
            return Err(ApiError::Conflict("Already clocked out today".into()));
        }
    };

    tx.commit().await.map_err(toggle_error)?;

    info!(
        action = %response.action,
        record_id = response.record.id,
        "Clock toggled"
    );

    Ok(HttpResponse::Ok().json(response))
}

async fn close_record(
    tx: &mut Transaction<'_, MySql>,
    mut record: ClockRecord,
    now: NaiveDateTime,
) -> Result<ClockToggleResponse, ApiError> {
    sqlx::query(
        r#"
        UPDATE clock_records
        SET departure_time = ?
        WHERE id = ?
        AND departure_time IS NULL
        "#,
    )
    .bind(now)
    .bind(record.id)
    .execute(&mut **tx)
    .await
    .map_err(toggle_error)?;

    let departure = Timestamp::from(now);
    let worked = compute_worked_duration(&record.arrival_time, &departure);
    record.departure_time = Some(departure);

    Ok(ClockToggleResponse {
        action: ClockAction::ClockOut,
        record,
        worked_hours: Some(worked),
    })
}

/// Deadlock (`40001`) or duplicate key (`23000`): another toggle of the same
/// user won the race.
fn is_lock_conflict(code: Option<&str>) -> bool {
    matches!(code, Some("40001") | Some("23000"))
}

fn toggle_error(e: sqlx::Error) -> ApiError {
    if let sqlx::Error::Database(db_err) = &e {
        if is_lock_conflict(db_err.code().as_deref()) {
            warn!(error = %e, "Concurrent clock toggle");
            return ApiError::Conflict("Another clock request is in progress, try again".into());
        }
    }
    e.into()
}

/// Today's clock state of the caller
#[utoipa::path(
    get,
    path = "/api/attendance/status",
    responses(
        (status = 200, body = TodayStatusResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn today_status(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    let now = now();
    let today = now.date();

    let records = db::user_records(pool.get_ref(), auth.user_id, today, today).await?;
    let schedules = load_schedules(pool.get_ref(), auth.user_id).await?;
    let schedule = pick_schedule(&schedules, today);

    let state = resolve_clock_state_on(auth.user_id, &records, today);
    let status = get_detailed_status_with_tolerance(
        state.current_record.as_ref(),
        schedule.as_ref(),
        config.arrival_tolerance_minutes,
    );
    let live_worked = state
        .current_record
        .as_ref()
        .filter(|record| record.is_open())
        .map(|record| live_worked_duration(&record.arrival_time, now));

    Ok(HttpResponse::Ok().json(TodayStatusResponse {
        date: today,
        state,
        status,
        live_worked,
    }))
}

/// Clock history of the caller with per-record status
#[utoipa::path(
    get,
    path = "/api/attendance/history",
    params(DateRangeQuery),
    responses(
        (status = 200, body = HistoryResponse),
        (status = 400, description = "Invalid date range"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn history(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<DateRangeQuery>,
) -> Result<HttpResponse, ApiError> {
    let (from, to) = query.resolve()?;

    let records = db::user_records(pool.get_ref(), auth.user_id, from, to).await?;
    let schedules = load_schedules(pool.get_ref(), auth.user_id).await?;

    let data = records
        .into_iter()
        .map(|record| {
            let date = to_date_key(&record.arrival_time);
            let schedule = date
                .as_deref()
                .and_then(|key| NaiveDate::parse_from_str(key, DATE_KEY_FORMAT).ok())
                .and_then(|day| pick_schedule(&schedules, day));
            let status = get_detailed_status_with_tolerance(
                Some(&record),
                schedule.as_ref(),
                config.arrival_tolerance_minutes,
            );
            HistoryEntry {
                date,
                record,
                status,
            }
        })
        .collect();

    Ok(HttpResponse::Ok().json(HistoryResponse { from, to, data }))
}
