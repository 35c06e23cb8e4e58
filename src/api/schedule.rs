use actix_web::{HttpResponse, web};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::ToSchema;

use super::load_schedules;
use crate::{
    auth::auth::AuthUser, error::ApiError, model::schedule::ScheduleRow,
    utils::schedule_cache,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpsertSchedule {
    /// 0 = Monday .. 6 = Sunday; omit for the user's default schedule
    #[schema(example = 0, nullable = true)]
    pub weekday: Option<u8>,
    #[schema(example = "09:00")]
    pub expected_arrival: String,
    #[schema(example = "12:00", nullable = true)]
    pub lunch_start: Option<String>,
    #[schema(example = "13:00", nullable = true)]
    pub lunch_end: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct ScheduleListResponse {
    pub user_id: u64,
    pub data: Vec<ScheduleRow>,
}

#[derive(Debug, PartialEq)]
struct ValidSchedule {
    weekday: Option<u8>,
    expected_arrival: NaiveTime,
    lunch_start: Option<NaiveTime>,
    lunch_end: Option<NaiveTime>,
}

fn parse_time_of_day(field: &str, value: &str) -> Result<NaiveTime, ApiError> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .map_err(|_| ApiError::BadRequest(format!("`{field}` must be HH:MM or HH:MM:SS")))
}

fn validate(payload: &UpsertSchedule) -> Result<ValidSchedule, ApiError> {
    if payload.weekday.is_some_and(|d| d > 6) {
        return Err(ApiError::BadRequest("`weekday` must be between 0 and 6".into()));
    }

    let expected_arrival = parse_time_of_day("expected_arrival", &payload.expected_arrival)?;
    let lunch_start = payload
        .lunch_start
        .as_deref()
        .map(|v| parse_time_of_day("lunch_start", v))
        .transpose()?;
    let lunch_end = payload
        .lunch_end
        .as_deref()
        .map(|v| parse_time_of_day("lunch_end", v))
        .transpose()?;

    match (lunch_start, lunch_end) {
        (Some(start), Some(end)) if start > end => {
            return Err(ApiError::BadRequest("Lunch break must end after it starts".into()));
        }
        (Some(_), None) | (None, Some(_)) => {
            return Err(ApiError::BadRequest(
                "`lunch_start` and `lunch_end` go together".into(),
            ));
        }
        _ => {}
    }

    Ok(ValidSchedule {
        weekday: payload.weekday,
        expected_arrival,
        lunch_start,
        lunch_end,
    })
}

/// Schedule rows of a user
#[utoipa::path(
    get,
    path = "/api/schedules/{user_id}",
    params(
        ("user_id", description = "User ID")
    ),
    responses(
        (status = 200, body = ScheduleListResponse),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Schedules"
)]
pub async fn get_schedules(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let user_id = path.into_inner();
    if auth.user_id != user_id {
        auth.require_hr_or_admin()?;
    }

    let rows = load_schedules(pool.get_ref(), user_id).await?;

    Ok(HttpResponse::Ok().json(ScheduleListResponse {
        user_id,
        data: rows.as_ref().clone(),
    }))
}

/// Create or replace a user's schedule for one weekday (or their default)
#[utoipa::path(
    put,
    path = "/api/schedules/{user_id}",
    request_body = UpsertSchedule,
    params(
        ("user_id", description = "User ID")
    ),
    responses(
        (status = 200, description = "Schedule saved"),
        (status = 400, description = "Invalid schedule"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Schedules"
)]
pub async fn put_schedule(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpsertSchedule>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;

    let user_id = path.into_inner();
    let schedule = validate(&payload)?;

    let mut tx = pool.begin().await?;

    // `<=>` matches NULL weekdays too
    let existing = sqlx::query_scalar::<_, u64>(
        "SELECT id FROM schedules WHERE user_id = ? AND weekday <=> ? FOR UPDATE",
    )
    .bind(user_id)
    .bind(schedule.weekday)
    .fetch_optional(&mut *tx)
    .await?;

    match existing {
        Some(id) => {
            sqlx::query(
                r#"
                UPDATE schedules
                SET expected_arrival = ?, lunch_start = ?, lunch_end = ?
                WHERE id = ?
                "#,
            )
            .bind(schedule.expected_arrival)
            .bind(schedule.lunch_start)
            .bind(schedule.lunch_end)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }
        None => {
            sqlx::query(
                r#"
                INSERT INTO schedules (user_id, weekday, expected_arrival, lunch_start, lunch_end)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(user_id)
            .bind(schedule.weekday)
            .bind(schedule.expected_arrival)
            .bind(schedule.lunch_start)
            .bind(schedule.lunch_end)
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;
    schedule_cache::invalidate(user_id).await;

    info!(user_id, by = auth.user_id, weekday = ?schedule.weekday, "Schedule saved");

    Ok(HttpResponse::Ok().json(json!({
        "message": "Schedule saved"
    })))
}
