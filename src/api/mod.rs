pub mod attendance;
pub mod report;
pub mod schedule;

use chrono::{Duration, Local, NaiveDate};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

use crate::{error::ApiError, model::schedule::ScheduleRow, utils::schedule_cache};

/// Longest window a single history or report request may cover.
const MAX_RANGE_DAYS: i64 = 366;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DateRangeQuery {
    /// First day included, `YYYY-MM-DD`. Defaults to 30 days before `to`.
    #[param(value_type = Option<String>, format = Date, example = "2026-01-01")]
    pub from: Option<NaiveDate>,
    /// Last day included, `YYYY-MM-DD`. Defaults to today.
    #[param(value_type = Option<String>, format = Date, example = "2026-01-31")]
    pub to: Option<NaiveDate>,
}

impl DateRangeQuery {
    pub fn resolve(&self) -> Result<(NaiveDate, NaiveDate), ApiError> {
        resolve_range(self.from, self.to, Local::now().date_naive())
    }
}

fn resolve_range(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<(NaiveDate, NaiveDate), ApiError> {
    let to = to.unwrap_or(today);
    let from = from.unwrap_or(to - Duration::days(30));

    if from > to {
        return Err(ApiError::BadRequest("`from` must not be after `to`".into()));
    }
    if (to - from).num_days() > MAX_RANGE_DAYS {
        return Err(ApiError::BadRequest(format!(
            "Date range must not exceed {MAX_RANGE_DAYS} days"
        )));
    }

    Ok((from, to))
}

pub(crate) async fn load_schedules(
    pool: &sqlx::MySqlPool,
    user_id: u64,
) -> Result<Arc<Vec<ScheduleRow>>, ApiError> {
    schedule_cache::schedules_for(pool, user_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id, "Failed to load schedules");
            ApiError::Internal
        })
}
