use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use sqlx::{MySqlConnection, MySqlPool};

use crate::model::{
    attendance::{ClockRecord, ClockRow},
    team::Team,
    user::User,
};

pub async fn init_db(database_url: &str) -> Result<MySqlPool> {
    MySqlPool::connect(database_url)
        .await
        .context("Failed to connect to database")
}

/// `[from 00:00, day after to 00:00)` in local wall-clock time.
pub fn day_bounds(from: NaiveDate, to: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let start = from.and_time(chrono::NaiveTime::MIN);
    let end = (to + Duration::days(1)).and_time(chrono::NaiveTime::MIN);
    (start, end)
}

/// Records of one user arriving between `from` and `to` inclusive, oldest first.
pub async fn user_records(
    pool: &MySqlPool,
    user_id: u64,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<ClockRecord>, sqlx::Error> {
    let (start, end) = day_bounds(from, to);

    let rows = sqlx::query_as::<_, ClockRow>(
        r#"
        SELECT id, user_id, arrival_time, departure_time
        FROM clock_records
        WHERE user_id = ?
        AND arrival_time >= ?
        AND arrival_time < ?
        ORDER BY arrival_time ASC, id ASC
        "#,
    )
    .bind(user_id)
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(ClockRecord::from).collect())
}

/// Same as [`user_records`] for a single day, locking the rows until the
/// surrounding transaction ends.
pub async fn user_records_for_update(
    conn: &mut MySqlConnection,
    user_id: u64,
    day: NaiveDate,
) -> Result<Vec<ClockRecord>, sqlx::Error> {
    let (start, end) = day_bounds(day, day);

    let rows = sqlx::query_as::<_, ClockRow>(
        r#"
        SELECT id, user_id, arrival_time, departure_time
        FROM clock_records
        WHERE user_id = ?
        AND arrival_time >= ?
        AND arrival_time < ?
        ORDER BY arrival_time ASC, id ASC
        FOR UPDATE
        "#,
    )
    .bind(user_id)
    .bind(start)
    .bind(end)
    .fetch_all(conn)
    .await?;

    Ok(rows.into_iter().map(ClockRecord::from).collect())
}

/// Every record of a user that still has no departure, whatever day it
/// started on, locked until the surrounding transaction ends.
pub async fn open_records_for_update(
    conn: &mut MySqlConnection,
    user_id: u64,
) -> Result<Vec<ClockRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ClockRow>(
        r#"
        SELECT id, user_id, arrival_time, departure_time
        FROM clock_records
        WHERE user_id = ?
        AND departure_time IS NULL
        ORDER BY arrival_time ASC, id ASC
        FOR UPDATE
        "#,
    )
    .bind(user_id)
    .fetch_all(conn)
    .await?;

    Ok(rows.into_iter().map(ClockRecord::from).collect())
}

/// Records of every member of a team, grouped by user, oldest first.
pub async fn team_records(
    pool: &MySqlPool,
    team_id: u64,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<ClockRecord>, sqlx::Error> {
    let (start, end) = day_bounds(from, to);

    let rows = sqlx::query_as::<_, ClockRow>(
        r#"
        SELECT c.id, c.user_id, c.arrival_time, c.departure_time
        FROM clock_records c
        JOIN users u ON u.id = c.user_id
        WHERE u.team_id = ?
        AND c.arrival_time >= ?
        AND c.arrival_time < ?
        ORDER BY c.user_id ASC, c.arrival_time ASC, c.id ASC
        "#,
    )
    .bind(team_id)
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(ClockRecord::from).collect())
}

pub async fn find_team(pool: &MySqlPool, team_id: u64) -> Result<Option<Team>, sqlx::Error> {
    sqlx::query_as::<_, Team>("SELECT id, name, manager_id FROM teams WHERE id = ?")
        .bind(team_id)
        .fetch_optional(pool)
        .await
}

/// Team the given user belongs to, if any.
pub async fn team_of_user(pool: &MySqlPool, user_id: u64) -> Result<Option<Team>, sqlx::Error> {
    sqlx::query_as::<_, Team>(
        r#"
        SELECT t.id, t.name, t.manager_id
        FROM teams t
        JOIN users u ON u.team_id = t.id
        WHERE u.id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn active_team_members(pool: &MySqlPool, team_id: u64) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, username
        FROM users
        WHERE team_id = ?
        AND is_active = TRUE
        ORDER BY username ASC
        "#,
    )
    .bind(team_id)
    .fetch_all(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_bounds_cover_whole_days() {
        let from = NaiveDate::from_ymd_opt(2026, 1, 30).unwrap();
        let to = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
        let (start, end) = day_bounds(from, to);

        assert_eq!(start.to_string(), "2026-01-30 00:00:00");
        assert_eq!(end.to_string(), "2026-02-01 00:00:00");
    }
}
