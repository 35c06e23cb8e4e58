use anyhow::{Result, anyhow};
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::sync::Arc;
use std::time::Duration;

use crate::model::schedule::ScheduleRow;

/// user id => every schedule row of that user (default row and weekday rows).
/// An empty list is cached too: most users have no schedule.
pub static SCHEDULE_CACHE: Lazy<Cache<u64, Arc<Vec<ScheduleRow>>>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(100_000)
        .time_to_live(Duration::from_secs(3600))
        .build()
});

const SELECT_SCHEDULES: &str = r#"
    SELECT id, user_id, weekday, expected_arrival, lunch_start, lunch_end
    FROM schedules
"#;

async fn fetch_user_schedules(pool: &MySqlPool, user_id: u64) -> Result<Vec<ScheduleRow>, sqlx::Error> {
    sqlx::query_as::<_, ScheduleRow>(&format!(
        "{SELECT_SCHEDULES} WHERE user_id = ? ORDER BY weekday IS NULL, weekday, id"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Schedule rows of a user, loaded once and then served from memory.
pub async fn schedules_for(
    pool: &MySqlPool,
    user_id: u64,
) -> Result<Arc<Vec<ScheduleRow>>, Arc<sqlx::Error>> {
    SCHEDULE_CACHE
        .try_get_with(user_id, async move {
            fetch_user_schedules(pool, user_id).await.map(Arc::new)
        })
        .await
}

/// Drop a user's entry after their schedule changed.
pub async fn invalidate(user_id: u64) {
    SCHEDULE_CACHE.invalidate(&user_id).await;
}

async fn batch_store(batch: &mut Vec<(u64, Vec<ScheduleRow>)>) {
    let futures: Vec<_> = batch
        .drain(..)
        .map(|(user_id, rows)| SCHEDULE_CACHE.insert(user_id, Arc::new(rows)))
        .collect();

    futures::future::join_all(futures).await;
}

/// Load every stored schedule into the cache, `batch_size` users at a time.
pub async fn warmup_schedule_cache(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let query = format!("{SELECT_SCHEDULES} ORDER BY user_id, weekday IS NULL, weekday, id");
    let mut stream = sqlx::query_as::<_, ScheduleRow>(&query).fetch(pool);

    let mut batch: Vec<(u64, Vec<ScheduleRow>)> = Vec::with_capacity(batch_size);
    let mut current: Option<(u64, Vec<ScheduleRow>)> = None;
    let mut users = 0usize;

    while let Some(row) = stream.next().await {
        let row = row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;

        let same_user = matches!(&current, Some((user_id, _)) if *user_id == row.user_id);
        if same_user {
            if let Some((_, rows)) = current.as_mut() {
                rows.push(row);
            }
        } else if let Some(done) = current.replace((row.user_id, vec![row])) {
            batch.push(done);
            users += 1;
        }

        if batch.len() >= batch_size {
            batch_store(&mut batch).await;
        }
    }

    if let Some(done) = current {
        batch.push(done);
        users += 1;
    }
    if !batch.is_empty() {
        batch_store(&mut batch).await;
    }

    tracing::info!(users, "Schedule cache warmup complete");
    Ok(())
}
