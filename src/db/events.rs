use crate::db::models::{self, NewEvent};
use crate::error::AppResult;
use sqlx::SqlitePool;

/// Write one event row. Rows are never updated afterwards.
pub async fn insert_event(pool: &SqlitePool, event: &NewEvent) -> AppResult<i64> {
    let result = sqlx::query(
        "INSERT INTO events (session_id, event_type, event_data, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&event.session_id)
    .bind(&event.event_type)
    .bind(&event.event_data)
    .bind(models::now())
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}
