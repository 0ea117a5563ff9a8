use crate::db::models::{self, NewPageview};
use crate::error::AppResult;
use sqlx::SqlitePool;

/// Write one pageview row. Rows are never updated afterwards.
pub async fn insert_pageview(pool: &SqlitePool, pageview: &NewPageview) -> AppResult<i64> {
    let result = sqlx::query(
        "INSERT INTO pageviews
         (session_id, path, referrer, utm_source, utm_medium, utm_campaign, device_type, browser, country, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&pageview.session_id)
    .bind(&pageview.path)
    .bind(&pageview.referrer)
    .bind(&pageview.utm_source)
    .bind(&pageview.utm_medium)
    .bind(&pageview.utm_campaign)
    .bind(&pageview.device_type)
    .bind(&pageview.browser)
    .bind(&pageview.country)
    .bind(models::now())
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}
