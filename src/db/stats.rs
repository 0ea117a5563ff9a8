//! Read-side queries over the tracking tables.

use crate::error::AppResult;
use serde::Serialize;
use sqlx::SqlitePool;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct PathViews {
    pub path: String,
    pub views: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub pageviews: i64,
    pub events: i64,
    pub top_paths: Vec<PathViews>,
}

pub async fn summary(pool: &SqlitePool, top_paths: i64) -> AppResult<Summary> {
    let pageviews: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pageviews")
        .fetch_one(pool)
        .await?;

    let events: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM events")
        .fetch_one(pool)
        .await?;

    let top_paths = sqlx::query_as::<_, PathViews>(
        "SELECT path, COUNT(*) AS views FROM pageviews
         GROUP BY path
         ORDER BY views DESC, path ASC
         LIMIT ?",
    )
    .bind(top_paths)
    .fetch_all(pool)
    .await?;

    Ok(Summary {
        pageviews,
        events,
        top_paths,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{NewEvent, NewPageview};
    use crate::db::{events, pageviews};
    use crate::test_support::test_pool;

    #[tokio::test]
    async fn counts_and_ranks_paths() {
        let pool = test_pool().await;
        for path in ["/", "/", "/cv", "/", "/cv", "/print"] {
            let pageview = NewPageview {
                path: path.to_string(),
                ..Default::default()
            };
            pageviews::insert_pageview(&pool, &pageview).await.unwrap();
        }
        let event = NewEvent {
            event_type: "print".to_string(),
            ..Default::default()
        };
        events::insert_event(&pool, &event).await.unwrap();

        let summary = summary(&pool, 2).await.unwrap();

        assert_eq!(summary.pageviews, 6);
        assert_eq!(summary.events, 1);
        assert_eq!(
            summary.top_paths,
            vec![
                PathViews { path: "/".into(), views: 3 },
                PathViews { path: "/cv".into(), views: 2 },
            ]
        );
    }
}
