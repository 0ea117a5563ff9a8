use crate::db::stats::{self, Summary};
use crate::error::AppResult;
use crate::state::AppState;
use axum::{extract::State, Json};

const TOP_PATHS: i64 = 10;

/// `GET /api/stats` (session required)
pub async fn summary(State(state): State<AppState>) -> AppResult<Json<Summary>> {
    Ok(Json(stats::summary(&state.db, TOP_PATHS).await?))
}
