//! # Health Check Handler
//!
//! Used by the edge and by uptime monitoring.

use crate::config::SERVICE_NAME;
use axum::Json;
use serde_json::{json, Value};

/// `GET /`
///
/// ```json
/// { "status": "ok", "service": "wrthwhl-analytics" }
/// ```
///
/// Never fails, so it returns `Json<Value>` rather than `AppResult`.
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": SERVICE_NAME
    }))
}
