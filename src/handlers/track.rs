//! # Tracking Handler
//!
//! Fire-and-forget beacons from the résumé site. One row per request, no
//! retries; failures are logged and answered with a status code only.

use crate::db::{events, pageviews};
use crate::error::AppResult;
use crate::state::AppState;
use crate::tracking::{self, Beacon};
use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use serde_json::{json, Value};

/// `POST /api/track`
///
/// The body is read as raw bytes so that a malformed body goes through the
/// same error path as a failed insert.
pub async fn track(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<Value>> {
    let country = headers
        .get(state.config.country_header.as_str())
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string);

    match tracking::parse_beacon(&body, country)? {
        Beacon::Pageview(pageview) => {
            pageviews::insert_pageview(&state.db, &pageview).await?;
        }
        Beacon::Event(event) => {
            events::insert_event(&state.db, &event).await?;
        }
    }

    Ok(Json(json!({ "ok": true })))
}
