//! Beacon parsing for `POST /api/track`.
//!
//! The body is a JSON object discriminated by `type`. Validation failures
//! become 400s with fixed messages; a body that is not JSON at all, or whose
//! fields have the wrong JSON type, is a 500 like any other failure the
//! beacon sender cannot do anything about.
//!
//! `eventType` and `eventData` are checked for JavaScript truthiness, the
//! way the site's beacon script treats them: a falsy `eventData` is stored
//! as NULL and a falsy `eventType` is missing.

use crate::db::models::{NewEvent, NewPageview};
use crate::error::{AppError, AppResult};
use serde::Deserialize;
use serde_json::Value;

pub const INVALID_TYPE: &str = "Invalid type";
pub const EVENT_TYPE_REQUIRED: &str = "eventType is required";

/// A validated beacon, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Beacon {
    Pageview(NewPageview),
    Event(NewEvent),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageviewBody {
    session_id: Option<String>,
    path: Option<String>,
    referrer: Option<String>,
    utm_source: Option<String>,
    utm_medium: Option<String>,
    utm_campaign: Option<String>,
    device_type: Option<String>,
    browser: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventBody {
    session_id: Option<String>,
    event_type: Option<Value>,
    event_data: Option<Value>,
}

/// Parse a raw request body.
///
/// `country` comes from the trusted edge header; a `country` field in the
/// body is ignored.
pub fn parse_beacon(body: &[u8], country: Option<String>) -> AppResult<Beacon> {
    let body: Value = serde_json::from_slice(body)
        .map_err(|e| AppError::Internal(format!("malformed tracking body: {e}")))?;

    match body.get("type").and_then(Value::as_str) {
        Some("pageview") => {
            let fields: PageviewBody = from_body(body)?;

            Ok(Beacon::Pageview(NewPageview {
                session_id: non_empty(fields.session_id),
                path: non_empty(fields.path).unwrap_or_else(|| "/".to_string()),
                referrer: non_empty(fields.referrer),
                utm_source: non_empty(fields.utm_source),
                utm_medium: non_empty(fields.utm_medium),
                utm_campaign: non_empty(fields.utm_campaign),
                device_type: non_empty(fields.device_type),
                browser: non_empty(fields.browser),
                country,
            }))
        }
        Some("event") => {
            let fields: EventBody = from_body(body)?;

            let event_type = event_type(fields.event_type)?;

            Ok(Beacon::Event(NewEvent {
                session_id: non_empty(fields.session_id),
                event_type,
                event_data: fields
                    .event_data
                    .filter(is_truthy)
                    .map(|data| data.to_string()),
            }))
        }
        _ => Err(AppError::BadRequest(INVALID_TYPE.to_string())),
    }
}

fn from_body<T: serde::de::DeserializeOwned>(body: Value) -> AppResult<T> {
    serde_json::from_value(body)
        .map_err(|e| AppError::Internal(format!("malformed tracking field: {e}")))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Any truthy scalar names the event: strings as-is, numbers and `true` as
/// their JSON text. Objects and arrays cannot be stored as a name.
fn event_type(value: Option<Value>) -> AppResult<String> {
    match value.filter(is_truthy) {
        None => Err(AppError::BadRequest(EVENT_TYPE_REQUIRED.to_string())),
        Some(Value::String(name)) => Ok(name),
        Some(scalar @ (Value::Number(_) | Value::Bool(_))) => Ok(scalar.to_string()),
        Some(other) => Err(AppError::Internal(format!(
            "malformed tracking field: eventType {other}"
        ))),
    }
}

/// JavaScript truthiness: `null`, `false`, `0` and `""` are falsy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
