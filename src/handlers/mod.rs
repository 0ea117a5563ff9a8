//! # HTTP Request Handlers
//!
//! ## Submodules
//! - `health`: Health check endpoint
//! - `track`: Pageview/event ingestion
//! - `auth`: Passkey registration, login, logout and session info
//! - `stats`: Aggregates for the dashboard (requires a session)
//!
//! Handlers extract what they need, call into `db`/`webauthn`, and return
//! `AppResult<Json<_>>`; errors turn into `{"error": ...}` responses.

use crate::error::AppError;
use axum::extract::FromRequest;

pub mod auth;
pub mod health;
pub mod stats;
pub mod track;

/// `axum::Json` whose rejection is an [`AppError::BadRequest`], so malformed
/// bodies get the usual `{"error": ...}` shape and never reach the store.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);
