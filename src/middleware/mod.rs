//! # Middleware Module
//!
//! - `auth`: Requires a signed-in session (set by a successful passkey login)

pub mod auth;
