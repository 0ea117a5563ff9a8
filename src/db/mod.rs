//! # Database Module
//!
//! One submodule per table (or group of tables):
//! - `models`: Row structs and timestamp formatting
//! - `users`: Passkey owners
//! - `credentials`: Registered passkeys and their sign counters
//! - `challenges`: Pending registration/login challenges
//! - `pageviews`, `events`: Tracking inserts
//! - `stats`: Aggregates over the tracking tables

pub mod challenges;
pub mod credentials;
pub mod events;
pub mod models;
pub mod pageviews;
pub mod stats;
pub mod users;
