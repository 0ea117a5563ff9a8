//! # Application State
//!
//! Resources shared by every request handler. Axum clones the state per
//! request, which is cheap: the pool is reference counted internally and
//! the rest sits behind `Arc`.
//!
//! Nothing in here is mutable. Challenges and sessions live in the database
//! so that any number of stateless instances can serve the same user.

use crate::config::Config;
use anyhow::Result;
use sqlx::sqlite::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use webauthn_rs::prelude::*;

#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,

    /// WebAuthn relying party, used to issue challenges and verify responses
    pub webauthn: Arc<Webauthn>,

    pub config: Arc<Config>,
}

impl AppState {
    /// Connect to the database, run migrations and configure WebAuthn.
    ///
    /// # Errors
    /// Fails if the database is unreachable, a migration fails, or the
    /// relying party settings are invalid (e.g. a malformed origin URL).
    pub async fn new(config: &Config) -> Result<Self> {
        let db = SqlitePool::connect(&config.database_url).await?;

        // Embedded from ./migrations at compile time
        sqlx::migrate!("./migrations").run(&db).await?;

        Self::with_pool(db, config)
    }

    /// Build state around an already migrated pool.
    pub fn with_pool(db: SqlitePool, config: &Config) -> Result<Self> {
        let webauthn = Arc::new(build_webauthn(config)?);

        Ok(AppState {
            db,
            webauthn,
            config: Arc::new(config.clone()),
        })
    }

    /// Lifetime of a freshly issued challenge.
    pub fn challenge_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.config.challenge_ttl_secs)
    }
}

/// The RP ID and origin must match where the browser sees the service.
fn build_webauthn(config: &Config) -> Result<Webauthn> {
    let rp_origin = Url::parse(&config.rp_origin)?;
    let timeout = Duration::from_secs(config.challenge_ttl_secs.unsigned_abs());

    let webauthn = WebauthnBuilder::new(&config.rp_id, &rp_origin)?
        .rp_name(&config.rp_name)
        .timeout(timeout)
        .build()?;

    Ok(webauthn)
}
