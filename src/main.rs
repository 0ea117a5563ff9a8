//! # wrthwhl analytics
//!
//! Companion service for the résumé site:
//! - **Tracking**: pageview/event beacons, one row each
//! - **Passkeys**: WebAuthn registration and login guarding the analytics data

mod config; // Environment configuration
mod db; // Database operations (tracking, users, credentials, challenges)
mod encoding; // Shared base64url helpers
mod error; // Error type and HTTP mapping
mod handlers; // HTTP request handlers
mod middleware; // Session guard
mod routes; // Router and layers
mod state; // Shared application state
mod tracking; // Beacon validation
mod webauthn; // Passkey handshakes

#[cfg(test)]
mod test_support;

use crate::config::Config;
use crate::state::AppState;
use anyhow::Context;
use time::Duration;
use tower_sessions::cookie::{Key, SameSite};
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::SqliteStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG overrides the default filter
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,wrthwhl_analytics=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!("Configuration loaded: {:?}", redacted(&config));

    // Connection pool, migrations and the WebAuthn relying party
    let app_state = AppState::new(&config).await?;
    tracing::info!("Application state initialized");

    // Sessions are stored server-side in SQLite; the cookie only carries a signed id
    let session_store = SqliteStore::new(app_state.db.clone());
    session_store.migrate().await?;

    let session_layer = SessionManagerLayer::new(session_store)
        .with_expiry(Expiry::OnInactivity(Duration::hours(config.session_ttl_hours)))
        .with_secure(config.session_secure)
        // The dashboard lives on another origin; cross-site cookies need SameSite=None + Secure
        .with_same_site(if config.session_secure {
            SameSite::None
        } else {
            SameSite::Lax
        })
        .with_signed(session_key(&config)?);

    let app = routes::router(app_state).layer(session_layer);

    let bind_addr = config.bind_address();
    tracing::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn session_key(config: &Config) -> anyhow::Result<Key> {
    match &config.session_secret {
        Some(secret) => Key::try_from(secret.as_bytes())
            .context("SESSION_SECRET must be at least 64 bytes"),
        None => {
            tracing::warn!("SESSION_SECRET not set; sessions will not survive a restart");
            Ok(Key::generate())
        }
    }
}

fn redacted(config: &Config) -> Config {
    Config {
        session_secret: config.session_secret.as_ref().map(|_| "***".to_string()),
        ..config.clone()
    }
}
