//! # Configuration Management
//!
//! Configuration comes from the environment ("12-factor" style), with a `.env`
//! file picked up for local development.
//!
//! ## Environment Variables
//! - `HOST`: Server bind address (default: 127.0.0.1)
//! - `PORT`: Server port (default: 8787)
//! - `DATABASE_URL`: SQLite database connection string
//! - `RP_ID`: WebAuthn Relying Party ID (usually your domain)
//! - `RP_ORIGIN`: WebAuthn Relying Party Origin (full URL)
//! - `RP_NAME`: Human-readable name for the service
//! - `PASSKEY_USER_NAME`: Account name shown by the authenticator for new users
//! - `ALLOWED_ORIGINS`: Comma separated CORS origins allowed to call `/api/*`
//! - `COUNTRY_HEADER`: Trusted edge header carrying the visitor country
//! - `CHALLENGE_TTL_SECS`: Lifetime of a pending WebAuthn challenge (1..=3600)
//! - `SESSION_TTL_HOURS`: Session inactivity timeout (1..=8760)
//! - `SESSION_SECRET`: Key material (>= 64 bytes) for signing session cookies
//! - `SESSION_SECURE`: Mark the session cookie `Secure`

use anyhow::{ensure, Context, Result};
use std::env;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Name reported by the health check.
pub const SERVICE_NAME: &str = "wrthwhl-analytics";

/// Challenges outliving an hour would only widen the replay window.
const CHALLENGE_TTL_RANGE: RangeInclusive<i64> = 1..=3600;

/// Up to one year of inactivity.
const SESSION_TTL_RANGE: RangeInclusive<i64> = 1..=8760;

const DEFAULT_ALLOWED_ORIGINS: &str =
    "https://marco.wrthwhl.cloud,https://analytics.wrthwhl.cloud,http://localhost:3000";

/// Application configuration
///
/// ## WebAuthn Terminology
/// - **RP (Relying Party)**: This service, which relies on passkeys for authentication
/// - **RP ID**: The domain name (e.g., "analytics.wrthwhl.cloud" or "localhost")
/// - **RP Origin**: Full URL the browser sees (e.g., "https://analytics.wrthwhl.cloud")
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host/IP address to bind to
    pub host: String,

    /// Server port number
    pub port: u16,

    /// SQLite database connection URL, e.g. "sqlite:analytics.db?mode=rwc"
    pub database_url: String,

    /// WebAuthn Relying Party ID, without protocol or port
    pub rp_id: String,

    /// WebAuthn Relying Party Origin, including protocol
    pub rp_origin: String,

    /// Human-readable service name shown during passkey creation
    pub rp_name: String,

    /// Account name handed to the authenticator when a new user registers
    pub passkey_user_name: String,

    /// Origins allowed to call the API with credentials
    pub allowed_origins: Vec<String>,

    /// Header set by the CDN with the visitor's country code.
    /// Never read from the request body.
    pub country_header: String,

    /// How long an issued challenge stays valid
    pub challenge_ttl_secs: i64,

    /// Session expiry after this many hours of inactivity
    pub session_ttl_hours: i64,

    /// Secret for signing the session cookie. `None` means a random key per process.
    pub session_secret: Option<String>,

    /// Whether the session cookie carries the `Secure` attribute
    pub session_secure: bool,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// Loads `.env` first if present, then reads every variable with
    /// [`Config::from_lookup`]. Returns an error if a numeric or boolean
    /// variable cannot be parsed.
    ///
    /// ## Example .env file
    /// ```text
    /// PORT=8787
    /// DATABASE_URL=sqlite:analytics.db?mode=rwc
    /// RP_ID=analytics.wrthwhl.cloud
    /// RP_ORIGIN=https://analytics.wrthwhl.cloud
    /// COUNTRY_HEADER=cf-ipcountry
    /// ```
    pub fn from_env() -> Result<Self> {
        // dotenvy doesn't error if the file is missing
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source, falling back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Config {
            host: var("HOST", "127.0.0.1"),
            port: parse_var(&lookup, "PORT", 8787)?,
            database_url: var("DATABASE_URL", "sqlite:analytics.db?mode=rwc"),
            rp_id: var("RP_ID", "localhost"),
            rp_origin: var("RP_ORIGIN", "http://localhost:8787"),
            rp_name: var("RP_NAME", "wrthwhl analytics"),
            passkey_user_name: var("PASSKEY_USER_NAME", "admin"),
            allowed_origins: var("ALLOWED_ORIGINS", DEFAULT_ALLOWED_ORIGINS)
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_string)
                .collect(),
            country_header: var("COUNTRY_HEADER", "cf-ipcountry").to_ascii_lowercase(),
            challenge_ttl_secs: parse_ranged(&lookup, "CHALLENGE_TTL_SECS", 300, CHALLENGE_TTL_RANGE)?,
            session_ttl_hours: parse_ranged(&lookup, "SESSION_TTL_HOURS", 24, SESSION_TTL_RANGE)?,
            session_secret: lookup("SESSION_SECRET").filter(|s| !s.is_empty()),
            session_secure: parse_var(&lookup, "SESSION_SECURE", false)?,
        })
    }

    /// Socket address for `tokio::net::TcpListener::bind()`, e.g. "127.0.0.1:8787"
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
        None => Ok(default),
    }
}

fn parse_ranged<F>(lookup: &F, key: &str, default: i64, range: RangeInclusive<i64>) -> Result<i64>
where
    F: Fn(&str) -> Option<String>,
{
    let value = parse_var(lookup, key, default)?;
    ensure!(
        range.contains(&value),
        "{key} must be between {} and {}, got {value}",
        range.start(),
        range.end()
    );

    Ok(value)
}
