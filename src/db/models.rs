//! # Database Models
//!
//! Structs that map to rows of the tables created in `migrations/`.
//!
//! Timestamps are stored as fixed-width RFC3339 text (microseconds, `Z`
//! suffix) so that string comparison in SQL orders them correctly.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use uuid::Uuid;

/// Format a timestamp the way every table stores it.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Current time in storage format.
pub fn now() -> String {
    timestamp(Utc::now())
}

/// Owner of one or more passkeys.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// UUID v4, also used as the WebAuthn user handle
    pub id: String,

    /// Account name shown by the authenticator
    pub name: String,

    pub display_name: String,
}

/// Passkey credential stored for a user
///
/// ## What is stored?
/// - **Passkey**: the verified credential serialized as JSON, including the
///   public key used to check assertion signatures
/// - **Counter**: last sign count seen; must strictly increase on every login
///
/// Only the public key is ever stored. The private key never leaves the
/// authenticator.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PasskeyCredential {
    /// Base64url credential id, as returned by the browser
    pub id: String,

    pub user_id: String,

    /// Serialized `webauthn_rs::prelude::Passkey`
    pub passkey: Vec<u8>,

    /// Signature counter
    pub counter: i64,

    /// `None` until the first login
    pub last_used_at: Option<String>,
}

/// Pending registration handshake
///
/// ## Challenge Lifecycle
/// 1. Options issued → challenge state stored with an expiry
/// 2. Browser creates a credential that embeds the challenge
/// 3. Verify call consumes (deletes) the row and checks the response against it
/// 4. Expired rows are unusable and get pruned when new options are issued
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RegistrationChallenge {
    pub id: String,

    /// User the new credential will belong to
    pub user_id: String,

    /// Serialized `PasskeyRegistration` from webauthn-rs
    pub challenge_state: Vec<u8>,

    pub created_at: String,

    pub expires_at: String,
}

impl RegistrationChallenge {
    pub fn new(user_id: String, challenge_state: Vec<u8>, ttl: Duration) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            challenge_state,
            created_at: timestamp(now),
            expires_at: timestamp(now + ttl),
        }
    }
}

/// Pending login handshake
///
/// Not bound to a user: the browser discovers which passkey to use, and the
/// credential id in the assertion tells us whose it is. The row id is the
/// `challengeId` handed to the client.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuthenticationChallenge {
    pub id: String,

    /// Serialized `DiscoverableAuthentication` from webauthn-rs
    pub challenge_state: Vec<u8>,

    pub created_at: String,

    pub expires_at: String,
}

impl AuthenticationChallenge {
    pub fn new(challenge_state: Vec<u8>, ttl: Duration) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4().to_string(),
            challenge_state,
            created_at: timestamp(now),
            expires_at: timestamp(now + ttl),
        }
    }
}

/// One tracked page load, ready to insert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewPageview {
    pub session_id: Option<String>,
    pub path: String,
    pub referrer: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub device_type: Option<String>,
    pub browser: Option<String>,
    pub country: Option<String>,
}

/// One tracked action, ready to insert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewEvent {
    pub session_id: Option<String>,
    pub event_type: String,
    /// JSON text of the client's `eventData`
    pub event_data: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_are_fixed_width() {
        let whole = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(timestamp(whole), "2025-01-02T03:04:05.000000Z");

        let later = whole + Duration::milliseconds(1);
        assert!(timestamp(later) > timestamp(whole));
    }

    #[test]
    fn challenges_expire_after_ttl() {
        let challenge = RegistrationChallenge::new("u".into(), vec![1], Duration::minutes(5));
        let created = DateTime::parse_from_rfc3339(&challenge.created_at).unwrap();
        let expires = DateTime::parse_from_rfc3339(&challenge.expires_at).unwrap();
        assert_eq!(expires - created, Duration::minutes(5));
    }
}
