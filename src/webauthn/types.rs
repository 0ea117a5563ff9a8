//! # WebAuthn API Types
//!
//! Request/response bodies for the passkey endpoints. Field names are
//! camelCase on the wire to match the browser client.
//!
//! The credential payloads are parsed straight into the webauthn-rs types,
//! so a body with missing or mistyped fields is rejected by the extractor
//! before any challenge is touched.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use webauthn_rs::prelude::{PublicKeyCredential, RegisterPublicKeyCredential};

/// Returned by `POST /api/auth/register/options`
///
/// `options` is the `publicKey` member of the creation options:
/// `{challenge, rp, user, pubKeyCredParams, timeout, attestation,
/// authenticatorSelection, excludeCredentials?, ...}` with binary values as
/// base64url strings.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationOptionsResponse {
    pub options: Value,
    /// Echoed back in the verify call
    pub user_id: String,
}

/// Body of `POST /api/auth/register/verify`
///
/// ## Example JSON
/// ```json
/// {
///   "userId": "550e8400-e29b-41d4-a716-446655440000",
///   "response": {
///     "id": "...", "rawId": "...", "type": "public-key",
///     "response": { "clientDataJSON": "...", "attestationObject": "...", "transports": ["internal"] }
///   }
/// }
/// ```
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationVerifyRequest {
    pub user_id: String,
    pub response: RegisterPublicKeyCredential,
}

/// Returned by `POST /api/auth/login/options`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginOptionsResponse {
    /// `{challenge, rpId, timeout, userVerification, allowCredentials?, ...}`
    pub options: Value,
    pub challenge_id: String,
}

/// Body of `POST /api/auth/login/verify`
///
/// `response.response` carries `clientDataJSON`, `authenticatorData`,
/// `signature` and an optional `userHandle`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginVerifyRequest {
    pub challenge_id: String,
    pub response: PublicKeyCredential,
}
