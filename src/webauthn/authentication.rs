//! # Passkey Login Logic
//!
//! Login uses discoverable credentials: the options carry no user and no
//! `allowCredentials`, the authenticator offers whichever passkey it holds
//! for our RP ID, and the credential id in the assertion tells us whose it is.

use crate::db::{challenges, credentials};
use crate::encoding;
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use serde_json::Value;
use webauthn_rs::prelude::*;

/// Issue login options under a fresh `challengeId`.
pub async fn start_authentication(state: &AppState) -> AppResult<(Value, String)> {
    challenges::prune_expired_challenges(&state.db).await?;

    let (rcr, auth_state) = state.webauthn.start_discoverable_authentication()?;

    let state_bytes = serde_json::to_vec(&auth_state)?;
    let challenge_id =
        challenges::save_authentication_challenge(&state.db, &state_bytes, state.challenge_ttl())
            .await?;

    tracing::debug!(challenge_id = %challenge_id, "Issued login options");

    Ok((serde_json::to_value(rcr.public_key)?, challenge_id))
}

/// Verify a login assertion and return the id of the authenticated user.
///
/// ## Checks, in order
/// 1. The challenge exists, is unexpired and unused (consumed atomically)
/// 2. The credential id is registered
/// 3. A user handle, if sent, belongs to the credential's owner
/// 4. Signature over authenticator data + client data hash verifies with the
///    stored public key; client data challenge, type and origin match
/// 5. The sign count is strictly greater than the stored one
///
/// Every failure is an [`AppError::AuthenticationRejected`] and leaves the
/// credential untouched.
pub async fn finish_authentication(
    state: &AppState,
    challenge_id: &str,
    credential: &PublicKeyCredential,
) -> AppResult<String> {
    let challenge = challenges::consume_authentication_challenge(&state.db, challenge_id)
        .await?
        .ok_or_else(|| {
            AppError::AuthenticationRejected(format!(
                "challenge {challenge_id} is unknown, expired or already used"
            ))
        })?;

    let auth_state: DiscoverableAuthentication =
        serde_json::from_slice(&challenge.challenge_state)?;

    let credential_id = encoding::encode(&credential.raw_id);
    let stored = credentials::find_by_credential_id(&state.db, &credential_id)
        .await?
        .ok_or_else(|| {
            AppError::AuthenticationRejected(format!("unknown credential {credential_id}"))
        })?;

    if let Some(handle) = &credential.response.user_handle {
        if !user_handle_matches(AsRef::<[u8]>::as_ref(handle), &stored.user_id) {
            return Err(AppError::AuthenticationRejected(format!(
                "user handle does not match owner of credential {credential_id}"
            )));
        }
    }

    let mut passkey: Passkey = serde_json::from_slice(&stored.passkey)?;

    let result = state
        .webauthn
        .finish_discoverable_authentication(
            credential,
            auth_state,
            &[DiscoverableKey::from(&passkey)],
        )
        .map_err(|e| AppError::AuthenticationRejected(format!("assertion rejected: {e:?}")))?;

    ensure_counter_advanced(stored.counter, result.counter())?;

    passkey.update_credential(&result);
    let passkey_bytes = serde_json::to_vec(&passkey)?;

    let advanced =
        credentials::advance_counter(&state.db, &stored.id, result.counter(), &passkey_bytes)
            .await?;
    if !advanced {
        // Another login with this count landed between our read and write
        return Err(AppError::AuthenticationRejected(format!(
            "sign count {} for credential {credential_id} already used",
            result.counter()
        )));
    }

    tracing::info!(
        user_id = %stored.user_id,
        credential_id = %stored.id,
        previous_use = stored.last_used_at.as_deref().unwrap_or("never"),
        "Passkey login"
    );

    Ok(stored.user_id)
}

/// A returned sign count that does not exceed the stored one means the
/// authenticator may have been cloned.
pub fn ensure_counter_advanced(stored: i64, returned: u32) -> AppResult<()> {
    if i64::from(returned) <= stored {
        return Err(AppError::AuthenticationRejected(format!(
            "sign count did not advance (stored {stored}, returned {returned})"
        )));
    }

    Ok(())
}

/// WebAuthn user handles are the raw 16 bytes of the user's UUID.
fn user_handle_matches(handle: &[u8], user_id: &str) -> bool {
    Uuid::parse_str(user_id)
        .map(|uuid| uuid.as_bytes().as_slice() == handle)
        .unwrap_or(false)
}
