//! # Passkey Registration Logic
//!
//! Registration is a two-step handshake:
//! 1. **Options**: generate a challenge bound to a user id → send to client
//! 2. **Verify**: consume the challenge, verify the attestation → store the public key
//!
//! Any failed check in step 2 leaves no trace: the user row and the
//! credential are written together in one transaction, and only after
//! verification succeeded.

use crate::db::{challenges, credentials, users};
use crate::encoding;
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use serde_json::Value;
use webauthn_rs::prelude::*;

/// Issue registration options.
///
/// When `session_user` names a known user the new passkey is added to that
/// account and its existing credentials go into `excludeCredentials`, so the
/// browser refuses to register the same authenticator twice. Otherwise a
/// new user id is minted; the user row itself is only created on verify.
///
/// Returns the `publicKey` creation options and the user id to echo back.
pub async fn start_registration(
    state: &AppState,
    session_user: Option<&str>,
) -> AppResult<(Value, String)> {
    challenges::prune_expired_challenges(&state.db).await?;

    let existing = match session_user {
        Some(id) => users::find_by_id(&state.db, id).await?,
        None => None,
    };

    let (user_uuid, name, display_name) = match &existing {
        Some(user) => (
            Uuid::parse_str(&user.id)
                .map_err(|_| AppError::Internal(format!("stored user id {} is not a UUID", user.id)))?,
            user.name.clone(),
            user.display_name.clone(),
        ),
        None => (
            Uuid::new_v4(),
            state.config.passkey_user_name.clone(),
            state.config.passkey_user_name.clone(),
        ),
    };
    let user_id = user_uuid.to_string();

    let exclude = excluded_credentials(state, &user_id).await?;

    let (ccr, reg_state) = state
        .webauthn
        .start_passkey_registration(user_uuid, &name, &display_name, exclude)?;

    let state_bytes = serde_json::to_vec(&reg_state)?;
    challenges::save_registration_challenge(&state.db, &user_id, &state_bytes, state.challenge_ttl())
        .await?;

    tracing::debug!(user_id = %user_id, existing_user = existing.is_some(), "Issued registration options");

    Ok((serde_json::to_value(ccr.public_key)?, user_id))
}

/// Verify an attestation and store the resulting credential.
///
/// ## What gets verified?
/// - A pending, unexpired challenge exists for `user_id` (and is consumed)
/// - Client data type is `webauthn.create`, its challenge matches, origin is ours
/// - RP ID hash in the authenticator data matches our RP ID
/// - The attestation statement is well formed
///
/// Returns the (normalized) id of the user the credential belongs to.
pub async fn finish_registration(
    state: &AppState,
    user_id: &str,
    credential: &RegisterPublicKeyCredential,
) -> AppResult<String> {
    let user_uuid =
        Uuid::parse_str(user_id).map_err(|_| AppError::BadRequest("Invalid userId".to_string()))?;
    let user_id = user_uuid.to_string();

    let challenge = challenges::consume_registration_challenge(&state.db, &user_id)
        .await?
        .ok_or_else(|| {
            AppError::RegistrationRejected(format!(
                "no pending registration challenge for user {user_id}"
            ))
        })?;

    let reg_state: PasskeyRegistration = serde_json::from_slice(&challenge.challenge_state)?;

    let passkey = state
        .webauthn
        .finish_passkey_registration(credential, &reg_state)
        .map_err(|e| AppError::RegistrationRejected(format!("attestation rejected: {e:?}")))?;

    let passkey_json = serde_json::to_value(&passkey)?;
    let passkey_bytes = serde_json::to_vec(&passkey_json)?;
    let credential_id = encoding::encode(passkey.cred_id());
    let transports = transport_names(credential);

    let mut tx = state.db.begin().await?;
    users::ensure_user(
        &mut *tx,
        &user_id,
        &state.config.passkey_user_name,
        &state.config.passkey_user_name,
    )
    .await?;
    credentials::insert_credential(
        &mut *tx,
        &credential_id,
        &user_id,
        &passkey_bytes,
        stored_counter(&passkey_json),
        transports.as_deref(),
    )
    .await?;
    tx.commit().await?;

    tracing::info!(user_id = %user_id, credential_id = %credential_id, "Registered passkey");

    Ok(user_id)
}

async fn excluded_credentials(
    state: &AppState,
    user_id: &str,
) -> AppResult<Option<Vec<CredentialID>>> {
    let stored = credentials::find_by_user_id(&state.db, user_id).await?;
    if stored.is_empty() {
        return Ok(None);
    }

    let mut exclude = Vec::with_capacity(stored.len());
    for credential in stored {
        let passkey: Passkey = serde_json::from_slice(&credential.passkey)?;
        exclude.push(passkey.cred_id().clone());
    }

    Ok(Some(exclude))
}

/// Transport hints reported by the browser, as their wire names.
fn transport_names(credential: &RegisterPublicKeyCredential) -> Option<Vec<String>> {
    let transports = credential.response.transports.as_ref()?;

    Some(
        transports
            .iter()
            .filter_map(|t| serde_json::to_value(t).ok())
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
    )
}

/// Sign count the authenticator reported at creation (usually 0).
fn stored_counter(passkey: &Value) -> u32 {
    passkey
        .pointer("/cred/counter")
        .and_then(Value::as_u64)
        .and_then(|c| u32::try_from(c).ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn counter_is_read_from_serialized_passkey() {
        assert_eq!(stored_counter(&json!({"cred": {"counter": 7}})), 7);
        assert_eq!(stored_counter(&json!({"cred": {}})), 0);
        assert_eq!(stored_counter(&json!({"cred": {"counter": u64::MAX}})), 0);
    }
}
