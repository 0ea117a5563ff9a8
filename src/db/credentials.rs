//! # Credential Database Operations
//!
//! Passkey credentials hold the public keys used to verify logins.
//!
//! ## Security Note
//! Only public keys are stored - private keys never leave the user's device.

use crate::db::models::{self, PasskeyCredential};
use crate::error::{AppError, AppResult};
use sqlx::{SqliteConnection, SqlitePool};

/// Insert a freshly verified credential.
///
/// Takes a connection so it can run inside the registration transaction.
/// A credential id that is already registered is a rejected registration,
/// not a storage failure.
pub async fn insert_credential(
    conn: &mut SqliteConnection,
    credential_id: &str,
    user_id: &str,
    passkey: &[u8],
    counter: u32,
    transports: Option<&[String]>,
) -> AppResult<()> {
    let transports_json = transports.map(serde_json::to_string).transpose()?;

    sqlx::query(
        "INSERT INTO passkey_credentials (id, user_id, passkey, counter, transports, created_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(credential_id)
    .bind(user_id)
    .bind(passkey)
    .bind(i64::from(counter))
    .bind(transports_json)
    .bind(models::now())
    .execute(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            AppError::RegistrationRejected(format!("credential {credential_id} already registered"))
        }
        _ => AppError::Database(e),
    })?;

    Ok(())
}

/// All credentials owned by a user, oldest first. Empty if none.
pub async fn find_by_user_id(pool: &SqlitePool, user_id: &str) -> AppResult<Vec<PasskeyCredential>> {
    let credentials = sqlx::query_as::<_, PasskeyCredential>(
        "SELECT id, user_id, passkey, counter, last_used_at FROM passkey_credentials
         WHERE user_id = ?
         ORDER BY created_at",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(credentials)
}

pub async fn find_by_credential_id(
    pool: &SqlitePool,
    credential_id: &str,
) -> AppResult<Option<PasskeyCredential>> {
    let credential = sqlx::query_as::<_, PasskeyCredential>(
        "SELECT id, user_id, passkey, counter, last_used_at FROM passkey_credentials WHERE id = ?",
    )
    .bind(credential_id)
    .fetch_optional(pool)
    .await?;

    Ok(credential)
}

/// Record a successful login: store the new sign count and updated passkey.
///
/// The update only applies while the stored counter is below `new_counter`,
/// so of two concurrent logins reporting the same count at most one wins.
/// Returns `false` when the count did not advance.
pub async fn advance_counter(
    pool: &SqlitePool,
    credential_id: &str,
    new_counter: u32,
    passkey: &[u8],
) -> AppResult<bool> {
    let result = sqlx::query(
        "UPDATE passkey_credentials
         SET counter = ?, passkey = ?, last_used_at = ?
         WHERE id = ? AND counter < ?",
    )
    .bind(i64::from(new_counter))
    .bind(passkey)
    .bind(models::now())
    .bind(credential_id)
    .bind(i64::from(new_counter))
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}
