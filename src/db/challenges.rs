//! # Challenge Store
//!
//! Pending WebAuthn challenges live in the database, not in process memory,
//! so any instance can finish a handshake another instance started.
//!
//! Consumption is a single `DELETE ... RETURNING` statement: the row that
//! comes back is gone for every other caller, which is what makes a
//! challenge single-use even when two verify requests race.

use crate::db::models::{self, AuthenticationChallenge, RegistrationChallenge};
use crate::error::AppResult;
use chrono::Duration;
use sqlx::SqlitePool;

// Registration Challenge Operations

pub async fn save_registration_challenge(
    pool: &SqlitePool,
    user_id: &str,
    challenge_state: &[u8],
    ttl: Duration,
) -> AppResult<String> {
    let challenge = RegistrationChallenge::new(user_id.to_string(), challenge_state.to_vec(), ttl);

    sqlx::query(
        "INSERT INTO registration_challenges (id, user_id, challenge_state, created_at, expires_at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&challenge.id)
    .bind(&challenge.user_id)
    .bind(&challenge.challenge_state)
    .bind(&challenge.created_at)
    .bind(&challenge.expires_at)
    .execute(pool)
    .await?;

    Ok(challenge.id)
}

/// Take every pending registration challenge for `user_id` out of the store
/// and return the newest one that has not expired.
///
/// Returns `None` when there is nothing usable: never issued, already
/// consumed, or expired.
pub async fn consume_registration_challenge(
    pool: &SqlitePool,
    user_id: &str,
) -> AppResult<Option<RegistrationChallenge>> {
    let now = models::now();

    let consumed = sqlx::query_as::<_, RegistrationChallenge>(
        "DELETE FROM registration_challenges
         WHERE user_id = ?
         RETURNING id, user_id, challenge_state, created_at, expires_at",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(consumed
        .into_iter()
        .filter(|challenge| challenge.expires_at > now)
        .max_by(|a, b| a.created_at.cmp(&b.created_at)))
}

// Authentication Challenge Operations

pub async fn save_authentication_challenge(
    pool: &SqlitePool,
    challenge_state: &[u8],
    ttl: Duration,
) -> AppResult<String> {
    let challenge = AuthenticationChallenge::new(challenge_state.to_vec(), ttl);

    sqlx::query(
        "INSERT INTO authentication_challenges (id, challenge_state, created_at, expires_at)
         VALUES (?, ?, ?, ?)",
    )
    .bind(&challenge.id)
    .bind(&challenge.challenge_state)
    .bind(&challenge.created_at)
    .bind(&challenge.expires_at)
    .execute(pool)
    .await?;

    Ok(challenge.id)
}

/// Atomically check-and-invalidate the login challenge `challenge_id`.
///
/// Expired rows are left for [`prune_expired_challenges`] and reported as `None`.
pub async fn consume_authentication_challenge(
    pool: &SqlitePool,
    challenge_id: &str,
) -> AppResult<Option<AuthenticationChallenge>> {
    let challenge = sqlx::query_as::<_, AuthenticationChallenge>(
        "DELETE FROM authentication_challenges
         WHERE id = ? AND expires_at > ?
         RETURNING id, challenge_state, created_at, expires_at",
    )
    .bind(challenge_id)
    .bind(models::now())
    .fetch_optional(pool)
    .await?;

    Ok(challenge)
}

/// Delete challenges whose expiry has passed. Runs whenever new options are issued.
pub async fn prune_expired_challenges(pool: &SqlitePool) -> AppResult<u64> {
    let now = models::now();

    let registration = sqlx::query("DELETE FROM registration_challenges WHERE expires_at <= ?")
        .bind(&now)
        .execute(pool)
        .await?;

    let authentication = sqlx::query("DELETE FROM authentication_challenges WHERE expires_at <= ?")
        .bind(&now)
        .execute(pool)
        .await?;

    Ok(registration.rows_affected() + authentication.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_pool;

    async fn count(pool: &SqlitePool, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn authentication_challenge_is_single_use() {
        let pool = test_pool().await;
        let id = save_authentication_challenge(&pool, b"state", Duration::minutes(5))
            .await
            .unwrap();

        let first = consume_authentication_challenge(&pool, &id).await.unwrap();
        assert_eq!(first.unwrap().challenge_state, b"state");

        let replay = consume_authentication_challenge(&pool, &id).await.unwrap();
        assert!(replay.is_none());
    }

    #[tokio::test]
    async fn expired_authentication_challenge_is_not_consumed() {
        let pool = test_pool().await;
        let id = save_authentication_challenge(&pool, b"state", Duration::seconds(-1))
            .await
            .unwrap();

        assert!(consume_authentication_challenge(&pool, &id).await.unwrap().is_none());
        assert_eq!(prune_expired_challenges(&pool).await.unwrap(), 1);
        assert_eq!(count(&pool, "authentication_challenges").await, 0);
    }

    #[tokio::test]
    async fn registration_consume_takes_newest_and_clears_the_rest() {
        let pool = test_pool().await;
        save_registration_challenge(&pool, "user-1", b"old", Duration::minutes(5))
            .await
            .unwrap();
        save_registration_challenge(&pool, "user-1", b"new", Duration::minutes(5))
            .await
            .unwrap();
        save_registration_challenge(&pool, "user-2", b"other", Duration::minutes(5))
            .await
            .unwrap();

        let taken = consume_registration_challenge(&pool, "user-1").await.unwrap().unwrap();
        assert_eq!(taken.challenge_state, b"new");
        assert!(consume_registration_challenge(&pool, "user-1").await.unwrap().is_none());
        assert_eq!(count(&pool, "registration_challenges").await, 1);
    }

    #[tokio::test]
    async fn expired_registration_challenge_is_rejected() {
        let pool = test_pool().await;
        save_registration_challenge(&pool, "user-1", b"state", Duration::seconds(-1))
            .await
            .unwrap();

        assert!(consume_registration_challenge(&pool, "user-1").await.unwrap().is_none());
    }
}
