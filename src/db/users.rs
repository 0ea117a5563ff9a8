use crate::db::models::{self, User};
use crate::error::AppResult;
use sqlx::{SqliteConnection, SqlitePool};

/// Create the user row unless it already exists.
///
/// Users are created lazily, when their first credential is verified, so an
/// abandoned registration never leaves an orphan user behind.
pub async fn ensure_user(
    conn: &mut SqliteConnection,
    user_id: &str,
    name: &str,
    display_name: &str,
) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO users (id, name, display_name, created_at)
         VALUES (?, ?, ?, ?)
         ON CONFLICT(id) DO NOTHING",
    )
    .bind(user_id)
    .bind(name)
    .bind(display_name)
    .bind(models::now())
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn find_by_id(pool: &SqlitePool, user_id: &str) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT id, name, display_name FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_pool;

    #[tokio::test]
    async fn ensure_user_is_idempotent() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        ensure_user(&mut conn, "user-1", "admin", "Admin").await.unwrap();
        ensure_user(&mut conn, "user-1", "other", "Other").await.unwrap();
        drop(conn);

        let user = find_by_id(&pool, "user-1").await.unwrap().unwrap();
        assert_eq!(user.name, "admin");
        assert_eq!(user.display_name, "Admin");
        assert!(find_by_id(&pool, "user-2").await.unwrap().is_none());
    }
}
