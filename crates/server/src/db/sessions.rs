use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::error::AppError;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OnlineUser {
    pub id: i64,
    pub username: String,
}

/// Start a session for `account_id`, revoking any others it holds.
/// Returns the new session id and its expiry.
pub async fn start_session(
    pool: &PgPool,
    account_id: i64,
    ttl_hours: i64,
) -> Result<(i64, DateTime<Utc>), AppError> {
    let expires_at = Utc::now() + Duration::hours(ttl_hours);
    let mut tx = pool.begin().await.map_err(AppError::Sqlx)?;

    sqlx::query("DELETE FROM sessions WHERE account_id = $1")
        .bind(account_id)
        .execute(&mut *tx)
        .await
        .map_err(AppError::Sqlx)?;

    let row: (i64,) = sqlx::query_as(
        "INSERT INTO sessions (account_id, expires_at) VALUES ($1, $2) RETURNING id",
    )
    .bind(account_id)
    .bind(expires_at)
    .fetch_one(&mut *tx)
    .await
    .map_err(AppError::Sqlx)?;

    tx.commit().await.map_err(AppError::Sqlx)?;
    Ok((row.0, expires_at))
}

pub async fn end_session(pool: &PgPool, session_id: i64) -> Result<(), AppError> {
    sqlx::query("DELETE FROM sessions WHERE id = $1")
        .bind(session_id)
        .execute(pool)
        .await
        .map_err(AppError::Sqlx)?;
    Ok(())
}

pub async fn purge_expired(pool: &PgPool) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at < NOW()")
        .execute(pool)
        .await
        .map_err(AppError::Sqlx)?;
    Ok(result.rows_affected())
}

/// Accounts holding a live session, excluding `viewer_id`.
pub async fn online_users(pool: &PgPool, viewer_id: i64) -> Result<Vec<OnlineUser>, AppError> {
    sqlx::query_as::<_, OnlineUser>(
        r#"SELECT DISTINCT a.id, a.username
           FROM sessions s
           JOIN accounts a ON a.id = s.account_id
           WHERE s.expires_at >= NOW()
             AND a.is_active
             AND a.id <> $1
           ORDER BY a.username"#,
    )
    .bind(viewer_id)
    .fetch_all(pool)
    .await
    .map_err(AppError::Sqlx)
}

pub async fn is_online(pool: &PgPool, account_id: i64) -> Result<bool, AppError> {
    let row: (bool,) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM sessions WHERE account_id = $1 AND expires_at >= NOW())",
    )
    .bind(account_id)
    .fetch_one(pool)
    .await
    .map_err(AppError::Sqlx)?;
    Ok(row.0)
}
