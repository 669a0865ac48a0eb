use axum::{
    extract::FromRequestParts,
    http::request::Parts,
};
use sqlx::PgPool;

use crate::auth::jwt;
use crate::config::Config;
use crate::error::AppError;

/// Authenticated user extracted from the Authorization header.
/// The token must point at a live session row, so logging out or logging in
/// elsewhere invalidates it.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub session_id: i64,
}

/// Resolve a bearer token to its account and session.
pub async fn authenticate(pool: &PgPool, config: &Config, token: &str) -> Result<AuthUser, AppError> {
    let claims = jwt::verify_token(token, &config.jwt_secret)
        .ok_or(AppError::Unauthorized)?;

    sqlx::query_as::<_, AuthUser>(
        r#"SELECT
            a.id, a.username, a.email, a.first_name, a.last_name, a.created_at,
            s.id AS session_id
        FROM sessions s
        JOIN accounts a ON a.id = s.account_id
        WHERE s.id = $1 AND s.account_id = $2
          AND s.expires_at > NOW()
          AND a.is_active"#,
    )
    .bind(claims.session_id)
    .bind(claims.user_id)
    .fetch_optional(pool)
    .await
    .map_err(AppError::Sqlx)?
    .ok_or(AppError::Unauthorized)
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let pool = parts
            .extensions
            .get::<PgPool>()
            .ok_or(AppError::Internal("Missing database pool".into()))?
            .clone();

        let config = parts
            .extensions
            .get::<Config>()
            .ok_or(AppError::Internal("Missing config".into()))?
            .clone();

        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::Unauthorized)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .or_else(|| auth_header.strip_prefix("bearer "))
            .ok_or(AppError::Unauthorized)?;

        authenticate(&pool, &config, token).await
    }
}
