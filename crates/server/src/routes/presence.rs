use axum::{Extension, Json};
use serde_json::Value as JsonValue;
use sqlx::PgPool;

use crate::auth::middleware::AuthUser;
use crate::db::sessions;
use crate::error::AppError;

/// GET /api/users/online
/// Accounts with a live session, excluding the viewer. A live session does not
/// prove the user is still looking at the page.
pub async fn online_users(
    Extension(pool): Extension<PgPool>,
    user: AuthUser,
) -> Result<Json<JsonValue>, AppError> {
    let purged = sessions::purge_expired(&pool).await?;
    if purged > 0 {
        tracing::debug!("Purged {} expired sessions", purged);
    }

    let online = sessions::online_users(&pool, user.id).await?;
    Ok(Json(serde_json::json!({ "online_users": online })))
}
