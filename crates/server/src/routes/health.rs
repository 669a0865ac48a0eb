use axum::{Extension, Json};
use serde_json::Value as JsonValue;
use sqlx::PgPool;

/// GET /health
pub async fn health_check(Extension(pool): Extension<PgPool>) -> Json<JsonValue> {
    let database = sqlx::query("SELECT 1").execute(&pool).await.is_ok();
    Json(serde_json::json!({
        "status": "ok",
        "database": database,
    }))
}
