use axum::{extract::Path, Extension, Json};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use sqlx::PgPool;

use crate::auth::middleware::AuthUser;
use crate::db::{journal, matches};
use crate::error::AppError;

const MAX_DESCRIPTION: usize = 200;
const MAX_NOTES: usize = 5000;

#[derive(Deserialize)]
pub struct JournalRequest {
    pub description: Option<String>,
    pub notes: Option<String>,
}

/// Only players of a match may keep notes on it.
async fn ensure_player(pool: &PgPool, match_id: i64, account_id: i64) -> Result<(), AppError> {
    let row = matches::get_match(pool, match_id)
        .await?
        .ok_or(AppError::NotFound("Game not found".into()))?;
    if !row.involves(account_id) {
        return Err(AppError::Forbidden("You are not a player in this match.".into()));
    }
    Ok(())
}

fn normalize(field: Option<String>) -> Option<String> {
    field
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// GET /api/matches/{match_id}/journal
pub async fn get_journal(
    Extension(pool): Extension<PgPool>,
    Path(match_id): Path<i64>,
    user: AuthUser,
) -> Result<Json<JsonValue>, AppError> {
    ensure_player(&pool, match_id, user.id).await?;

    let entry = journal::get_entry(&pool, user.id, match_id).await?;
    Ok(Json(match entry {
        Some(e) => serde_json::to_value(e).map_err(anyhow::Error::from)?,
        None => serde_json::json!({
            "match_id": match_id,
            "description": null,
            "notes": null,
            "hidden": false,
        }),
    }))
}

/// PUT /api/matches/{match_id}/journal
pub async fn edit_journal(
    Extension(pool): Extension<PgPool>,
    Path(match_id): Path<i64>,
    user: AuthUser,
    Json(req): Json<JournalRequest>,
) -> Result<Json<journal::JournalEntry>, AppError> {
    ensure_player(&pool, match_id, user.id).await?;

    let description = normalize(req.description);
    let notes = normalize(req.notes);
    if description.as_ref().is_some_and(|d| d.chars().count() > MAX_DESCRIPTION) {
        return Err(AppError::BadRequest(format!(
            "Description must be at most {MAX_DESCRIPTION} characters"
        )));
    }
    if notes.as_ref().is_some_and(|n| n.chars().count() > MAX_NOTES) {
        return Err(AppError::BadRequest(format!(
            "Notes must be at most {MAX_NOTES} characters"
        )));
    }

    let entry = journal::upsert_entry(
        &pool,
        user.id,
        match_id,
        description.as_deref(),
        notes.as_deref(),
    )
    .await?;

    Ok(Json(entry))
}

/// DELETE /api/matches/{match_id}/journal
/// Deletes the viewer's entry only; the match is untouched.
pub async fn delete_journal(
    Extension(pool): Extension<PgPool>,
    Path(match_id): Path<i64>,
    user: AuthUser,
) -> Result<Json<JsonValue>, AppError> {
    ensure_player(&pool, match_id, user.id).await?;
    let deleted = journal::delete_entry(&pool, user.id, match_id).await?;
    Ok(Json(serde_json::json!({ "deleted": deleted })))
}
