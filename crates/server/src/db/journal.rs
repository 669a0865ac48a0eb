use serde::Serialize;
use sqlx::PgPool;

use crate::error::AppError;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct JournalEntry {
    pub match_id: i64,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub hidden: bool,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

pub async fn get_entry(
    pool: &PgPool,
    account_id: i64,
    match_id: i64,
) -> Result<Option<JournalEntry>, AppError> {
    sqlx::query_as::<_, JournalEntry>(
        r#"SELECT match_id, description, notes, hidden, updated_at
           FROM journal_entries
           WHERE account_id = $1 AND match_id = $2"#,
    )
    .bind(account_id)
    .bind(match_id)
    .fetch_optional(pool)
    .await
    .map_err(AppError::Sqlx)
}

/// Create the entry on first edit, overwrite both fields afterwards.
pub async fn upsert_entry(
    pool: &PgPool,
    account_id: i64,
    match_id: i64,
    description: Option<&str>,
    notes: Option<&str>,
) -> Result<JournalEntry, AppError> {
    sqlx::query_as::<_, JournalEntry>(
        r#"INSERT INTO journal_entries (account_id, match_id, description, notes)
           VALUES ($1, $2, $3, $4)
           ON CONFLICT (account_id, match_id) DO UPDATE SET
               description = EXCLUDED.description,
               notes = EXCLUDED.notes,
               updated_at = NOW()
           RETURNING match_id, description, notes, hidden, updated_at"#,
    )
    .bind(account_id)
    .bind(match_id)
    .bind(description)
    .bind(notes)
    .fetch_one(pool)
    .await
    .map_err(AppError::Sqlx)
}

pub async fn delete_entry(pool: &PgPool, account_id: i64, match_id: i64) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM journal_entries WHERE account_id = $1 AND match_id = $2")
        .bind(account_id)
        .bind(match_id)
        .execute(pool)
        .await
        .map_err(AppError::Sqlx)?;
    Ok(result.rows_affected() > 0)
}
