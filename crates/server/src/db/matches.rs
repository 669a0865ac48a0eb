use chess_core::{MatchState, Players, Side};
use sqlx::PgPool;

use crate::error::AppError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MatchRow {
    pub id: i64,
    pub player1_id: i64,
    pub player2_id: i64,
    pub player1_name: String,
    pub player2_name: String,
    pub fen: String,
    pub turn: String,
    pub moves: i32,
    pub outcome: Option<String>,
    pub active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl MatchRow {
    pub fn to_state(&self) -> MatchState {
        MatchState {
            id: self.id,
            white_id: self.player1_id,
            black_id: self.player2_id,
            fen: self.fen.clone(),
            turn: Side::parse(&self.turn).unwrap_or(Side::White),
            moves: self.moves,
            active: self.active,
            outcome: self.outcome.clone(),
        }
    }

    pub fn players(&self) -> Players {
        Players {
            white: self.player1_name.clone(),
            black: self.player2_name.clone(),
        }
    }

    pub fn involves(&self, account_id: i64) -> bool {
        self.player1_id == account_id || self.player2_id == account_id
    }
}

/// A history entry with the viewer's (non-hidden) journal attached.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct HistoryRow {
    #[sqlx(flatten)]
    pub game: MatchRow,
    pub journal_description: Option<String>,
    pub journal_notes: Option<String>,
}

const MATCH_QUERY: &str = r#"SELECT
    m.id,
    m.player1_id,
    m.player2_id,
    p1.username AS player1_name,
    p2.username AS player2_name,
    m.fen,
    m.turn,
    m.moves,
    m.outcome,
    m.active,
    m.created_at
FROM matches m
JOIN accounts p1 ON p1.id = m.player1_id
JOIN accounts p2 ON p2.id = m.player2_id"#;

pub async fn get_match(pool: &PgPool, match_id: i64) -> Result<Option<MatchRow>, AppError> {
    let query = format!("{MATCH_QUERY} WHERE m.id = $1");
    sqlx::query_as::<_, MatchRow>(&query)
        .bind(match_id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Sqlx)
}

pub async fn get_active_match_for(pool: &PgPool, account_id: i64) -> Result<Option<MatchRow>, AppError> {
    let query = format!(
        "{MATCH_QUERY} WHERE m.active AND (m.player1_id = $1 OR m.player2_id = $1) ORDER BY m.id LIMIT 1"
    );
    sqlx::query_as::<_, MatchRow>(&query)
        .bind(account_id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Sqlx)
}

/// Why a challenge could not be created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeBlocked {
    ChallengerBusy,
    OpponentBusy,
}

/// Create a match between `challenger` (white) and `opponent` (black) unless
/// either already has an active one. Both account rows are locked for the
/// duration of the check so two concurrent challenges cannot both succeed.
pub async fn create_challenge(
    pool: &PgPool,
    challenger_id: i64,
    opponent_id: i64,
) -> Result<Result<i64, ChallengeBlocked>, AppError> {
    let mut tx = pool.begin().await.map_err(AppError::Sqlx)?;

    sqlx::query("SELECT id FROM accounts WHERE id = $1 OR id = $2 ORDER BY id FOR UPDATE")
        .bind(challenger_id)
        .bind(opponent_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(AppError::Sqlx)?;

    let busy: Vec<(i64,)> = sqlx::query_as(
        r#"SELECT p FROM (
               SELECT player1_id AS p FROM matches WHERE active
               UNION
               SELECT player2_id AS p FROM matches WHERE active
           ) busy
           WHERE p = $1 OR p = $2"#,
    )
    .bind(challenger_id)
    .bind(opponent_id)
    .fetch_all(&mut *tx)
    .await
    .map_err(AppError::Sqlx)?;

    if busy.iter().any(|(p,)| *p == challenger_id) {
        return Ok(Err(ChallengeBlocked::ChallengerBusy));
    }
    if busy.iter().any(|(p,)| *p == opponent_id) {
        return Ok(Err(ChallengeBlocked::OpponentBusy));
    }

    let row: (i64,) = sqlx::query_as(
        r#"INSERT INTO matches (player1_id, player2_id, fen, turn, moves, active)
           VALUES ($1, $2, 'startpos', 'white', 0, TRUE)
           RETURNING id"#,
    )
    .bind(challenger_id)
    .bind(opponent_id)
    .fetch_one(&mut *tx)
    .await
    .map_err(AppError::Sqlx)?;

    tx.commit().await.map_err(AppError::Sqlx)?;
    Ok(Ok(row.0))
}

/// Persist a reconciled move. The write only lands if the match is still
/// active at `expected_moves`; returns false when another submission won.
pub async fn store_move(
    pool: &PgPool,
    next: &MatchState,
    expected_moves: i32,
) -> Result<bool, AppError> {
    let result = sqlx::query(
        r#"UPDATE matches SET
            fen = $2,
            turn = $3,
            moves = $4,
            outcome = $5,
            active = $6,
            updated_at = NOW()
        WHERE id = $1 AND moves = $7 AND active"#,
    )
    .bind(next.id)
    .bind(&next.fen)
    .bind(next.turn.as_str())
    .bind(next.moves)
    .bind(next.outcome.as_deref())
    .bind(next.active)
    .bind(expected_moves)
    .execute(pool)
    .await
    .map_err(AppError::Sqlx)?;

    Ok(result.rows_affected() == 1)
}

/// Finish an active match with `outcome`. Returns false if it was already over.
pub async fn store_resignation(pool: &PgPool, match_id: i64, outcome: &str) -> Result<bool, AppError> {
    let result = sqlx::query(
        r#"UPDATE matches SET outcome = $2, active = FALSE, updated_at = NOW()
           WHERE id = $1 AND active"#,
    )
    .bind(match_id)
    .bind(outcome)
    .execute(pool)
    .await
    .map_err(AppError::Sqlx)?;

    Ok(result.rows_affected() == 1)
}

/// An active match where the viewer was challenged and nobody has moved yet.
pub async fn has_pending_challenge(pool: &PgPool, account_id: i64) -> Result<bool, AppError> {
    let row: (bool,) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM matches WHERE player2_id = $1 AND active AND moves = 0)",
    )
    .bind(account_id)
    .fetch_one(pool)
    .await
    .map_err(AppError::Sqlx)?;
    Ok(row.0)
}

pub async fn get_history(
    pool: &PgPool,
    account_id: i64,
    limit: i64,
    offset: i64,
) -> Result<Vec<HistoryRow>, AppError> {
    let query = format!(
        r#"SELECT q.*, j.description AS journal_description, j.notes AS journal_notes
           FROM ({MATCH_QUERY}
                 WHERE (m.player1_id = $1 OR m.player2_id = $1)
                   AND NOT EXISTS (
                       SELECT 1 FROM match_hidden h
                       WHERE h.match_id = m.id AND h.account_id = $1)
           ) q
           LEFT JOIN journal_entries j
             ON j.match_id = q.id AND j.account_id = $1 AND NOT j.hidden
           ORDER BY q.id DESC
           LIMIT $2 OFFSET $3"#
    );
    sqlx::query_as::<_, HistoryRow>(&query)
        .bind(account_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .map_err(AppError::Sqlx)
}

pub async fn count_history(pool: &PgPool, account_id: i64) -> Result<i64, AppError> {
    let count: (i64,) = sqlx::query_as(
        r#"SELECT COUNT(*) FROM matches m
           WHERE (m.player1_id = $1 OR m.player2_id = $1)
             AND NOT EXISTS (
                 SELECT 1 FROM match_hidden h
                 WHERE h.match_id = m.id AND h.account_id = $1)"#,
    )
    .bind(account_id)
    .fetch_one(pool)
    .await
    .map_err(AppError::Sqlx)?;
    Ok(count.0)
}

/// Hide a match from one viewer's history, along with their journal entry.
pub async fn hide_match(pool: &PgPool, match_id: i64, account_id: i64) -> Result<(), AppError> {
    let mut tx = pool.begin().await.map_err(AppError::Sqlx)?;

    sqlx::query(
        r#"INSERT INTO match_hidden (match_id, account_id)
           VALUES ($1, $2)
           ON CONFLICT DO NOTHING"#,
    )
    .bind(match_id)
    .bind(account_id)
    .execute(&mut *tx)
    .await
    .map_err(AppError::Sqlx)?;

    sqlx::query(
        r#"UPDATE journal_entries SET hidden = TRUE, updated_at = NOW()
           WHERE match_id = $1 AND account_id = $2"#,
    )
    .bind(match_id)
    .bind(account_id)
    .execute(&mut *tx)
    .await
    .map_err(AppError::Sqlx)?;

    tx.commit().await.map_err(AppError::Sqlx)?;
    Ok(())
}
