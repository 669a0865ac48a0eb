use axum::{extract::Path, extract::Query, Extension, Json};
use chess_core::{fen, reconcile, render, GlyphTable, RulesOracle, Side, ShakmatyOracle, ViewerResult};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use sqlx::PgPool;

use crate::auth::middleware::AuthUser;
use crate::config::Config;
use crate::db::matches::{self, MatchRow};
use crate::error::AppError;
use crate::notify::{Event, Notifier};

#[derive(Deserialize)]
pub struct MoveRequest {
    pub uci_move: String,
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub page: Option<i64>,
}

/// Board, turn and players of a match, as the game page renders it.
fn state_json(row: &MatchRow) -> JsonValue {
    let (rows, decode_err) = fen::decode_or_initial(&row.fen);
    if let Some(e) = decode_err {
        tracing::warn!("Match {} has an undecodable position ({e}), rendering the initial board", row.id);
    }
    let page_data = render::project(&rows, &GlyphTable::html_entities());

    let current_turn = ShakmatyOracle
        .side_to_move(&row.fen)
        .unwrap_or_else(|_| Side::parse(&row.turn).unwrap_or(Side::White));

    serde_json::json!({
        "page_data": page_data,
        "current_turn": current_turn,
        "current_game_id": row.id,
        "player1": row.player1_name,
        "player2": row.player2_name,
        "moves": row.moves,
        "active": row.active,
        "outcome": row.outcome.clone().unwrap_or_default(),
    })
}

async fn load_match(pool: &PgPool, match_id: i64) -> Result<MatchRow, AppError> {
    matches::get_match(pool, match_id)
        .await?
        .ok_or(AppError::NotFound("Game not found".into()))
}

/// GET /api/matches/current
pub async fn current_match(
    Extension(pool): Extension<PgPool>,
    user: AuthUser,
) -> Result<Json<JsonValue>, AppError> {
    let row = matches::get_active_match_for(&pool, user.id)
        .await?
        .ok_or(AppError::NotFound("No game in progress".into()))?;
    Ok(Json(state_json(&row)))
}

/// GET /api/matches/{match_id}
pub async fn get_match_state(
    Extension(pool): Extension<PgPool>,
    Path(match_id): Path<i64>,
    _user: AuthUser,
) -> Result<Json<JsonValue>, AppError> {
    let row = load_match(&pool, match_id).await?;
    Ok(Json(state_json(&row)))
}

/// POST /api/matches/{match_id}/move
pub async fn submit_move(
    Extension(pool): Extension<PgPool>,
    Extension(notifier): Extension<Notifier>,
    Path(match_id): Path<i64>,
    user: AuthUser,
    Json(req): Json<MoveRequest>,
) -> Result<Json<JsonValue>, AppError> {
    let uci_move = req.uci_move.trim();
    if uci_move.is_empty() {
        return Err(AppError::BadRequest("You must enter a move.".into()));
    }

    let mut row = load_match(&pool, match_id).await?;
    let current = row.to_state();
    let applied = reconcile::submit_move(&ShakmatyOracle, &current, user.id, uci_move, &row.players())?;

    if !matches::store_move(&pool, &applied.state, current.moves).await? {
        return Err(AppError::Conflict(
            "The game changed before your move was saved. Reload and try again.".into(),
        ));
    }

    let next = &applied.state;
    row.fen = next.fen.clone();
    row.turn = next.turn.as_str().to_string();
    row.moves = next.moves;
    row.active = next.active;
    row.outcome = next.outcome.clone();

    let players = [row.player1_id, row.player2_id];
    notifier.to_users(
        &players,
        Event::MoveMade {
            match_id,
            moves: next.moves,
            current_turn: next.turn,
        },
    );
    if let Some(outcome) = next.outcome.as_ref().filter(|_| applied.finished()) {
        tracing::info!("Match {} finished after {} moves: {}", match_id, next.moves, outcome);
        notifier.to_users(
            &players,
            Event::MatchEnded {
                match_id,
                outcome: outcome.clone(),
            },
        );
    }

    Ok(Json(state_json(&row)))
}

/// POST /api/matches/{match_id}/resign
pub async fn resign(
    Extension(pool): Extension<PgPool>,
    Extension(notifier): Extension<Notifier>,
    Path(match_id): Path<i64>,
    user: AuthUser,
) -> Result<Json<JsonValue>, AppError> {
    let mut row = load_match(&pool, match_id).await?;
    let next = reconcile::resign(&row.to_state(), user.id, &row.players())?;
    let outcome = next.outcome.clone().unwrap_or_default();

    if !matches::store_resignation(&pool, match_id, &outcome).await? {
        return Err(AppError::Conflict("This match is already over.".into()));
    }

    tracing::info!("Match {}: {}", match_id, outcome);
    notifier.to_users(
        &[row.player1_id, row.player2_id],
        Event::MatchEnded {
            match_id,
            outcome: outcome.clone(),
        },
    );

    row.active = false;
    row.outcome = Some(outcome);
    Ok(Json(state_json(&row)))
}

/// Clamp a requested page into range: returns (page, num_pages, offset).
fn page_window(total: i64, page_size: i64, requested: Option<i64>) -> (i64, i64, i64) {
    let num_pages = ((total + page_size - 1) / page_size).max(1);
    let page = requested.unwrap_or(1).clamp(1, num_pages);
    (page, num_pages, (page - 1) * page_size)
}

/// GET /api/matches?page=N
/// The viewer's games, newest first, without the ones they hid.
pub async fn history(
    Extension(pool): Extension<PgPool>,
    Extension(config): Extension<Config>,
    Query(q): Query<HistoryQuery>,
    user: AuthUser,
) -> Result<Json<JsonValue>, AppError> {
    let total = matches::count_history(&pool, user.id).await?;
    let (page, num_pages, offset) = page_window(total, config.history_page_size, q.page);
    let rows = matches::get_history(&pool, user.id, config.history_page_size, offset).await?;

    let games: Vec<JsonValue> = rows
        .iter()
        .map(|h| {
            let g = &h.game;
            let opponent = if g.player1_id == user.id { &g.player2_name } else { &g.player1_name };
            let journal = (h.journal_description.is_some() || h.journal_notes.is_some()).then(|| {
                serde_json::json!({
                    "description": h.journal_description,
                    "notes": h.journal_notes,
                })
            });
            serde_json::json!({
                "id": g.id,
                "player1": g.player1_name,
                "player2": g.player2_name,
                "opponent": opponent,
                "moves": g.moves,
                "active": g.active,
                "outcome": g.outcome,
                "result": ViewerResult::from_outcome(g.outcome.as_deref(), &user.username),
                "createdAt": g.created_at.to_rfc3339(),
                "journal": journal,
            })
        })
        .collect();

    Ok(Json(serde_json::json!({
        "games": games,
        "total": total,
        "page": page,
        "numPages": num_pages,
        "hasNext": page < num_pages,
        "hasPrevious": page > 1,
    })))
}

/// POST /api/matches/{match_id}/hide
/// Removes the match (and the viewer's journal entry) from the viewer's
/// history only; the opponent still sees it.
pub async fn hide_match(
    Extension(pool): Extension<PgPool>,
    Path(match_id): Path<i64>,
    user: AuthUser,
) -> Result<Json<JsonValue>, AppError> {
    let row = load_match(&pool, match_id).await?;
    if !row.involves(user.id) {
        return Err(AppError::Forbidden("You are not a player in this match.".into()));
    }

    matches::hide_match(&pool, match_id, user.id).await?;
    tracing::info!("Match {} hidden for {}", match_id, user.username);
    Ok(Json(serde_json::json!({ "ok": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(fen: &str) -> MatchRow {
        MatchRow {
            id: 3,
            player1_id: 1,
            player2_id: 2,
            player1_name: "alice".into(),
            player2_name: "bob".into(),
            fen: fen.into(),
            turn: "white".into(),
            moves: 0,
            outcome: None,
            active: true,
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_state_json_fresh_match() {
        let json = state_json(&row("startpos"));
        assert_eq!(json["current_turn"], "white");
        assert_eq!(json["current_game_id"], 3);
        assert_eq!(json["player2"], "bob");
        assert_eq!(json["outcome"], "");
        assert_eq!(json["page_data"]["rows"].as_array().unwrap().len(), 9);
        assert_eq!(json["page_data"]["rows"][7]["e1"], "&#9812;");
    }

    #[test]
    fn test_state_json_falls_back_on_bad_fen() {
        let mut r = row("not/a/fen b - - 0 1");
        r.turn = "black".into();
        let json = state_json(&r);
        assert_eq!(json["page_data"]["rows"][0]["e8"], "&#9818;");
        assert_eq!(json["current_turn"], "black");
    }

    #[test]
    fn test_page_window() {
        assert_eq!(page_window(0, 10, None), (1, 1, 0));
        assert_eq!(page_window(25, 10, Some(2)), (2, 3, 10));
        assert_eq!(page_window(25, 10, Some(9)), (3, 3, 20));
        assert_eq!(page_window(25, 10, Some(-4)), (1, 3, 0));
        assert_eq!(page_window(20, 10, Some(2)), (2, 2, 10));
    }
}
