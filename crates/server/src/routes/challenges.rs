use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use sqlx::PgPool;

use crate::auth::middleware::AuthUser;
use crate::db::matches::ChallengeBlocked;
use crate::db::{accounts, matches, sessions};
use crate::error::AppError;
use crate::notify::{Event, Notifier};

#[derive(Deserialize)]
pub struct ChallengeRequest {
    pub opponent: i64,
}

/// POST /api/challenges
/// The challenger plays white against an online opponent.
pub async fn create_challenge(
    Extension(pool): Extension<PgPool>,
    Extension(notifier): Extension<Notifier>,
    user: AuthUser,
    Json(req): Json<ChallengeRequest>,
) -> Result<Json<JsonValue>, AppError> {
    if req.opponent == user.id {
        return Err(AppError::BadRequest("You cannot challenge yourself.".into()));
    }

    let opponent = accounts::get_account_by_id(&pool, req.opponent)
        .await?
        .filter(|a| a.is_active)
        .ok_or(AppError::NotFound("Opponent not found.".into()))?;

    if !sessions::is_online(&pool, opponent.id).await? {
        return Err(AppError::BadRequest("Opponent is not online.".into()));
    }

    let match_id = match matches::create_challenge(&pool, user.id, opponent.id).await? {
        Ok(id) => id,
        Err(ChallengeBlocked::ChallengerBusy) => {
            return Err(AppError::Conflict("You already have a game in progress.".into()))
        }
        Err(ChallengeBlocked::OpponentBusy) => {
            return Err(AppError::Conflict("Opponent is already in a game.".into()))
        }
    };

    tracing::info!("{} challenged {} (match {})", user.username, opponent.username, match_id);
    notifier.to_users(
        &[opponent.id],
        Event::ChallengeReceived {
            match_id,
            from: user.username.clone(),
        },
    );

    Ok(Json(serde_json::json!({
        "success": true,
        "match_id": match_id,
    })))
}

/// GET /api/challenges/pending
pub async fn check_for_challenges(
    Extension(pool): Extension<PgPool>,
    user: AuthUser,
) -> Result<Json<JsonValue>, AppError> {
    let pending = matches::has_pending_challenge(&pool, user.id).await?;
    Ok(Json(serde_json::json!({ "challenge_received": pending })))
}
