//! Turn and move reconciliation.
//!
//! Given a match snapshot, a submitted coordinate move and the mover, decide
//! whether the move stands and compute the next snapshot. Nothing here
//! persists anything; the caller stores the returned state.

use crate::coord_move::{CoordMove, FormatError};
use crate::fen;
use crate::match_state::{MatchState, Players, Side};
use crate::rules::{GameStatus, RulesError, RulesOracle};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("You are not a player in this match.")]
    NotAPlayer,

    #[error("This match is already over.")]
    MatchOver,

    #[error("It is not your turn.")]
    NotYourTurn,

    #[error("Invalid move!")]
    IllegalMove(CoordMove),

    #[error(transparent)]
    Rules(RulesError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveApplied {
    pub state: MatchState,
    pub played: CoordMove,
}

impl MoveApplied {
    pub fn finished(&self) -> bool {
        !self.state.active
    }
}

/// Validate and apply `raw` for `mover`. On any error the caller's state is untouched.
pub fn submit_move<O: RulesOracle + ?Sized>(
    oracle: &O,
    state: &MatchState,
    mover: i64,
    raw: &str,
    players: &Players,
) -> Result<MoveApplied, MoveError> {
    let mv = CoordMove::parse(raw)?;

    let mover_side = state.side_of(mover).ok_or(MoveError::NotAPlayer)?;
    if !state.active {
        return Err(MoveError::MatchOver);
    }

    let to_move = oracle.side_to_move(&state.fen).map_err(MoveError::Rules)?;
    if mover_side != to_move || moves_opponent_piece(&state.fen, mv, mover_side) {
        return Err(MoveError::NotYourTurn);
    }

    if !oracle.is_legal(&state.fen, mv).map_err(MoveError::Rules)? {
        return Err(MoveError::IllegalMove(mv));
    }

    let applied = oracle.apply(&state.fen, mv).map_err(|e| match e {
        RulesError::Illegal(_) => MoveError::IllegalMove(mv),
        other => MoveError::Rules(other),
    })?;

    let mut next = state.clone();
    next.fen = applied.fen;
    next.turn = to_move.flip();
    next.moves += 1;

    let outcome = match applied.status {
        GameStatus::Ongoing => None,
        GameStatus::Checkmate { winner } => {
            Some(format!("{} wins by checkmate", players.name(winner)))
        }
        GameStatus::Stalemate => Some("Game drawn by stalemate".to_string()),
        GameStatus::InsufficientMaterial => {
            Some("Game drawn by insufficient material".to_string())
        }
    };
    if let Some(outcome) = outcome {
        next.outcome = Some(outcome);
        next.active = false;
    }

    Ok(MoveApplied { state: next, played: mv })
}

/// Resign on behalf of `resigner`. Allowed whoever is on move.
pub fn resign(state: &MatchState, resigner: i64, players: &Players) -> Result<MatchState, MoveError> {
    let side = state.side_of(resigner).ok_or(MoveError::NotAPlayer)?;
    if !state.active {
        return Err(MoveError::MatchOver);
    }

    let mut next = state.clone();
    next.outcome = Some(format!("{} wins by resignation", players.name(side.flip())));
    next.active = false;
    Ok(next)
}

/// Touching a piece of the other colour is an attempt to play their turn.
fn moves_opponent_piece(fen_str: &str, mv: CoordMove, mover: Side) -> bool {
    match fen::decode(fen_str) {
        Ok(rows) => fen::piece_at(&rows, mv.from)
            .map(|p| Side::from(p.color) != mover)
            .unwrap_or(false),
        Err(_) => false,
    }
}
