//! Rules oracle: the single seam through which chess legality is decided.

use shakmaty::{fen::Fen, CastlingMode, Chess, EnPassantMode, Position};

use crate::coord_move::CoordMove;
use crate::fen;
use crate::match_state::Side;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RulesError {
    #[error("Unreadable position: {0}")]
    BadPosition(String),

    #[error("Illegal move: {0}")]
    Illegal(String),
}

/// Where the game stands after a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Ongoing,
    Checkmate { winner: Side },
    Stalemate,
    InsufficientMaterial,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    pub fen: String,
    pub status: GameStatus,
}

pub trait RulesOracle {
    fn side_to_move(&self, fen: &str) -> Result<Side, RulesError>;

    fn is_legal(&self, fen: &str, mv: CoordMove) -> Result<bool, RulesError>;

    /// Play a legal move and return the resulting position.
    fn apply(&self, fen: &str, mv: CoordMove) -> Result<Applied, RulesError>;
}

/// Standard chess rules backed by shakmaty.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShakmatyOracle;

impl ShakmatyOracle {
    fn position(fen: &str) -> Result<Chess, RulesError> {
        let parsed: Fen = fen::resolve(fen)
            .parse()
            .map_err(|e: shakmaty::fen::ParseFenError| RulesError::BadPosition(e.to_string()))?;
        parsed
            .into_position::<Chess>(CastlingMode::Standard)
            .map_err(|e| RulesError::BadPosition(e.to_string()))
    }
}

impl RulesOracle for ShakmatyOracle {
    fn side_to_move(&self, fen: &str) -> Result<Side, RulesError> {
        Ok(Self::position(fen)?.turn().into())
    }

    fn is_legal(&self, fen: &str, mv: CoordMove) -> Result<bool, RulesError> {
        let pos = Self::position(fen)?;
        Ok(mv.to_uci().to_move(&pos).is_ok())
    }

    fn apply(&self, fen: &str, mv: CoordMove) -> Result<Applied, RulesError> {
        let mut pos = Self::position(fen)?;
        let legal = mv
            .to_uci()
            .to_move(&pos)
            .map_err(|_| RulesError::Illegal(mv.to_string()))?;

        pos.play_unchecked(&legal);

        let status = if pos.is_checkmate() {
            GameStatus::Checkmate {
                winner: Side::from(pos.turn()).flip(),
            }
        } else if pos.is_stalemate() {
            GameStatus::Stalemate
        } else if pos.is_insufficient_material() {
            GameStatus::InsufficientMaterial
        } else {
            GameStatus::Ongoing
        };

        Ok(Applied {
            fen: Fen::from_position(pos, EnPassantMode::Legal).to_string(),
            status,
        })
    }
}
