//! Board representation and move reconciliation for the chess lobby.
//!
//! Pure code: no I/O, no logging. Legality is always delegated to a
//! [`rules::RulesOracle`].

pub mod coord_move;
pub mod fen;
pub mod match_state;
pub mod reconcile;
pub mod render;
pub mod rules;

pub use coord_move::{CoordMove, FormatError};
pub use fen::{DecodeError, RankRow};
pub use match_state::{MatchState, Players, Side, ViewerResult};
pub use reconcile::{MoveApplied, MoveError};
pub use render::{BoardView, GlyphTable};
pub use rules::{RulesOracle, ShakmatyOracle};
