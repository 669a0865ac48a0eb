use serde::{Deserialize, Serialize};
use shakmaty::Color;

use crate::fen::STARTPOS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn flip(self) -> Self {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::White => "white",
            Side::Black => "black",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "white" => Some(Side::White),
            "black" => Some(Side::Black),
            _ => None,
        }
    }
}

impl From<Color> for Side {
    fn from(color: Color) -> Self {
        match color {
            Color::White => Side::White,
            Color::Black => Side::Black,
        }
    }
}

/// Snapshot of a match as the reconciler sees it.
/// The challenger plays white, the challenged player black.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchState {
    pub id: i64,
    pub white_id: i64,
    pub black_id: i64,
    pub fen: String,
    pub turn: Side,
    pub moves: i32,
    pub active: bool,
    pub outcome: Option<String>,
}

impl MatchState {
    /// A freshly accepted challenge: initial position, white to move, no moves yet.
    pub fn new_challenge(id: i64, challenger_id: i64, opponent_id: i64) -> Self {
        Self {
            id,
            white_id: challenger_id,
            black_id: opponent_id,
            fen: STARTPOS.to_string(),
            turn: Side::White,
            moves: 0,
            active: true,
            outcome: None,
        }
    }

    pub fn side_of(&self, user_id: i64) -> Option<Side> {
        if user_id == self.white_id {
            Some(Side::White)
        } else if user_id == self.black_id {
            Some(Side::Black)
        } else {
            None
        }
    }

    pub fn player_for(&self, side: Side) -> i64 {
        match side {
            Side::White => self.white_id,
            Side::Black => self.black_id,
        }
    }

    pub fn is_player_turn(&self, user_id: i64) -> bool {
        self.player_for(self.turn) == user_id
    }

    /// Pending challenge from the challenged player's point of view.
    pub fn is_pending_for(&self, user_id: i64) -> bool {
        self.active && self.moves == 0 && self.black_id == user_id
    }
}

/// Display names of both players, used to phrase outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Players {
    pub white: String,
    pub black: String,
}

impl Players {
    pub fn name(&self, side: Side) -> &str {
        match side {
            Side::White => &self.white,
            Side::Black => &self.black,
        }
    }
}

/// A finished or ongoing match as seen by one participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ViewerResult {
    Win,
    Loss,
    Tie,
    Ongoing,
}

impl ViewerResult {
    pub fn from_outcome(outcome: Option<&str>, viewer_name: &str) -> Self {
        match outcome.filter(|o| !o.is_empty()) {
            None => ViewerResult::Ongoing,
            Some(o) if o.contains("wins") => {
                if o.starts_with(&format!("{viewer_name} wins")) {
                    ViewerResult::Win
                } else {
                    ViewerResult::Loss
                }
            }
            Some(o) if o.to_lowercase().contains("draw") => ViewerResult::Tie,
            Some(_) => ViewerResult::Ongoing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_challenge() {
        let m = MatchState::new_challenge(7, 1, 2);
        assert_eq!(m.turn, Side::White);
        assert_eq!(m.moves, 0);
        assert!(m.active);
        assert!(m.is_player_turn(1));
        assert!(!m.is_player_turn(2));
        assert!(m.is_pending_for(2));
        assert!(!m.is_pending_for(1));
        assert_eq!(m.side_of(2), Some(Side::Black));
        assert_eq!(m.side_of(3), None);
    }

    #[test]
    fn test_side_roundtrip_names() {
        assert_eq!(Side::parse("white"), Some(Side::White));
        assert_eq!(Side::parse(Side::Black.as_str()), Some(Side::Black));
        assert_eq!(Side::parse("w"), None);
        assert_eq!(Side::White.flip(), Side::Black);
    }

    #[test]
    fn test_viewer_result() {
        let outcome = Some("alice wins by resignation");
        assert_eq!(ViewerResult::from_outcome(outcome, "alice"), ViewerResult::Win);
        assert_eq!(ViewerResult::from_outcome(outcome, "bob"), ViewerResult::Loss);
        // A username that is a substring of the winner's must not count as a win.
        assert_eq!(ViewerResult::from_outcome(outcome, "ali"), ViewerResult::Loss);
        assert_eq!(
            ViewerResult::from_outcome(Some("Game drawn by stalemate"), "bob"),
            ViewerResult::Tie
        );
        assert_eq!(ViewerResult::from_outcome(None, "bob"), ViewerResult::Ongoing);
        assert_eq!(ViewerResult::from_outcome(Some(""), "bob"), ViewerResult::Ongoing);
    }

    #[test]
    fn test_viewer_result_json() {
        assert_eq!(serde_json::to_value(ViewerResult::Win).unwrap(), "Win");
        assert_eq!(serde_json::to_value(ViewerResult::Loss).unwrap(), "Loss");
        assert_eq!(serde_json::to_value(ViewerResult::Tie).unwrap(), "Tie");
        assert_eq!(serde_json::to_value(ViewerResult::Ongoing).unwrap(), "Ongoing");
    }
}
