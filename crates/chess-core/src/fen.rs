//! FEN position decoding for board display.
//!
//! Only the piece-placement field is decoded here; side to move, castling and
//! move counters stay opaque and are handed to the rules oracle as-is.

use shakmaty::{File, Piece, Rank, Square};

/// Sentinel stored on freshly created matches.
pub const STARTPOS: &str = "startpos";

pub const INITIAL_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("empty position")]
    Empty,

    #[error("expected 8 ranks, found {found}")]
    RankCount { found: usize },

    #[error("rank {rank} describes more than 8 squares")]
    RankOverflow { rank: u8 },

    #[error("rank {rank} describes fewer than 8 squares")]
    RankUnderflow { rank: u8 },

    #[error("unrecognized piece letter '{letter}' in rank {rank}")]
    UnknownPiece { rank: u8, letter: char },
}

/// One decoded rank, files a..h in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankRow {
    pub rank: u8,
    pub cells: Vec<(Square, Option<Piece>)>,
}

impl RankRow {
    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.cells
            .iter()
            .find(|(sq, _)| *sq == square)
            .and_then(|(_, piece)| *piece)
    }
}

/// Resolve the `startpos` sentinel to a real FEN.
pub fn resolve(fen: &str) -> &str {
    if fen.trim() == STARTPOS {
        INITIAL_FEN
    } else {
        fen
    }
}

/// Decode a FEN (or `startpos`) into 8 rank rows, rank 8 first.
pub fn decode(fen: &str) -> Result<Vec<RankRow>, DecodeError> {
    let placement = resolve(fen)
        .split_whitespace()
        .next()
        .ok_or(DecodeError::Empty)?;

    let ranks: Vec<&str> = placement.split('/').collect();
    if ranks.len() != 8 {
        return Err(DecodeError::RankCount { found: ranks.len() });
    }

    ranks
        .iter()
        .enumerate()
        .map(|(i, rank_str)| decode_rank(8 - i as u8, rank_str))
        .collect()
}

/// Decode, falling back to the initial position when the FEN is malformed.
pub fn decode_or_initial(fen: &str) -> (Vec<RankRow>, Option<DecodeError>) {
    match decode(fen) {
        Ok(rows) => (rows, None),
        Err(e) => (initial_rows(), Some(e)),
    }
}

/// Rows for the standard starting position.
pub fn initial_rows() -> Vec<RankRow> {
    match decode(INITIAL_FEN) {
        Ok(rows) => rows,
        Err(e) => unreachable!("hardcoded initial position failed to decode: {e}"),
    }
}

/// Look up a square in decoded rows.
pub fn piece_at(rows: &[RankRow], square: Square) -> Option<Piece> {
    let rank = square.rank() as u8 + 1;
    rows.iter()
        .find(|row| row.rank == rank)
        .and_then(|row| row.piece_at(square))
}

fn decode_rank(rank: u8, rank_str: &str) -> Result<RankRow, DecodeError> {
    let mut cells = Vec::with_capacity(8);

    for c in rank_str.chars() {
        if let Some(n) = c.to_digit(10) {
            if n == 0 {
                return Err(DecodeError::UnknownPiece { rank, letter: c });
            }
            if n > 8 {
                return Err(DecodeError::RankOverflow { rank });
            }
            for _ in 0..n {
                push_cell(&mut cells, rank, None)?;
            }
        } else {
            let piece = Piece::from_char(c).ok_or(DecodeError::UnknownPiece { rank, letter: c })?;
            push_cell(&mut cells, rank, Some(piece))?;
        }
    }

    if cells.len() < 8 {
        return Err(DecodeError::RankUnderflow { rank });
    }

    Ok(RankRow { rank, cells })
}

fn push_cell(
    cells: &mut Vec<(Square, Option<Piece>)>,
    rank: u8,
    piece: Option<Piece>,
) -> Result<(), DecodeError> {
    let file = cells.len() as u32;
    if file >= 8 {
        return Err(DecodeError::RankOverflow { rank });
    }
    let square = Square::from_coords(File::new(file), Rank::new(rank as u32 - 1));
    cells.push((square, piece));
    Ok(())
}
