//! Projection of decoded rank rows into a display grid.

use std::collections::BTreeMap;

use serde::Serialize;
use shakmaty::Piece;

use crate::fen::RankRow;

const FILE_LABELS: [&str; 8] = ["A", "B", "C", "D", "E", "F", "G", "H"];

/// Piece → glyph mapping, keyed by FEN letter.
#[derive(Debug, Clone)]
pub struct GlyphTable {
    glyphs: BTreeMap<char, String>,
    blank: String,
}

impl GlyphTable {
    pub fn new(glyphs: impl IntoIterator<Item = (char, String)>, blank: impl Into<String>) -> Self {
        Self {
            glyphs: glyphs.into_iter().collect(),
            blank: blank.into(),
        }
    }

    /// HTML entities for the Unicode chess symbols, `&nbsp;` for empty squares.
    pub fn html_entities() -> Self {
        Self::new(
            "KQRBNPkqrbnp"
                .chars()
                .zip(9812..=9823)
                .map(|(c, code)| (c, format!("&#{code};"))),
            "&nbsp;",
        )
    }

    /// Literal Unicode chess symbols, a plain space for empty squares.
    pub fn unicode() -> Self {
        Self::new(
            "KQRBNPkqrbnp".chars().zip("♔♕♖♗♘♙♚♛♜♝♞♟".chars().map(String::from)),
            " ",
        )
    }

    pub fn glyph(&self, piece: Option<Piece>) -> &str {
        piece
            .and_then(|p| self.glyphs.get(&p.char()))
            .map(String::as_str)
            .unwrap_or(&self.blank)
    }
}

impl Default for GlyphTable {
    fn default() -> Self {
        Self::html_entities()
    }
}

/// One record of the display grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum BoardRow {
    Rank {
        row_number: u8,
        #[serde(flatten)]
        squares: BTreeMap<String, String>,
    },
    Labels {
        row_labels: BTreeMap<String, String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardView {
    pub rows: Vec<BoardRow>,
}

/// Build the display grid: one record per rank followed by the file-label trailer.
pub fn project(rows: &[RankRow], table: &GlyphTable) -> BoardView {
    let mut out: Vec<BoardRow> = rows
        .iter()
        .map(|row| BoardRow::Rank {
            row_number: row.rank,
            squares: row
                .cells
                .iter()
                .map(|(sq, piece)| (sq.to_string(), table.glyph(*piece).to_string()))
                .collect(),
        })
        .collect();

    out.push(BoardRow::Labels {
        row_labels: FILE_LABELS
            .iter()
            .map(|l| (l.to_string(), l.to_string()))
            .collect(),
    });

    BoardView { rows: out }
}
