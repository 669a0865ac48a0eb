//! Coordinate move notation: `<from><to>[promotion]`, e.g. `e2e4`, `e7e8q`.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use shakmaty::{uci::UciMove, Role, Square};

static COORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-h][1-8])([a-h][1-8])([qrbnQRBN])?$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid UCI move format: \"{0}\".")]
pub struct FormatError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordMove {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Role>,
}

impl CoordMove {
    /// Validate the syntactic shape only; legality is the rules oracle's call.
    pub fn parse(raw: &str) -> Result<Self, FormatError> {
        let caps = COORD_RE
            .captures(raw)
            .ok_or_else(|| FormatError(raw.to_string()))?;

        let square = |i: usize| -> Result<Square, FormatError> {
            caps[i].parse().map_err(|_| FormatError(raw.to_string()))
        };

        let promotion = match caps.get(3) {
            Some(m) => {
                let c = m.as_str().chars().next().unwrap_or('q').to_ascii_lowercase();
                Some(Role::from_char(c).ok_or_else(|| FormatError(raw.to_string()))?)
            }
            None => None,
        };

        Ok(Self {
            from: square(1)?,
            to: square(2)?,
            promotion,
        })
    }

    pub fn to_uci(self) -> UciMove {
        UciMove::Normal {
            from: self.from,
            to: self.to,
            promotion: self.promotion,
        }
    }
}

impl fmt::Display for CoordMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(role) = self.promotion {
            write!(f, "{}", role.char())?;
        }
        Ok(())
    }
}
