use serde::{Deserialize, Serialize};

/// Player-visible state of a single cell, derived from the board grids.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tile {
    Hidden,
    Flagged,
    /// Opened safe cell with its neighboring-bomb hint.
    Open(u8),
    /// Opened bomb.
    Mine,
}

impl Tile {
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open(_) | Self::Mine)
    }
}

impl Default for Tile {
    fn default() -> Self {
        Self::Hidden
    }
}
