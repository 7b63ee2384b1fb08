//! Board engine for a single-player minesweeper game.
//!
//! [`Game`] owns the grids and performs every state transition; the
//! [`GameEvents`] registry pushes the results to whoever subscribed. Nothing
//! in this crate draws or reads input — front ends consume the notifications.

use std::ops::BitOr;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

pub use engine::*;
pub use error::*;
pub use events::*;
pub use generator::*;
pub use tile::*;
pub use types::*;

mod engine;
mod error;
mod events;
mod generator;
mod ticker;
mod tile;
mod types;

/// Board dimensions and bomb count, validated at construction.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    width: Coord,
    height: Coord,
    mines: CellCount,
}

impl GameConfig {
    /// Fails with [`GameError::InvalidConfig`] on a zero dimension or when
    /// `mines >= width * height`; bomb placement relies on at least one free
    /// cell remaining.
    pub fn new(width: Coord, height: Coord, mines: CellCount) -> Result<Self> {
        if width == 0 || height == 0 || mines >= cell_product(width, height) {
            return Err(GameError::InvalidConfig);
        }
        Ok(Self {
            width,
            height,
            mines,
        })
    }

    pub(crate) const fn new_unchecked(width: Coord, height: Coord, mines: CellCount) -> Self {
        Self {
            width,
            height,
            mines,
        }
    }

    pub const fn width(&self) -> Coord {
        self.width
    }

    pub const fn height(&self) -> Coord {
        self.height
    }

    pub const fn mines(&self) -> CellCount {
        self.mines
    }

    pub const fn size(&self) -> Coord2 {
        (self.width, self.height)
    }

    pub const fn total_cells(&self) -> CellCount {
        cell_product(self.width, self.height)
    }
}

/// Fixed bomb layout. Placed once at construction, never relocated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Minefield {
    mask: Array2<bool>,
    count: CellCount,
}

impl Minefield {
    pub fn from_mask(mask: Array2<bool>) -> Self {
        let count = mask.iter().filter(|&&mine| mine).count() as CellCount;
        Self { mask, count }
    }

    pub fn from_mine_coords(size: Coord2, mines: &[Coord2]) -> Result<Self> {
        let mut mask: Array2<bool> = Array2::default(size.grid());
        for &coords in mines {
            if coords.0 >= size.0 || coords.1 >= size.1 {
                return Err(GameError::InvalidCoords);
            }
            mask[coords.grid()] = true;
        }
        Ok(Self::from_mask(mask))
    }

    pub fn config(&self) -> GameConfig {
        let (width, height) = self.size();
        GameConfig::new_unchecked(width, height, self.count)
    }

    pub fn size(&self) -> Coord2 {
        let (width, height) = self.mask.dim();
        (width as Coord, height as Coord)
    }

    pub fn mine_count(&self) -> CellCount {
        self.count
    }

    pub fn total_cells(&self) -> CellCount {
        self.mask.len() as CellCount
    }

    pub fn safe_cells(&self) -> CellCount {
        self.total_cells() - self.count
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        let (width, height) = self.size();
        if coords.0 < width && coords.1 < height {
            Ok(coords)
        } else {
            Err(GameError::InvalidCoords)
        }
    }

    pub fn is_mine(&self, coords: Coord2) -> bool {
        self.mask[coords.grid()]
    }

    /// Bombs in the clamped 8-neighborhood of `coords`.
    pub fn adjacent_mines(&self, coords: Coord2) -> u8 {
        neighbors(coords, self.size())
            .filter(|&pos| self.is_mine(pos))
            .count() as u8
    }

    /// Mine coordinates in board scan order.
    pub fn iter_mines(&self) -> impl Iterator<Item = Coord2> + '_ {
        self.mask
            .indexed_iter()
            .filter(|&(_, &mine)| mine)
            .map(|((x, y), _)| (x as Coord, y as Coord))
    }

    pub(crate) fn mask(&self) -> &Array2<bool> {
        &self.mask
    }
}

/// Result of a flag toggle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FlagOutcome {
    NoChange,
    Changed,
}

impl FlagOutcome {
    pub const fn has_update(self) -> bool {
        matches!(self, Self::Changed)
    }
}

/// Result of opening one or more cells.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OpenOutcome {
    NoChange,
    Opened,
    Exploded,
    Won,
}

impl OpenOutcome {
    pub const fn has_update(self) -> bool {
        !matches!(self, Self::NoChange)
    }
}

/// Merge for multi-cell opens: an explosion outranks a win outranks a plain
/// open.
impl BitOr for OpenOutcome {
    type Output = OpenOutcome;

    fn bitor(self, rhs: Self) -> Self::Output {
        use OpenOutcome::*;
        match (self, rhs) {
            (Exploded, _) | (_, Exploded) => Exploded,
            (Won, _) | (_, Won) => Won,
            (Opened, _) | (_, Opened) => Opened,
            (NoChange, NoChange) => NoChange,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_rejects_zero_dimensions() {
        assert_eq!(GameConfig::new(0, 5, 1), Err(GameError::InvalidConfig));
        assert_eq!(GameConfig::new(5, 0, 1), Err(GameError::InvalidConfig));
    }

    #[test]
    fn config_rejects_mine_count_at_or_above_cell_count() {
        assert_eq!(GameConfig::new(3, 3, 9), Err(GameError::InvalidConfig));
        assert_eq!(GameConfig::new(3, 3, 200), Err(GameError::InvalidConfig));
        assert!(GameConfig::new(3, 3, 8).is_ok());
        assert!(GameConfig::new(1, 1, 0).is_ok());
    }

    #[test]
    fn minefield_counts_and_validates() {
        let field = Minefield::from_mine_coords((4, 3), &[(0, 0), (3, 2)]).unwrap();
        assert_eq!(field.size(), (4, 3));
        assert_eq!(field.mine_count(), 2);
        assert_eq!(field.safe_cells(), 10);
        assert!(field.is_mine((0, 0)));
        assert!(!field.is_mine((1, 1)));
        assert_eq!(field.validate_coords((3, 2)), Ok((3, 2)));
        assert_eq!(field.validate_coords((4, 0)), Err(GameError::InvalidCoords));
        assert_eq!(field.validate_coords((0, 3)), Err(GameError::InvalidCoords));
    }

    #[test]
    fn minefield_rejects_out_of_range_mines() {
        assert_eq!(
            Minefield::from_mine_coords((2, 2), &[(2, 0)]),
            Err(GameError::InvalidCoords)
        );
    }

    #[test]
    fn adjacent_mines_uses_clamped_neighborhood() {
        let field = Minefield::from_mine_coords((3, 3), &[(1, 1)]).unwrap();
        assert_eq!(field.adjacent_mines((0, 0)), 1);
        assert_eq!(field.adjacent_mines((2, 2)), 1);
        // the center itself does not count its own mine
        assert_eq!(field.adjacent_mines((1, 1)), 0);
    }

    #[test]
    fn iter_mines_lists_every_mine() {
        let field = Minefield::from_mine_coords((3, 2), &[(2, 1), (0, 0)]).unwrap();
        let mines: Vec<_> = field.iter_mines().collect();
        assert_eq!(mines, vec![(0, 0), (2, 1)]);
    }

    #[test]
    fn open_outcome_merge_priorities() {
        use OpenOutcome::*;
        assert_eq!(NoChange | Opened, Opened);
        assert_eq!(Opened | Won, Won);
        assert_eq!(Won | Exploded, Exploded);
        assert_eq!(Exploded | Won, Exploded);
        assert_eq!(NoChange | NoChange, NoChange);
    }

    #[test]
    fn minefield_serde_round_trip() {
        let field = Minefield::from_mine_coords((5, 4), &[(1, 2), (4, 0)]).unwrap();
        let json = serde_json::to_string(&field).unwrap();
        let back: Minefield = serde_json::from_str(&json).unwrap();
        assert_eq!(back, field);
    }
}
