use ndarray::Array2;
use rand::prelude::*;

use crate::*;

/// Strategy for laying out bombs for a fresh game.
pub trait MinefieldGenerator {
    fn generate(self, config: GameConfig) -> Minefield;
}

/// Uniform placement by rejection sampling: pick a random cell, retry on
/// collision, until the requested count is placed. Termination relies on
/// [`GameConfig`] guaranteeing at least one free cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RandomGenerator {
    seed: u64,
}

impl RandomGenerator {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn from_entropy() -> Self {
        Self::new(rand::rng().random())
    }
}

impl MinefieldGenerator for RandomGenerator {
    fn generate(self, config: GameConfig) -> Minefield {
        let mut rng = SmallRng::seed_from_u64(self.seed);
        let mut mask: Array2<bool> = Array2::default(config.size().grid());

        let mut placed: CellCount = 0;
        while placed < config.mines() {
            let coords: Coord2 = (
                rng.random_range(0..config.width()),
                rng.random_range(0..config.height()),
            );
            let cell = &mut mask[coords.grid()];
            if !*cell {
                *cell = true;
                placed += 1;
            }
        }

        log::debug!(
            "placed {} bombs on a {}x{} board",
            placed,
            config.width(),
            config.height()
        );
        Minefield::from_mask(mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(width: Coord, height: Coord, mines: CellCount) -> GameConfig {
        GameConfig::new(width, height, mines).unwrap()
    }

    #[test]
    fn places_exactly_the_requested_count() {
        for mines in [0, 1, 10, 80] {
            let field = RandomGenerator::new(7).generate(config(9, 9, mines));
            assert_eq!(field.mine_count(), mines);
        }
    }

    #[test]
    fn same_seed_reproduces_the_layout() {
        let cfg = config(16, 16, 40);
        let first = RandomGenerator::new(42).generate(cfg);
        let second = RandomGenerator::new(42).generate(cfg);
        assert_eq!(first, second);
    }

    #[test]
    fn different_seeds_differ() {
        let cfg = config(16, 16, 40);
        let first = RandomGenerator::new(1).generate(cfg);
        let second = RandomGenerator::new(2).generate(cfg);
        assert_ne!(first, second);
    }

    #[test]
    fn handles_a_nearly_full_board() {
        let field = RandomGenerator::new(3).generate(config(4, 4, 15));
        assert_eq!(field.mine_count(), 15);
        assert_eq!(field.safe_cells(), 1);
    }
}
