//! Where droplets start.
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::HydroError;
use crate::grid::GridShape;

/// A source of spawn cells.
pub trait SpawnSource {
    /// Next spawn cell `(x, y)`, inside `shape`.
    fn next_cell(&mut self, shape: GridShape) -> (usize, usize);
}

/// Uniformly random cells drawn from a seedable RNG.
#[derive(Debug, Clone)]
pub struct RandomSpawner<R = ChaCha8Rng> {
    rng: R,
}

impl RandomSpawner<ChaCha8Rng> {
    /// Reproducible spawner: the same seed yields the same cell sequence.
    pub fn seeded(seed: u64) -> Self {
        Self { rng: ChaCha8Rng::seed_from_u64(seed) }
    }
}

impl<R: Rng> RandomSpawner<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> SpawnSource for RandomSpawner<R> {
    fn next_cell(&mut self, shape: GridShape) -> (usize, usize) {
        let x = self.rng.gen_range(0..shape.width);
        let y = self.rng.gen_range(0..shape.height);
        (x, y)
    }
}

/// Replays a fixed list of cells, cycling when exhausted.
///
/// Built with [`FixedSpawns::new`], coordinates outside the grid are wrapped
/// modulo its dimensions, so `(5, 9)` on a 4×4 grid spawns at `(1, 1)`.  Use
/// [`FixedSpawns::within`] to have them rejected instead.
#[derive(Debug, Clone)]
pub struct FixedSpawns {
    cells: Vec<(usize, usize)>,
    next: usize,
}

impl FixedSpawns {
    /// An empty list spawns every droplet at `(0, 0)`.
    pub fn new(cells: Vec<(usize, usize)>) -> Self {
        Self { cells, next: 0 }
    }

    /// Like [`FixedSpawns::new`], but every cell must lie inside `shape`.
    pub fn within(shape: GridShape, cells: Vec<(usize, usize)>) -> Result<Self, HydroError> {
        if let Some(&(x, y)) = cells.iter().find(|&&(x, y)| x >= shape.width || y >= shape.height) {
            return Err(HydroError::SpawnOutOfBounds { x, y, width: shape.width, height: shape.height });
        }
        Ok(Self::new(cells))
    }
}

impl SpawnSource for FixedSpawns {
    fn next_cell(&mut self, shape: GridShape) -> (usize, usize) {
        let Some(&(x, y)) = self.cells.get(self.next) else {
            return (0, 0);
        };
        self.next = (self.next + 1) % self.cells.len();
        (x % shape.width, y % shape.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_cells_stay_inside_the_grid() {
        let shape = GridShape::new(7, 3).unwrap();
        let mut spawner = RandomSpawner::seeded(11);
        for _ in 0..500 {
            let (x, y) = spawner.next_cell(shape);
            assert!(x < 7 && y < 3, "({x}, {y}) outside 7x3");
        }
    }

    #[test]
    fn same_seed_same_sequence() {
        let shape = GridShape::new(64, 64).unwrap();
        let mut a = RandomSpawner::seeded(42);
        let mut b = RandomSpawner::seeded(42);
        let xs: Vec<_> = (0..32).map(|_| a.next_cell(shape)).collect();
        let ys: Vec<_> = (0..32).map(|_| b.next_cell(shape)).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn fixed_spawns_cycle_and_wrap() {
        let shape = GridShape::new(4, 4).unwrap();
        let mut spawns = FixedSpawns::new(vec![(1, 2), (5, 9)]);
        assert_eq!(spawns.next_cell(shape), (1, 2));
        assert_eq!(spawns.next_cell(shape), (1, 1));
        assert_eq!(spawns.next_cell(shape), (1, 2));
    }

    #[test]
    fn checked_fixed_spawns_reject_outside_cells() {
        let shape = GridShape::new(4, 4).unwrap();
        let err = FixedSpawns::within(shape, vec![(1, 2), (4, 0)]).unwrap_err();
        assert_eq!(err, HydroError::SpawnOutOfBounds { x: 4, y: 0, width: 4, height: 4 });
        let mut spawns = FixedSpawns::within(shape, vec![(3, 3)]).unwrap();
        assert_eq!(spawns.next_cell(shape), (3, 3));
    }

    #[test]
    fn empty_fixed_list_spawns_at_origin() {
        let shape = GridShape::new(4, 4).unwrap();
        assert_eq!(FixedSpawns::new(Vec::new()).next_cell(shape), (0, 0));
    }
}
