//! Thermal cascade: local 8-neighbour settling of dry cells.
//!
//! Any elevation difference between a dry cell and a dry neighbour that
//! exceeds [`MAX_DIFF`] has `SETTLING · excess / 2` moved from the higher
//! cell to the lower one.  Transfers are pairwise, so the sum over the
//! 3×3 window is conserved.  Neighbours are visited in [`D8_OFFSETS`] order
//! and each transfer sees the result of the previous one.
use crate::grid::{GridStore, D8_OFFSETS};

/// Differences up to this are left alone.
pub const MAX_DIFF: f32 = 0.01;
/// Fraction of the excess difference that settles per invocation.
pub const SETTLING: f32 = 0.1;

/// Relax the neighbourhood of `index`.  No-op when the cell is submerged.
pub fn cascade(grid: &mut GridStore, index: usize) {
    let shape = grid.shape();
    let (elevation, pool) = grid.terrain_mut();
    if pool[index] > 0.0 {
        return;
    }

    for &(dx, dy) in &D8_OFFSETS {
        let Some(n) = shape.offset(index, dx, dy) else {
            continue;
        };
        if pool[n] > 0.0 {
            continue;
        }

        let diff = elevation[index] - elevation[n];
        let excess = diff.abs() - MAX_DIFF;
        if excess <= 0.0 {
            continue;
        }

        let transfer = SETTLING * excess / 2.0;
        if diff > 0.0 {
            elevation[index] -= transfer;
            elevation[n] += transfer;
        } else {
            elevation[index] += transfer;
            elevation[n] -= transfer;
        }
    }
}
