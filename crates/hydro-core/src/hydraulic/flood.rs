//! Basin flooding: rising-plane flood fill with drain detection.
//!
//! Starting from the droplet's cell, a water plane is raised over the
//! 8-connected region lying at or below it (the flood set).  Cells above the
//! plane form the boundary.  Each round either spends all remaining volume
//! raising the plane, or spends just enough to reach the lowest boundary
//! cell, which then joins the region and exploration resumes from it.
//!
//! Reaching a cell below the plane means the basin overflows there (the
//! drain): standing water is trimmed to the outflow level and the droplet
//! moves on to the drain.  Exploration uses an explicit stack and a visited
//! buffer reused across calls, so cost scales with the basin explored rather
//! than with the grid.
use std::collections::BTreeMap;

use crate::grid::{GridShape, GridStore};
use crate::vector::Vec2;
use super::droplet::{Droplet, Halt};
use super::params::DropletParams;

/// Working buffers for flood fill, sized to the grid and reused between calls.
#[derive(Debug, Clone, Default)]
pub struct FloodScratch {
    visited: Vec<bool>,
    touched: Vec<usize>,
    stack: Vec<usize>,
    flood_set: Vec<usize>,
    /// Boundary cell → water-inclusive height.  Ordered so the lowest-index
    /// cell wins ties.
    boundary: BTreeMap<usize, f32>,
}

impl FloodScratch {
    pub fn new(shape: GridShape) -> Self {
        Self { visited: vec![false; shape.len()], ..Self::default() }
    }

    /// Cells covered by the most recent flood call.
    pub fn flood_set(&self) -> &[usize] {
        &self.flood_set
    }

    /// Clear only what the previous call touched.
    fn reset(&mut self, len: usize) {
        if self.visited.len() != len {
            self.visited.clear();
            self.visited.resize(len, false);
        } else {
            for &i in &self.touched {
                self.visited[i] = false;
            }
        }
        self.touched.clear();
        self.stack.clear();
        self.flood_set.clear();
        self.boundary.clear();
    }

    /// Mark `i` visited; `false` if it already was.
    fn visit(&mut self, i: usize) -> bool {
        if self.visited[i] {
            return false;
        }
        self.visited[i] = true;
        self.touched.push(i);
        true
    }

    fn lowest_boundary(&self) -> Option<(usize, f32)> {
        self.boundary
            .iter()
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map(|(&i, &h)| (i, h))
    }

    /// Move a boundary cell back to unexplored so the next round starts there.
    fn release(&mut self, i: usize) {
        self.boundary.remove(&i);
        self.visited[i] = false;
    }

    /// Grow the flood set from `seed` under `plane`.
    ///
    /// Returns the drain cell if the region is open at this level: the lowest
    /// unexplored neighbour below the plane of the first flood cell that has
    /// one.  Exploration stops there.
    fn explore(&mut self, grid: &GridStore, seed: usize, plane: f32) -> Option<usize> {
        let shape = grid.shape();
        let tol = level_tolerance(plane);

        self.stack.push(seed);
        while let Some(i) = self.stack.pop() {
            if !self.visit(i) {
                continue;
            }

            let surface = grid.surface(i);
            if surface > plane + tol {
                self.boundary.insert(i, surface);
                continue;
            }
            if surface < plane - tol {
                self.stack.clear();
                return Some(i);
            }
            self.flood_set.push(i);

            let mut drain: Option<(usize, f32)> = None;
            for n in shape.neighbors8(i) {
                if self.visited[n] {
                    continue;
                }
                let s = grid.surface(n);
                if s < plane - tol {
                    if drain.map_or(true, |(_, d)| s < d) {
                        drain = Some((n, s));
                    }
                } else {
                    self.stack.push(n);
                }
            }
            if let Some((d, _)) = drain {
                self.visit(d);
                self.stack.clear();
                return Some(d);
            }
        }
        None
    }
}

/// Slack for comparing heights against the plane.  Lake cells are written as
/// `plane - elevation`, so `elevation + pool` only matches the plane up to
/// rounding.
fn level_tolerance(plane: f32) -> f32 {
    4.0 * f32::EPSILON * plane.abs().max(1.0)
}

impl Droplet {
    /// Pool the droplet's water at its current cell.
    ///
    /// Returns `true` when the basin overflows: the droplet has been moved
    /// to the drain cell and should resume descending.  Returns `false` when
    /// the droplet is spent, out of flood attempts, or fully absorbed into a
    /// closed basin (the lake stays in the pool field).
    pub fn flood(
        &mut self,
        grid: &mut GridStore,
        scratch: &mut FloodScratch,
        params: &DropletParams,
    ) -> bool {
        if self.volume < params.min_volume {
            self.halt = Some(Halt::Evaporated);
            return false;
        }
        if self.spill == 0 {
            self.halt = Some(Halt::SpillExhausted);
            return false;
        }
        self.spill -= 1;

        let shape = grid.shape();
        let Some(start) = shape.cell_at(self.position.x, self.position.y) else {
            self.volume = 0.0;
            self.halt = Some(Halt::OffEdge);
            return false;
        };

        scratch.reset(shape.len());
        let mut plane = grid.surface(start);
        let mut seed = start;
        let mut drain = None;

        while self.volume > params.min_volume {
            if let Some(d) = scratch.explore(grid, seed, plane) {
                drain = Some(d);
                break;
            }

            let cells = scratch.flood_set.len() as f32;
            let rise = self.volume * params.volume_factor / cells;
            match scratch.lowest_boundary() {
                Some((wall, height)) if plane + rise >= height => {
                    // Fill exactly to the wall and let it join the basin.
                    let spent = (height - plane) / params.volume_factor * cells;
                    self.volume = (self.volume - spent).max(0.0);
                    plane = height;
                    scratch.release(wall);
                    seed = wall;
                }
                _ => {
                    plane += rise;
                    self.volume = 0.0;
                }
            }

            let (elevation, pool) = grid.terrain_mut();
            // Cells admitted within the level tolerance may sit a hair above
            // the plane.
            for &i in &scratch.flood_set {
                pool[i] = (plane - elevation[i]).max(0.0);
            }
        }

        let Some(drain) = drain else {
            self.halt = Some(Halt::Pooled);
            return false;
        };

        let plane = outflow_level(grid, drain, plane);
        let (elevation, pool) = grid.terrain_mut();
        for &i in scratch.flood_set.iter().chain(scratch.boundary.keys()) {
            pool[i] = (plane - elevation[i]).max(0.0);
        }

        self.sediment /= scratch.flood_set.len().max(1) as f32;
        let (x, y) = shape.coords(drain);
        self.position = Vec2::new(x as f64, y as f64);
        self.halt = None;
        true
    }
}

/// Refine the spill height at `drain`: the lowest submerged neighbour whose
/// surface is not below the drain's and is below `plane`, else `plane`.
fn outflow_level(grid: &GridStore, drain: usize, plane: f32) -> f32 {
    let floor = grid.surface(drain);
    grid.shape()
        .neighbors8(drain)
        .filter(|&n| grid.is_submerged(n))
        .map(|n| grid.surface(n))
        .filter(|&s| s >= floor && s < plane)
        .fold(plane, f32::min)
}
