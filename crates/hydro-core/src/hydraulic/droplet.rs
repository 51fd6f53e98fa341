//! Droplet state and the descent step.
//!
//! A droplet walks downhill one step per [`Droplet::descend`] call.  Each step
//! records its visit in the track field, blends its velocity with the
//! surface slope, moves a fixed distance of √2 (enough to reach any of the 8
//! neighbours), trades sediment with the cell it left, evaporates, and lets
//! the thermal cascade settle the cell it arrived on.
use std::f64::consts::SQRT_2;

use crate::grid::GridStore;
use crate::vector::{Vec2, Vec3};
use super::cascade::cascade;
use super::params::DropletParams;

/// Below this (lateral slope × friction) the surface cannot move the droplet.
const MIN_ACCELERATION: f64 = 1e-5;

/// Why a droplet stopped descending or stopped altogether.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halt {
    /// Volume fell below the minimum.
    Evaporated,
    /// Slope too gentle to accelerate the droplet.
    Flat,
    /// The step left the grid; the droplet's volume is discarded.
    OffEdge,
    /// The step landed on standing water.
    EnteredPool,
    /// Flood fill found a closed basin and absorbed the remaining volume.
    Pooled,
    /// No flood attempts left.
    SpillExhausted,
    /// Reached the configured maximum age; its sediment was dropped in place.
    Aged,
}

impl Halt {
    /// `true` for halts after which the droplet may still flood.
    pub fn can_flood(self) -> bool {
        matches!(self, Halt::Flat | Halt::EnteredPool)
    }
}

/// A transient water particle.
#[derive(Debug, Clone, PartialEq)]
pub struct Droplet {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Carrier volume, starts at 1 and only shrinks.
    pub volume: f32,
    /// Sediment concentration carried.
    pub sediment: f32,
    /// Successful descent steps.
    pub age: u32,
    /// Remaining flood attempts.
    pub spill: u32,
    /// Reason for the most recent stop, if any.
    pub halt: Option<Halt>,
}

impl Droplet {
    /// Fresh droplet resting on cell `(x, y)`.
    pub fn new(x: usize, y: usize, params: &DropletParams) -> Self {
        Self {
            position: Vec2::new(x as f64, y as f64),
            velocity: Vec2::ZERO,
            volume: 1.0,
            sediment: 0.0,
            age: 0,
            spill: params.max_spill,
            halt: None,
        }
    }

    fn stop(&mut self, reason: Halt) -> bool {
        self.halt = Some(reason);
        false
    }

    /// Take one descent step along `normal`, the surface normal at the
    /// droplet's current cell.
    ///
    /// `vegetation` — per-cell plant density in [0, 1] damping erosion;
    /// pass `&[]` for bare ground.
    ///
    /// Returns `false` when the droplet stops; [`Droplet::halt`] tells why.
    pub fn descend(
        &mut self,
        normal: Vec3,
        grid: &mut GridStore,
        vegetation: &[f32],
        params: &DropletParams,
    ) -> bool {
        if self.volume < params.min_volume {
            return self.stop(Halt::Evaporated);
        }

        let shape = grid.shape();
        let Some(here) = shape.cell_at(self.position.x, self.position.y) else {
            self.volume = 0.0;
            return self.stop(Halt::OffEdge);
        };

        if params.max_age.is_some_and(|max| self.age >= max) {
            grid.elevation_mut()[here] += self.sediment;
            self.sediment = 0.0;
            self.volume = 0.0;
            return self.stop(Halt::Aged);
        }

        grid.track_mut()[here] += self.volume;

        // Plant density is subtracted from the deposition rate, so even sparse
        // cover pins the soil.  Established streams carry water further and
        // let it keep its momentum.
        let plants = vegetation.get(here).copied().unwrap_or(0.0);
        let flow = grid.flow()[here];
        let eff_d = (params.deposition_rate - plants).max(0.0);
        let eff_f = params.friction * (1.0 - flow as f64);
        let eff_r = params.evap_rate * (1.0 - 0.2 * flow);

        let slope = normal.lateral();
        if slope.length() * eff_f < MIN_ACCELERATION {
            return self.stop(Halt::Flat);
        }

        // Surface pull and momentum can cancel exactly; treat that as flat too.
        let Some(heading) = slope.mix(self.velocity, eff_f).try_normalize() else {
            return self.stop(Halt::Flat);
        };
        self.velocity = heading * SQRT_2;
        self.position += self.velocity;

        let Some(next) = shape.cell_at(self.position.x, self.position.y) else {
            self.volume = 0.0;
            return self.stop(Halt::OffEdge);
        };

        if grid.is_submerged(next) {
            return self.stop(Halt::EnteredPool);
        }

        // Capacity follows the drop to the next cell; the imbalance is
        // settled against the cell being left.
        let elevation = grid.elevation_mut();
        let capacity = (elevation[here] - elevation[next]).max(0.0);
        let exchange = eff_d * (capacity - self.sediment);
        self.sediment += exchange;
        elevation[here] -= exchange;

        // Mass-conservative evaporation: concentration rises as water leaves.
        self.sediment /= 1.0 - eff_r;
        self.volume *= 1.0 - eff_r;

        cascade(grid, next);

        self.age += 1;
        self.halt = None;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridStore;
    use crate::hydraulic::normal::surface_normal;
    use approx::assert_abs_diff_eq;

    /// Ramp falling towards +x by `drop` per cell.
    fn make_ramp(width: usize, height: usize, drop: f32) -> GridStore {
        let mut grid = GridStore::new(width, height).unwrap();
        let shape = grid.shape();
        for x in 0..width {
            for y in 0..height {
                grid.elevation_mut()[shape.index(x, y)] = (width - x) as f32 * drop;
            }
        }
        grid
    }

    fn step(drop: &mut Droplet, grid: &mut GridStore, vegetation: &[f32]) -> bool {
        let params = DropletParams::default();
        let here = grid.shape().cell_at(drop.position.x, drop.position.y).unwrap();
        let n = surface_normal(grid, here, params.scale);
        drop.descend(n, grid, vegetation, &params)
    }

    fn step_with(drop: &mut Droplet, grid: &mut GridStore, params: &DropletParams) -> bool {
        let here = grid.shape().cell_at(drop.position.x, drop.position.y).unwrap();
        let n = surface_normal(grid, here, params.scale);
        drop.descend(n, grid, &[], params)
    }

    #[test]
    fn flat_field_halts_immediately_everywhere() {
        let params = DropletParams::default();
        let mut grid = GridStore::from_elevation(4, 3, vec![0.5; 12]).unwrap();
        for x in 0..4 {
            for y in 0..3 {
                let mut drop = Droplet::new(x, y, &params);
                assert!(!step(&mut drop, &mut grid, &[]), "({x}, {y}) should not move");
                assert_eq!(drop.halt, Some(Halt::Flat));
                assert_eq!(drop.position, Vec2::new(x as f64, y as f64));
            }
        }
        assert!(grid.elevation().iter().all(|&h| h == 0.5));
    }

    #[test]
    fn ramp_step_moves_downhill_and_erodes() {
        let params = DropletParams::default();
        let mut grid = make_ramp(8, 8, 0.05);
        let shape = grid.shape();
        let start = shape.index(2, 4);
        let h0 = grid.elevation()[start];
        let mut drop = Droplet::new(2, 4, &params);

        assert!(step(&mut drop, &mut grid, &[]));
        assert!(drop.position.x > 3.0, "droplet should move towards +x: {:?}", drop.position);
        assert_abs_diff_eq!(drop.velocity.length(), SQRT_2, epsilon = 1e-12);
        assert!(grid.elevation()[start] < h0, "start cell should be eroded");
        assert!(drop.sediment > 0.0);
        assert!(drop.volume < 1.0);
        assert_eq!(drop.age, 1);
        assert_abs_diff_eq!(grid.track()[start], 1.0);
    }

    #[test]
    fn spent_droplet_does_not_touch_the_grid() {
        let params = DropletParams::default();
        let mut grid = make_ramp(5, 5, 0.1);
        let mut drop = Droplet::new(1, 1, &params);
        drop.volume = params.min_volume * 0.5;
        assert!(!step(&mut drop, &mut grid, &[]));
        assert_eq!(drop.halt, Some(Halt::Evaporated));
        assert!(grid.track().iter().all(|&t| t == 0.0));
    }

    #[test]
    fn stepping_off_the_edge_discards_volume() {
        let params = DropletParams::default();
        let mut grid = make_ramp(5, 5, 0.1);
        let mut drop = Droplet::new(4, 2, &params);
        assert!(!step(&mut drop, &mut grid, &[]));
        assert_eq!(drop.halt, Some(Halt::OffEdge));
        assert_eq!(drop.volume, 0.0);
    }

    #[test]
    fn entering_a_pool_stops_without_erosion() {
        let params = DropletParams::default();
        let mut grid = make_ramp(6, 6, 0.05);
        let shape = grid.shape();
        for y in 0..6 {
            grid.pool_mut()[shape.index(3, y)] = 0.01;
        }
        let before = grid.elevation().to_vec();
        let mut drop = Droplet::new(2, 2, &params);
        assert!(!step(&mut drop, &mut grid, &[]));
        assert_eq!(drop.halt, Some(Halt::EnteredPool));
        assert_eq!(grid.elevation(), &before[..]);
        assert_eq!(drop.sediment, 0.0);
    }

    #[test]
    fn dense_vegetation_prevents_erosion() {
        // Gentle enough that the cascade leaves the start cell alone.
        let params = DropletParams::default();
        let mut grid = make_ramp(8, 8, 0.005);
        let shape = grid.shape();
        let start = shape.index(2, 4);
        let h0 = grid.elevation()[start];
        let plants = vec![1.0; shape.len()];
        let mut drop = Droplet::new(2, 4, &params);
        assert!(step(&mut drop, &mut grid, &plants));
        assert_eq!(grid.elevation()[start], h0);
        assert_eq!(drop.sediment, 0.0);
    }

    #[test]
    fn sparse_vegetation_reduces_erosion() {
        // 0.05 leaves 0.096 - 0.05 of the deposition rate.
        let params = DropletParams::default();
        let mut grid = make_ramp(8, 8, 0.005);
        let start = grid.shape().index(2, 4);
        let h0 = grid.elevation()[start];
        let plants = vec![0.05; grid.shape().len()];
        let mut drop = Droplet::new(2, 4, &params);
        assert!(step(&mut drop, &mut grid, &plants));
        let eroded = h0 - grid.elevation()[start];
        assert_abs_diff_eq!(eroded, (params.deposition_rate - 0.05) * 0.005, epsilon = 1e-7);
    }

    #[test]
    fn plant_density_above_deposition_rate_stops_erosion() {
        let params = DropletParams::default();
        let mut grid = make_ramp(8, 8, 0.005);
        let start = grid.shape().index(2, 4);
        let h0 = grid.elevation()[start];
        let plants = vec![0.2; grid.shape().len()];
        let mut drop = Droplet::new(2, 4, &params);
        assert!(step(&mut drop, &mut grid, &plants));
        assert_eq!(grid.elevation()[start], h0);
        assert_eq!(drop.sediment, 0.0);
    }

    #[test]
    fn stream_flow_slows_evaporation() {
        let params = DropletParams::default();
        let mut grid = make_ramp(8, 8, 0.05);
        let start = grid.shape().index(2, 4);
        grid.flow_mut()[start] = 0.5;
        let mut drop = Droplet::new(2, 4, &params);
        assert!(step(&mut drop, &mut grid, &[]));
        assert_abs_diff_eq!(drop.volume, 1.0 - 0.001 * (1.0 - 0.2 * 0.5), epsilon = 1e-6);
    }

    #[test]
    fn stream_flow_weakens_momentum() {
        // Effective friction is the weight of the previous velocity, and it
        // shrinks as flow grows: in a stream the droplet follows the slope.
        let params = DropletParams::default();
        let sideways = Vec2::new(0.0, SQRT_2);
        let mut headings = Vec::new();
        for flow in [0.0, 0.5] {
            let mut grid = make_ramp(8, 8, 0.05);
            let start = grid.shape().index(2, 2);
            grid.flow_mut()[start] = flow;
            let mut drop = Droplet::new(2, 2, &params);
            drop.velocity = sideways;
            assert!(step(&mut drop, &mut grid, &[]));
            headings.push(drop.velocity);
        }
        let (dry, wet) = (headings[0], headings[1]);
        assert!(dry.y > 0.0 && wet.y > 0.0);
        assert!(wet.y < dry.y, "flow should damp the sideways carry: {wet:?} vs {dry:?}");
        assert!(wet.x > dry.x);
    }

    #[test]
    fn aged_droplet_drops_its_sediment() {
        let params = DropletParams { max_age: Some(3), ..DropletParams::default() };
        let mut grid = make_ramp(16, 16, 0.02);
        let mut drop = Droplet::new(1, 8, &params);
        let mut steps = 0;
        while step_with(&mut drop, &mut grid, &params) {
            steps += 1;
        }
        assert_eq!(steps, 3);
        assert_eq!(drop.halt, Some(Halt::Aged));
        assert_eq!(drop.sediment, 0.0);
        assert_eq!(drop.volume, 0.0);
        assert!(!drop.halt.is_some_and(Halt::can_flood));
    }

    #[test]
    fn descent_on_a_ramp_ends_off_the_edge() {
        let params = DropletParams::default();
        let mut grid = make_ramp(16, 16, 0.02);
        let mut drop = Droplet::new(1, 8, &params);
        let mut steps = 0;
        while step(&mut drop, &mut grid, &[]) {
            steps += 1;
            assert!(steps < 64, "droplet should leave a 16-cell ramp quickly");
        }
        assert_eq!(drop.halt, Some(Halt::OffEdge));
        assert!(steps > 0);
    }
}
