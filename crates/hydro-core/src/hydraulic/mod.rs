//! Droplet hydraulic erosion: descent → cascade → basin flooding, driven
//! cycle by cycle over a shared [`GridStore`].
pub mod cascade;
pub mod droplet;
pub mod flood;
pub mod normal;
pub mod params;
pub mod spawn;

use serde::{Deserialize, Serialize};

use crate::error::HydroError;
use crate::grid::GridStore;
use droplet::{Droplet, Halt};
use flood::FloodScratch;
use normal::surface_normal;
use params::DropletParams;
use spawn::SpawnSource;

/// EMA rate applied to the flow field once per `erode` call.
pub const FLOW_LEARNING_RATE: f32 = 0.01;
/// Gain of the saturating transform of the track field.
pub const TRACK_GAIN: f32 = 50.0;

/// How the droplets of one or more `erode` calls ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErosionReport {
    pub cycles: u32,
    /// Descent steps summed over all droplets.
    pub steps: u64,
    pub evaporated: u32,
    pub lost_off_edge: u32,
    pub pooled: u32,
    pub spill_exhausted: u32,
    /// Culled at the maximum age.
    pub aged: u32,
    /// Floods that found a drain and sent the droplet onward.
    pub drains_followed: u32,
    /// Longest single droplet life, in descent steps.
    pub max_age: u32,
}

impl ErosionReport {
    pub fn merge(&mut self, other: &ErosionReport) {
        self.cycles += other.cycles;
        self.steps += other.steps;
        self.evaporated += other.evaporated;
        self.lost_off_edge += other.lost_off_edge;
        self.pooled += other.pooled;
        self.spill_exhausted += other.spill_exhausted;
        self.aged += other.aged;
        self.drains_followed += other.drains_followed;
        self.max_age = self.max_age.max(other.max_age);
    }

    fn record(&mut self, drop: &Droplet) {
        self.cycles += 1;
        self.steps += drop.age as u64;
        self.max_age = self.max_age.max(drop.age);
        match drop.halt {
            Some(Halt::Evaporated) => self.evaporated += 1,
            Some(Halt::OffEdge) => self.lost_off_edge += 1,
            Some(Halt::Pooled) => self.pooled += 1,
            Some(Halt::SpillExhausted) => self.spill_exhausted += 1,
            Some(Halt::Aged) => self.aged += 1,
            // Always followed by a flood, never final.
            Some(Halt::Flat | Halt::EnteredPool) | None => {}
        }
    }
}

// ── Driver ────────────────────────────────────────────────────────────────────

/// Runs droplets one after another and refreshes the flow field.
#[derive(Debug, Clone)]
pub struct ErosionDriver {
    params: DropletParams,
    scratch: FloodScratch,
}

impl ErosionDriver {
    pub fn new(params: DropletParams) -> Result<Self, HydroError> {
        params.validate()?;
        Ok(Self { params, scratch: FloodScratch::default() })
    }

    pub fn params(&self) -> &DropletParams {
        &self.params
    }

    /// Spawn `cycles` droplets from `spawner`, run each to termination, then
    /// fold the visit track into the flow field and evaporate lake surfaces.
    ///
    /// `vegetation` — per-cell plant density in [0, 1]; pass `&[]` for bare
    /// ground.
    pub fn erode<S: SpawnSource + ?Sized>(
        &mut self,
        grid: &mut GridStore,
        vegetation: &[f32],
        spawner: &mut S,
        cycles: u32,
    ) -> Result<ErosionReport, HydroError> {
        let shape = grid.shape();
        if !vegetation.is_empty() && vegetation.len() != shape.len() {
            return Err(HydroError::FieldLength {
                field: "vegetation",
                actual: vegetation.len(),
                expected: shape.len(),
                width: shape.width,
                height: shape.height,
            });
        }
        let outside = vegetation.iter().filter(|v| !(0.0..=1.0).contains(*v)).count();
        if outside > 0 {
            log::warn!("{outside} vegetation values lie outside [0, 1]");
        }

        grid.reset_track();
        let mut report = ErosionReport::default();

        for cycle in 0..cycles {
            let (x, y) = spawner.next_cell(shape);
            let mut drop = Droplet::new(x, y, &self.params);
            self.run(&mut drop, grid, vegetation, &mut report);
            report.record(&drop);
            log::trace!(
                "droplet {cycle} from ({x}, {y}): {:?} after {} steps",
                drop.halt,
                drop.age
            );
        }

        update_flow(grid);
        evaporate_pools(grid, self.params.pool_evaporation);
        log::debug!(
            "erode: {} droplets, {} steps, {} evaporated, {} off edge, {} pooled, {} out of spills, {} aged, {} drains, max flow {:.3}",
            report.cycles,
            report.steps,
            report.evaporated,
            report.lost_off_edge,
            report.pooled,
            report.spill_exhausted,
            report.aged,
            report.drains_followed,
            grid.max_flow()
        );
        Ok(report)
    }

    /// Alternate descent and flooding until the droplet is done.
    fn run(&mut self, drop: &mut Droplet, grid: &mut GridStore, vegetation: &[f32], report: &mut ErosionReport) {
        let shape = grid.shape();
        loop {
            while let Some(here) = shape.cell_at(drop.position.x, drop.position.y) {
                let normal = surface_normal(grid, here, self.params.scale);
                if !drop.descend(normal, grid, vegetation, &self.params) {
                    break;
                }
            }
            if !drop.halt.is_some_and(Halt::can_flood) {
                return;
            }
            if !drop.flood(grid, &mut self.scratch, &self.params) {
                return;
            }
            report.drains_followed += 1;
        }
    }
}

// ── Flow field ────────────────────────────────────────────────────────────────

/// Saturating transform of a visit count: `g·t / (1 + g·t)`, strictly
/// increasing on `t ≥ 0` and below 1.
#[inline]
pub fn saturate(track: f32) -> f32 {
    let t = TRACK_GAIN * track;
    t / (1.0 + t)
}

/// Blend the saturated track into the flow field.
pub fn update_flow(grid: &mut GridStore) {
    let (flow, track) = grid.flow_and_track_mut();
    for (f, &t) in flow.iter_mut().zip(track) {
        *f = (1.0 - FLOW_LEARNING_RATE) * *f + FLOW_LEARNING_RATE * saturate(t);
    }
}

/// Lower every lake surface by `rate`, never below dry ground.
pub fn evaporate_pools(grid: &mut GridStore, rate: f32) {
    if rate <= 0.0 {
        return;
    }
    grid.pool_mut().iter_mut().for_each(|p| *p = (*p - rate).max(0.0));
}
