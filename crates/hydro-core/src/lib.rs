//! Droplet-based hydraulic erosion over a regular heightfield grid.
pub mod error;
pub mod grid;
pub mod hydraulic;
pub mod terrain;
pub mod vector;

pub use error::HydroError;
pub use grid::{GridShape, GridStore};
pub use hydraulic::droplet::{Droplet, Halt};
pub use hydraulic::params::DropletParams;
pub use hydraulic::spawn::{FixedSpawns, RandomSpawner, SpawnSource};
pub use hydraulic::{ErosionDriver, ErosionReport};
