use serde::{Deserialize, Serialize};

use crate::error::HydroError;

/// Physical constants of a single droplet and of the surface it reads.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DropletParams {
    /// Fraction of volume lost per descent step on dry, streamless ground.
    /// Must be positive: evaporation is what bounds a droplet's lifetime.
    pub evap_rate: f32,
    /// Fraction of the sediment imbalance settled per step on bare ground.
    pub deposition_rate: f32,
    /// Droplets below this volume are spent.
    pub min_volume: f32,
    /// Inertia of the droplet velocity, 0 = follow the surface, 1 = ignore it.
    pub friction: f64,
    /// Water height produced by one unit of volume spread over one cell.
    pub volume_factor: f32,
    /// Flood attempts granted to each droplet.
    pub max_spill: u32,
    /// Multiplier applied to height differences when estimating normals.
    pub scale: f64,
    /// Descent steps after which a droplet is culled, dropping its sediment
    /// where it stands.  `None` leaves lifetime bounded by evaporation only.
    pub max_age: Option<u32>,
    /// Water height lost by every lake cell at the end of each `erode` call.
    /// Zero keeps lakes permanent.
    pub pool_evaporation: f32,
}

impl Default for DropletParams {
    fn default() -> Self {
        Self {
            evap_rate: 0.001,
            deposition_rate: 1.2 * 0.08,
            min_volume: 0.01,
            friction: 0.25,
            volume_factor: 0.5,
            max_spill: 5,
            scale: 80.0,
            max_age: None,
            pool_evaporation: 0.0,
        }
    }
}

impl DropletParams {
    /// Reject parameter sets that would make the droplet model diverge.
    pub fn validate(&self) -> Result<(), HydroError> {
        positive("evap_rate", self.evap_rate as f64)?;
        unit_interval("evap_rate", self.evap_rate as f64, false)?;
        unit_interval("deposition_rate", self.deposition_rate as f64, true)?;
        unit_interval("friction", self.friction, true)?;
        positive("min_volume", self.min_volume as f64)?;
        positive("volume_factor", self.volume_factor as f64)?;
        positive("scale", self.scale)?;
        if let Some(age) = self.max_age {
            positive("max_age", age as f64)?;
        }
        if !(self.pool_evaporation.is_finite() && self.pool_evaporation >= 0.0) {
            return Err(HydroError::InvalidParameter {
                name: "pool_evaporation",
                value: self.pool_evaporation as f64,
                reason: "must be finite and >= 0",
            });
        }
        Ok(())
    }
}

fn unit_interval(name: &'static str, value: f64, closed: bool) -> Result<(), HydroError> {
    let ok = value.is_finite() && value >= 0.0 && if closed { value <= 1.0 } else { value < 1.0 };
    if ok {
        Ok(())
    } else {
        Err(HydroError::InvalidParameter {
            name,
            value,
            reason: if closed { "must lie in [0, 1]" } else { "must lie in [0, 1)" },
        })
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), HydroError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(HydroError::InvalidParameter { name, value, reason: "must be finite and > 0" })
    }
}
