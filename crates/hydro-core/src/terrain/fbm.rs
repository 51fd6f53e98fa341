//! Fractal Perlin terrain sampled at grid cell centres.
use noise::{NoiseFn, Perlin};

/// Octave frequency ratio.
const LACUNARITY: f64 = 2.0;

/// Summed Perlin octaves laid over a grid.  Octave `i` runs at
/// `base_freq · 2^i` cycles per cell with amplitude `2^(−H·i)`.
pub struct FbmTerrain {
    perlin: Perlin,
    octaves: u32,
    persistence: f64,
    base_freq: f64,
}

impl FbmTerrain {
    /// `features` is the number of first-octave undulations across the longer
    /// grid side.
    pub fn new(seed: u32, hurst: f32, octaves: u32, features: f64, width: usize, height: usize) -> Self {
        let side = width.max(height).max(1) as f64;
        Self {
            perlin: Perlin::new(seed),
            octaves,
            persistence: LACUNARITY.powf(-(hurst as f64)),
            base_freq: features / side,
        }
    }

    /// Raw value at the centre of cell `(x, y)`, roughly within ±1.
    pub fn height_at(&self, x: usize, y: usize) -> f64 {
        // Cell centres stay off the integer lattice, where Perlin is zero.
        let (px, py) = ((x as f64 + 0.5) * self.base_freq, (y as f64 + 0.5) * self.base_freq);
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut freq = 1.0;
        for _ in 0..self.octaves {
            total += amplitude * self.perlin.get([px * freq, py * freq]);
            amplitude *= self.persistence;
            freq *= LACUNARITY;
        }
        total
    }

    /// Raw field over `width × height` cells in `x * height + y` layout.
    pub fn field(&self, width: usize, height: usize) -> Vec<f32> {
        (0..width)
            .flat_map(|x| (0..height).map(move |y| (x, y)))
            .map(|(x, y)| self.height_at(x, y) as f32)
            .collect()
    }
}
