//! Initial heightfields for erosion runs.
pub mod fbm;

pub use fbm::FbmTerrain;

/// First-octave undulations across the longer grid side.
const BASE_FEATURES: f64 = 4.0;

/// fBm heightfield of `width × height` cells in `x * height + y` layout,
/// normalised to [0, 1].
pub fn fbm_elevation(width: usize, height: usize, seed: u32, hurst: f32, octaves: u32) -> Vec<f32> {
    let mut data = FbmTerrain::new(seed, hurst, octaves, BASE_FEATURES, width, height).field(width, height);
    normalize(&mut data);
    data
}

/// Rescale `data` in place to span [0, 1].  A constant field becomes all zero.
pub fn normalize(data: &mut [f32]) {
    let (lo, hi) = data
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let range = hi - lo;
    if !(range > 0.0) {
        data.iter_mut().for_each(|v| *v = 0.0);
        return;
    }
    data.iter_mut().for_each(|v| *v = (*v - lo) / range);
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn elevation_spans_unit_interval() {
        let data = fbm_elevation(32, 24, 42, 0.75, 6);
        assert_eq!(data.len(), 32 * 24);
        let lo = data.iter().cloned().fold(f32::INFINITY, f32::min);
        let hi = data.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        assert_abs_diff_eq!(lo, 0.0);
        assert_abs_diff_eq!(hi, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn elevation_is_deterministic_per_seed() {
        assert_eq!(fbm_elevation(16, 16, 3, 0.75, 5), fbm_elevation(16, 16, 3, 0.75, 5));
        assert_ne!(fbm_elevation(16, 16, 3, 0.75, 5), fbm_elevation(16, 16, 4, 0.75, 5));
    }

    #[test]
    fn constant_field_normalises_to_zero() {
        let mut data = vec![3.5; 10];
        normalize(&mut data);
        assert!(data.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn normalize_maps_extremes() {
        let mut data = vec![-2.0, 0.0, 2.0];
        normalize(&mut data);
        assert_eq!(data, vec![0.0, 0.5, 1.0]);
    }
}
