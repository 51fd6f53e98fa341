use thiserror::Error;

/// Errors raised while setting up grids or validating inputs to an erosion run.
/// The simulation itself never fails; droplets terminate through their
/// boolean continuation results instead.
#[derive(Debug, Error, PartialEq)]
pub enum HydroError {
    #[error("grid dimensions must be non-zero, got {width}x{height}")]
    EmptyGrid { width: usize, height: usize },

    #[error("{field} has {actual} cells, expected {expected} ({width}x{height})")]
    FieldLength {
        field: &'static str,
        actual: usize,
        expected: usize,
        width: usize,
        height: usize,
    },

    #[error("spawn cell ({x}, {y}) lies outside the {width}x{height} grid")]
    SpawnOutOfBounds { x: usize, y: usize, width: usize, height: usize },

    #[error("parameter `{name}` = {value} is out of range: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },
}
