//! Grid store: elevation, flow, pool and track fields over one fixed domain.
//!
//! All fields share a single linear index, `index = x * height + y`, so a
//! column of constant `x` is contiguous.  Every neighbour lookup goes through
//! [`GridShape`]; a neighbour outside `[0, width) × [0, height)` is reported
//! as `None` and callers skip it.
use crate::error::HydroError;

/// 8-connected neighbour offsets `(dx, dy)`.
pub const D8_OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Dimensions of the simulation domain plus the index arithmetic over it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridShape {
    pub width: usize,
    pub height: usize,
}

impl GridShape {
    pub fn new(width: usize, height: usize) -> Result<Self, HydroError> {
        if width == 0 || height == 0 {
            return Err(HydroError::EmptyGrid { width, height });
        }
        Ok(Self { width, height })
    }

    /// Number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Linear index of an in-bounds cell.
    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height, "cell ({x}, {y}) outside {self:?}");
        x * self.height + y
    }

    #[inline]
    pub fn in_bounds(&self, x: isize, y: isize) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Linear index for signed coordinates, `None` outside the domain.
    #[inline]
    pub fn checked_index(&self, x: isize, y: isize) -> Option<usize> {
        if self.in_bounds(x, y) {
            Some(self.index(x as usize, y as usize))
        } else {
            None
        }
    }

    /// Inverse of [`GridShape::index`].
    #[inline]
    pub fn coords(&self, index: usize) -> (usize, usize) {
        (index / self.height, index % self.height)
    }

    /// Index of the cell displaced by `(dx, dy)` from `index`.
    #[inline]
    pub fn offset(&self, index: usize, dx: isize, dy: isize) -> Option<usize> {
        let (x, y) = self.coords(index);
        self.checked_index(x as isize + dx, y as isize + dy)
    }

    /// In-bounds 8-connected neighbours of `index`.
    pub fn neighbors8(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        D8_OFFSETS
            .iter()
            .filter_map(move |&(dx, dy)| self.offset(index, dx, dy))
    }

    /// Cell containing the continuous position `(x, y)`; `None` when the
    /// position lies outside the domain.
    pub fn cell_at(&self, x: f64, y: f64) -> Option<usize> {
        if !(x >= 0.0 && y >= 0.0) {
            return None;
        }
        let (cx, cy) = (x.floor(), y.floor());
        if cx >= self.width as f64 || cy >= self.height as f64 {
            return None;
        }
        Some(self.index(cx as usize, cy as usize))
    }
}

/// The four parallel fields mutated by an erosion run.
///
/// Fields are exposed as slices so their length can never drift from the
/// shape they were built with.
#[derive(Debug, Clone, PartialEq)]
pub struct GridStore {
    shape: GridShape,
    elevation: Vec<f32>,
    flow: Vec<f32>,
    pool: Vec<f32>,
    track: Vec<f32>,
}

impl GridStore {
    /// Flat (zero-elevation) store.
    pub fn new(width: usize, height: usize) -> Result<Self, HydroError> {
        let shape = GridShape::new(width, height)?;
        Ok(Self::with_elevation(shape, vec![0.0; shape.len()]))
    }

    /// Store seeded with an existing elevation field laid out as
    /// `x * height + y`.
    pub fn from_elevation(width: usize, height: usize, elevation: Vec<f32>) -> Result<Self, HydroError> {
        let shape = GridShape::new(width, height)?;
        if elevation.len() != shape.len() {
            return Err(HydroError::FieldLength {
                field: "elevation",
                actual: elevation.len(),
                expected: shape.len(),
                width,
                height,
            });
        }
        Ok(Self::with_elevation(shape, elevation))
    }

    fn with_elevation(shape: GridShape, elevation: Vec<f32>) -> Self {
        let n = shape.len();
        Self {
            shape,
            elevation,
            flow: vec![0.0; n],
            pool: vec![0.0; n],
            track: vec![0.0; n],
        }
    }

    #[inline]
    pub fn shape(&self) -> GridShape {
        self.shape
    }

    pub fn width(&self) -> usize {
        self.shape.width
    }

    pub fn height(&self) -> usize {
        self.shape.height
    }

    pub fn elevation(&self) -> &[f32] {
        &self.elevation
    }

    pub fn elevation_mut(&mut self) -> &mut [f32] {
        &mut self.elevation
    }

    pub fn flow(&self) -> &[f32] {
        &self.flow
    }

    pub fn flow_mut(&mut self) -> &mut [f32] {
        &mut self.flow
    }

    pub fn pool(&self) -> &[f32] {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut [f32] {
        &mut self.pool
    }

    pub fn track(&self) -> &[f32] {
        &self.track
    }

    pub fn track_mut(&mut self) -> &mut [f32] {
        &mut self.track
    }

    /// Split borrow of elevation and pool, used by the cascade and flood code
    /// which read one field while writing the other.
    pub(crate) fn terrain_mut(&mut self) -> (&mut [f32], &mut [f32]) {
        (&mut self.elevation, &mut self.pool)
    }

    pub(crate) fn flow_and_track_mut(&mut self) -> (&mut [f32], &[f32]) {
        (&mut self.flow, &self.track)
    }

    /// Water-inclusive height: elevation plus standing water.
    #[inline]
    pub fn surface(&self, index: usize) -> f32 {
        self.elevation[index] + self.pool[index]
    }

    #[inline]
    pub fn is_submerged(&self, index: usize) -> bool {
        self.pool[index] > 0.0
    }

    pub fn reset_track(&mut self) {
        self.track.iter_mut().for_each(|t| *t = 0.0);
    }

    /// Number of cells holding standing water.
    pub fn submerged_cells(&self) -> usize {
        self.pool.iter().filter(|&&p| p > 0.0).count()
    }

    pub fn total_elevation(&self) -> f64 {
        self.elevation.iter().map(|&v| v as f64).sum()
    }

    pub fn total_pool(&self) -> f64 {
        self.pool.iter().map(|&v| v as f64).sum()
    }

    pub fn max_flow(&self) -> f32 {
        self.flow.iter().cloned().fold(0.0, f32::max)
    }
}
