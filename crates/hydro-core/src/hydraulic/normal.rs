//! Surface normal of the water-inclusive height field.
//!
//! Four triangles fan around the cell, one per quadrant spanned by two
//! adjacent axis neighbours.  Each contributes the cross product of its two
//! arms, where an arm is `(dx, scale · Δsurface, dy)`.  The sum is normalised.
//!
//! Boundary policy: a quadrant that needs a neighbour outside the grid is
//! skipped entirely, so edge and corner cells are estimated from the
//! quadrants that lie inside the domain.  If no quadrant survives (a grid one
//! cell wide in both directions) the normal is straight up.
use crate::grid::GridStore;
use crate::vector::Vec3;

/// Arm pairs `(a, b)` ordered so that `a × b` points up on flat ground.
const QUADRANTS: [((isize, isize), (isize, isize)); 4] = [
    ((0, 1), (1, 0)),
    ((0, -1), (-1, 0)),
    ((1, 0), (0, -1)),
    ((-1, 0), (0, 1)),
];

/// Unit normal at `index`.  The lateral components `(x, z)` point downhill.
pub fn surface_normal(grid: &GridStore, index: usize, scale: f64) -> Vec3 {
    let shape = grid.shape();
    let here = grid.surface(index) as f64;

    let arm = |(dx, dy): (isize, isize)| -> Option<Vec3> {
        let n = shape.offset(index, dx, dy)?;
        let rise = scale * (grid.surface(n) as f64 - here);
        Some(Vec3::new(dx as f64, rise, dy as f64))
    };

    let mut sum = Vec3::ZERO;
    for &(a, b) in &QUADRANTS {
        if let (Some(a), Some(b)) = (arm(a), arm(b)) {
            sum += a.cross(b);
        }
    }
    sum.try_normalize().unwrap_or(Vec3::UP)
}
