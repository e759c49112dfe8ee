//! Fetch priority and admission math.
//!
//! The globe rotates continuously and only about half its surface is ever
//! visible. Pending fetches are ordered by angular proximity to the viewing
//! center, with polar rows de-prioritized, so detail sharpens exactly where
//! the user is looking within the bounded bandwidth budget.

/// Horizontal tile distance from a fractional grid center, with wrap-around.
///
/// The grid is horizontally cyclic: column 0 neighbors column
/// `tiles_per_side - 1`.
#[inline]
pub fn wrapped_distance_x(x: u32, center_x: f64, tiles_per_side: u32) -> f64 {
    let n = tiles_per_side as f64;
    let d = (x as f64 - center_x).abs();
    d.min(n - d)
}

/// Vertical distance from the middle rows of the grid.
///
/// Rows near the poles score higher (less urgent).
#[inline]
pub fn distance_y(y: u32, tiles_per_side: u32) -> f64 {
    let middle = tiles_per_side as f64 / 2.0 - 0.5;
    (y as f64 - middle).abs()
}

/// Combined fetch priority; lower values are dispatched sooner.
///
/// Horizontal proximity to the visible hemisphere dominates; vertical
/// distance contributes at half weight.
#[inline]
pub fn priority(x: u32, y: u32, center_x: f64, tiles_per_side: u32) -> f64 {
    wrapped_distance_x(x, center_x, tiles_per_side) + 0.5 * distance_y(y, tiles_per_side)
}

/// Admission filter: whether a slot at horizontal distance `dist_x` is close
/// enough to the visible hemisphere to be scheduled at all.
///
/// Tiles on the permanently hidden far side are never fetched until rotation
/// brings them inside this window. The bound is strict (`<`, not `<=`).
#[inline]
pub fn admits(dist_x: f64, tiles_per_side: u32) -> bool {
    dist_x < tiles_per_side as f64 / 2.0 + 1.0
}
