//! Coordinate conversion module
//!
//! Provides conversions between Web Mercator tile coordinates used by
//! satellite imagery providers and the geographic coordinates their
//! static-map endpoints expect, plus the viewpoint-longitude projection
//! used to prioritize tile fetches.

mod types;

pub use types::{CoordError, GeoCoord, TileCoord, MAX_LAT, MAX_LON, MAX_ZOOM, MIN_LAT, MIN_LON, MIN_ZOOM};

use std::f64::consts::PI;

/// Returns the geographic coordinate of a tile's center.
///
/// Uses the standard Slippy Map formulas evaluated at the tile midpoint:
/// `lon = (x + 0.5) / 2^z * 360 - 180` and
/// `lat = atan(sinh(pi * (1 - 2 * (y + 0.5) / 2^z)))` in degrees.
///
/// Total for all valid tile coordinates; never errors.
#[inline]
pub fn tile_center(tile: &TileCoord) -> GeoCoord {
    let n = 2.0_f64.powi(tile.zoom as i32);

    let lon = (tile.x as f64 + 0.5) / n * 360.0 - 180.0;

    let y = (tile.y as f64 + 0.5) / n;
    let lat = (PI * (1.0 - 2.0 * y)).sinh().atan().to_degrees();

    GeoCoord { lat, lon }
}

/// Projects a viewpoint longitude onto the tile grid's X axis.
///
/// Returns a fractional tile-index in `[0, tiles_per_side)`. The grid is
/// horizontally cyclic, so any longitude (including values outside
/// `[-180, 180)`) maps into range.
#[inline]
pub fn center_tile_x(viewpoint_lon_deg: f64, tiles_per_side: u32) -> f64 {
    let n = tiles_per_side as f64;
    ((viewpoint_lon_deg + 180.0) / 360.0 * n).rem_euclid(n)
}
