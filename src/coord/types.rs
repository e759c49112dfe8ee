//! Coordinate type definitions

use std::fmt;

/// Web Mercator valid latitude range
pub const MIN_LAT: f64 = -85.05112878;
pub const MAX_LAT: f64 = 85.05112878;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Supported zoom levels
pub const MIN_ZOOM: u8 = 0;
pub const MAX_ZOOM: u8 = 18;

/// Tile coordinates in the Web Mercator / Slippy Map grid.
///
/// At zoom `z` the grid is `2^z × 2^z` tiles; `x` counts east from the
/// antimeridian, `y` counts south from the north edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    /// X coordinate (east-west), 0 at west
    pub x: u32,
    /// Y coordinate (north-south), 0 at north
    pub y: u32,
    /// Zoom level (0-18)
    pub zoom: u8,
}

impl TileCoord {
    /// Creates a tile coordinate, validating it against the grid bounds.
    ///
    /// # Arguments
    ///
    /// * `x` - Tile column, must be in `[0, 2^zoom)`
    /// * `y` - Tile row, must be in `[0, 2^zoom)`
    /// * `zoom` - Zoom level (0-18)
    pub fn new(x: u32, y: u32, zoom: u8) -> Result<Self, CoordError> {
        if zoom > MAX_ZOOM {
            return Err(CoordError::InvalidZoom(zoom));
        }
        let n = 1u32 << zoom;
        if x >= n || y >= n {
            return Err(CoordError::InvalidTileIndex { x, y, zoom });
        }
        Ok(Self { x, y, zoom })
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}) @ z{}", self.x, self.y, self.zoom)
    }
}

/// Geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoCoord {
    /// Latitude in degrees, positive north
    pub lat: f64,
    /// Longitude in degrees, positive east
    pub lon: f64,
}

/// Errors that can occur during coordinate handling.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordError {
    /// Zoom level is outside valid range (0 to 18)
    InvalidZoom(u8),
    /// Tile index is outside the grid for its zoom level
    InvalidTileIndex { x: u32, y: u32, zoom: u8 },
}

impl fmt::Display for CoordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordError::InvalidZoom(zoom) => {
                write!(
                    f,
                    "Invalid zoom level: {} (must be between {} and {})",
                    zoom, MIN_ZOOM, MAX_ZOOM
                )
            }
            CoordError::InvalidTileIndex { x, y, zoom } => {
                write!(
                    f,
                    "Tile index ({}, {}) out of range for zoom {} (grid is {}x{})",
                    x,
                    y,
                    zoom,
                    1u32 << zoom,
                    1u32 << zoom
                )
            }
        }
    }
}

impl std::error::Error for CoordError {}
