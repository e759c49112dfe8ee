//! Stream configuration
//!
//! Pure settings data for the streaming engine with reference-deployment
//! defaults. All geometry is derived from here: the target grid is
//! `2^target_zoom` tiles per side and the composite buffer is
//! `tiles_per_side * tile_size` pixels square.

use crate::coord::MAX_ZOOM;
use crate::provider::MapStyle;
use std::fmt;

/// Default static-map endpoint of the reference deployment.
pub const DEFAULT_ENDPOINT: &str = "https://static-maps.yandex.ru/1.x/";

/// Streaming engine configuration.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Zoom level of the high-resolution target grid
    pub target_zoom: u8,
    /// Coarser zoom level filled once before priority streaming starts
    pub base_zoom: u8,
    /// Edge length of a composited tile in pixels
    pub tile_size: u32,
    /// Width and height of the imagery requested from the provider;
    /// the excess over `tile_size` is a branded border cropped away
    pub request_size: u32,
    /// Upper bound on concurrent target-zoom fetches
    pub max_concurrent_fetches: usize,
    /// Provider endpoint URL
    pub endpoint: String,
    /// Label locale passed to the provider
    pub locale: String,
    /// Imagery style
    pub style: MapStyle,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            target_zoom: 4,
            base_zoom: 2,
            tile_size: 256,
            request_size: 450,
            max_concurrent_fetches: 4,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            locale: "en_US".to_string(),
            style: MapStyle::Satellite,
        }
    }
}

impl StreamConfig {
    /// Validates the configuration geometry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_zoom > MAX_ZOOM {
            return Err(ConfigError::ZoomOutOfRange(self.target_zoom));
        }
        if self.base_zoom > self.target_zoom {
            return Err(ConfigError::BaseZoomAboveTarget {
                base: self.base_zoom,
                target: self.target_zoom,
            });
        }
        if self.tile_size == 0 {
            return Err(ConfigError::ZeroTileSize);
        }
        if self.request_size < self.tile_size {
            return Err(ConfigError::RequestSmallerThanTile {
                request: self.request_size,
                tile: self.tile_size,
            });
        }
        if self.max_concurrent_fetches == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        Ok(())
    }

    /// Tiles per side of the target grid (`2^target_zoom`).
    pub fn tiles_per_side(&self) -> u32 {
        1u32 << self.target_zoom
    }

    /// Tiles per side of the base grid (`2^base_zoom`).
    pub fn base_tiles_per_side(&self) -> u32 {
        1u32 << self.base_zoom
    }

    /// Edge length of the composite buffer in pixels.
    pub fn side_pixels(&self) -> u32 {
        self.tiles_per_side() * self.tile_size
    }

    /// Border width cropped from each side of fetched imagery.
    pub fn crop_offset(&self) -> u32 {
        (self.request_size - self.tile_size) / 2
    }

    /// Destination edge length for one upscaled base tile.
    pub fn base_dest_size(&self) -> u32 {
        self.tile_size << (self.target_zoom - self.base_zoom)
    }
}

/// Errors produced by configuration validation.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Target zoom exceeds the supported range
    ZoomOutOfRange(u8),
    /// Base zoom is finer than the target zoom
    BaseZoomAboveTarget { base: u8, target: u8 },
    /// Tile size must be non-zero
    ZeroTileSize,
    /// Requested imagery is smaller than the composited tile
    RequestSmallerThanTile { request: u32, tile: u32 },
    /// At least one concurrent fetch is required
    ZeroConcurrency,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZoomOutOfRange(zoom) => {
                write!(f, "Target zoom {} exceeds maximum {}", zoom, MAX_ZOOM)
            }
            ConfigError::BaseZoomAboveTarget { base, target } => {
                write!(
                    f,
                    "Base zoom {} must not exceed target zoom {}",
                    base, target
                )
            }
            ConfigError::ZeroTileSize => write!(f, "Tile size must be greater than zero"),
            ConfigError::RequestSmallerThanTile { request, tile } => {
                write!(
                    f,
                    "Request size {} is smaller than tile size {}",
                    request, tile
                )
            }
            ConfigError::ZeroConcurrency => {
                write!(f, "max_concurrent_fetches must be greater than zero")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
