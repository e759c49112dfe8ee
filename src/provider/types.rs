//! Provider types and traits

use image::RgbaImage;
use std::fmt;
use std::future::Future;

/// Errors that can occur while fetching tile imagery.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchError {
    /// HTTP request failed (network error, timeout, non-2xx status)
    Http(String),
    /// Response payload could not be decoded as an image
    Decode(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Http(msg) => write!(f, "HTTP error: {}", msg),
            FetchError::Decode(msg) => write!(f, "Image decode error: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {}

/// Map imagery style served by the static-map provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MapStyle {
    /// Satellite photography
    #[default]
    Satellite,
    /// Schematic road map
    Schematic,
}

impl MapStyle {
    /// Returns the provider's layer code for this style.
    pub fn layer_code(&self) -> &'static str {
        match self {
            MapStyle::Satellite => "sat",
            MapStyle::Schematic => "map",
        }
    }
}

/// Trait for asynchronous tile imagery fetchers.
///
/// Implementors retrieve a rectangular raster for a fully built request URL.
/// Every failure is non-fatal to the caller: a failed fetch leaves the tile
/// slot unloaded and eligible for rescheduling on a later viewpoint update.
pub trait TileFetcher: Send + Sync {
    /// Fetches and decodes the image behind `url`.
    ///
    /// # Returns
    ///
    /// The decoded RGBA raster, or an error if the request or decode failed.
    fn fetch(&self, url: &str) -> impl Future<Output = Result<RgbaImage, FetchError>> + Send;
}
