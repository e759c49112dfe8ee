//! Request URL construction for the static-map tile provider.
//!
//! The provider serves a fixed-size raster centered on a geographic
//! coordinate: `{endpoint}?ll={lon},{lat}&z={zoom}&l={layer}&size={W},{H}&lang={locale}`.
//! URL construction is deterministic; the provider's URL scheme and rate
//! limits are an external contract.

use crate::coord::GeoCoord;
use crate::provider::MapStyle;

/// Builds request URLs against a static-map imagery endpoint.
#[derive(Debug, Clone)]
pub struct RequestUrlBuilder {
    endpoint: String,
    style: MapStyle,
    request_size: u32,
    locale: String,
}

impl RequestUrlBuilder {
    /// Creates a URL builder.
    ///
    /// # Arguments
    ///
    /// * `endpoint` - Base URL of the provider (scheme://host/path)
    /// * `style` - Imagery style, selects the provider layer code
    /// * `request_size` - Requested image width and height in pixels
    /// * `locale` - Label language passed through to the provider
    pub fn new(endpoint: impl Into<String>, style: MapStyle, request_size: u32, locale: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            style,
            request_size: request_size.max(1),
            locale: locale.into(),
        }
    }

    /// Builds the request URL for an image centered on `geo` at `zoom`.
    pub fn build(&self, geo: &GeoCoord, zoom: u8) -> String {
        format!(
            "{}?ll={},{}&z={}&l={}&size={},{}&lang={}",
            self.endpoint,
            geo.lon,
            geo.lat,
            zoom,
            self.style.layer_code(),
            self.request_size,
            self.request_size,
            self.locale
        )
    }
}
