//! globestream - Progressive tile streaming for a rotating globe
//!
//! This library implements the tile streaming and compositing engine behind
//! a rotating-globe visualization: tile coordinate math, prioritized and
//! bandwidth-limited fetch scheduling, and progressive composition of
//! fetched imagery into a single raster buffer that an external renderer
//! samples as a texture.
//!
//! The renderer drives the engine with the longitude currently facing the
//! camera; the engine streams high-resolution tiles into the visible
//! hemisphere first, on top of a coarse base layer loaded once at startup.
//!
//! # High-Level API
//!
//! ```ignore
//! use globestream::provider::{AsyncReqwestClient, HttpTileFetcher};
//! use globestream::{StreamConfig, StreamManager};
//!
//! let fetcher = HttpTileFetcher::new(AsyncReqwestClient::new()?);
//! let mut stream = StreamManager::new(StreamConfig::default(), fetcher)?;
//!
//! stream.load_base_layer().await;
//!
//! // Once per rendered frame:
//! stream.update(current_viewpoint_longitude);
//! if stream.buffer().is_dirty() {
//!     upload_texture(stream.buffer().raster());
//!     stream.clear_dirty();
//! }
//! ```

pub mod composite;
pub mod config;
pub mod coord;
pub mod provider;
pub mod scheduler;
pub mod stream;

pub use composite::CompositeBuffer;
pub use config::{ConfigError, StreamConfig};
pub use provider::{FetchError, MapStyle, TileFetcher};
pub use scheduler::TileLoadState;
pub use stream::{RedrawListener, StreamManager};

/// Version of the globestream library.
///
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
