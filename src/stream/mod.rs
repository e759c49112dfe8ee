//! Stream manager
//!
//! Composition root of the streaming engine. Owns the composite buffer and
//! the slot table, runs the one-time coarse base-layer fill, and on every
//! viewpoint update drains completed fetches, recomputes priorities, and
//! pumps the bounded-concurrency fetch pool.
//!
//! Concurrency model: fetches run as spawned tokio tasks, but their results
//! are delivered over a single-consumer channel and applied to the buffer
//! and slot table only inside [`StreamManager::update`], on the owner's
//! context. Completions and updates therefore never race on shared state.

use crate::composite::CompositeBuffer;
use crate::config::{ConfigError, StreamConfig};
use crate::coord::{self, TileCoord};
use crate::provider::{FetchError, RequestUrlBuilder, TileFetcher};
use crate::scheduler::{SlotTable, TileLoadState, TileScheduler};
use image::RgbaImage;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Observer notified whenever the composite buffer gains new imagery.
///
/// The renderer re-uploads the texture in response and clears the dirty
/// flag via [`StreamManager::clear_dirty`].
pub trait RedrawListener: Send + Sync {
    /// Called after each successful tile draw.
    fn on_buffer_updated(&self);
}

/// Result of one spawned fetch, delivered back to the owning manager.
struct FetchOutcome {
    x: u32,
    y: u32,
    result: Result<RgbaImage, FetchError>,
}

/// Owns the composite buffer and drives progressive tile streaming.
///
/// `update` must be called from within a tokio runtime context (it spawns
/// fetch tasks); it is cheap enough to run once per rendered frame for the
/// small fixed grids this engine targets.
pub struct StreamManager<F: TileFetcher + 'static> {
    config: StreamConfig,
    fetcher: Arc<F>,
    url_builder: RequestUrlBuilder,
    buffer: CompositeBuffer,
    slots: SlotTable,
    scheduler: TileScheduler,
    completions_tx: mpsc::UnboundedSender<FetchOutcome>,
    completions_rx: mpsc::UnboundedReceiver<FetchOutcome>,
    cancel: CancellationToken,
    listener: Option<Arc<dyn RedrawListener>>,
}

impl<F: TileFetcher + 'static> StreamManager<F> {
    /// Creates a manager with a background-filled buffer and an empty grid.
    pub fn new(config: StreamConfig, fetcher: F) -> Result<Self, ConfigError> {
        config.validate()?;

        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let url_builder = RequestUrlBuilder::new(
            config.endpoint.clone(),
            config.style,
            config.request_size,
            config.locale.clone(),
        );

        Ok(Self {
            buffer: CompositeBuffer::new(config.side_pixels()),
            slots: SlotTable::new(config.tiles_per_side()),
            scheduler: TileScheduler::new(config.max_concurrent_fetches),
            fetcher: Arc::new(fetcher),
            url_builder,
            completions_tx,
            completions_rx,
            cancel: CancellationToken::new(),
            listener: None,
            config,
        })
    }

    /// Attaches a redraw listener.
    pub fn with_listener(mut self, listener: Arc<dyn RedrawListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Read access to the composite raster for texture upload.
    pub fn buffer(&self) -> &CompositeBuffer {
        &self.buffer
    }

    /// Clears the buffer's one-shot dirty flag after a texture re-upload.
    pub fn clear_dirty(&mut self) {
        self.buffer.clear_dirty();
    }

    /// Current state of a target-grid slot.
    pub fn slot_state(&self, x: u32, y: u32) -> TileLoadState {
        self.slots.get(x, y)
    }

    /// Number of loaded target-grid slots.
    pub fn loaded_count(&self) -> usize {
        self.slots.loaded_count()
    }

    /// Total target-grid slot count.
    pub fn total_slots(&self) -> usize {
        self.slots.total()
    }

    /// Number of fetches currently in flight.
    pub fn in_flight(&self) -> usize {
        self.scheduler.in_flight()
    }

    /// Fraction of target-zoom slots loaded, in `[0, 100]`.
    ///
    /// Non-decreasing over the manager's lifetime: loaded slots never revert.
    pub fn progress(&self) -> f64 {
        self.slots.loaded_count() as f64 / self.slots.total() as f64 * 100.0
    }

    /// One-time coarse fill of the whole buffer at the base zoom level.
    ///
    /// All base tiles are fetched concurrently (the base grid is small and
    /// needs no concurrency cap) and drawn upscaled as they arrive, so the
    /// globe gains imagery progressively. Individual failures are tolerated;
    /// the background fill shows through wherever a base tile never loaded.
    pub async fn load_base_layer(&mut self) {
        if self.cancel.is_cancelled() {
            return;
        }

        let n = self.config.base_tiles_per_side();
        let zoom = self.config.base_zoom;
        debug!(base_zoom = zoom, tiles = n * n, "Loading base layer");

        let mut fetches = JoinSet::new();
        for y in 0..n {
            for x in 0..n {
                let url = self.request_url(x, y, zoom);
                let fetcher = Arc::clone(&self.fetcher);
                fetches.spawn(async move { (x, y, fetcher.fetch(&url).await) });
            }
        }

        let dest_size = self.config.base_dest_size();
        while let Some(joined) = fetches.join_next().await {
            if self.cancel.is_cancelled() {
                fetches.abort_all();
                return;
            }
            match joined {
                Ok((x, y, Ok(image))) => {
                    self.buffer.draw_tile(
                        &image,
                        x * dest_size,
                        y * dest_size,
                        dest_size,
                        self.config.crop_offset(),
                        self.config.tile_size,
                    );
                    self.notify();
                }
                Ok((x, y, Err(error))) => {
                    warn!(x, y, error = %error, "Base tile fetch failed; background fill remains");
                }
                Err(join_error) => {
                    warn!(error = %join_error, "Base tile task failed to join");
                }
            }
        }
    }

    /// Per-frame driver: applies finished fetches, recomputes priorities for
    /// the new viewpoint, and dispatches into the free concurrency slack.
    ///
    /// Safe to call at high frequency; each call rescans the small fixed
    /// grid once.
    pub fn update(&mut self, viewpoint_lon_deg: f64) {
        if self.cancel.is_cancelled() {
            return;
        }

        self.process_completions();

        let center_x = coord::center_tile_x(viewpoint_lon_deg, self.config.tiles_per_side());
        let builder = &self.url_builder;
        let zoom = self.config.target_zoom;
        self.scheduler
            .recompute_priorities(center_x, &self.slots, |x, y| {
                builder.build(&coord::tile_center(&TileCoord { x, y, zoom }), zoom)
            });

        self.pump();
    }

    /// Tears the stream down. Idempotent.
    ///
    /// In-flight fetches are not aborted mid-request, but their completions
    /// become inert: no buffer mutation, no state transition, no
    /// notification.
    pub fn destroy(&mut self) {
        if !self.cancel.is_cancelled() {
            debug!("Stream manager destroyed");
            self.cancel.cancel();
        }
    }

    /// Whether `destroy` has been called.
    pub fn is_destroyed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Drains the completion channel without blocking, applying each result
    /// to the buffer and slot table on the owner's context.
    fn process_completions(&mut self) {
        while let Ok(outcome) = self.completions_rx.try_recv() {
            self.scheduler.complete();
            match outcome.result {
                Ok(image) => {
                    let size = self.config.tile_size;
                    self.buffer.draw_tile(
                        &image,
                        outcome.x * size,
                        outcome.y * size,
                        size,
                        self.config.crop_offset(),
                        size,
                    );
                    self.slots.mark_loaded(outcome.x, outcome.y);
                    debug!(
                        x = outcome.x,
                        y = outcome.y,
                        progress = self.progress(),
                        "Tile composited"
                    );
                    self.notify();
                }
                Err(error) => {
                    warn!(
                        x = outcome.x,
                        y = outcome.y,
                        error = %error,
                        "Tile fetch failed; slot reopened for rescheduling"
                    );
                    self.slots.reopen(outcome.x, outcome.y);
                }
            }
        }
    }

    /// Dispatches queued requests into the available concurrency slack.
    fn pump(&mut self) {
        for request in self.scheduler.take_dispatchable(&mut self.slots) {
            debug!(
                x = request.x,
                y = request.y,
                priority = request.priority,
                "Dispatching tile fetch"
            );
            let fetcher = Arc::clone(&self.fetcher);
            let tx = self.completions_tx.clone();
            let cancel = self.cancel.clone();
            tokio::spawn(async move {
                let result = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return,
                    result = fetcher.fetch(&request.url) => result,
                };
                // Receiver may be gone if the manager was dropped
                let _ = tx.send(FetchOutcome {
                    x: request.x,
                    y: request.y,
                    result,
                });
            });
        }
    }

    fn request_url(&self, x: u32, y: u32, zoom: u8) -> String {
        self.url_builder
            .build(&coord::tile_center(&TileCoord { x, y, zoom }), zoom)
    }

    fn notify(&self) {
        if let Some(listener) = &self.listener {
            listener.on_buffer_updated();
        }
    }
}
