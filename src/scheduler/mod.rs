//! Tile fetch scheduler
//!
//! Tracks per-slot load state for the target zoom grid, rebuilds a
//! priority-ordered pending queue on every viewpoint update, and meters
//! dispatch so the number of in-flight fetches never exceeds the configured
//! concurrency bound.
//!
//! Per-slot state machine: `NotLoaded -> Queued -> Loaded` (terminal), with
//! `Queued -> NotLoaded` on fetch failure so the slot reopens for future
//! scheduling. `Loaded` is monotonic and never reverts.

mod priority;

pub use priority::{admits, distance_y, priority, wrapped_distance_x};

use std::collections::VecDeque;

/// Load status of one tile slot in the target zoom grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TileLoadState {
    /// Not fetched and not in flight; eligible for scheduling
    #[default]
    NotLoaded,
    /// Dispatched to the fetcher, awaiting completion
    Queued,
    /// Imagery drawn into the composite buffer (terminal)
    Loaded,
}

/// Dense per-slot state table for the target zoom grid.
///
/// A flat array keyed by linear index; the grid is small and fixed, so a
/// full rescan per viewpoint update stays cheap.
pub struct SlotTable {
    tiles_per_side: u32,
    states: Vec<TileLoadState>,
    loaded: usize,
}

impl SlotTable {
    /// Creates a table with `tiles_per_side^2` slots, all `NotLoaded`.
    pub fn new(tiles_per_side: u32) -> Self {
        Self {
            tiles_per_side,
            states: vec![TileLoadState::NotLoaded; (tiles_per_side * tiles_per_side) as usize],
            loaded: 0,
        }
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        (y * self.tiles_per_side + x) as usize
    }

    /// Grid width/height in tiles.
    pub fn tiles_per_side(&self) -> u32 {
        self.tiles_per_side
    }

    /// Total slot count.
    pub fn total(&self) -> usize {
        self.states.len()
    }

    /// Number of slots in `Loaded` state.
    pub fn loaded_count(&self) -> usize {
        self.loaded
    }

    /// Current state of the slot at `(x, y)`.
    pub fn get(&self, x: u32, y: u32) -> TileLoadState {
        self.states[self.index(x, y)]
    }

    /// Transition `NotLoaded -> Queued` at dispatch time.
    ///
    /// Returns false (and leaves the slot untouched) if the slot is not
    /// currently `NotLoaded`; a slot is never dispatched twice.
    pub fn mark_queued(&mut self, x: u32, y: u32) -> bool {
        let idx = self.index(x, y);
        if self.states[idx] == TileLoadState::NotLoaded {
            self.states[idx] = TileLoadState::Queued;
            true
        } else {
            false
        }
    }

    /// Transition `Queued -> Loaded` on successful fetch and draw.
    ///
    /// `Loaded` is terminal; marking an already loaded slot is a no-op.
    pub fn mark_loaded(&mut self, x: u32, y: u32) {
        let idx = self.index(x, y);
        if self.states[idx] != TileLoadState::Loaded {
            self.states[idx] = TileLoadState::Loaded;
            self.loaded += 1;
        }
    }

    /// Transition `Queued -> NotLoaded` on fetch failure.
    ///
    /// Reopens the slot for scheduling on a later viewpoint update. Loaded
    /// slots never revert.
    pub fn reopen(&mut self, x: u32, y: u32) {
        let idx = self.index(x, y);
        if self.states[idx] == TileLoadState::Queued {
            self.states[idx] = TileLoadState::NotLoaded;
        }
    }
}

/// A pending fetch request for one tile slot.
///
/// Ephemeral: exists only while queued, consumed when dispatched.
#[derive(Debug, Clone)]
pub struct TileRequest {
    /// Tile column in the target grid
    pub x: u32,
    /// Tile row in the target grid
    pub y: u32,
    /// Fully built provider request URL
    pub url: String,
    /// Dispatch priority; lower is more urgent
    pub priority: f64,
}

/// Priority scheduler feeding the bounded-concurrency fetch pool.
///
/// Owns only the transient pending queue and the in-flight count; the slot
/// table and composite buffer stay with the stream manager.
pub struct TileScheduler {
    pending: VecDeque<TileRequest>,
    in_flight: usize,
    max_concurrent: usize,
}

impl TileScheduler {
    /// Creates a scheduler that keeps at most `max_concurrent` fetches in flight.
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            pending: VecDeque::new(),
            in_flight: 0,
            max_concurrent,
        }
    }

    /// Rebuilds the pending queue for the current viewpoint.
    ///
    /// Scans every `NotLoaded` slot, drops slots outside the admission
    /// window, computes priorities relative to `center_x` (fractional tile
    /// units), and sorts ascending. Stale entries from a previous viewpoint
    /// are superseded wholesale, never duplicated. Queued and loaded slots
    /// are skipped, so a slot is never scheduled twice.
    pub fn recompute_priorities<F>(&mut self, center_x: f64, slots: &SlotTable, mut build_url: F)
    where
        F: FnMut(u32, u32) -> String,
    {
        let n = slots.tiles_per_side();
        self.pending.clear();

        for y in 0..n {
            for x in 0..n {
                if slots.get(x, y) != TileLoadState::NotLoaded {
                    continue;
                }
                if !admits(wrapped_distance_x(x, center_x, n), n) {
                    continue;
                }
                self.pending.push_back(TileRequest {
                    x,
                    y,
                    url: build_url(x, y),
                    priority: priority(x, y, center_x, n),
                });
            }
        }

        // Stable sort keeps insertion order for equal priorities
        self.pending
            .make_contiguous()
            .sort_by(|a, b| a.priority.partial_cmp(&b.priority).unwrap_or(std::cmp::Ordering::Equal));
    }

    /// Pops as many head requests as the concurrency window allows.
    ///
    /// Each returned request has had its slot marked `Queued` and counts
    /// against the in-flight bound; the caller must dispatch it and report
    /// back via [`complete`](Self::complete).
    pub fn take_dispatchable(&mut self, slots: &mut SlotTable) -> Vec<TileRequest> {
        let mut dispatched = Vec::new();

        while self.in_flight < self.max_concurrent {
            let Some(request) = self.pending.pop_front() else {
                break;
            };
            if !slots.mark_queued(request.x, request.y) {
                // Slot advanced since the queue was built; entry is stale
                continue;
            }
            self.in_flight += 1;
            dispatched.push(request);
        }

        dispatched
    }

    /// Records a fetch completion (success or failure), freeing one slot of
    /// concurrency slack.
    pub fn complete(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    /// Number of fetches currently in flight.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Number of pending, not yet dispatched requests.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url_stub(x: u32, y: u32) -> String {
        format!("tile://{},{}", x, y)
    }

    #[test]
    fn test_slot_table_starts_not_loaded() {
        let slots = SlotTable::new(4);
        assert_eq!(slots.total(), 16);
        assert_eq!(slots.loaded_count(), 0);
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(slots.get(x, y), TileLoadState::NotLoaded);
            }
        }
    }

    #[test]
    fn test_slot_state_machine() {
        let mut slots = SlotTable::new(4);

        assert!(slots.mark_queued(1, 2));
        assert_eq!(slots.get(1, 2), TileLoadState::Queued);

        // Queued slots cannot be dispatched again
        assert!(!slots.mark_queued(1, 2));

        slots.mark_loaded(1, 2);
        assert_eq!(slots.get(1, 2), TileLoadState::Loaded);
        assert_eq!(slots.loaded_count(), 1);

        // Loaded is terminal: reopen and re-queue are no-ops
        slots.reopen(1, 2);
        assert_eq!(slots.get(1, 2), TileLoadState::Loaded);
        assert!(!slots.mark_queued(1, 2));

        // Double mark_loaded does not inflate the counter
        slots.mark_loaded(1, 2);
        assert_eq!(slots.loaded_count(), 1);
    }

    #[test]
    fn test_reopen_after_failure() {
        let mut slots = SlotTable::new(4);
        slots.mark_queued(0, 0);
        slots.reopen(0, 0);
        assert_eq!(slots.get(0, 0), TileLoadState::NotLoaded);
        // Reopened slot is schedulable again
        assert!(slots.mark_queued(0, 0));
    }

    #[test]
    fn test_recompute_orders_by_priority() {
        let mut scheduler = TileScheduler::new(64);
        let mut slots = SlotTable::new(8);

        scheduler.recompute_priorities(0.0, &slots, url_stub);

        // Head of the queue is a middle-row tile at the viewing center
        let dispatched = scheduler.take_dispatchable(&mut slots);
        assert_eq!(dispatched[0].x, 0);
        assert!(dispatched[0].y == 3 || dispatched[0].y == 4);

        // Priorities are non-decreasing along the dispatch order
        for pair in dispatched.windows(2) {
            assert!(pair[0].priority <= pair[1].priority);
        }
    }

    #[test]
    fn test_recompute_skips_non_pending_slots() {
        let mut scheduler = TileScheduler::new(64);
        let mut slots = SlotTable::new(4);
        slots.mark_queued(0, 0);
        slots.mark_queued(1, 0);
        slots.mark_loaded(1, 0);

        scheduler.recompute_priorities(0.0, &slots, url_stub);

        assert_eq!(scheduler.pending_len(), 14);
    }

    #[test]
    fn test_recompute_supersedes_previous_queue() {
        let mut scheduler = TileScheduler::new(64);
        let slots = SlotTable::new(4);

        scheduler.recompute_priorities(0.0, &slots, url_stub);
        scheduler.recompute_priorities(2.0, &slots, url_stub);

        // Rebuilt, not appended
        assert_eq!(scheduler.pending_len(), 16);
    }

    #[test]
    fn test_dispatch_respects_concurrency_bound() {
        let mut scheduler = TileScheduler::new(4);
        let mut slots = SlotTable::new(8);

        scheduler.recompute_priorities(0.0, &slots, url_stub);
        let first = scheduler.take_dispatchable(&mut slots);
        assert_eq!(first.len(), 4);
        assert_eq!(scheduler.in_flight(), 4);

        // Window is full; nothing more dispatches
        let second = scheduler.take_dispatchable(&mut slots);
        assert!(second.is_empty());

        // One completion frees exactly one slot
        scheduler.complete();
        let third = scheduler.take_dispatchable(&mut slots);
        assert_eq!(third.len(), 1);
        assert_eq!(scheduler.in_flight(), 4);
    }

    #[test]
    fn test_no_duplicate_dispatch_across_recomputes() {
        let mut scheduler = TileScheduler::new(4);
        let mut slots = SlotTable::new(4);

        scheduler.recompute_priorities(0.0, &slots, url_stub);
        let first = scheduler.take_dispatchable(&mut slots);

        // Recompute while fetches are in flight, then drain again: the
        // queued slots must not be re-dispatched.
        scheduler.recompute_priorities(0.0, &slots, url_stub);
        for _ in 0..first.len() {
            scheduler.complete();
        }
        let second = scheduler.take_dispatchable(&mut slots);

        for a in &first {
            for b in &second {
                assert!(
                    (a.x, a.y) != (b.x, b.y),
                    "slot ({}, {}) dispatched twice",
                    a.x,
                    a.y
                );
            }
        }
    }

    #[test]
    fn test_stale_entry_skipped_at_dispatch() {
        let mut scheduler = TileScheduler::new(16);
        let mut slots = SlotTable::new(2);

        scheduler.recompute_priorities(0.0, &slots, url_stub);
        // Slot advances after the queue was built
        slots.mark_queued(1, 0);
        slots.mark_loaded(1, 0);

        let dispatched = scheduler.take_dispatchable(&mut slots);
        assert_eq!(dispatched.len(), 3);
        assert!(dispatched.iter().all(|r| (r.x, r.y) != (1, 0)));
        assert_eq!(scheduler.in_flight(), 3);
    }

    #[test]
    fn test_queue_priorities_match_priority_helper() {
        let mut scheduler = TileScheduler::new(64);
        let mut slots = SlotTable::new(8);
        let center_x = 2.75;

        scheduler.recompute_priorities(center_x, &slots, url_stub);

        let dispatched = scheduler.take_dispatchable(&mut slots);
        assert_eq!(dispatched.len(), 64);
        for request in &dispatched {
            assert_eq!(request.priority, priority(request.x, request.y, center_x, 8));
        }
    }

    #[test]
    fn test_dispatch_order_ascending_across_batches() {
        let mut scheduler = TileScheduler::new(2);
        let mut slots = SlotTable::new(4);

        scheduler.recompute_priorities(1.0, &slots, url_stub);

        // Drain the whole queue two requests at a time; each batch pops from
        // the head, so priorities never decrease across batch boundaries.
        let mut last = f64::NEG_INFINITY;
        let mut total = 0;
        loop {
            let batch = scheduler.take_dispatchable(&mut slots);
            if batch.is_empty() {
                break;
            }
            for request in &batch {
                assert!(
                    request.priority >= last,
                    "priority {} dispatched after {}",
                    request.priority,
                    last
                );
                last = request.priority;
            }
            total += batch.len();
            for _ in 0..batch.len() {
                scheduler.complete();
            }
        }
        assert_eq!(total, 16);
    }

    #[test]
    fn test_queued_entries_satisfy_admission_window() {
        let mut scheduler = TileScheduler::new(256);
        let mut slots = SlotTable::new(16);

        scheduler.recompute_priorities(3.25, &slots, url_stub);

        let window = 16.0 / 2.0 + 1.0;
        for request in scheduler.take_dispatchable(&mut slots) {
            assert!(wrapped_distance_x(request.x, 3.25, 16) < window);
        }
    }
}
