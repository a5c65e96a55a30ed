//! Gesture adapters that turn raw scroll and touch input into sync triggers.
//!
//! Nothing here performs I/O. A front end feeds positions into
//! [`PullGesture`] and [`NearEndLatch`] and, when they fire, calls
//! [`ListSync::on_pull_past_threshold`](crate::ListSync::on_pull_past_threshold)
//! or [`ListSync::on_near_end`](crate::ListSync::on_near_end).

use crate::cache::CacheEntry;
use crate::sync::{SkipReason, SyncOutcome};

/// Pull distance (logical px) that triggers a refresh.
pub const DEFAULT_PULL_THRESHOLD: f64 = 60.0;

/// Pull distance used by the entry and transaction lists.
pub const LIST_PULL_THRESHOLD: f64 = 100.0;

/// Distance from the end of the list (logical px) that counts as "near the end".
pub const NEAR_END_DISTANCE: f64 = 200.0;

/// Why a refresh trigger must be dropped, if it must.
pub fn refresh_block<T>(entry: &CacheEntry<T>, input_focused: bool) -> Option<SkipReason> {
    if entry.loading {
        Some(SkipReason::InFlight)
    } else if input_focused {
        Some(SkipReason::InputFocused)
    } else {
        None
    }
}

/// Why a load-more trigger must be dropped, if it must.
pub fn load_more_block<T>(entry: &CacheEntry<T>) -> Option<SkipReason> {
    if !entry.has_more {
        Some(SkipReason::Exhausted)
    } else if entry.loading {
        Some(SkipReason::InFlight)
    } else if entry.items.is_empty() {
        Some(SkipReason::Empty)
    } else {
        None
    }
}

/// Pull-to-refresh gesture tracker.
///
/// A pull only starts while the list is scrolled to the top. Upward travel is
/// clamped to zero, and releasing reports whether the travel reached the
/// threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct PullGesture {
    threshold: f64,
    start_y: Option<f64>,
    distance: f64,
}

impl Default for PullGesture {
    fn default() -> Self {
        Self::new(DEFAULT_PULL_THRESHOLD)
    }
}

impl PullGesture {
    #[must_use]
    pub const fn new(threshold: f64) -> Self {
        Self {
            threshold,
            start_y: None,
            distance: 0.0,
        }
    }

    /// Gesture tuned for the entry and transaction lists.
    #[must_use]
    pub const fn for_list() -> Self {
        Self::new(LIST_PULL_THRESHOLD)
    }

    pub fn touch_start(&mut self, y: f64, at_top: bool) {
        self.start_y = at_top.then_some(y);
        self.distance = 0.0;
    }

    pub fn touch_move(&mut self, y: f64) {
        if let Some(start) = self.start_y {
            self.distance = (y - start).max(0.0);
        }
    }

    /// End the gesture. Returns `true` when a refresh should run.
    pub fn release(&mut self) -> bool {
        let fire = self.start_y.is_some() && self.distance >= self.threshold;
        self.start_y = None;
        self.distance = 0.0;
        fire
    }

    pub const fn is_pulling(&self) -> bool {
        self.start_y.is_some()
    }

    /// Current pull travel in logical px.
    pub const fn distance(&self) -> f64 {
        self.distance
    }

    /// Travel as a fraction of the threshold, capped at 1.
    pub fn progress(&self) -> f64 {
        if self.threshold <= 0.0 {
            return 1.0;
        }
        (self.distance / self.threshold).min(1.0)
    }
}

/// Fires once per approach to the end of a list.
///
/// After firing it stays quiet until the viewport leaves the proximity zone
/// or the list grows or shrinks. Pass the outcome of the triggered
/// `load_more` to [`settle`](Self::settle) so a dropped request does not
/// leave it disarmed. A failed request keeps it disarmed, so a network error
/// is not retried on every scroll event.
#[derive(Debug, Clone, PartialEq)]
pub struct NearEndLatch {
    distance: f64,
    armed: bool,
    fired_at_len: Option<usize>,
}

impl Default for NearEndLatch {
    fn default() -> Self {
        Self::new(NEAR_END_DISTANCE)
    }
}

impl NearEndLatch {
    #[must_use]
    pub const fn new(distance: f64) -> Self {
        Self {
            distance,
            armed: true,
            fired_at_len: None,
        }
    }

    /// Report a scroll position. `remaining` is the distance between the
    /// bottom of the viewport and the end of the list, `item_count` the
    /// number of items currently rendered. Returns `true` when a load-more
    /// should run.
    pub fn observe(&mut self, remaining: f64, item_count: usize) -> bool {
        if remaining > self.distance {
            self.armed = true;
            return false;
        }
        if self.fired_at_len.is_some_and(|len| len != item_count) {
            self.armed = true;
        }
        if !self.armed {
            return false;
        }
        self.armed = false;
        self.fired_at_len = Some(item_count);
        true
    }

    /// Re-arm when the load-more this latch fired did not run: another fetch
    /// held the slot, or a newer reload superseded it.
    pub fn settle(&mut self, outcome: &SyncOutcome) {
        if matches!(
            outcome,
            SyncOutcome::Skipped(SkipReason::InFlight) | SyncOutcome::Superseded
        ) {
            self.reset();
        }
    }

    pub fn reset(&mut self) {
        self.armed = true;
        self.fired_at_len = None;
    }
}
