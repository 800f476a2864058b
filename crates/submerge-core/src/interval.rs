//! Time Interval Model
//!
//! Defines the half-open time range `[from, to)` that anchors every caption
//! entry on the timeline. Ticks are integer milliseconds.
//!
//! The collision and containment predicates here use one consistent
//! convention: an interval occupies `[from, to)`, so two intervals that only
//! touch (`a.to == b.from`) do NOT collide.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Time in ticks (integer milliseconds)
pub type Tick = u64;

// =============================================================================
// Interval
// =============================================================================

/// A half-open time range `[from, to)` in ticks.
///
/// Invariant: `from <= to`. `from == to == 0` denotes "unset".
/// Equality compares both endpoints; the document sort key is `from` only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interval {
    pub from: Tick,
    pub to: Tick,
}

impl Interval {
    /// Creates a new interval, rejecting `from > to`.
    pub fn new(from: Tick, to: Tick) -> CoreResult<Self> {
        if from > to {
            return Err(CoreError::InvalidInterval { from, to });
        }
        Ok(Self { from, to })
    }

    /// Returns the "unset" interval (`[0, 0)`).
    pub fn unset() -> Self {
        Self::default()
    }

    /// Returns true if both endpoints are zero.
    pub fn is_unset(&self) -> bool {
        self.from == 0 && self.to == 0
    }

    /// Returns the spanned duration in ticks.
    pub fn duration(&self) -> Tick {
        self.to - self.from
    }

    /// Returns true if this interval holds no time at all.
    pub fn is_empty(&self) -> bool {
        self.from == self.to
    }

    /// Returns true if the two spans share at least one tick.
    pub fn collides(&self, other: &Interval) -> bool {
        self.from < other.to && other.from < self.to
    }

    /// Returns true if `other`'s span lies entirely within this span.
    pub fn contains(&self, other: &Interval) -> bool {
        other.from >= self.from && other.to <= self.to
    }

    /// Ordering by start tick only. This is the document's sort key, not a
    /// total order over intervals.
    pub fn precedes(&self, other: &Interval) -> bool {
        self.from < other.from
    }

    /// Zeroes both endpoints.
    pub fn reset(&mut self) {
        self.from = 0;
        self.to = 0;
    }

    /// Shifts both endpoints by a signed tick delta, clamping at zero on
    /// underflow. Never produces an inverted interval.
    pub fn shift(&mut self, delta: i64) {
        if delta >= 0 {
            let delta = delta as Tick;
            self.from = self.from.saturating_add(delta);
            self.to = self.to.saturating_add(delta);
        } else {
            let delta = delta.unsigned_abs();
            self.from = self.from.saturating_sub(delta);
            self.to = self.to.saturating_sub(delta);
        }
    }

    /// Returns a shifted copy of this interval.
    pub fn shifted(&self, delta: i64) -> Self {
        let mut out = *self;
        out.shift(delta);
        out
    }
}

// =============================================================================
// Tests
// =============================================================================
