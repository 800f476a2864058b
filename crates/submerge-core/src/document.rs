//! Caption Document and Timeline Merge Engine
//!
//! A document is an ordered, duplicate-free collection of caption entries
//! with a maintained invariant: after every successful insert, no two
//! entries collide and the entries stay sorted by start tick.
//!
//! The invariant is enforced by the merge engine, not by the container.
//! Entries live in a sorted `Vec` with binary-search lookup; inserting an
//! entry that overlaps existing ones splits, merges, or discards text as
//! dictated by the merge policy. Cascading overlaps are resolved with an
//! explicit worklist so stack depth stays bounded no matter how many
//! captions collide.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::interval::{Interval, Tick};
use crate::policy::{merge_styled_text, MergePolicy, StyleTransform};
use crate::text::StyledText;

// =============================================================================
// Caption Entry
// =============================================================================

/// One timed styled-text record in a document.
///
/// Ordered by `timestamps.from` in the document's backing store; two
/// entries with equal timestamps and equal content are semantically
/// identical.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionEntry {
    /// Styled caption text
    pub content: StyledText,
    /// Time span this caption is visible, in ticks
    pub timestamps: Interval,
}

impl CaptionEntry {
    pub fn new(content: StyledText, timestamps: Interval) -> Self {
        Self {
            content,
            timestamps,
        }
    }
}

// =============================================================================
// Document
// =============================================================================

/// An ordered set of caption entries keyed by start tick.
///
/// Use [`insert`](Self::insert) instead of building the entry list by hand;
/// it is what keeps the no-collision invariant alive.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    entries: Vec<CaptionEntry>,
}

impl Document {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a document by inserting every entry through the merge engine.
    /// Entries may arrive in any order; the engine sorts and reconciles.
    pub fn from_entries(
        entries: impl IntoIterator<Item = CaptionEntry>,
        policy: &MergePolicy,
    ) -> Self {
        let mut doc = Self::new();
        for entry in entries {
            doc.insert(entry, policy);
        }
        doc
    }

    /// Returns the entries, ascending by start tick.
    pub fn entries(&self) -> &[CaptionEntry] {
        &self.entries
    }

    /// Iterates the entries in timeline order.
    pub fn iter(&self) -> impl Iterator<Item = &CaptionEntry> {
        self.entries.iter()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the document holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // -------------------------------------------------------------------------
    // Timeline Merge Engine
    // -------------------------------------------------------------------------

    /// Inserts a caption entry, reconciling any overlap with existing
    /// entries per the merge policy.
    ///
    /// Overlapping regions carry merged text, non-overlapping remainders of
    /// the wider caption survive as split fragments, and exact duplicates
    /// are suppressed. Re-inserting an already-integrated entry is a no-op,
    /// so insertion is idempotent under retry.
    pub fn insert(&mut self, entry: CaptionEntry, policy: &MergePolicy) {
        let mut worklist = VecDeque::new();
        worklist.push_back(entry);
        while let Some(pending) = worklist.pop_front() {
            self.insert_step(pending, policy, &mut worklist);
        }
    }

    /// One state-machine step of the merge engine. Terminal cases mutate
    /// the entry list directly; split fragments go back on the worklist and
    /// resolve against the still-unprocessed remainder on a later step.
    fn insert_step(
        &mut self,
        v: CaptionEntry,
        policy: &MergePolicy,
        worklist: &mut VecDeque<CaptionEntry>,
    ) {
        let Some(idx) = self.colliding_index(&v.timestamps) else {
            // No collision: plain sorted insert.
            let at = self.lower_bound(v.timestamps.from);
            self.entries.insert(at, v);
            return;
        };

        let collided = &self.entries[idx];

        // Exact duplicate: suppressed.
        if collided.timestamps == v.timestamps && collided.content == v.content {
            debug!(
                from = v.timestamps.from,
                to = v.timestamps.to,
                "insert: duplicate entry suppressed"
            );
            return;
        }

        // Same interval, different content: merge in place.
        if collided.timestamps == v.timestamps {
            let merged = merge_styled_text(&collided.content, &v.content, policy);
            self.entries[idx].content = merged;
            return;
        }

        // Containment, either way around.
        let collided_in_v = v.timestamps.contains(&collided.timestamps);
        let v_in_collided = collided.timestamps.contains(&v.timestamps);
        if collided_in_v || v_in_collided {
            // Identical text over nested spans is a re-merge leftover;
            // dropping the incoming entry keeps the operation idempotent.
            if collided.content.content() == v.content.content() {
                debug!(
                    from = v.timestamps.from,
                    to = v.timestamps.to,
                    "insert: redundant contained entry dropped"
                );
                return;
            }

            let existing = self.entries.remove(idx);
            let (outer_content, outer, inner) = if collided_in_v {
                (&v.content, v.timestamps, existing.timestamps)
            } else {
                (&existing.content, existing.timestamps, v.timestamps)
            };
            let merged = merge_styled_text(&existing.content, &v.content, policy);

            if outer.from != inner.from {
                worklist.push_back(CaptionEntry::new(
                    outer_content.clone(),
                    Interval {
                        from: outer.from,
                        to: inner.from,
                    },
                ));
            }
            worklist.push_back(CaptionEntry::new(merged, inner));
            if inner.to != outer.to {
                worklist.push_back(CaptionEntry::new(
                    outer_content.clone(),
                    Interval {
                        from: inner.to,
                        to: outer.to,
                    },
                ));
            }
            return;
        }

        // Partial overlap with exactly one entry.
        let run_end = self.collision_run_end(idx, &v.timestamps);
        if run_end == idx {
            let existing = self.entries.remove(idx);
            let merged = merge_styled_text(&existing.content, &v.content, policy);
            let (first, second) = if v.timestamps.precedes(&existing.timestamps) {
                (&v, &existing)
            } else {
                (&existing, &v)
            };

            if first.timestamps.from != second.timestamps.from {
                worklist.push_back(CaptionEntry::new(
                    first.content.clone(),
                    Interval {
                        from: first.timestamps.from,
                        to: second.timestamps.from,
                    },
                ));
            }
            worklist.push_back(CaptionEntry::new(
                merged,
                Interval {
                    from: second.timestamps.from,
                    to: first.timestamps.to,
                },
            ));
            if first.timestamps.to != second.timestamps.to {
                worklist.push_back(CaptionEntry::new(
                    second.content.clone(),
                    Interval {
                        from: first.timestamps.to,
                        to: second.timestamps.to,
                    },
                ));
            }
            return;
        }

        // Collision with two or more entries: carve the incoming entry
        // against the whole colliding run and requeue the fragments. Each
        // fragment overlaps at most one existing entry, so it resolves
        // through the terminal cases above on a later step.
        debug!(
            from = v.timestamps.from,
            to = v.timestamps.to,
            run = run_end - idx + 1,
            "insert: carving against colliding run"
        );

        let first_from = self.entries[idx].timestamps.from;
        if v.timestamps.from < first_from {
            worklist.push_back(CaptionEntry::new(
                v.content.clone(),
                Interval {
                    from: v.timestamps.from,
                    to: first_from,
                },
            ));
        }
        for i in idx..=run_end {
            let lower = v.timestamps.from.max(self.entries[i].timestamps.from);
            let upper = if i < run_end {
                v.timestamps.to.min(self.entries[i + 1].timestamps.from)
            } else {
                v.timestamps.to.min(self.entries[i].timestamps.to)
            };
            if lower < upper {
                worklist.push_back(CaptionEntry::new(
                    v.content.clone(),
                    Interval {
                        from: lower,
                        to: upper,
                    },
                ));
            }
        }
        let last_to = self.entries[run_end].timestamps.to;
        if v.timestamps.to > last_to {
            worklist.push_back(CaptionEntry::new(
                v.content.clone(),
                Interval {
                    from: last_to,
                    to: v.timestamps.to,
                },
            ));
        }
    }

    /// Index of the first entry whose start tick is not below `from`.
    fn lower_bound(&self, from: Tick) -> usize {
        self.entries.partition_point(|e| e.timestamps.from < from)
    }

    /// Finds the colliding entry nearest the probe's start, if any.
    ///
    /// The lower bound and its immediate predecessor both have to be
    /// checked: collision is not captured by the start-tick key alone.
    fn colliding_index(&self, probe: &Interval) -> Option<usize> {
        let idx = self.lower_bound(probe.from);
        if idx > 0 && self.entries[idx - 1].timestamps.collides(probe) {
            return Some(idx - 1);
        }
        if idx < self.entries.len() && self.entries[idx].timestamps.collides(probe) {
            return Some(idx);
        }
        None
    }

    /// Last index of the contiguous run of entries colliding with `probe`,
    /// starting at `idx`.
    fn collision_run_end(&self, idx: usize, probe: &Interval) -> usize {
        let mut end = idx;
        while end + 1 < self.entries.len() && self.entries[end + 1].timestamps.collides(probe) {
            end += 1;
        }
        end
    }

    // -------------------------------------------------------------------------
    // Document-level Operations
    // -------------------------------------------------------------------------

    /// Shifts every entry by a signed tick delta, clamping at zero.
    ///
    /// A uniform shift maps start ticks monotonically, so the sort order
    /// and the no-collision invariant survive without a rebuild.
    pub fn shift(&mut self, delta: i64) {
        for entry in &mut self.entries {
            entry.timestamps.shift(delta);
        }
    }

    /// Enforces a minimum gap between adjacent entries.
    ///
    /// When two neighbors sit closer than `min_gap`, the earlier caption's
    /// end shrinks and the later caption's start grows, each by half the
    /// deficit. Captions too short to give up their half are clamped to
    /// zero duration rather than inverted.
    pub fn gap(&mut self, min_gap: Tick) {
        if min_gap == 0 {
            return;
        }
        for i in 1..self.entries.len() {
            let prev_to = self.entries[i - 1].timestamps.to;
            let next_from = self.entries[i].timestamps.from;
            let gap = next_from.saturating_sub(prev_to);
            if gap >= min_gap {
                continue;
            }

            let deficit = min_gap - gap;
            let shrink = deficit / 2;
            let grow = deficit - shrink;

            let prev = &mut self.entries[i - 1].timestamps;
            let shrunk = prev.to.saturating_sub(shrink).max(prev.from);
            if shrunk + shrink != prev.to {
                warn!(
                    from = prev.from,
                    to = prev.to,
                    min_gap,
                    "gap: caption too short to shrink, clamping"
                );
            }
            prev.to = shrunk;

            let next = &mut self.entries[i].timestamps;
            next.from = next.from.saturating_add(grow).min(next.to);
        }
    }

    /// Applies style transforms to every caption's content. Timestamps are
    /// untouched, so no reconciliation is needed.
    pub fn restyle(&mut self, transforms: &[StyleTransform]) {
        for entry in &mut self.entries {
            for transform in transforms {
                transform.apply(&mut entry.content);
            }
        }
    }

    /// Merges every entry of `other` into this document, in ascending
    /// timestamp order.
    pub fn merge_in_place(&mut self, other: &Document, policy: &MergePolicy) {
        for entry in &other.entries {
            self.insert(entry.clone(), policy);
        }
    }

    /// Appends `other` after this document's tail: every appended entry is
    /// shifted forward by the current last end tick, so the two timelines
    /// play back to back instead of overlapping.
    pub fn append_in_place(&mut self, other: &Document, policy: &MergePolicy) {
        let tail = self.entries.last().map_or(0, |e| e.timestamps.to);
        let delta = i64::try_from(tail).unwrap_or(i64::MAX);
        for entry in &other.entries {
            let mut shifted = entry.clone();
            shifted.timestamps.shift(delta);
            self.insert(shifted, policy);
        }
    }
}

/// Combines two documents: copies `a`, then replays every entry of `b`
/// into the copy through the merge engine. Neither input is mutated.
pub fn merge(a: &Document, b: &Document, policy: &MergePolicy) -> Document {
    let mut out = a.clone();
    out.merge_in_place(b, policy);
    out
}

// =============================================================================
// Tests
// =============================================================================
