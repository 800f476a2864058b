//! Submerge Error Definitions
//!
//! Defines error types used throughout the core library.

use thiserror::Error;

use crate::interval::Tick;

/// Core engine error types
#[derive(Error, Debug)]
pub enum CoreError {
    // =========================================================================
    // Interval Errors
    // =========================================================================
    #[error("Invalid interval: {from}~{to} ticks (from must not exceed to)")]
    InvalidInterval { from: Tick, to: Tick },

    // =========================================================================
    // Styled Text Errors
    // =========================================================================
    #[error("Attribute range {start}..{finish} is out of bounds for content of {len} bytes")]
    AttributeOutOfBounds {
        start: usize,
        finish: usize,
        len: usize,
    },

    // =========================================================================
    // Policy Errors
    // =========================================================================
    #[error("Unknown merge method: {0} (expected top2bottom|bottom2top|left2right|right2left)")]
    UnknownMergeMethod(String),

    // =========================================================================
    // Format Errors
    // =========================================================================
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Malformed cue: {0}")]
    MalformedCue(String),

    #[error("Missing text in cue #{0}")]
    MissingCueText(usize),
}

/// Core engine result type
pub type CoreResult<T> = Result<T, CoreError>;
