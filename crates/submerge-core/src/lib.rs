//! Submerge Core Library
//!
//! Engine for combining timed caption documents. A document keeps its
//! entries sorted and collision-free at all times; inserting an entry that
//! overlaps existing ones splits the timeline into fragments and merges
//! their text under a configurable policy. Caption text carries byte-ranged
//! style attributes that survive slicing, concatenation, and merging.
//!
//! The `formats` module translates documents to and from SubRip (`.srt`)
//! text, including inline markup tags.

pub mod document;
pub mod error;
pub mod formats;
pub mod interval;
pub mod policy;
pub mod text;

pub use document::{merge, CaptionEntry, Document};
pub use error::{CoreError, CoreResult};
pub use formats::{document_from_srt, export_srt, parse_srt};
pub use interval::{Interval, Tick};
pub use policy::{
    merge_styled_text, MergeDirection, MergePolicy, StyleTransform, DEFAULT_MIN_GAP,
};
pub use text::{
    Attribute, StyledText, TextSpan, ATTR_BOLD, ATTR_COLOR, ATTR_FONTSIZE, ATTR_ITALIC,
    ATTR_UNDERLINE,
};
