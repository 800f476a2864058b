//! Merge Policy
//!
//! Configuration describing how two overlapping styled texts are combined:
//! a direction, an ordered list of style transforms applied to the incoming
//! text, and the minimum-gap parameter consumed by document retiming.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::interval::Tick;
use crate::text::StyledText;

/// Default minimum gap between adjacent captions, in ticks.
pub const DEFAULT_MIN_GAP: Tick = 100;

/// Fixed separator between the two columns of a side-by-side merge.
const COLUMN_SEPARATOR: &str = " ---- ";

// =============================================================================
// Merge Direction
// =============================================================================

/// How two overlapping captions' text is laid out after a merge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeDirection {
    /// Existing text above, incoming text below (default)
    #[default]
    TopToBottom,
    /// Incoming text above, existing text below
    BottomToTop,
    /// Existing text left, incoming text right, line by line
    LeftToRight,
    /// Incoming text left, existing text right, line by line
    RightToLeft,
}

impl FromStr for MergeDirection {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "top2bottom" => Ok(Self::TopToBottom),
            "bottom2top" => Ok(Self::BottomToTop),
            "left2right" => Ok(Self::LeftToRight),
            "right2left" => Ok(Self::RightToLeft),
            other => Err(CoreError::UnknownMergeMethod(other.to_string())),
        }
    }
}

// =============================================================================
// Style Transforms
// =============================================================================

/// A pre-processing step applied to incoming text before combination.
///
/// Modeled as a tagged enum of style operations rather than closures so a
/// policy stays a plain, serializable value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "op", content = "value")]
pub enum StyleTransform {
    Bold,
    Italic,
    Underline,
    Color(String),
    FontSize(String),
}

impl StyleTransform {
    /// Applies this transform over the whole content of `text`.
    pub fn apply(&self, text: &mut StyledText) {
        match self {
            Self::Bold => text.bold_all(),
            Self::Italic => text.italic_all(),
            Self::Underline => text.underline_all(),
            Self::Color(color) => text.color_all(color.clone()),
            Self::FontSize(size) => text.fontsize_all(size.clone()),
        }
    }
}

// =============================================================================
// Merge Policy
// =============================================================================

/// Configuration for reconciling overlapping captions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergePolicy {
    /// Layout of merged text
    #[serde(default)]
    pub direction: MergeDirection,
    /// Style mutators applied, in order, to incoming text before combination
    #[serde(default)]
    pub transforms: Vec<StyleTransform>,
    /// Minimum gap between adjacent captions, in ticks
    #[serde(default = "default_min_gap")]
    pub min_gap: Tick,
}

fn default_min_gap() -> Tick {
    DEFAULT_MIN_GAP
}

impl Default for MergePolicy {
    fn default() -> Self {
        Self {
            direction: MergeDirection::default(),
            transforms: Vec::new(),
            min_gap: DEFAULT_MIN_GAP,
        }
    }
}

impl MergePolicy {
    /// Creates a policy with the given direction and defaults elsewhere.
    pub fn with_direction(direction: MergeDirection) -> Self {
        Self {
            direction,
            ..Self::default()
        }
    }
}

// =============================================================================
// Policy Application
// =============================================================================

/// Combines two styled texts under a merge policy. Pure: neither input is
/// mutated.
///
/// Every transform in `policy.transforms` is applied to the incoming text
/// `b` first (e.g. forcing a color onto merged-in captions so they stay
/// visually distinct). The side-by-side directions walk the
/// lexicographically larger content line by line and pair up the slices of
/// both operands; a shorter operand simply contributes empty fragments.
pub fn merge_styled_text(a: &StyledText, b: &StyledText, policy: &MergePolicy) -> StyledText {
    let mut incoming = b.clone();
    for transform in &policy.transforms {
        transform.apply(&mut incoming);
    }

    match policy.direction {
        MergeDirection::TopToBottom => {
            let mut out = a.clone();
            out.push_str("\n");
            out.append_in_place(&incoming);
            out
        }
        MergeDirection::BottomToTop => {
            let mut out = incoming;
            out.push_str("\n");
            out.append_in_place(a);
            out
        }
        MergeDirection::LeftToRight => side_by_side(a, &incoming),
        MergeDirection::RightToLeft => side_by_side(&incoming, a),
    }
}

/// Renders `left` and `right` side by side, one output line per line of the
/// wider operand, separated by the fixed column separator.
fn side_by_side(left: &StyledText, right: &StyledText) -> StyledText {
    let wide = if right > left { right } else { left };

    let mut out = StyledText::default();
    for (index, (start, finish)) in line_bounds(wide.content()).into_iter().enumerate() {
        if index > 0 {
            out.push_str("\n");
        }
        out.append_in_place(&left.slice(start, finish));
        out.push_str(COLUMN_SEPARATOR);
        out.append_in_place(&right.slice(start, finish));
    }
    out
}

/// Returns the byte bounds `[start, finish)` of every line in `content`,
/// excluding the newline itself.
fn line_bounds(content: &str) -> Vec<(usize, usize)> {
    let mut bounds = Vec::new();
    let mut start = 0;
    for (idx, ch) in content.char_indices() {
        if ch == '\n' {
            bounds.push((start, idx));
            start = idx + 1;
        }
    }
    bounds.push((start, content.len()));
    bounds
}

// =============================================================================
// Tests
// =============================================================================
