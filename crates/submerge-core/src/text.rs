//! Styled Text Model
//!
//! An owned text buffer plus a collection of named formatting attributes
//! anchored to byte ranges of that buffer. Every concatenation, slice, or
//! trim rewrites the attribute ranges so they stay valid against the
//! current content.
//!
//! Attribute names are plain strings; the well-known vocabulary is
//! `bold`, `italic`, `underline`, `color`, and `fontsize`, but unknown
//! names pass through untouched.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

// =============================================================================
// Attribute Names
// =============================================================================

/// Attribute name for bold text
pub const ATTR_BOLD: &str = "bold";
/// Attribute name for italic text
pub const ATTR_ITALIC: &str = "italic";
/// Attribute name for underlined text
pub const ATTR_UNDERLINE: &str = "underline";
/// Attribute name for colored text (value holds a hex or named color)
pub const ATTR_COLOR: &str = "color";
/// Attribute name for sized text (value holds the font size)
pub const ATTR_FONTSIZE: &str = "fontsize";

// =============================================================================
// Text Span
// =============================================================================

/// Byte range `[start, finish)` into a styled text's content.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct TextSpan {
    pub start: usize,
    pub finish: usize,
}

impl TextSpan {
    pub fn new(start: usize, finish: usize) -> Self {
        Self { start, finish }
    }

    /// Returns the covered byte count.
    pub fn len(&self) -> usize {
        self.finish.saturating_sub(self.start)
    }

    /// Returns true if the span covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.finish <= self.start
    }

    /// Returns true if the two spans share at least one byte.
    pub fn collides(&self, other: &TextSpan) -> bool {
        self.start < other.finish && other.start < self.finish
    }

    /// Returns true if `other` lies entirely within this span.
    pub fn contains(&self, other: &TextSpan) -> bool {
        other.start >= self.start && other.finish <= self.finish
    }

    /// Returns the smallest span covering both spans.
    pub fn union(&self, other: &TextSpan) -> TextSpan {
        TextSpan {
            start: self.start.min(other.start),
            finish: self.finish.max(other.finish),
        }
    }
}

// =============================================================================
// Attribute
// =============================================================================

/// One formatting property over a byte span of the owning text.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    /// Byte range this attribute covers
    pub span: TextSpan,
    /// Attribute name (e.g. `bold`, `color`)
    pub name: String,
    /// Optional payload (color hex, font size)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Attribute {
    /// Creates an attribute with no payload.
    pub fn new(span: TextSpan, name: impl Into<String>) -> Self {
        Self {
            span,
            name: name.into(),
            value: None,
        }
    }

    /// Creates an attribute carrying a payload.
    pub fn with_value(span: TextSpan, name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            span,
            name: name.into(),
            value: Some(value.into()),
        }
    }

    /// Returns true if the two attributes express the same style (same name
    /// and payload), regardless of where they apply.
    fn same_style(&self, other: &Attribute) -> bool {
        self.name == other.name && self.value == other.value
    }
}

// =============================================================================
// Styled Text
// =============================================================================

/// An owned text buffer with byte-ranged formatting attributes.
///
/// Invariant: every attribute span is a valid, non-empty range into the
/// current content. Equality compares content and the attribute set
/// (order-independent).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyledText {
    content: String,
    attributes: Vec<Attribute>,
}

impl StyledText {
    /// Creates plain, unstyled text.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            attributes: Vec::new(),
        }
    }

    /// Returns the raw text content.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the stored attributes, in insertion order.
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Returns the content length in bytes.
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Returns true if the content is empty.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Drops all content and attributes.
    pub fn clear(&mut self) {
        self.content.clear();
        self.attributes.clear();
    }

    // -------------------------------------------------------------------------
    // Combination
    // -------------------------------------------------------------------------

    /// Returns a new styled text holding `self.content + other.content`.
    ///
    /// The donor's attributes are copied with every range offset by this
    /// text's prior content length; `other` is left untouched.
    pub fn concat(&self, other: &StyledText) -> StyledText {
        let mut out = self.clone();
        out.append_in_place(other);
        out
    }

    /// Mutating variant of [`concat`](Self::concat), used when accumulating
    /// multi-line content.
    pub fn append_in_place(&mut self, other: &StyledText) {
        let offset = self.content.len();
        self.content.push_str(&other.content);
        for attr in &other.attributes {
            let mut shifted = attr.clone();
            shifted.span.start += offset;
            shifted.span.finish += offset;
            self.attributes.push(shifted);
        }
    }

    /// Appends plain text without styling.
    pub fn push_str(&mut self, text: &str) {
        self.content.push_str(text);
    }

    /// Appends `line` on a new line (no separator when this text is empty).
    pub fn append_line(&mut self, line: &StyledText) {
        if !self.content.is_empty() {
            self.content.push('\n');
        }
        self.append_in_place(line);
    }

    // -------------------------------------------------------------------------
    // Slicing and Trimming
    // -------------------------------------------------------------------------

    /// Returns the styled sub-text over the byte range `[start, end)`.
    ///
    /// The end is clamped to the content length, so slicing past the end
    /// yields an empty fragment. Surviving attributes are shifted left by
    /// `start`; attributes falling fully outside the window are dropped and
    /// partially covered ones are clipped. Byte positions landing inside a
    /// UTF-8 sequence are snapped back to the previous character boundary.
    pub fn slice(&self, start: usize, end: usize) -> StyledText {
        let len = self.content.len();
        let start = snap_to_char_boundary(&self.content, start.min(len));
        let end = snap_to_char_boundary(&self.content, end.min(len));
        if start >= end {
            return StyledText::default();
        }

        let window = TextSpan::new(start, end);
        let mut attributes = Vec::new();
        for attr in &self.attributes {
            if !attr.span.collides(&window) {
                continue;
            }
            let clipped = TextSpan::new(
                attr.span.start.max(start) - start,
                attr.span.finish.min(end) - start,
            );
            if !clipped.is_empty() {
                let mut survivor = attr.clone();
                survivor.span = clipped;
                attributes.push(survivor);
            }
        }

        StyledText {
            content: self.content[start..end].to_string(),
            attributes,
        }
    }

    /// Strips leading and trailing whitespace, shifting and clipping every
    /// attribute range accordingly.
    pub fn trim(&mut self) {
        let leading = self.content.len() - self.content.trim_start().len();
        let trimmed_len = self.content.trim().len();
        if leading == 0 && trimmed_len == self.content.len() {
            return;
        }

        self.content = self.content[leading..leading + trimmed_len].to_string();
        let mut survivors = Vec::with_capacity(self.attributes.len());
        for attr in self.attributes.drain(..) {
            let start = attr.span.start.max(leading) - leading;
            let finish = attr.span.finish.saturating_sub(leading).min(trimmed_len);
            if start < finish {
                let mut survivor = attr;
                survivor.span = TextSpan::new(start, finish);
                survivors.push(survivor);
            }
        }
        self.attributes = survivors;
    }

    // -------------------------------------------------------------------------
    // Attribute Insertion
    // -------------------------------------------------------------------------

    /// Inserts an attribute, reconciling it against every stored attribute:
    ///
    /// 1. An exact duplicate (same range, name, value) is a no-op.
    /// 2. Equal range and name with a different value overwrites the value.
    /// 3. Same name and value with colliding ranges coalesces both into
    ///    their union range.
    /// 4. Anything else is kept alongside; overlapping independent
    ///    attributes (e.g. bold + color) are legal.
    ///
    /// Fails with [`CoreError::AttributeOutOfBounds`] when the range does
    /// not denote a non-empty span inside the current content.
    pub fn put_attribute(&mut self, attr: Attribute) -> CoreResult<()> {
        let len = self.content.len();
        if attr.span.start >= attr.span.finish || attr.span.start >= len || attr.span.finish > len
        {
            return Err(CoreError::AttributeOutOfBounds {
                start: attr.span.start,
                finish: attr.span.finish,
                len,
            });
        }

        for existing in &mut self.attributes {
            if *existing == attr {
                return Ok(());
            }
            if existing.span == attr.span && existing.name == attr.name {
                existing.value = attr.value;
                return Ok(());
            }
            if existing.same_style(&attr) && existing.span.collides(&attr.span) {
                existing.span = existing.span.union(&attr.span);
                return Ok(());
            }
        }

        self.attributes.push(attr);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Convenience Setters
    // -------------------------------------------------------------------------

    /// Marks the given range bold.
    pub fn bold(&mut self, span: TextSpan) -> CoreResult<()> {
        self.put_attribute(Attribute::new(span, ATTR_BOLD))
    }

    /// Marks the given range italic.
    pub fn italic(&mut self, span: TextSpan) -> CoreResult<()> {
        self.put_attribute(Attribute::new(span, ATTR_ITALIC))
    }

    /// Underlines the given range.
    pub fn underline(&mut self, span: TextSpan) -> CoreResult<()> {
        self.put_attribute(Attribute::new(span, ATTR_UNDERLINE))
    }

    /// Colors the given range.
    pub fn color(&mut self, span: TextSpan, color: impl Into<String>) -> CoreResult<()> {
        self.put_attribute(Attribute::with_value(span, ATTR_COLOR, color))
    }

    /// Sets the font size over the given range.
    pub fn fontsize(&mut self, span: TextSpan, size: impl Into<String>) -> CoreResult<()> {
        self.put_attribute(Attribute::with_value(span, ATTR_FONTSIZE, size))
    }

    /// Marks the whole content bold. No-op on empty content.
    pub fn bold_all(&mut self) {
        self.put_attribute_all(Attribute::new(TextSpan::default(), ATTR_BOLD));
    }

    /// Marks the whole content italic. No-op on empty content.
    pub fn italic_all(&mut self) {
        self.put_attribute_all(Attribute::new(TextSpan::default(), ATTR_ITALIC));
    }

    /// Underlines the whole content. No-op on empty content.
    pub fn underline_all(&mut self) {
        self.put_attribute_all(Attribute::new(TextSpan::default(), ATTR_UNDERLINE));
    }

    /// Colors the whole content. No-op on empty content.
    pub fn color_all(&mut self, color: impl Into<String>) {
        self.put_attribute_all(Attribute::with_value(TextSpan::default(), ATTR_COLOR, color));
    }

    /// Sets the font size over the whole content. No-op on empty content.
    pub fn fontsize_all(&mut self, size: impl Into<String>) {
        self.put_attribute_all(Attribute::with_value(
            TextSpan::default(),
            ATTR_FONTSIZE,
            size,
        ));
    }

    fn put_attribute_all(&mut self, mut attr: Attribute) {
        if self.content.is_empty() {
            return;
        }
        attr.span = TextSpan::new(0, self.content.len());
        // The span is the full content range, so the bounds check cannot fail.
        let _ = self.put_attribute(attr);
    }
}

impl PartialEq for StyledText {
    fn eq(&self, other: &Self) -> bool {
        if self.content != other.content || self.attributes.len() != other.attributes.len() {
            return false;
        }
        let mut left = self.attributes.clone();
        let mut right = other.attributes.clone();
        left.sort();
        right.sort();
        left == right
    }
}

impl Eq for StyledText {}

/// Lexicographic over `content` only; used to pick the wider operand when
/// pairing lines for side-by-side merges, not as a semantic caption order.
/// Texts with equal content but different attributes are incomparable,
/// keeping the ordering consistent with [`PartialEq`].
impl PartialOrd for StyledText {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        match self.content.cmp(&other.content) {
            std::cmp::Ordering::Equal if self == other => Some(std::cmp::Ordering::Equal),
            std::cmp::Ordering::Equal => None,
            ord => Some(ord),
        }
    }
}

impl From<&str> for StyledText {
    fn from(content: &str) -> Self {
        Self::new(content)
    }
}

/// Walks `idx` back to the nearest UTF-8 character boundary at or before it.
pub(crate) fn snap_to_char_boundary(content: &str, mut idx: usize) -> usize {
    while idx > 0 && !content.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn span(start: usize, finish: usize) -> TextSpan {
        TextSpan::new(start, finish)
    }

    // -------------------------------------------------------------------------
    // Span Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_span_collides() {
        assert!(span(0, 5).collides(&span(3, 8)));
        assert!(!span(0, 5).collides(&span(5, 8)));
        assert!(!span(0, 5).collides(&span(7, 9)));
    }

    #[test]
    fn test_span_union() {
        assert_eq!(span(0, 5).union(&span(3, 8)), span(0, 8));
        assert_eq!(span(4, 6).union(&span(1, 2)), span(1, 6));
    }

    // -------------------------------------------------------------------------
    // Concatenation Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_concat_content_length() {
        let a = StyledText::new("Hello");
        let b = StyledText::new("World");
        let joined = a.concat(&b);
        assert_eq!(joined.content(), "HelloWorld");
        assert_eq!(joined.len(), a.len() + b.len());
    }

    #[test]
    fn test_concat_shifts_donor_attributes() {
        let mut a = StyledText::new("Hello");
        a.color(span(0, 5), "#ff0000").unwrap();

        let mut b = StyledText::new("World");
        b.bold(span(1, 4)).unwrap();

        let joined = a.concat(&b);
        // Recipient attributes keep their positions.
        assert!(joined
            .attributes()
            .iter()
            .any(|attr| attr.name == ATTR_COLOR && attr.span == span(0, 5)));
        // Donor attributes are offset by the recipient's prior length.
        assert!(joined
            .attributes()
            .iter()
            .any(|attr| attr.name == ATTR_BOLD && attr.span == span(6, 9)));
        // The donor itself is untouched.
        assert_eq!(b.attributes()[0].span, span(1, 4));
    }

    #[test]
    fn test_concat_color_does_not_bleed() {
        let mut a = StyledText::new("Hello");
        a.color(span(0, 5), "#ff0000").unwrap();
        let joined = a.concat(&StyledText::new("World"));

        assert_eq!(joined.attributes().len(), 1);
        assert_eq!(joined.attributes()[0].span, span(0, 5));
    }

    #[test]
    fn test_append_line() {
        let mut text = StyledText::default();
        text.append_line(&StyledText::new("first"));
        text.append_line(&StyledText::new("second"));
        assert_eq!(text.content(), "first\nsecond");
    }

    // -------------------------------------------------------------------------
    // Slice Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_slice_basic() {
        let mut text = StyledText::new("Hello World");
        text.bold(span(0, 5)).unwrap();
        text.italic(span(6, 11)).unwrap();

        let tail = text.slice(6, 11);
        assert_eq!(tail.content(), "World");
        assert_eq!(tail.attributes().len(), 1);
        assert_eq!(tail.attributes()[0].name, ATTR_ITALIC);
        assert_eq!(tail.attributes()[0].span, span(0, 5));
    }

    #[test]
    fn test_slice_clips_partial_attribute() {
        let mut text = StyledText::new("Hello World");
        text.bold(span(3, 8)).unwrap();

        let head = text.slice(0, 5);
        assert_eq!(head.content(), "Hello");
        assert_eq!(head.attributes()[0].span, span(3, 5));
    }

    #[test]
    fn test_slice_past_end_is_empty() {
        let text = StyledText::new("Hi");
        assert_eq!(text.slice(5, 10).content(), "");
        assert_eq!(text.slice(0, 100).content(), "Hi");
    }

    #[test]
    fn test_slice_snaps_utf8_boundaries() {
        // "héllo": the é occupies bytes 1..3.
        let text = StyledText::new("héllo");
        let sliced = text.slice(0, 2);
        assert_eq!(sliced.content(), "h");
    }

    // -------------------------------------------------------------------------
    // Trim Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_trim_shifts_attributes() {
        let mut text = StyledText::new("  Hello  ");
        text.bold(span(2, 7)).unwrap();
        text.trim();
        assert_eq!(text.content(), "Hello");
        assert_eq!(text.attributes()[0].span, span(0, 5));
    }

    #[test]
    fn test_trim_drops_whitespace_only_attributes() {
        let mut text = StyledText::new("  Hello");
        text.bold(span(0, 2)).unwrap();
        text.trim();
        assert_eq!(text.content(), "Hello");
        assert!(text.attributes().is_empty());
    }

    // -------------------------------------------------------------------------
    // Attribute Insertion Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_put_attribute_idempotent() {
        let mut text = StyledText::new("Hello");
        text.bold(span(0, 5)).unwrap();
        text.bold(span(0, 5)).unwrap();
        assert_eq!(text.attributes().len(), 1);
    }

    #[test]
    fn test_put_attribute_overwrites_value_on_equal_range() {
        let mut text = StyledText::new("Hello");
        text.color(span(0, 5), "#ff0000").unwrap();
        text.color(span(0, 5), "#00ff00").unwrap();
        assert_eq!(text.attributes().len(), 1);
        assert_eq!(text.attributes()[0].value.as_deref(), Some("#00ff00"));
    }

    #[test]
    fn test_put_attribute_coalesces_colliding_same_style() {
        let mut text = StyledText::new("Hello World");
        text.bold(span(0, 6)).unwrap();
        text.bold(span(4, 11)).unwrap();
        assert_eq!(text.attributes().len(), 1);
        assert_eq!(text.attributes()[0].span, span(0, 11));
    }

    #[test]
    fn test_put_attribute_keeps_independent_overlaps() {
        let mut text = StyledText::new("Hello");
        text.bold(span(0, 5)).unwrap();
        text.color(span(2, 4), "#ff0000").unwrap();
        assert_eq!(text.attributes().len(), 2);
    }

    #[test]
    fn test_put_attribute_rejects_out_of_bounds() {
        let mut text = StyledText::new("Hello");
        assert!(matches!(
            text.bold(span(5, 6)),
            Err(CoreError::AttributeOutOfBounds { .. })
        ));
        assert!(matches!(
            text.bold(span(0, 6)),
            Err(CoreError::AttributeOutOfBounds { .. })
        ));
        assert!(matches!(
            text.bold(span(3, 3)),
            Err(CoreError::AttributeOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_whole_content_setters() {
        let mut text = StyledText::new("Hello");
        text.bold_all();
        text.color_all("#00ffff");
        assert_eq!(text.attributes().len(), 2);
        assert_eq!(text.attributes()[0].span, span(0, 5));

        let mut empty = StyledText::default();
        empty.bold_all();
        assert!(empty.attributes().is_empty());
    }

    #[test]
    fn test_unknown_attribute_names_pass_through() {
        let mut text = StyledText::new("Hello");
        text.put_attribute(Attribute::new(span(0, 5), "speaker"))
            .unwrap();
        assert_eq!(text.attributes()[0].name, "speaker");
    }

    // -------------------------------------------------------------------------
    // Equality Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_equality_ignores_attribute_order() {
        let mut a = StyledText::new("Hello");
        a.bold(span(0, 2)).unwrap();
        a.italic(span(3, 5)).unwrap();

        let mut b = StyledText::new("Hello");
        b.italic(span(3, 5)).unwrap();
        b.bold(span(0, 2)).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_inequality_on_differing_attributes() {
        let mut a = StyledText::new("Hello");
        a.bold(span(0, 2)).unwrap();
        let b = StyledText::new("Hello");
        assert_ne!(a, b);
    }

    #[test]
    fn test_ordering_is_lexicographic_over_content() {
        let a = StyledText::new("apple");
        let b = StyledText::new("banana");
        assert!(a < b);
        assert!(b > a);

        // Attributes do not participate in the ordering.
        let mut styled = StyledText::new("apple");
        styled.bold(span(0, 5)).unwrap();
        assert!(styled < b);
        // Same content, different attributes: incomparable, not equal.
        assert_eq!(styled.partial_cmp(&a), None);
    }

    // -------------------------------------------------------------------------
    // Serialization Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_styled_text_serialization() {
        let mut text = StyledText::new("Hello");
        text.color(span(0, 5), "#ff0000").unwrap();
        let json = serde_json::to_string(&text).unwrap();
        let parsed: StyledText = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, text);
    }
}
