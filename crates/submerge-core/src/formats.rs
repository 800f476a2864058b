//! SubRip Format Adapter
//!
//! Parses and writes `.srt` content at the core's interface boundary:
//! a stream of (interval, styled text) pairs in, an ordered non-colliding
//! stream out. Inline markup (`<b>`, `<i>`, `<u>`, `<font color=…>`,
//! `<font size=…>`) is transpiled to byte-ranged attributes on the way in
//! and painted back from attributes on the way out.
//!
//! # SRT Format
//!
//! ```text
//! 1
//! 00:00:01,000 --> 00:00:04,000
//! First caption text
//!
//! 2
//! 00:00:05,500 --> 00:00:08,000
//! Second caption, <i>styled</i>
//! ```

use tracing::warn;

use crate::document::{CaptionEntry, Document};
use crate::error::{CoreError, CoreResult};
use crate::interval::{Interval, Tick};
use crate::policy::MergePolicy;
use crate::text::{
    snap_to_char_boundary, Attribute, StyledText, TextSpan, ATTR_BOLD, ATTR_COLOR, ATTR_FONTSIZE,
    ATTR_ITALIC, ATTR_UNDERLINE,
};

// =============================================================================
// Parsing
// =============================================================================

/// Parses SRT content into caption entries, in file order.
///
/// The numeric cue counter line is optional; timestamps accept both `,` and
/// `.` as the millisecond separator. Multi-line cue text is accumulated
/// with embedded newlines.
pub fn parse_srt(content: &str) -> CoreResult<Vec<CaptionEntry>> {
    let mut entries = Vec::new();
    let mut lines = content.lines().peekable();
    let mut cue_index = 0;

    while lines.peek().is_some() {
        // Skip blank separator lines.
        while lines.next_if(|l| l.trim().is_empty()).is_some() {}
        let Some(first) = lines.next() else {
            break;
        };

        // The counter line is optional; a line holding "-->" is already the
        // timestamp line.
        let timestamp_line = if first.contains("-->") {
            first
        } else {
            lines
                .next()
                .ok_or_else(|| CoreError::MalformedCue(format!("cue #{cue_index} has no timestamp line")))?
        };
        let timestamps = parse_timestamp_line(timestamp_line)?;

        let mut text = StyledText::default();
        let mut saw_text = false;
        while let Some(line) = lines.next_if(|l| !l.trim().is_empty()) {
            text.append_line(&transpile_tags(line));
            saw_text = true;
        }
        if !saw_text {
            return Err(CoreError::MissingCueText(cue_index));
        }

        entries.push(CaptionEntry::new(text, timestamps));
        cue_index += 1;
    }

    Ok(entries)
}

/// Parses SRT content straight into a reconciled document.
pub fn document_from_srt(content: &str, policy: &MergePolicy) -> CoreResult<Document> {
    Ok(Document::from_entries(parse_srt(content)?, policy))
}

/// Parses a timestamp line (e.g. `00:00:01,000 --> 00:00:04,000`).
fn parse_timestamp_line(line: &str) -> CoreResult<Interval> {
    let (start, end) = line
        .split_once("-->")
        .ok_or_else(|| CoreError::MalformedCue(format!("expected 'start --> end': {line}")))?;
    Interval::new(parse_timestamp(start)?, parse_timestamp(end)?)
}

/// Parses one SRT timestamp (`HH:MM:SS,mmm`) into ticks.
fn parse_timestamp(ts: &str) -> CoreResult<Tick> {
    let ts = ts.trim();
    let invalid = || CoreError::InvalidTimestamp(ts.to_string());

    let normalized = ts.replace(',', ".");
    let mut parts = normalized.split(':');
    let (Some(hours), Some(minutes), Some(seconds), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid());
    };

    let hours: Tick = hours.parse().map_err(|_| invalid())?;
    let minutes: Tick = minutes.parse().map_err(|_| invalid())?;
    let (secs, millis) = seconds.split_once('.').unwrap_or((seconds, "000"));
    let secs: Tick = secs.parse().map_err(|_| invalid())?;
    let millis = parse_millis(millis).ok_or_else(invalid)?;

    Ok(hours * 3_600_000 + minutes * 60_000 + secs * 1000 + millis)
}

/// Interprets a millisecond field of any width as a 3-digit fraction
/// (`"5"` reads as 500, `"123"` as 123).
fn parse_millis(field: &str) -> Option<Tick> {
    if field.is_empty() || !field.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let mut digits: String = field.chars().take(3).collect();
    while digits.len() < 3 {
        digits.push('0');
    }
    digits.parse().ok()
}

// =============================================================================
// Inline Tag Transpilation
// =============================================================================

/// An inline tag that has been opened but not yet closed.
struct OpenTag {
    /// Raw tag name as written in the markup (`b`, `font`, …)
    tag: String,
    /// Attribute this tag will produce
    name: String,
    value: Option<String>,
    /// Byte offset into the cleaned content where the tag opened
    start: usize,
}

/// Converts one line of tagged SRT text into styled text. Tags left open at
/// the end of the line extend to the end of the line; stray closing tags
/// are ignored.
fn transpile_tags(line: &str) -> StyledText {
    let mut clean = String::new();
    let mut open: Vec<OpenTag> = Vec::new();
    let mut pending: Vec<Attribute> = Vec::new();

    let mut rest = line;
    while let Some(lt) = rest.find('<') {
        clean.push_str(&rest[..lt]);
        let after = &rest[lt + 1..];
        let Some(gt) = after.find('>') else {
            // An unterminated '<' is literal text.
            clean.push_str(&rest[lt..]);
            rest = "";
            break;
        };
        let tag_body = &after[..gt];
        rest = &after[gt + 1..];

        if let Some(name) = tag_body.strip_prefix('/') {
            close_tag(name.trim(), clean.len(), &mut open, &mut pending);
        } else {
            open_tag(tag_body, clean.len(), &mut open);
        }
    }
    clean.push_str(rest);

    // Unclosed tags run to the end of the line.
    let end = clean.len();
    for tag in open {
        pending.push(attribute_for(&tag, end));
    }

    let mut text = StyledText::new(clean);
    for attr in pending {
        if let Err(err) = text.put_attribute(attr) {
            warn!(%err, "dropping inline tag with an empty or invalid range");
        }
    }
    text
}

/// Records the attribute(s) a single opening tag introduces. A
/// `<font color=… size=…>` opens one attribute per recognized property;
/// unknown tag names pass through opaquely under their own name.
fn open_tag(tag_body: &str, at: usize, open: &mut Vec<OpenTag>) {
    let mut tokens = tag_body.split_whitespace();
    let Some(raw_name) = tokens.next() else {
        return;
    };
    let tag = raw_name.to_ascii_lowercase();

    match tag.as_str() {
        "b" => push_open(open, &tag, ATTR_BOLD, None, at),
        "i" => push_open(open, &tag, ATTR_ITALIC, None, at),
        "u" => push_open(open, &tag, ATTR_UNDERLINE, None, at),
        "font" => {
            let mut opened = false;
            for token in tokens {
                let Some((key, value)) = token.split_once('=') else {
                    continue;
                };
                let value = value.trim_matches(|c| c == '"' || c == '\'').to_string();
                match key.to_ascii_lowercase().as_str() {
                    "color" => {
                        push_open(open, &tag, ATTR_COLOR, Some(value), at);
                        opened = true;
                    }
                    "size" => {
                        push_open(open, &tag, ATTR_FONTSIZE, Some(value), at);
                        opened = true;
                    }
                    _ => {}
                }
            }
            if !opened {
                // A bare <font> still needs a matching close.
                push_open(open, &tag, ATTR_COLOR, None, at);
            }
        }
        _ => push_open(open, &tag, &tag, None, at),
    }
}

fn push_open(open: &mut Vec<OpenTag>, tag: &str, name: &str, value: Option<String>, at: usize) {
    open.push(OpenTag {
        tag: tag.to_string(),
        name: name.to_string(),
        value,
        start: at,
    });
}

/// Closes the most recent group of open tags matching `name`. A single
/// `</font>` closes every attribute its `<font …>` opened.
fn close_tag(name: &str, at: usize, open: &mut Vec<OpenTag>, pending: &mut Vec<Attribute>) {
    let name = name.to_ascii_lowercase();
    // Same-name tags opened at different offsets are nested, not grouped;
    // only the innermost group closes here.
    let mut group_start: Option<usize> = None;
    while open
        .last()
        .is_some_and(|t| t.tag == name && group_start.is_none_or(|s| t.start == s))
    {
        if let Some(tag) = open.pop() {
            group_start = Some(tag.start);
            pending.push(attribute_for(&tag, at));
        }
    }
    if group_start.is_none() {
        warn!(tag = %name, "ignoring stray closing tag");
    }
}

fn attribute_for(tag: &OpenTag, finish: usize) -> Attribute {
    match &tag.value {
        Some(value) => Attribute::with_value(TextSpan::new(tag.start, finish), &tag.name, value),
        None => Attribute::new(TextSpan::new(tag.start, finish), &tag.name),
    }
}

// =============================================================================
// Writing
// =============================================================================

/// Writes a document as SRT, painting attributes back to inline tags.
pub fn export_srt(doc: &Document) -> String {
    let mut out = String::new();
    for (index, entry) in doc.iter().enumerate() {
        out.push_str(&format!("{}\n", index + 1));
        out.push_str(&format!(
            "{} --> {}\n",
            format_timestamp(entry.timestamps.from),
            format_timestamp(entry.timestamps.to)
        ));
        out.push_str(&paint_tags(&entry.content));
        out.push_str("\n\n");
    }
    out.trim_end().to_string()
}

/// Formats ticks as an SRT timestamp (`00:00:00,000`).
fn format_timestamp(ticks: Tick) -> String {
    let millis = ticks % 1000;
    let total_secs = ticks / 1000;
    let secs = total_secs % 60;
    let total_mins = total_secs / 60;
    let mins = total_mins % 60;
    let hours = total_mins / 60;
    format!("{hours:02}:{mins:02}:{secs:02},{millis:03}")
}

/// Kind marker for tag insertion events; closes sort before opens at the
/// same byte position.
const EVENT_CLOSE: u8 = 0;
const EVENT_OPEN: u8 = 1;

/// Re-inserts markup tags from attributes.
///
/// Opens are emitted widest-first at equal positions and closes in reverse
/// open order, which yields properly nested tags for nested spans; spans
/// that genuinely interleave produce overlapping tags, which SRT renderers
/// tolerate.
fn paint_tags(text: &StyledText) -> String {
    let content = text.content();
    if text.attributes().is_empty() {
        return content.to_string();
    }

    let mut sorted: Vec<&Attribute> = text.attributes().iter().collect();
    sorted.sort_by_key(|attr| (attr.span.start, std::cmp::Reverse(attr.span.finish)));

    // (byte position, kind, tiebreak, tag text)
    let mut events: Vec<(usize, u8, usize, String)> = Vec::with_capacity(sorted.len() * 2);
    let count = sorted.len();
    for (order, attr) in sorted.iter().enumerate() {
        let pos = snap_to_char_boundary(content, attr.span.start.min(content.len()));
        let end = snap_to_char_boundary(content, attr.span.finish.min(content.len()));
        events.push((pos, EVENT_OPEN, order, opening_tag(attr)));
        events.push((end, EVENT_CLOSE, count - order, closing_tag(attr)));
    }
    events.sort_by(|a, b| (a.0, a.1, a.2).cmp(&(b.0, b.1, b.2)));

    let mut out = String::with_capacity(content.len());
    let mut cursor = 0;
    for (pos, _, _, tag) in events {
        out.push_str(&content[cursor..pos]);
        out.push_str(&tag);
        cursor = pos;
    }
    out.push_str(&content[cursor..]);
    out
}

fn opening_tag(attr: &Attribute) -> String {
    let value = attr.value.as_deref().unwrap_or_default();
    match attr.name.as_str() {
        ATTR_BOLD => "<b>".to_string(),
        ATTR_ITALIC => "<i>".to_string(),
        ATTR_UNDERLINE => "<u>".to_string(),
        ATTR_COLOR => format!("<font color=\"{value}\">"),
        ATTR_FONTSIZE => format!("<font size=\"{value}\">"),
        other => format!("<{other}>"),
    }
}

fn closing_tag(attr: &Attribute) -> String {
    match attr.name.as_str() {
        ATTR_BOLD => "</b>".to_string(),
        ATTR_ITALIC => "</i>".to_string(),
        ATTR_UNDERLINE => "</u>".to_string(),
        ATTR_COLOR | ATTR_FONTSIZE => "</font>".to_string(),
        other => format!("</{other}>"),
    }
}

// =============================================================================
// Tests
// =============================================================================
