//! Markdown section splitting.
//!
//! Splitting is flat: a section's content stops at the next heading of any
//! level. Nested structure is recovered by splitting a section's
//! [`scope`](Section::scope) again.

use once_cell::sync::Lazy;
use regex::Regex;

/// ATX heading at line start: `#` to `######`, whitespace, text.
static RE_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(#{1,6})[ \t]+(.+)$").expect("heading pattern is valid"));

/// A heading and the text that follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section<'a> {
    /// Heading text without the `#` markers
    pub header: &'a str,

    /// Number of `#` characters (1-6)
    pub level: usize,

    /// Text after the heading line, up to the next heading of any level
    pub content: &'a str,

    /// Text after the heading line, up to the next heading of the same or a
    /// shallower level
    pub scope: &'a str,

    /// Byte offset of the heading line in the split text
    pub start: usize,

    /// Byte offset where the scope ends
    pub scope_end: usize,
}

impl Section<'_> {
    /// Case-insensitive substring match against the header.
    pub fn header_contains(&self, needle: &str) -> bool {
        self.header.to_lowercase().contains(&needle.to_lowercase())
    }
}

/// Whether a single line is an ATX heading.
pub(crate) fn is_heading(line: &str) -> bool {
    RE_HEADING.is_match(line)
}

/// Split markdown text into sections in document order.
///
/// Text before the first heading does not belong to any section.
pub fn split_sections(text: &str) -> Vec<Section<'_>> {
    struct Heading<'a> {
        header: &'a str,
        level: usize,
        start: usize,
        content_start: usize,
    }

    let headings: Vec<Heading<'_>> = RE_HEADING
        .captures_iter(text)
        .filter_map(|cap| {
            let whole = cap.get(0)?;
            let line_end = whole.end();
            let content_start =
                if text[line_end..].starts_with('\n') { line_end + 1 } else { line_end };
            Some(Heading {
                header: cap.get(2)?.as_str().trim(),
                level: cap.get(1)?.as_str().len(),
                start: whole.start(),
                content_start,
            })
        })
        .collect();

    headings
        .iter()
        .enumerate()
        .map(|(i, heading)| {
            let content_end = headings.get(i + 1).map_or(text.len(), |next| next.start);
            let scope_end = headings[i + 1..]
                .iter()
                .find(|next| next.level <= heading.level)
                .map_or(text.len(), |next| next.start);

            Section {
                header: heading.header,
                level: heading.level,
                content: &text[heading.content_start..content_end],
                scope: &text[heading.content_start..scope_end],
                start: heading.start,
                scope_end,
            }
        })
        .collect()
}
