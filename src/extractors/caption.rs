// src/extractors/caption.rs

use once_cell::sync::Lazy;
use regex::Regex;

/// Longest title fragment allowed in an output file name.
pub const MAX_TITLE_LEN: usize = 60;

// "Table N: Title", anchored at the start of the trimmed paragraph text
static CAPTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^Table\s*([0-9]+)\s*:\s*(.+)").expect("Failed to compile CAPTION_RE")
});

// Anything that may not appear in a sanitized title
static UNSAFE_CHARS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_]").expect("Failed to compile UNSAFE_CHARS_RE"));

/// A recognized "Table N: Title" paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caption {
    /// The number exactly as written, leading zeros included.
    pub number: String,
    /// Sanitized title; may be empty when the title had no usable characters.
    pub title: String,
}

impl Caption {
    /// `Table 1` (or `Table 01`, ...) restarts numbering and opens a new section.
    pub fn starts_section(&self) -> bool {
        self.number.trim_start_matches('0') == "1"
    }
}

/// Tries to read a caption out of a paragraph's text.
pub fn parse_caption(text: &str) -> Option<Caption> {
    let caps = CAPTION_RE.captures(text.trim())?;
    Some(Caption {
        number: caps[1].to_string(),
        title: sanitize_title(&caps[2]),
    })
}

/// Makes caption text safe for a file name.
///
/// Every character outside `[A-Za-z0-9_]` becomes `_`, surrounding
/// underscores are stripped and the result is capped at [`MAX_TITLE_LEN`].
/// Applying it twice gives the same result as applying it once.
pub fn sanitize_title(raw: &str) -> String {
    let replaced = UNSAFE_CHARS_RE.replace_all(raw.trim(), "_");
    let stripped = replaced.trim_matches('_');
    // only ASCII is left, so byte and char lengths agree
    let capped = &stripped[..stripped.len().min(MAX_TITLE_LEN)];
    capped.trim_end_matches('_').to_string()
}
