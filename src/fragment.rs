//! HTML fragment scanner.
//!
//! Finds the few elements the canvas mapper understands (`h1`, `h2`, `h3`,
//! `label`, `input`, `button`) in arbitrary HTML text. This is not an HTML
//! parser: the input does not have to be well formed, and everything that is
//! not one of those tags is skipped.
//!
//! Matching rules:
//! - Tag names are matched case-insensitively.
//! - A paired element needs a closing tag with the same name on the same line
//!   as the end of its opening tag. The first such closing tag wins.
//! - `<input>` may also stand alone. The paired form is still tried first.
//! - The scan is leftmost-first and non-overlapping. After a match it resumes
//!   at the first byte past the fragment, so recognized tags nested inside a
//!   fragment stay part of its inner text.

use regex::Regex;
use serde::Serialize;

lazy_static::lazy_static! {
    /// Opening tag of any recognized element. Attribute text runs up to the first `>`.
    static ref OPEN_TAG: Regex =
        Regex::new(r"(?i)<(h1|h2|h3|label|input|button)([^>]*)>").unwrap();

    static ref CLASS_ATTR: Regex =
        Regex::new(r#"(?i)\bclass\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#).unwrap();

    static ref BACKGROUND_COLOR: Regex =
        Regex::new(r#"(?i)background-color\s*:\s*([^;"'>]*)"#).unwrap();
}

/// Inline `background-color` values that turn a button red.
const RED_BACKGROUNDS: &[&str] = &["red", "#f00", "#ff0000"];

/// What a fragment turns into on the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FragmentKind {
    /// `h1`, `h2`, `h3` or `label`
    Text,
    Input,
    Button,
}

impl FragmentKind {
    fn from_tag(tag: &str) -> Self {
        if tag.eq_ignore_ascii_case("input") {
            FragmentKind::Input
        } else if tag.eq_ignore_ascii_case("button") {
            FragmentKind::Button
        } else {
            FragmentKind::Text
        }
    }
}

/// One recognized element, borrowed from the scanned HTML.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fragment<'a> {
    pub kind: FragmentKind,
    /// Tag name as written in the source (original case).
    pub tag: &'a str,
    /// Byte offset of the opening `<`.
    pub start: usize,
    /// Text between the opening tag and its closing tag, untrimmed.
    /// Empty for a standalone `<input>`.
    pub inner_text: &'a str,
    /// Everything between the tag name and the `>` of the opening tag.
    pub attributes: &'a str,
    /// The whole matched span, opening tag through closing tag.
    pub raw_match_text: &'a str,
}

impl Fragment<'_> {
    /// Byte offset one past the end of the fragment.
    pub fn end(&self) -> usize {
        self.start + self.raw_match_text.len()
    }

    /// Whether a button asks for the red variant, either through a class
    /// containing "red" or an inline red `background-color`.
    pub fn is_red_variant(&self) -> bool {
        has_red_class(self.attributes) || has_red_background(self.attributes)
    }
}

/// Scan `html` for recognized fragments, in source order.
pub fn scan_fragments(html: &str) -> Vec<Fragment<'_>> {
    let mut fragments = Vec::new();
    let mut pos = 0;

    while pos < html.len() {
        let Some(caps) = OPEN_TAG.captures_at(html, pos) else {
            break;
        };
        let (Some(open), Some(tag), Some(attrs)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            break;
        };
        let kind = FragmentKind::from_tag(tag.as_str());

        if let Some(close_start) = find_closing_tag(html, open.end(), tag.as_str()) {
            // "</" + name + ">"
            let end = close_start + tag.len() + 3;
            fragments.push(Fragment {
                kind,
                tag: tag.as_str(),
                start: open.start(),
                inner_text: &html[open.end()..close_start],
                attributes: attrs.as_str(),
                raw_match_text: &html[open.start()..end],
            });
            pos = end;
        } else if kind == FragmentKind::Input {
            fragments.push(Fragment {
                kind,
                tag: tag.as_str(),
                start: open.start(),
                inner_text: "",
                attributes: attrs.as_str(),
                raw_match_text: open.as_str(),
            });
            pos = open.end();
        } else {
            // Unclosed or mismatched pair. `<` is one byte, so this stays on a char boundary.
            tracing::trace!(tag = tag.as_str(), offset = open.start(), "skipping unclosed tag");
            pos = open.start() + 1;
        }
    }

    fragments
}

fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Find the first `</tag>` (ASCII case-insensitive) starting at `from` and
/// ending before the next line terminator. Returns the offset of its `<`.
fn find_closing_tag(html: &str, from: usize, tag: &str) -> Option<usize> {
    let rest = &html[from..];
    let line = match rest.find(is_line_terminator) {
        Some(end) => &rest[..end],
        None => rest,
    };

    let bytes = line.as_bytes();
    let name = tag.as_bytes();
    let needle_len = name.len() + 3;
    if bytes.len() < needle_len {
        return None;
    }

    (0..=bytes.len() - needle_len)
        .find(|&i| {
            bytes[i] == b'<'
                && bytes[i + 1] == b'/'
                && bytes[i + 2..i + 2 + name.len()].eq_ignore_ascii_case(name)
                && bytes[i + 2 + name.len()] == b'>'
        })
        .map(|i| from + i)
}

fn has_red_class(attributes: &str) -> bool {
    CLASS_ATTR.captures_iter(attributes).any(|caps| {
        caps.get(1)
            .or_else(|| caps.get(2))
            .or_else(|| caps.get(3))
            .is_some_and(|value| value.as_str().to_ascii_lowercase().contains("red"))
    })
}

fn has_red_background(attributes: &str) -> bool {
    BACKGROUND_COLOR.captures_iter(attributes).any(|caps| {
        caps.get(1).is_some_and(|value| {
            let value = value.as_str().trim();
            RED_BACKGROUNDS.iter().any(|red| value.eq_ignore_ascii_case(red))
        })
    })
}
