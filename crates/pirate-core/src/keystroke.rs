//! Parsing of typed text into keystroke groups.
//!
//! Plain characters are typed one at a time.  Anything that cannot be
//! expressed as a single character (hotkeys, function keys, Enter) is written
//! as an escape sequence:
//!
//! ```text
//! {KEY:<name>(+<name>)*}
//! ```
//!
//! For example `"ab{KEY:WIN+r}c"` yields four groups: `a`, `b`, `WIN+r`, `c`.
//! Whitespace inside the braces is ignored, so `{KEY: CTRL + ALT + t }` is the
//! same as `{KEY:CTRL+ALT+t}`.
//!
//! # Matching rules
//!
//! - The body of an escape ends at the first `}` after `{KEY:`.
//! - An escape cannot span a line break; `{KEY:` followed by a newline before
//!   the closing brace is typed literally, and scanning continues from the next
//!   `{KEY:` occurrence.
//! - Text before, between, and after escapes is split into single characters.

use std::fmt;

const ESCAPE_OPEN: &str = "{KEY:";
const ESCAPE_CLOSE: char = '}';

/// One unit of typed input: produces exactly one HID report and one release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeystrokeGroup {
    /// A single plain character, looked up by its own text.
    Char(char),
    /// A `+`-joined combo taken from an escape, whitespace already stripped.
    Combo(String),
}

impl KeystrokeGroup {
    /// Returns the key names making up this group, in the order written.
    ///
    /// A plain character is always a single key, even when it is `+`.
    pub fn keys(&self) -> Vec<String> {
        match self {
            KeystrokeGroup::Char(c) => vec![c.to_string()],
            KeystrokeGroup::Combo(combo) => combo.split('+').map(str::to_string).collect(),
        }
    }
}

impl fmt::Display for KeystrokeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.keys().join(" + "))
    }
}

/// Splits `text` into keystroke groups in typing order.
pub fn parse_keystrokes(text: &str) -> Vec<KeystrokeGroup> {
    let mut groups = Vec::with_capacity(text.len());
    let mut pos = 0;

    while pos < text.len() {
        match find_escape(text, pos) {
            Some((start, body, end)) => {
                groups.extend(text[pos..start].chars().map(KeystrokeGroup::Char));
                let combo: String = body.chars().filter(|c| !c.is_whitespace()).collect();
                groups.push(KeystrokeGroup::Combo(combo));
                pos = end;
            }
            None => {
                groups.extend(text[pos..].chars().map(KeystrokeGroup::Char));
                break;
            }
        }
    }

    groups
}

/// Finds the first complete escape at or after `from`.
///
/// Returns `(start, body, end)` where `start` is the index of `{`, `body` is
/// the text between `{KEY:` and `}`, and `end` is the index just past `}`.
fn find_escape(text: &str, from: usize) -> Option<(usize, &str, usize)> {
    let mut search = from;
    while let Some(offset) = text[search..].find(ESCAPE_OPEN) {
        let start = search + offset;
        let body_start = start + ESCAPE_OPEN.len();
        let rest = &text[body_start..];

        match rest.find([ESCAPE_CLOSE, '\n']) {
            Some(close) if rest[close..].starts_with(ESCAPE_CLOSE) => {
                let end = body_start + close + ESCAPE_CLOSE.len_utf8();
                return Some((start, &rest[..close], end));
            }
            // Hit a line break first; this candidate cannot match.
            Some(_) => search = start + 1,
            None => return None,
        }
    }
    None
}

// ── Tests ─────────────────────────────────────────────────────────────────────
