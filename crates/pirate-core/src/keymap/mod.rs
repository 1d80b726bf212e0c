//! Keyboard layout resources.
//!
//! A [`Keymap`] maps a key name to the two bytes needed to press it on a USB
//! boot-protocol keyboard: a modifier bitmask (byte 0 of the report) and a
//! HID Usage ID (one of the six keycode slots).
//!
//! Layouts are JSON objects shipped inside the binary:
//!
//! ```json
//! { "a": ["00", "04"], "A": ["02", "04"], "WIN": ["08", "00"] }
//! ```
//!
//! Each value is `[modifier_hex, keycode_hex]`, two hex digits apiece.
//! Modifier-only keys such as `WIN` carry keycode `00`.
//!
//! # Why strings and not numbers?
//!
//! Layout files are written by hand against the USB HID Usage Tables, which
//! list every code in hex.  Keeping the hex text in the file makes a layout
//! easy to check against the tables; the loader converts it once, up front.

pub mod layouts;

use std::collections::HashMap;

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur while loading a layout.
#[derive(Debug, Error, PartialEq)]
pub enum KeymapError {
    /// No layout resource exists for the requested identifier.
    #[error("keyboard layout '{0}' not found")]
    LayoutNotFound(String),

    /// The layout resource is not a JSON object of `[modifier, keycode]` pairs.
    #[error("layout '{layout}' is malformed: {reason}")]
    Parse { layout: String, reason: String },

    /// A modifier or keycode is not exactly two hex digits.
    #[error("layout '{layout}' has an invalid entry for key '{key}': '{value}' is not a 2-digit hex byte")]
    InvalidEntry {
        layout: String,
        key: String,
        value: String,
    },
}

/// The modifier byte and keycode for a single key name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEntry {
    /// Bits ORed into report byte 0 (e.g. `0x02` for Left Shift).
    pub modifier: u8,
    /// HID Usage ID placed into a keycode slot; `0x00` for modifier-only keys.
    pub keycode: u8,
}

/// On-disk shape of a layout file.
#[derive(Deserialize)]
#[serde(transparent)]
struct RawLayout(HashMap<String, (String, String)>);

/// An immutable key-name → [`KeyEntry`] table.
///
/// Key names are case-sensitive: `"a"` and `"A"` are different keys (the
/// latter carries the Shift modifier in the bundled layouts).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Keymap {
    layout: String,
    entries: HashMap<String, KeyEntry>,
}

impl Keymap {
    /// Loads one of the layouts bundled with the binary (see [`layouts::AVAILABLE`]).
    ///
    /// # Errors
    ///
    /// Returns [`KeymapError::LayoutNotFound`] if `layout` is not bundled, or a
    /// parse error if the bundled resource is malformed.
    pub fn load(layout: &str) -> Result<Self, KeymapError> {
        let text = layouts::resource(layout)
            .ok_or_else(|| KeymapError::LayoutNotFound(layout.to_string()))?;
        Self::from_json(layout, text)
    }

    /// Parses a layout from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`KeymapError::Parse`] for malformed JSON and
    /// [`KeymapError::InvalidEntry`] for any value that is not a 2-digit hex byte.
    pub fn from_json(layout: &str, text: &str) -> Result<Self, KeymapError> {
        let raw: RawLayout = serde_json::from_str(text).map_err(|e| KeymapError::Parse {
            layout: layout.to_string(),
            reason: e.to_string(),
        })?;

        let mut entries = HashMap::with_capacity(raw.0.len());
        for (key, (modifier, keycode)) in raw.0 {
            let modifier = parse_hex_byte(layout, &key, &modifier)?;
            let keycode = parse_hex_byte(layout, &key, &keycode)?;
            entries.insert(key, KeyEntry { modifier, keycode });
        }

        Ok(Self {
            layout: layout.to_string(),
            entries,
        })
    }

    /// Builds a keymap directly from entries.  Mostly useful in tests.
    pub fn from_entries<I, K>(layout: &str, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, KeyEntry)>,
        K: Into<String>,
    {
        Self {
            layout: layout.to_string(),
            entries: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// The layout identifier this keymap was loaded from.
    pub fn layout(&self) -> &str {
        &self.layout
    }

    /// Looks up a key by name.
    pub fn get(&self, name: &str) -> Option<KeyEntry> {
        self.entries.get(name).copied()
    }

    /// Returns `true` if the keymap defines `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of key names defined.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no key names are defined.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_hex_byte(layout: &str, key: &str, value: &str) -> Result<u8, KeymapError> {
    let invalid = || KeymapError::InvalidEntry {
        layout: layout.to_string(),
        key: key.to_string(),
        value: value.to_string(),
    };
    if value.len() != 2 || !value.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    u8::from_str_radix(value, 16).map_err(|_| invalid())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
