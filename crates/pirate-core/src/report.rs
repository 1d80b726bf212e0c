//! USB HID boot-protocol keyboard reports.
//!
//! Report layout (8 bytes):
//! ```text
//! [modifiers:1][reserved:1][key1][key2][key3][key4][key5][key6]
//! ```
//!
//! - Byte 0 is the bitwise OR of every modifier in the keystroke group.
//! - Byte 1 is reserved and always `0x00`.
//! - Bytes 2–7 are keycode slots, filled left to right; `0x00` means empty.
//!
//! Every data report is followed on the wire by [`HidReport::RELEASE`], an
//! all-zero report that lifts every key.
//!
//! # Modifier-only keys
//!
//! Keys such as `WIN` have keycode `0x00`.  Writing `0x00` into a slot leaves it
//! empty, so `WIN+r` packs as `08 00 15 00 00 00 00 00`: the `r` lands in the
//! first slot.  A group still overflows if a key arrives when all six slots are
//! occupied, even if that key would only have contributed a modifier.

use std::fmt;

use thiserror::Error;

use crate::keymap::Keymap;
use crate::keystroke::KeystrokeGroup;

/// Size of a boot-protocol keyboard report in bytes.
pub const REPORT_LEN: usize = 8;
/// Index of the first keycode slot.
const FIRST_SLOT: usize = 2;

/// Errors that can occur while packing a keystroke group.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    /// The group names a key that is not in the loaded keymap.
    #[error("key '{0}' not found in keymap")]
    UnknownKey(String),

    /// More keys than free keycode slots.
    #[error("too many keys in report ({keys}): HID report holds at most 6 keycodes")]
    ReportOverflow { keys: usize },
}

/// One 8-byte keyboard report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct HidReport([u8; REPORT_LEN]);

impl HidReport {
    /// The all-zero "every key up" report.
    pub const RELEASE: HidReport = HidReport([0; REPORT_LEN]);

    /// Wraps raw report bytes.
    pub const fn from_bytes(bytes: [u8; REPORT_LEN]) -> Self {
        Self(bytes)
    }

    /// Packs one keystroke group using `keymap`.
    ///
    /// # Errors
    ///
    /// - [`EncodeError::UnknownKey`] if a key name is missing from `keymap`.
    /// - [`EncodeError::ReportOverflow`] if no empty slot remains for a key.
    pub fn build(group: &KeystrokeGroup, keymap: &Keymap) -> Result<Self, EncodeError> {
        let keys = group.keys();
        let mut bytes = [0u8; REPORT_LEN];

        for key in &keys {
            let entry = keymap
                .get(key)
                .ok_or_else(|| EncodeError::UnknownKey(key.clone()))?;

            bytes[0] |= entry.modifier;

            let slot = bytes[FIRST_SLOT..]
                .iter_mut()
                .find(|slot| **slot == 0)
                .ok_or(EncodeError::ReportOverflow { keys: keys.len() })?;
            *slot = entry.keycode;
        }

        Ok(Self(bytes))
    }

    /// The raw report bytes.
    pub fn as_bytes(&self) -> &[u8; REPORT_LEN] {
        &self.0
    }

    /// Modifier bitmask (byte 0).
    pub fn modifiers(&self) -> u8 {
        self.0[0]
    }

    /// The six keycode slots (bytes 2–7).
    pub fn keycodes(&self) -> &[u8] {
        &self.0[FIRST_SLOT..]
    }
}

impl fmt::Display for HidReport {
    /// Uppercase hex pairs separated by single spaces, e.g. `08 00 15 00 00 00 00 00`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{byte:02X}")?;
        }
        Ok(())
    }
}

/// Formats the per-keystroke log line: counter, report hexdump, key names.
///
/// ```rust
/// use pirate_core::{keystroke_log_line, HidReport, KeystrokeGroup};
///
/// let report = HidReport::from_bytes([0, 0, 0x04, 0, 0, 0, 0, 0]);
/// let line = keystroke_log_line(1, &report, &KeystrokeGroup::Char('a'));
/// assert_eq!(line, "00001  00 00 04 00 00 00 00 00  a");
/// ```
pub fn keystroke_log_line(counter: u64, report: &HidReport, group: &KeystrokeGroup) -> String {
    format!("{counter:05}  {report}  {group}")
}

// ── Tests ─────────────────────────────────────────────────────────────────────
