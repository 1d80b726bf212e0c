//! # pirate-core
//!
//! Shared library for PiRate containing the keystroke encoder, HID report
//! framing, typing-speed pacing, and the serial relay session state machine.
//!
//! This crate has zero dependencies on OS APIs, device files, or terminals.
//! Everything that touches `/dev/hidg0`, a serial port, or the local TTY lives
//! in the `pirate` crate; this crate only decides *what* bytes go where.
//!
//! # Architecture overview
//!
//! PiRate emulates a USB keyboard to type a short script on a target machine,
//! then attaches to a shell that script opens over a USB serial link.
//!
//! - **`keymap`** – Layout resources mapping key names (`"a"`, `"WIN"`,
//!   `"ENTER"`) to a modifier byte and a HID keycode.
//!
//! - **`keystroke`** – Splits text containing `{KEY:CTRL+ALT+t}` escapes into
//!   ordered keystroke groups.
//!
//! - **`report`** – Packs one keystroke group into an 8-byte boot-protocol
//!   keyboard report.
//!
//! - **`pacing`** – Converts words-per-minute into an inter-keystroke delay.
//!
//! - **`relay`** – The byte-relay session: sentinel marker detection and the
//!   control-character rules applied to local input.

pub mod keymap;
pub mod keystroke;
pub mod pacing;
pub mod relay;
pub mod report;

pub use keymap::{KeyEntry, Keymap, KeymapError};
pub use keystroke::{parse_keystrokes, KeystrokeGroup};
pub use pacing::keystroke_delay;
pub use relay::{
    marker::{MarkerScanner, DONE_MARKER},
    session::{InputAction, RelaySession, RelayState, SerialStep, SessionEnd, SessionError},
};
pub use report::{keystroke_log_line, EncodeError, HidReport};
