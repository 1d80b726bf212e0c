//! Keyboard: types text on the target through a HID report sink.
//!
//! This use case sits at the application layer and delegates the actual
//! device write to a [`ReportSink`] trait object.  The `/dev/hidg0` writer
//! lives in the infrastructure layer; tests inject a recording mock.
//!
//! # Typing pipeline
//!
//! ```text
//! "ab{KEY:WIN+r}c"
//!     │ parse_keystrokes
//!     ▼
//! [a] [b] [WIN+r] [c]          one keystroke group each
//!     │ HidReport::build
//!     ▼
//! 8-byte report ──▶ sink.write_report()  (data frame + release frame)
//!     │
//!     ▼
//! clock.sleep(delay)           after every group, including the last
//! ```
//!
//! A failing group aborts the whole `send()` call.  Groups already written
//! stay written; the device has no way to take keystrokes back.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use pirate_core::{
    keystroke_delay, keystroke_log_line, parse_keystrokes, EncodeError, HidReport, Keymap,
    KeymapError,
};
use thiserror::Error;
use tracing::debug;

/// Errors raised while opening or writing a device file.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The device path does not exist (gadget not configured?).
    #[error("device path '{}' not found", path.display())]
    NotFound { path: PathBuf },

    /// The device exists but cannot be opened by this user.
    #[error("permission denied for device path '{}'", path.display())]
    PermissionDenied { path: PathBuf },

    /// Any other I/O failure.
    #[error("I/O error on device '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DeviceError {
    /// Classifies an `io::Error` raised while using `path`.
    pub fn from_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            io::ErrorKind::NotFound => DeviceError::NotFound { path },
            io::ErrorKind::PermissionDenied => DeviceError::PermissionDenied { path },
            _ => DeviceError::Io { path, source },
        }
    }
}

/// Errors from [`Keyboard`] construction and [`Keyboard::send`].
#[derive(Debug, Error)]
pub enum KeyboardError {
    #[error(transparent)]
    Keymap(#[from] KeymapError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Device(#[from] DeviceError),
}

/// Destination for HID reports.
///
/// Each call must deliver the data frame followed by the all-zero release
/// frame before returning.
pub trait ReportSink: Send + Sync {
    fn write_report(&self, report: &HidReport) -> Result<(), DeviceError>;
}

/// Source of delays between keystrokes.
pub trait Clock: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// [`Clock`] backed by `std::thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Resolved per-instance keyboard settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyboardSettings {
    /// Default typing speed, used when `send()` gets no override.
    pub wpm: u32,
    /// Emit one debug line per keystroke group.
    pub log_keystrokes: bool,
    /// Dry-run mode: reports are built but never handed to the sink.
    pub disabled: bool,
}

impl Default for KeyboardSettings {
    fn default() -> Self {
        Self {
            wpm: 200,
            log_keystrokes: false,
            disabled: false,
        }
    }
}

/// The keyboard use case.
pub struct Keyboard {
    keymap: Keymap,
    sink: Arc<dyn ReportSink>,
    clock: Arc<dyn Clock>,
    settings: KeyboardSettings,
    keystrokes: u64,
}

impl Keyboard {
    /// Creates a keyboard with a loaded keymap and injected collaborators.
    pub fn new(
        keymap: Keymap,
        sink: Arc<dyn ReportSink>,
        clock: Arc<dyn Clock>,
        settings: KeyboardSettings,
    ) -> Self {
        Self {
            keymap,
            sink,
            clock,
            settings,
            keystrokes: 0,
        }
    }

    /// Types `text`, pacing keystrokes at `wpm` (or the instance default).
    ///
    /// # Errors
    ///
    /// - [`KeyboardError::Encode`] for an unknown key or an overfull combo.
    ///   Nothing is written for the failing group.
    /// - [`KeyboardError::Device`] if the sink cannot be written.
    pub fn send(&mut self, text: &str, wpm: Option<u32>) -> Result<(), KeyboardError> {
        let delay = keystroke_delay(wpm.unwrap_or(self.settings.wpm));

        for group in parse_keystrokes(text) {
            self.keystrokes += 1;
            let report = HidReport::build(&group, &self.keymap)?;

            if self.settings.log_keystrokes {
                debug!("{}", keystroke_log_line(self.keystrokes, &report, &group));
            }

            if !self.settings.disabled {
                self.sink.write_report(&report)?;
            }

            self.clock.sleep(delay);
        }

        Ok(())
    }

    /// Number of keystroke groups processed by this instance so far.
    pub fn keystroke_count(&self) -> u64 {
        self.keystrokes
    }

    pub fn settings(&self) -> &KeyboardSettings {
        &self.settings
    }

    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
