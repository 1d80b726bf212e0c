//! Mock report sink for testing.
//!
//! The real [`HidGadget`](super::HidGadget) needs a configured USB gadget.
//! `MockReportSink` replaces the device write with in-memory recording: every
//! frame is pushed into a `Mutex<Vec<...>>` so test assertions can inspect
//! exactly what would have reached the host, and in what order.
//!
//! # Usage in tests
//!
//! ```ignore
//! let sink = Arc::new(MockReportSink::new());
//! let mut kb = Keyboard::new(keymap, Arc::clone(&sink), clock, settings);
//!
//! kb.send("a", None).unwrap();
//!
//! // One data frame plus one release frame.
//! assert_eq!(sink.frames().len(), 2);
//! ```
//!
//! # `should_fail` flag
//!
//! Set `should_fail = true` to make every write return
//! [`DeviceError::PermissionDenied`], exercising error paths without a
//! misconfigured device.

use std::path::PathBuf;
use std::sync::Mutex;

use pirate_core::HidReport;

use crate::application::keyboard::{DeviceError, ReportSink};

/// A sink that records frames without touching any device.
#[derive(Default)]
pub struct MockReportSink {
    /// Every frame written, release frames included.
    pub frames: Mutex<Vec<[u8; 8]>>,
    /// When `true`, every write fails with `PermissionDenied`.
    pub should_fail: bool,
}

impl MockReportSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose writes always fail.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// Snapshot of the recorded frames.
    pub fn frames(&self) -> Vec<[u8; 8]> {
        self.frames
            .lock()
            .map(|f| f.clone())
            .unwrap_or_default()
    }
}

impl ReportSink for MockReportSink {
    fn write_report(&self, report: &HidReport) -> Result<(), DeviceError> {
        if self.should_fail {
            return Err(DeviceError::PermissionDenied {
                path: PathBuf::from("mock"),
            });
        }
        if let Ok(mut frames) = self.frames.lock() {
            frames.push(*report.as_bytes());
            frames.push(*HidReport::RELEASE.as_bytes());
        }
        Ok(())
    }
}
