//! `/dev/hidgN` report writer.
//!
//! The Linux USB gadget HID function exposes a character device per
//! interface.  Writing 8 bytes to it sends one boot-protocol keyboard report
//! to the host.  The device is opened per report (read+write, never
//! truncated or created) and closed again immediately, so a gadget that is
//! re-bound between keystrokes is picked up on the next write.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use pirate_core::{HidReport, Keymap};
use tracing::debug;

use crate::application::keyboard::{
    DeviceError, Keyboard, KeyboardError, KeyboardSettings, ReportSink, SystemClock,
};
use crate::infrastructure::storage::config::PirateConfig;

/// HID gadget character device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HidGadget {
    path: PathBuf,
}

impl HidGadget {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReportSink for HidGadget {
    /// Opens the device, writes the report then the release frame.
    fn write_report(&self, report: &HidReport) -> Result<(), DeviceError> {
        let mut device = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.path)
            .map_err(|e| DeviceError::from_io(&self.path, e))?;

        device
            .write_all(report.as_bytes())
            .and_then(|()| device.write_all(HidReport::RELEASE.as_bytes()))
            .map_err(|e| DeviceError::from_io(&self.path, e))
    }
}

/// Per-call overrides for [`open_keyboard`].  `None` means "use configuration".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyboardOptions {
    pub path: Option<PathBuf>,
    pub layout: Option<String>,
    pub wpm: Option<u32>,
    pub log_keystrokes: Option<bool>,
    pub disabled: Option<bool>,
}

/// Builds a [`Keyboard`] writing to a [`HidGadget`].
///
/// Each setting resolves as override, then configuration (whose own
/// defaults cover absent keys).
///
/// # Errors
///
/// Returns [`KeyboardError::Keymap`] if the layout is not bundled.
pub fn open_keyboard(
    options: KeyboardOptions,
    config: &PirateConfig,
) -> Result<Keyboard, KeyboardError> {
    let path = options
        .path
        .unwrap_or_else(|| PathBuf::from(&config.keyboard.path));
    let layout = options
        .layout
        .unwrap_or_else(|| config.keyboard.layout.clone());
    let settings = KeyboardSettings {
        wpm: options.wpm.unwrap_or(config.keyboard.wpm),
        log_keystrokes: options
            .log_keystrokes
            .unwrap_or(config.keyboard.log_keystrokes),
        disabled: options.disabled.unwrap_or(config.dev.disable_keyboard),
    };

    let keymap = Keymap::load(&layout)?;
    if settings.disabled {
        debug!("Keyboard disabled in config. Reports will not be written.");
    }
    debug!(
        "keyboard ready: device={}, layout={}, wpm={}",
        path.display(),
        layout,
        settings.wpm
    );

    Ok(Keyboard::new(
        keymap,
        Arc::new(HidGadget::new(path)),
        Arc::new(SystemClock),
        settings,
    ))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pirate_core::KeymapError;
    use uuid::Uuid;

    fn temp_device() -> PathBuf {
        let path = std::env::temp_dir().join(format!("pirate_hidg_{}", Uuid::new_v4()));
        std::fs::write(&path, b"").unwrap();
        path
    }

    #[test]
    fn test_write_report_appends_data_then_release() {
        // Arrange
        let path = temp_device();
        let gadget = HidGadget::new(&path);
        let report = HidReport::from_bytes([0x08, 0, 0x15, 0, 0, 0, 0, 0]);

        // Act
        gadget.write_report(&report).unwrap();

        // Assert
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes, [[0x08, 0, 0x15, 0, 0, 0, 0, 0], [0u8; 8]].concat());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_missing_device_is_not_found() {
        let gadget = HidGadget::new("/nonexistent/hidg0");
        let result = gadget.write_report(&HidReport::RELEASE);
        match result {
            Err(DeviceError::NotFound { path }) => assert_eq!(path, PathBuf::from("/nonexistent/hidg0")),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_open_keyboard_uses_config_when_no_overrides() {
        let mut config = PirateConfig::default();
        config.keyboard.wpm = 321;
        config.dev.disable_keyboard = true;

        let kb = open_keyboard(KeyboardOptions::default(), &config).unwrap();

        assert_eq!(kb.settings().wpm, 321);
        assert!(kb.settings().disabled);
        assert_eq!(kb.keymap().layout(), "us");
    }

    #[test]
    fn test_open_keyboard_overrides_beat_config() {
        let mut config = PirateConfig::default();
        config.dev.disable_keyboard = true;
        let options = KeyboardOptions {
            wpm: Some(50),
            disabled: Some(false),
            log_keystrokes: Some(true),
            ..Default::default()
        };

        let kb = open_keyboard(options, &config).unwrap();

        assert_eq!(
            kb.settings(),
            &KeyboardSettings { wpm: 50, log_keystrokes: true, disabled: false }
        );
    }

    #[test]
    fn test_open_keyboard_unknown_layout_is_resource_not_found() {
        let options = KeyboardOptions {
            layout: Some("dvorak-xx".to_string()),
            ..Default::default()
        };

        let result = open_keyboard(options, &PirateConfig::default());

        assert!(matches!(
            result,
            Err(KeyboardError::Keymap(KeymapError::LayoutNotFound(ref l))) if l == "dvorak-xx"
        ));
    }
}
