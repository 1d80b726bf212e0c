//! Integration tests for the keyboard use case and the HID gadget device.
//!
//! The gadget tests use a plain temp file in place of `/dev/hidg0`: the
//! device protocol is nothing more than 8-byte writes.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pirate::application::keyboard::{
    Clock, DeviceError, Keyboard, KeyboardError, KeyboardSettings,
};
use pirate::infrastructure::hid_gadget::{open_keyboard, KeyboardOptions, MockReportSink};
use pirate::infrastructure::storage::config::PirateConfig;
use pirate_core::{EncodeError, Keymap};

// ── Helpers ──────────────────────────────────────────────────────────────────

#[derive(Default)]
struct RecordingClock {
    sleeps: Mutex<Vec<Duration>>,
}

impl Clock for RecordingClock {
    fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

fn us_keyboard(
    settings: KeyboardSettings,
) -> (Keyboard, Arc<MockReportSink>, Arc<RecordingClock>) {
    let sink = Arc::new(MockReportSink::new());
    let clock = Arc::new(RecordingClock::default());
    let keyboard = Keyboard::new(
        Keymap::load("us").unwrap(),
        Arc::clone(&sink) as _,
        Arc::clone(&clock) as _,
        settings,
    );
    (keyboard, sink, clock)
}

fn temp_device() -> PathBuf {
    let path = std::env::temp_dir().join(format!("pirate-hidg-{}", uuid::Uuid::new_v4()));
    std::fs::write(&path, b"").unwrap();
    path
}

// ── Keyboard over a mock sink ────────────────────────────────────────────────

#[test]
fn test_hotkey_escape_between_characters() {
    // Arrange
    let (mut keyboard, sink, clock) = us_keyboard(KeyboardSettings::default());

    // Act
    keyboard.send("ab{KEY:WIN+r}c", None).unwrap();

    // Assert: four groups, each a data frame then a release
    let release = [0u8; 8];
    assert_eq!(
        sink.frames(),
        vec![
            [0x00, 0, 0x04, 0, 0, 0, 0, 0],
            release,
            [0x00, 0, 0x05, 0, 0, 0, 0, 0],
            release,
            [0x08, 0, 0x15, 0, 0, 0, 0, 0],
            release,
            [0x00, 0, 0x06, 0, 0, 0, 0, 0],
            release,
        ]
    );
    assert_eq!(clock.sleeps.lock().unwrap().len(), 4);
    assert_eq!(keyboard.keystroke_count(), 4);
}

#[test]
fn test_shifted_character_sets_shift_modifier() {
    let (mut keyboard, sink, _clock) = us_keyboard(KeyboardSettings::default());

    keyboard.send("|", None).unwrap();

    assert_eq!(sink.frames()[0], [0x02, 0, 0x31, 0, 0, 0, 0, 0]);
}

#[test]
fn test_disabled_keyboard_never_writes_but_still_paces() {
    // Arrange
    let settings = KeyboardSettings {
        disabled: true,
        ..Default::default()
    };
    let (mut keyboard, sink, clock) = us_keyboard(settings);

    // Act
    keyboard.send("hello", None).unwrap();

    // Assert
    assert!(sink.frames().is_empty());
    assert_eq!(clock.sleeps.lock().unwrap().len(), 5);
    assert_eq!(keyboard.keystroke_count(), 5);
}

#[test]
fn test_per_call_wpm_is_clamped() {
    // Arrange
    let (mut keyboard, _sink, clock) = us_keyboard(KeyboardSettings::default());

    // Act
    keyboard.send("a", Some(1)).unwrap();
    keyboard.send("a", Some(1_000_000)).unwrap();
    keyboard.send("a", None).unwrap();

    // Assert
    assert_eq!(
        *clock.sleeps.lock().unwrap(),
        vec![
            Duration::from_secs_f64(60.0 / 50.0),
            Duration::from_secs_f64(60.0 / 5000.0),
            Duration::from_secs_f64(60.0 / 1000.0),
        ]
    );
}

#[test]
fn test_unknown_key_stops_before_writing_it() {
    // Arrange
    let (mut keyboard, sink, _clock) = us_keyboard(KeyboardSettings::default());

    // Act
    let err = keyboard.send("a{KEY:HYPER}b", None).unwrap_err();

    // Assert: only `a` reached the device
    assert!(matches!(
        err,
        KeyboardError::Encode(EncodeError::UnknownKey(ref key)) if key == "HYPER"
    ));
    assert_eq!(sink.frames().len(), 2);
}

#[test]
fn test_sink_failure_surfaces_as_device_error() {
    // Arrange
    let sink = Arc::new(MockReportSink::failing());
    let mut keyboard = Keyboard::new(
        Keymap::load("us").unwrap(),
        sink,
        Arc::new(RecordingClock::default()),
        KeyboardSettings::default(),
    );

    // Act
    let err = keyboard.send("a", None).unwrap_err();

    // Assert
    assert!(matches!(
        err,
        KeyboardError::Device(DeviceError::PermissionDenied { .. })
    ));
}

// ── Real gadget writer ───────────────────────────────────────────────────────

#[test]
fn test_gadget_writes_report_and_release_to_device_file() {
    // Arrange
    let device = temp_device();
    let options = KeyboardOptions {
        path: Some(device.clone()),
        wpm: Some(5000),
        ..Default::default()
    };
    let mut keyboard = open_keyboard(options, &PirateConfig::default()).unwrap();

    // Act
    keyboard.send("{KEY:CTRL+ALT+t}", None).unwrap();

    // Assert
    let written = std::fs::read(&device).unwrap();
    std::fs::remove_file(&device).ok();
    assert_eq!(
        written,
        vec![0x05, 0, 0x17, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]
    );
}

#[test]
fn test_missing_gadget_device_is_not_found() {
    // Arrange
    let device = std::env::temp_dir().join(format!("pirate-missing-{}", uuid::Uuid::new_v4()));
    let options = KeyboardOptions {
        path: Some(device.clone()),
        wpm: Some(5000),
        ..Default::default()
    };
    let mut keyboard = open_keyboard(options, &PirateConfig::default()).unwrap();

    // Act
    let err = keyboard.send("a", None).unwrap_err();

    // Assert
    assert!(matches!(
        err,
        KeyboardError::Device(DeviceError::NotFound { ref path }) if *path == device
    ));
}

#[test]
fn test_unknown_layout_is_rejected_at_open() {
    let options = KeyboardOptions {
        layout: Some("klingon".to_string()),
        ..Default::default()
    };

    let result = open_keyboard(options, &PirateConfig::default());

    assert!(matches!(result, Err(KeyboardError::Keymap(_))));
}
