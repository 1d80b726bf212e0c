//! TOML-based configuration for PiRate.
//!
//! The file is looked up in this order, first hit wins:
//!
//! 1. The `--config <PATH>` command-line flag.
//! 2. The `PIRATE_CONFIG` environment variable, if the file it names exists.
//! 3. `/config/pirate.toml` (the on-device location).
//! 4. `$XDG_CONFIG_HOME/pirate/config.toml` or `~/.config/pirate/config.toml`.
//!
//! Example:
//!
//! ```toml
//! [keyboard]
//! layout = "us"
//! wpm = 400
//! path = "/dev/hidg0"
//! log_keystrokes = true
//!
//! [serial]
//! path = "/dev/ttyGS0"
//! baud = 115200
//! newline = "crlf"
//!
//! [dev]
//! stack_trace_errors = false
//! log_level = "debug"
//! disable_keyboard = false
//! disable_serial = false
//! ```
//!
//! # Serde default values
//!
//! Every section and every field is optional.  Fields annotated with
//! `#[serde(default = "some_fn")]` use the return value of `some_fn()` when
//! absent, so an empty file behaves exactly like no file at all.
//!
//! # Invalid files
//!
//! A missing file, a path without the `.toml` extension, or content that does
//! not parse is reported with `warn!` and the whole configuration falls back
//! to defaults.  Startup never fails because of the config file.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "PIRATE_CONFIG";
/// Canonical on-device config location.
pub const DEVICE_CONFIG_PATH: &str = "/config/pirate.toml";
/// Required config file extension.
const CONFIG_EXTENSION: &str = "toml";

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// The path does not end in `.toml`.
    #[error("config path {} does not end with .toml", path.display())]
    UnsupportedExtension { path: PathBuf },
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PirateConfig {
    #[serde(default)]
    pub keyboard: KeyboardConfig,
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub dev: DevConfig,
}

/// `[keyboard]` section: HID gadget settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeyboardConfig {
    /// Bundled layout identifier, e.g. `"us"`.
    #[serde(default = "default_layout")]
    pub layout: String,
    /// Typing speed in words per minute (clamped to 10..=1000 when used).
    #[serde(default = "default_wpm")]
    pub wpm: u32,
    /// HID gadget device node.
    #[serde(default = "default_keyboard_path")]
    pub path: String,
    /// Log one line per keystroke group at debug level.
    #[serde(default)]
    pub log_keystrokes: bool,
}

/// `[serial]` section: USB serial gadget settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SerialConfig {
    /// Serial gadget device node.
    #[serde(default = "default_serial_path")]
    pub path: String,
    #[serde(default = "default_baud")]
    pub baud: u32,
    #[serde(default)]
    pub newline: NewlineMode,
}

/// `[dev]` section: developer and test switches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DevConfig {
    /// Print the full error chain on failure instead of a one-line message.
    #[serde(default)]
    pub stack_trace_errors: bool,
    /// One of `success`, `info`, `warning`, `error`, `debug`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Build HID reports but never write them.
    #[serde(default)]
    pub disable_keyboard: bool,
    /// Make the serial relay a no-op.
    #[serde(default)]
    pub disable_serial: bool,
}

/// Line-ending convention of the remote shell.
///
/// Recorded for payloads that need it.  The relay itself forwards bytes
/// verbatim in every mode.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NewlineMode {
    #[default]
    Crlf,
    Lf,
    Cr,
}

impl NewlineMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            NewlineMode::Crlf => "crlf",
            NewlineMode::Lf => "lf",
            NewlineMode::Cr => "cr",
        }
    }
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_layout() -> String {
    "us".to_string()
}
fn default_wpm() -> u32 {
    200
}
fn default_keyboard_path() -> String {
    "/dev/hidg0".to_string()
}
fn default_serial_path() -> String {
    "/dev/ttyGS0".to_string()
}
fn default_baud() -> u32 {
    115_200
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for KeyboardConfig {
    fn default() -> Self {
        Self {
            layout: default_layout(),
            wpm: default_wpm(),
            path: default_keyboard_path(),
            log_keystrokes: false,
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            path: default_serial_path(),
            baud: default_baud(),
            newline: NewlineMode::default(),
        }
    }
}

impl Default for DevConfig {
    fn default() -> Self {
        Self {
            stack_trace_errors: false,
            log_level: default_log_level(),
            disable_keyboard: false,
            disable_serial: false,
        }
    }
}

// ── Accessor ──────────────────────────────────────────────────────────────────

/// A single typed setting, as returned by [`PirateConfig::get`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValue {
    Str(String),
    Int(i64),
    Bool(bool),
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Str(s) => f.write_str(s),
            ConfigValue::Int(i) => write!(f, "{i}"),
            ConfigValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl PirateConfig {
    /// Looks up a setting by section and key name.
    ///
    /// Returns `None` for an unknown section or key.
    pub fn get(&self, section: &str, key: &str) -> Option<ConfigValue> {
        use ConfigValue::{Bool, Int, Str};

        let value = match (section, key) {
            ("keyboard", "layout") => Str(self.keyboard.layout.clone()),
            ("keyboard", "wpm") => Int(i64::from(self.keyboard.wpm)),
            ("keyboard", "path") => Str(self.keyboard.path.clone()),
            ("keyboard", "log_keystrokes") => Bool(self.keyboard.log_keystrokes),
            ("serial", "path") => Str(self.serial.path.clone()),
            ("serial", "baud") => Int(i64::from(self.serial.baud)),
            ("serial", "newline") => Str(self.serial.newline.as_str().to_string()),
            ("dev", "stack_trace_errors") => Bool(self.dev.stack_trace_errors),
            ("dev", "log_level") => Str(self.dev.log_level.clone()),
            ("dev", "disable_keyboard") => Bool(self.dev.disable_keyboard),
            ("dev", "disable_serial") => Bool(self.dev.disable_serial),
            _ => return None,
        };
        Some(value)
    }

    /// Like [`get`](Self::get), falling back to `default` when absent.
    pub fn get_or(&self, section: &str, key: &str, default: ConfigValue) -> ConfigValue {
        self.get(section, key).unwrap_or(default)
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Reads and parses one config file.
///
/// # Errors
///
/// - [`ConfigError::UnsupportedExtension`] if `path` does not end in `.toml`.
/// - [`ConfigError::Io`] if the file cannot be read.
/// - [`ConfigError::Parse`] if the TOML is malformed or a value has the wrong type.
pub fn load_config_from(path: &Path) -> Result<PirateConfig, ConfigError> {
    if path.extension().and_then(|e| e.to_str()) != Some(CONFIG_EXTENSION) {
        return Err(ConfigError::UnsupportedExtension {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolves and loads the configuration, never failing.
///
/// Any problem is logged at `warn` level and defaults are returned.
pub fn load_config(explicit: Option<&Path>) -> PirateConfig {
    let Some(path) = resolve_config_path(explicit) else {
        warn!("No config file found. Loading defaults...");
        return PirateConfig::default();
    };

    match load_config_from(&path) {
        Ok(config) => {
            debug!("loaded config from {}", path.display());
            config
        }
        Err(e) => {
            warn!("{e}. Loading defaults...");
            PirateConfig::default()
        }
    }
}

/// Returns the config path to use, or `None` if no candidate exists.
///
/// An explicit path is returned even when it does not exist, so the caller
/// reports it instead of silently picking another file.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    search_paths(std::env::var_os(CONFIG_ENV), user_config_path())
        .into_iter()
        .find(|p| p.exists())
}

/// Candidate locations in priority order.
fn search_paths(env: Option<OsString>, user: Option<PathBuf>) -> Vec<PathBuf> {
    let mut paths = Vec::with_capacity(3);
    if let Some(env) = env.filter(|v| !v.is_empty()) {
        paths.push(PathBuf::from(env));
    }
    paths.push(PathBuf::from(DEVICE_CONFIG_PATH));
    if let Some(user) = user {
        paths.push(user);
    }
    paths
}

/// `$XDG_CONFIG_HOME/pirate/config.toml`, else `~/.config/pirate/config.toml`.
fn user_config_path() -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
    Some(base.join("pirate").join("config.toml"))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
