//! Storage infrastructure: configuration file loading.
//!
//! The `config` sub-module handles:
//!
//! - Locating the TOML configuration file (explicit flag, `PIRATE_CONFIG`,
//!   the on-device `/config` mount, then the user config directory).
//! - Deserializing it into [`config::PirateConfig`] with per-field defaults.
//! - Falling back to defaults, with a warning, when the file is missing or
//!   unreadable.  A bad config file is never fatal.

pub mod config;
