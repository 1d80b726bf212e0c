//! Logging setup.
//!
//! Output goes through a `tracing-subscriber` `fmt` layer.  The filter sits
//! behind a `reload` layer: logging starts at `info` so config loading can
//! report problems, then [`LogHandle::apply`] switches to the configured
//! `dev.log_level`.  A `RUST_LOG` value in the environment always wins and is
//! never replaced.

use std::str::FromStr;

use thiserror::Error;
use tracing::level_filters::LevelFilter;
use tracing::{debug, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

#[derive(Debug, Error, PartialEq, Eq)]
#[error("the level '{0}' is not a valid log level")]
pub struct InvalidLogLevel(pub String);

/// Log levels accepted in `dev.log_level`.
///
/// `Success` marks milestones such as "Connected!" and "Payload complete."
/// and is emitted at `INFO`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Success,
    Info,
    Warning,
    Error,
    Debug,
}

impl LogLevel {
    pub fn level_filter(&self) -> LevelFilter {
        match self {
            LogLevel::Success | LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warning => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Debug => LevelFilter::DEBUG,
        }
    }
}

impl FromStr for LogLevel {
    type Err = InvalidLogLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "success" => Ok(LogLevel::Success),
            "info" => Ok(LogLevel::Info),
            "warning" | "warn" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            "debug" => Ok(LogLevel::Debug),
            _ => Err(InvalidLogLevel(s.to_string())),
        }
    }
}

/// Handle for adjusting the global log filter after startup.
pub struct LogHandle {
    reload: reload::Handle<EnvFilter, Registry>,
    env_override: bool,
}

impl LogHandle {
    /// Applies a `dev.log_level` string.
    ///
    /// Unknown levels are reported and leave the current filter in place.
    pub fn apply(&self, level: &str) {
        match level.parse::<LogLevel>() {
            Ok(level) => self.set_level(level),
            Err(e) => warn!("{e}. Keeping current log level."),
        }
    }

    /// Switches the filter to `level` unless `RUST_LOG` is set.
    pub fn set_level(&self, level: LogLevel) {
        if self.env_override {
            debug!("RUST_LOG is set; ignoring configured log level {level:?}");
            return;
        }
        let filter = EnvFilter::default().add_directive(level.level_filter().into());
        if let Err(e) = self.reload.reload(filter) {
            warn!("failed to change log level: {e}");
        }
    }
}

/// Installs the global subscriber at `info` (or `RUST_LOG`).
///
/// Calling this more than once keeps the first subscriber; the returned handle
/// then has no effect on output.
pub fn init() -> LogHandle {
    let env_filter = EnvFilter::try_from_default_env().ok();
    let env_override = env_filter.is_some();
    let filter = env_filter.unwrap_or_else(|| EnvFilter::new("info"));

    let (filter, reload) = reload::Layer::new(filter);
    if let Err(e) = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init()
    {
        debug!("global subscriber already installed: {e}");
    }

    LogHandle {
        reload,
        env_override,
    }
}
