//! Built-in payloads.
//!
//! A payload is a scripted sequence for one target OS: keystrokes to type,
//! pauses while the target reacts, and usually a serial session at the end.
//! Payloads are looked up by dotted name, `<os>.<name>`, e.g.
//! `macos.serial_shell`.

pub mod macos;

use thiserror::Error;

use crate::infrastructure::storage::config::PirateConfig;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PayloadError {
    #[error("No payload named '{0}'")]
    NotFound(String),
}

/// Everything a payload needs from the running process.
pub struct PayloadContext<'a> {
    pub config: &'a PirateConfig,
}

/// A runnable payload.
pub trait Payload {
    /// Dotted name used on the command line.
    fn name(&self) -> &'static str;

    /// One-line summary for listings.
    fn description(&self) -> &'static str;

    /// Runs the payload to completion.
    fn execute(&self, ctx: &PayloadContext<'_>) -> anyhow::Result<()>;
}

/// Every built-in payload.
pub fn available() -> Vec<Box<dyn Payload>> {
    vec![Box::new(macos::SerialShell::default())]
}

/// Looks up a payload by its dotted name.
///
/// # Errors
///
/// Returns [`PayloadError::NotFound`] for an unknown name.
pub fn resolve_payload(name: &str) -> Result<Box<dyn Payload>, PayloadError> {
    available()
        .into_iter()
        .find(|p| p.name() == name)
        .ok_or_else(|| PayloadError::NotFound(name.to_string()))
}
