//! PiRate entry point.
//!
//! Runs on a Raspberry Pi configured as a USB composite gadget (HID keyboard
//! plus CDC-ACM serial).  A payload types a stager into the attached host,
//! then this process relays the local terminal to the shell the stager
//! started on the other end of the serial link.
//!
//! # Usage
//!
//! ```text
//! pirate [--config PATH] <COMMAND>
//!
//! Commands:
//!   version                 Print the PiRate version
//!   payloads                List built-in payloads
//!   execute <PAYLOAD>       Run a payload, e.g. macos.serial_shell
//!   config <SECTION> <KEY>  Print a resolved configuration value
//! ```
//!
//! # Configuration lookup
//!
//! The first existing file wins:
//!
//! | Source                                   | Notes                       |
//! |------------------------------------------|-----------------------------|
//! | `--config PATH`                          | Used even if missing        |
//! | `$PIRATE_CONFIG`                         | Only if the file exists     |
//! | `/config/pirate.toml`                    | Device image default        |
//! | `$XDG_CONFIG_HOME/pirate/config.toml`    | Falls back to `~/.config`   |
//!
//! A missing or invalid file is reported as a warning and the built-in
//! defaults are used.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{debug, error, info};

use pirate::infrastructure::logging;
use pirate::infrastructure::storage::config::{load_config, PirateConfig};
use pirate::payloads::{self, resolve_payload, PayloadContext};

// ── CLI definition ────────────────────────────────────────────────────────────

/// Command-line arguments for `pirate`.
#[derive(Debug, Parser)]
#[command(
    name = "pirate",
    about = "USB HID keystroke injection and serial shell relay",
    version
)]
struct Cli {
    /// Configuration file to load instead of the default search path.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand, PartialEq, Eq)]
enum Command {
    /// Print the PiRate version.
    Version,

    /// List built-in payloads.
    Payloads,

    /// Run a payload by dotted name.
    Execute {
        /// Payload name, e.g. `macos.serial_shell`.
        payload: String,
    },

    /// Print a resolved configuration value.
    Config { section: String, key: String },
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> ExitCode {
    let log = logging::init();
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref());
    log.apply(&config.dev.log_level);

    match run(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if config.dev.stack_trace_errors {
                error!("Error: {err:?}");
            } else {
                error!("Error: {err}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command, config: &PirateConfig) -> anyhow::Result<()> {
    match command {
        Command::Version => {
            println!("{}", version());
            Ok(())
        }
        Command::Payloads => {
            for payload in payloads::available() {
                println!("{:<24} {}", payload.name(), payload.description());
            }
            Ok(())
        }
        Command::Execute { payload } => execute(&payload, config),
        Command::Config { section, key } => {
            let value = config
                .get(&section, &key)
                .with_context(|| format!("unknown setting '{section}.{key}'"))?;
            println!("{value}");
            Ok(())
        }
    }
}

fn execute(name: &str, config: &PirateConfig) -> anyhow::Result<()> {
    info!("Starting PiRate {}...", version());
    debug!("Developer logging enabled.");
    if config.dev.stack_trace_errors {
        debug!("Stack trace errors enabled.");
    }

    let payload = resolve_payload(name)?;
    info!("Executing payload '{name}'...");
    payload
        .execute(&PayloadContext { config })
        .with_context(|| format!("payload '{name}' failed"))?;
    info!("Payload complete.");
    Ok(())
}

fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// ── Tests ─────────────────────────────────────────────────────────────────────
