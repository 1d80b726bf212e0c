//! SerialConsole: relays the local terminal to a shell over a serial link.
//!
//! This is not a terminal emulator.  Bytes move verbatim in both directions;
//! only a handful of control characters typed locally are intercepted:
//!
//! | Local input            | Effect                                         |
//! |------------------------|------------------------------------------------|
//! | Ctrl-] (`0x1D`)        | Detach locally; nothing is sent to the remote. |
//! | a lone Ctrl-D (`0x04`) | Send `0x04` to the remote, keep relaying.      |
//! | end of input           | Send `0x04` to the remote and stop.            |
//! | Ctrl-C (SIGINT)        | Send `0x03` to the remote, keep relaying.      |
//!
//! The session also stops, normally, when the remote prints
//! `__PIRATE_DONE__`.  The marker may arrive split across reads.  A serial
//! peer that hangs up ends the session with [`SessionEnd::RemoteClosed`].
//!
//! # Event loop (for beginners)
//!
//! One thread blocks in `poll(2)` on the serial link, the local input and
//! (when SIGINT forwarding is on) the signal notification socket.  There is
//! no timeout: the loop sleeps until one of them has data.  Each wake-up
//! handles the ready sources in a fixed order (serial, then local input,
//! then the signal socket) before waiting again.  `poll` is level-triggered,
//! so anything left unread simply wakes the next iteration.
//!
//! # Cleanup
//!
//! The terminal mode, the SIGINT disposition and an owned serial port are all
//! held by guards.  Every exit path, including `?` propagation, restores and
//! closes them in reverse order of acquisition.

use std::fs::File;
use std::io::{self, Read, Write};
use std::os::fd::{AsFd, BorrowedFd, OwnedFd};

use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use pirate_core::relay::{EOT, ETX, READ_CHUNK};
use pirate_core::{InputAction, RelaySession, SessionEnd, SessionError};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::infrastructure::interrupt::InterruptForwarder;
use crate::infrastructure::serial_port::{open_serial, read_available, SerialLink};
use crate::infrastructure::storage::config::{NewlineMode, PirateConfig};
use crate::infrastructure::terminal::CbreakGuard;

/// One-shot hook run when the first serial data of a session arrives.
pub type ReadyCallback = Box<dyn FnMut() -> anyhow::Result<()> + Send>;

/// Errors from setting up or running a relay session.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("serial device '{path}' not found")]
    NotFound { path: String },

    #[error("permission denied for serial device '{path}'")]
    PermissionDenied { path: String },

    #[error("failed to open serial device '{path}': {source}")]
    Open {
        path: String,
        #[source]
        source: serialport::Error,
    },

    #[error("failed to configure local terminal: {0}")]
    Terminal(#[source] Errno),

    #[error("failed to install SIGINT forwarder: {0}")]
    Signal(#[source] io::Error),

    #[error("poll failed: {0}")]
    Poll(#[source] Errno),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("relay I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Construction overrides.  `None` means "use configuration".
#[derive(Default)]
pub struct SerialOptions {
    pub path: Option<String>,
    pub baud: Option<u32>,
    pub newline: Option<NewlineMode>,
    pub on_ready: Option<ReadyCallback>,
    pub disabled: Option<bool>,
}

/// Per-call options for [`SerialConsole::stdio`].
pub struct StdioOptions {
    /// Baud override for this call only.
    pub baud: Option<u32>,
    /// Local input; defaults to a duplicate of the process stdin.
    pub input: Option<OwnedFd>,
    /// Local output; defaults to a duplicate of the process stdout.
    pub output: Option<OwnedFd>,
    /// Switch the local input to cbreak mode for the session.
    pub manage_tty: bool,
    /// Forward Ctrl-C to the remote instead of terminating.
    pub forward_sigint: bool,
}

impl Default for StdioOptions {
    fn default() -> Self {
        Self {
            baud: None,
            input: None,
            output: None,
            manage_tty: true,
            forward_sigint: true,
        }
    }
}

/// Serial relay between the local terminal and the remote shell.
pub struct SerialConsole {
    path: String,
    baud: u32,
    newline: NewlineMode,
    disabled: bool,
    on_ready: Option<ReadyCallback>,
}

impl SerialConsole {
    /// Resolves each setting as override, then configuration.
    pub fn new(options: SerialOptions, config: &PirateConfig) -> Self {
        let console = Self {
            path: options.path.unwrap_or_else(|| config.serial.path.clone()),
            baud: options.baud.unwrap_or(config.serial.baud),
            newline: options.newline.unwrap_or(config.serial.newline),
            disabled: options.disabled.unwrap_or(config.dev.disable_serial),
            on_ready: options.on_ready,
        };
        if console.disabled {
            debug!("Serial disabled in config. Skipping connection...");
        }
        console
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn baud(&self) -> u32 {
        self.baud
    }

    pub fn newline(&self) -> NewlineMode {
        self.newline
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Opens the configured device and relays until detach, EOF or marker.
    ///
    /// The port is closed before returning.  A disabled console returns
    /// [`SessionEnd::Disabled`] without opening anything.
    ///
    /// # Errors
    ///
    /// Device open failures are returned before any terminal or signal state
    /// is touched.  Errors inside the loop unwind through cleanup first.
    pub fn stdio(&mut self, options: StdioOptions) -> Result<SessionEnd, RelayError> {
        if self.disabled {
            debug!("Serial disabled; relay not started.");
            return Ok(SessionEnd::Disabled);
        }

        let baud = options.baud.unwrap_or(self.baud);
        let mut port = open_serial(&self.path, baud)?;
        info!("Opened {} at {baud} baud", self.path);
        self.stdio_with(&mut port, options)
    }

    /// Relays over a caller-owned link, which is left open.
    ///
    /// `options.baud` is ignored: the link is already configured.
    pub fn stdio_with<L: SerialLink + ?Sized>(
        &mut self,
        link: &mut L,
        options: StdioOptions,
    ) -> Result<SessionEnd, RelayError> {
        if self.disabled {
            return Ok(SessionEnd::Disabled);
        }

        let input = match options.input {
            Some(fd) => File::from(fd),
            None => File::from(io::stdin().as_fd().try_clone_to_owned()?),
        };
        let output = match options.output {
            Some(fd) => File::from(fd),
            None => File::from(io::stdout().as_fd().try_clone_to_owned()?),
        };

        let _tty = if options.manage_tty {
            CbreakGuard::enter(input.as_fd()).map_err(RelayError::Terminal)?
        } else {
            None
        };
        let mut interrupt = if options.forward_sigint {
            Some(InterruptForwarder::install().map_err(RelayError::Signal)?)
        } else {
            None
        };

        let mut session = RelaySession::new();
        session.begin()?;
        let result = self.relay(link, &input, &output, interrupt.as_mut(), &mut session);
        let end = session.close();
        debug!("relay session {:?}: {end:?}", session.state());
        result
    }

    fn relay<L: SerialLink + ?Sized>(
        &mut self,
        link: &mut L,
        input: &File,
        output: &File,
        mut interrupt: Option<&mut InterruptForwarder>,
        session: &mut RelaySession,
    ) -> Result<SessionEnd, RelayError> {
        let mut buf = vec![0u8; READ_CHUNK];
        let mut output = output;
        let mut input = input;

        loop {
            let ready = wait_readable(link, input, interrupt.as_deref())?;

            // Serial -> local output, with marker detection.
            if ready.serial {
                let n = read_available(link, &mut buf)?;
                if n == 0 && ready.serial_hangup {
                    debug!("serial peer hung up");
                    session.finish(SessionEnd::RemoteClosed);
                    return Ok(SessionEnd::RemoteClosed);
                }
                if n > 0 {
                    let data = &buf[..n];
                    let step = session.on_serial_data(data);
                    if step.fire_ready {
                        self.fire_ready();
                    }
                    output.write_all(data)?;
                    if step.marker_seen {
                        output.write_all(b"\r\n")?;
                        session.finish(SessionEnd::MarkerSeen);
                        return Ok(SessionEnd::MarkerSeen);
                    }
                }
            }

            // Local input -> serial.
            if ready.input {
                if let Some(n) = read_input(&mut input, &mut buf)? {
                    let chunk = &buf[..n];
                    match RelaySession::classify_input(chunk) {
                        InputAction::LocalClosed => {
                            link.write_all(&[EOT])?;
                            link.flush()?;
                            session.finish(SessionEnd::LocalClosed);
                            return Ok(SessionEnd::LocalClosed);
                        }
                        InputAction::Detach => {
                            session.finish(SessionEnd::Detached);
                            return Ok(SessionEnd::Detached);
                        }
                        InputAction::RemoteEof => link.write_all(&[EOT])?,
                        InputAction::Forward => link.write_all(chunk)?,
                    }
                    link.flush()?;
                }
            }

            // SIGINT -> ETX, best effort.
            if ready.interrupt {
                if let Some(forwarder) = interrupt.as_deref_mut() {
                    for _ in 0..forwarder.drain() {
                        if let Err(e) = link.write_all(&[ETX]).and_then(|()| link.flush()) {
                            debug!("failed to forward Ctrl-C: {e}");
                        }
                    }
                }
            }
        }
    }

    fn fire_ready(&mut self) {
        if let Some(callback) = self.on_ready.as_mut() {
            if let Err(e) = callback() {
                warn!("ready callback failed: {e:#}");
            }
        }
    }
}

/// Which sources `poll(2)` reported ready.
#[derive(Debug, Default, Clone, Copy)]
struct Readiness {
    serial: bool,
    serial_hangup: bool,
    input: bool,
    interrupt: bool,
}

/// Blocks until at least one source is readable (or hung up).
fn wait_readable<L: SerialLink + ?Sized>(
    link: &L,
    input: &File,
    interrupt: Option<&InterruptForwarder>,
) -> Result<Readiness, RelayError> {
    // SAFETY: `link` is borrowed for the whole call, so its descriptor stays open.
    let serial_fd = unsafe { BorrowedFd::borrow_raw(link.as_raw_fd()) };

    let mut fds = Vec::with_capacity(3);
    fds.push(PollFd::new(serial_fd, PollFlags::POLLIN));
    fds.push(PollFd::new(input.as_fd(), PollFlags::POLLIN));
    if let Some(forwarder) = interrupt {
        fds.push(PollFd::new(forwarder.as_fd(), PollFlags::POLLIN));
    }

    loop {
        match poll(&mut fds, PollTimeout::NONE) {
            Ok(_) => break,
            // SIGINT interrupts the wait; the notification socket is readable on retry.
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(RelayError::Poll(e)),
        }
    }

    let readable = |fd: &PollFd<'_>| {
        fd.revents().map_or(false, |r| {
            r.intersects(PollFlags::POLLIN | PollFlags::POLLHUP | PollFlags::POLLERR)
        })
    };

    Ok(Readiness {
        serial: readable(&fds[0]),
        serial_hangup: fds[0]
            .revents()
            .map_or(false, |r| r.contains(PollFlags::POLLHUP)),
        input: readable(&fds[1]),
        interrupt: fds.get(2).map_or(false, readable),
    })
}

/// Reads one chunk of local input.
///
/// `Ok(None)` means nothing was actually available (a spurious wake on a
/// non-blocking descriptor); `Ok(Some(0))` is end of input.
fn read_input(input: &mut &File, buf: &mut [u8]) -> io::Result<Option<usize>> {
    loop {
        match input.read(buf) {
            Ok(n) => return Ok(Some(n)),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(None),
            Err(e) => return Err(e),
        }
    }
}
