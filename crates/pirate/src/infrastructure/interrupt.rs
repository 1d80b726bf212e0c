//! SIGINT forwarding.
//!
//! While the relay runs, Ctrl-C belongs to the remote shell.  The handler
//! installed here does the only async-signal-safe thing available: it writes
//! one byte into a non-blocking socket pair.  The relay loop polls the other
//! end alongside serial and local input, and sends `0x03` to the remote from
//! ordinary code.  The handler never sees the serial link or loop state.

use std::io::{self, Read};
use std::os::fd::{AsFd, AsRawFd, BorrowedFd};
use std::os::unix::net::UnixStream;
use std::sync::atomic::{AtomicI32, Ordering};

use nix::libc;
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use tracing::debug;

/// Write end of the active forwarder's socket pair, or -1.
static NOTIFY_FD: AtomicI32 = AtomicI32::new(-1);

extern "C" fn on_sigint(_signal: libc::c_int) {
    let fd = NOTIFY_FD.load(Ordering::SeqCst);
    if fd >= 0 {
        let byte: u8 = 1;
        // SAFETY: write(2) is async-signal-safe; `byte` outlives the call.
        unsafe {
            libc::write(fd, (&byte as *const u8).cast::<libc::c_void>(), 1);
        }
    }
}

/// Installs the SIGINT handler; restores the previous disposition on drop.
pub struct InterruptForwarder {
    receiver: UnixStream,
    _sender: UnixStream,
    previous: SigAction,
}

impl InterruptForwarder {
    /// Installs the forwarding handler.
    ///
    /// # Errors
    ///
    /// Fails if the socket pair cannot be created or `sigaction` fails.
    pub fn install() -> io::Result<Self> {
        let (receiver, sender) = UnixStream::pair()?;
        receiver.set_nonblocking(true)?;
        sender.set_nonblocking(true)?;

        NOTIFY_FD.store(sender.as_raw_fd(), Ordering::SeqCst);

        let action = SigAction::new(
            SigHandler::Handler(on_sigint),
            SaFlags::SA_RESTART,
            SigSet::empty(),
        );
        // SAFETY: the handler only loads an atomic and calls write(2).
        let previous = match unsafe { sigaction(Signal::SIGINT, &action) } {
            Ok(previous) => previous,
            Err(e) => {
                NOTIFY_FD.store(-1, Ordering::SeqCst);
                return Err(io::Error::from(e));
            }
        };

        Ok(Self {
            receiver,
            _sender: sender,
            previous,
        })
    }

    /// Consumes pending notifications and returns how many signals arrived.
    pub fn drain(&mut self) -> usize {
        let mut buf = [0u8; 64];
        let mut count = 0;
        loop {
            match self.receiver.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => count += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
        }
        count
    }
}

impl AsFd for InterruptForwarder {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.receiver.as_fd()
    }
}

impl Drop for InterruptForwarder {
    fn drop(&mut self) {
        // SAFETY: restores the disposition captured at install time.
        if let Err(e) = unsafe { sigaction(Signal::SIGINT, &self.previous) } {
            debug!("failed to restore SIGINT handler: {e}");
        }
        NOTIFY_FD.store(-1, Ordering::SeqCst);
    }
}
