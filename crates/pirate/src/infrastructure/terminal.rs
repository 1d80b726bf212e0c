//! Local terminal mode handling.
//!
//! The relay wants keystrokes one at a time, without local echo (the remote
//! shell echoes), but with Ctrl-C still raising SIGINT so it can be
//! forwarded.  That is "cbreak" mode: `ICANON` and `ECHO` off, `ISIG` left on,
//! reads return after a single byte.

use std::io::IsTerminal;
use std::os::fd::BorrowedFd;

use nix::sys::termios::{
    tcgetattr, tcsetattr, LocalFlags, SetArg, SpecialCharacterIndices, Termios,
};
use tracing::debug;

/// Puts a terminal into cbreak mode and restores the saved mode on drop.
pub struct CbreakGuard<'fd> {
    fd: BorrowedFd<'fd>,
    saved: Termios,
}

impl<'fd> CbreakGuard<'fd> {
    /// Switches `fd` to cbreak mode.
    ///
    /// Returns `Ok(None)` without touching anything if `fd` is not a terminal
    /// (input redirected from a file or pipe).
    ///
    /// # Errors
    ///
    /// Propagates `tcgetattr`/`tcsetattr` failures.
    pub fn enter(fd: BorrowedFd<'fd>) -> nix::Result<Option<Self>> {
        if !fd.is_terminal() {
            debug!("local input is not a terminal; leaving its mode alone");
            return Ok(None);
        }

        let saved = tcgetattr(fd)?;
        let mut cbreak = saved.clone();
        cbreak.local_flags.remove(LocalFlags::ICANON | LocalFlags::ECHO);
        cbreak.control_chars[SpecialCharacterIndices::VMIN as usize] = 1;
        cbreak.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;
        tcsetattr(fd, SetArg::TCSAFLUSH, &cbreak)?;

        Ok(Some(Self { fd, saved }))
    }
}

impl Drop for CbreakGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = tcsetattr(self.fd, SetArg::TCSADRAIN, &self.saved) {
            debug!("failed to restore terminal mode: {e}");
        }
    }
}
