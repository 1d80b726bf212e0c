//! Serial relay session logic.
//!
//! The relay bridges a local terminal with a serial device.  This module holds
//! the parts of that bridge that are pure byte bookkeeping:
//!
//! - **`marker`** – Rolling-window search for the completion sentinel, which
//!   may arrive split across several reads.
//! - **`session`** – The session state machine and the control-character
//!   rules applied to local input (detach, EOF, pass-through).
//!
//! The poll loop that actually moves bytes lives in the `pirate` crate.

pub mod marker;
pub mod session;

/// ASCII ETX, sent to the remote when the local user presses Ctrl-C.
pub const ETX: u8 = 0x03;
/// ASCII EOT, sent to the remote as an end-of-input request (Ctrl-D).
pub const EOT: u8 = 0x04;
/// ASCII GS (Ctrl-]), detaches the local side without notifying the remote.
pub const DETACH: u8 = 0x1D;
/// Maximum bytes read from either side per wake-up.
pub const READ_CHUNK: usize = 4096;
