//! pirate library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does PiRate do? (for beginners)
//!
//! PiRate runs on a small board (a Raspberry Pi Zero, for example) plugged
//! into a target computer's USB port.  The board presents itself to the
//! target as two USB gadgets at once: a keyboard and a serial port.
//!
//! A *payload* then:
//!
//! 1. Types a short shell script on the target through the keyboard gadget
//!    (`/dev/hidg0`).  The script opens the target's end of the USB serial
//!    link and runs an interactive shell on it.
//! 2. Attaches the operator's terminal to the board's end of that link
//!    (`/dev/ttyGS0`) and relays bytes both ways until the remote shell exits
//!    and prints `__PIRATE_DONE__`.
//!
//! The crate is split in two layers, following the same rule everywhere:
//! `application` decides what to do, `infrastructure` talks to the OS.

/// Application layer: the keyboard use case and its device seams.
pub mod application;

/// Infrastructure layer: device files, serial relay, config, logging.
pub mod infrastructure;

/// Built-in payloads, addressable by dotted name (`macos.serial_shell`).
pub mod payloads;
