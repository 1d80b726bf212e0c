//! Infrastructure layer.
//!
//! Contains OS-facing adapters: device files, the serial relay loop, terminal
//! and signal handling, configuration storage, and logging.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `pirate_core`, but MUST NOT be imported by the `application` layer.
//!
//! # Sub-modules
//!
//! - **`hid_gadget`** – `/dev/hidgN` implementation of `ReportSink`, plus a
//!   `MockReportSink` for tests.
//! - **`serial_port`** – The `SerialLink` trait and the `serialport` opener.
//! - **`serial_console`** – The `poll(2)` relay loop between the local
//!   terminal and the serial link.
//! - **`terminal`** – cbreak mode guard for the local TTY.
//! - **`interrupt`** – SIGINT → self-notification socket.
//! - **`storage`** – TOML configuration loading.
//! - **`logging`** – `tracing-subscriber` setup with a reloadable level.

pub mod hid_gadget;
pub mod interrupt;
pub mod logging;
pub mod serial_console;
pub mod serial_port;
pub mod storage;
pub mod terminal;
