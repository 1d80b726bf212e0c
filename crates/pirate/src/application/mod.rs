//! Application layer use cases.
//!
//! - **`keyboard`** – Turns text with `{KEY:...}` escapes into paced HID
//!   reports.  The report writer and the clock are injected as trait objects
//!   so the use case can be driven by a mock in tests.

pub mod keyboard;
