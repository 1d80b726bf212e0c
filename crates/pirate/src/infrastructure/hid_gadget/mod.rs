//! USB HID gadget keyboard device.
//!
//! - **`gadget`** – [`HidGadget`](gadget::HidGadget), the `/dev/hidgN` writer,
//!   and [`open_keyboard`](gadget::open_keyboard), which wires a
//!   [`Keyboard`](crate::application::keyboard::Keyboard) from overrides,
//!   configuration and defaults.
//! - **`mock`** – A recording sink for tests.

pub mod gadget;
pub mod mock;

pub use gadget::{open_keyboard, HidGadget, KeyboardOptions};
pub use mock::MockReportSink;
