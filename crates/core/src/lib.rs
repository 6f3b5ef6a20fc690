//! m8mouse-core: register protocol, device session, and mouse configuration.
//!
//! This crate provides the logic for talking to the M8 gaming mouse over
//! USB HID: reading and writing its configuration registers, mapping raw
//! register values to named modes, and saving/restoring profiles.

pub mod comm;
pub mod device;
pub mod error;
pub mod memory;
pub mod modes;
pub mod profile;
pub mod protocol;
pub mod safety;
pub mod session;
pub mod transport;

pub use session::{DeviceSession, HidSession};

/// USB Vendor ID of the mouse's controller.
pub const USB_M8_VID: u16 = 0x258A;

/// USB Product ID of the M8 mouse.
pub const USB_M8_PID: u16 = 0x1007;
