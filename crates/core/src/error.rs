//! Error types for m8mouse-core.

use thiserror::Error;

/// Core library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// HID device communication failure.
    #[error("HID error: {0}")]
    Hid(String),

    /// Device not found during enumeration.
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    /// Device rejected a register command.
    #[error("device error: command 0x{command:02X}, code 0x{code:02X}")]
    Protocol { command: u8, code: u8 },

    /// Value out of safe range.
    #[error("value out of range: {field} = {value} (allowed {min}..={max})")]
    OutOfRange {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },

    /// Profile serialization/deserialization error.
    #[error("profile error: {0}")]
    Profile(String),

    /// Permission denied (missing udev rule or exclusive access).
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Operation timed out.
    #[error("timeout: {0}")]
    Timeout(String),

    /// The register image has not been read from the device yet.
    #[error("device state has not been queried")]
    NotQueried,
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, Error>;
