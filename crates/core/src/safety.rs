//! Safety layer: validates every staged value against the known catalogs
//! before it can reach the device.
//!
//! ## Safety Invariants
//! 1. Mode indices must address an entry of their category's catalog
//! 2. DPI levels are bounds-checked against [`DPI_RES_COUNT`]
//! 3. Profile values must be raw values that appear in the catalog
//! 4. All validation happens before a byte is staged, so invalid data
//!    never reaches the register image
//!
//! Raw register writes (`-raw`) bypass these checks.

use crate::error::{Error, Result};
use crate::modes::{dpi_res_register, Mode, ModeCategory, DPI_RES_COUNT};

/// Saturating `usize` to `u32` conversion for error reports.
pub(crate) fn clamp_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// Validate a 0-based mode index and return the selected catalog entry.
pub fn validate_mode_index(category: ModeCategory, index: usize) -> Result<&'static Mode> {
    category.mode_at(index).ok_or(Error::OutOfRange {
        field: category.name(),
        value: clamp_u32(index),
        min: 0,
        max: clamp_u32(category.modes().len().saturating_sub(1)),
    })
}

/// Validate a 0-based DPI level and return its resolution register.
pub fn validate_dpi_level(level: usize) -> Result<u8> {
    dpi_res_register(level).ok_or(Error::OutOfRange {
        field: "dpi_level",
        value: clamp_u32(level),
        min: 0,
        max: (DPI_RES_COUNT - 1) as u32,
    })
}

/// Validate that a raw register value is a known entry of `category`.
pub fn validate_raw_value(category: ModeCategory, raw: u8) -> Result<&'static Mode> {
    category.find_by_value(raw).ok_or_else(|| {
        Error::Profile(format!(
            "unknown {} value 0x{raw:02X}",
            category.name()
        ))
    })
}
