//! Configuration profiles: JSON snapshots of the settings registers.

use crate::error::{Error, Result};
use crate::memory::DeviceMemory;
use crate::modes::{dpi_res_register, registers, ModeCategory, DPI_RES_COUNT};
use crate::safety;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Current profile file format version.
pub const PROFILE_VERSION: u32 = 1;

/// A saved mouse configuration, as raw register values.
///
/// A field is `None` when the device held a value outside its catalog; such
/// fields are left untouched when the profile is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub version: u32,
    /// Active DPI level.
    pub dpi_mode: Option<u8>,
    /// Resolution of each DPI level.
    pub dpi_resolutions: Vec<Option<u8>>,
    pub led_mode: Option<u8>,
    pub led_speed: Option<u8>,
    pub led_brightness: Option<u8>,
    pub poll_rate: Option<u8>,
}

impl Profile {
    /// Snapshot the settings registers of a loaded image.
    pub fn capture(memory: &DeviceMemory) -> Result<Self> {
        let read = |category: ModeCategory, address: u8| -> Result<Option<u8>> {
            let raw = memory.get(address).ok_or(Error::NotQueried)?;
            if category.find_by_value(raw).is_some() {
                Ok(Some(raw))
            } else {
                debug!(field = category.name(), raw, "not saving unknown value");
                Ok(None)
            }
        };

        let mut dpi_resolutions = Vec::with_capacity(DPI_RES_COUNT);
        for level in 0..DPI_RES_COUNT {
            let address = dpi_res_register(level).ok_or(Error::NotQueried)?;
            dpi_resolutions.push(read(ModeCategory::DpiResolution, address)?);
        }

        Ok(Self {
            version: PROFILE_VERSION,
            dpi_mode: read(ModeCategory::Dpi, registers::DPI_ACTIVE)?,
            dpi_resolutions,
            led_mode: read(ModeCategory::Led, registers::LED_MODE)?,
            led_speed: read(ModeCategory::Speed, registers::LED_SPEED)?,
            led_brightness: read(ModeCategory::Brightness, registers::LED_BRIGHTNESS)?,
            poll_rate: read(ModeCategory::PollRate, registers::POLL_RATE)?,
        })
    }

    /// (register, category, raw value) for every single-register setting.
    fn settings(&self) -> [(u8, ModeCategory, Option<u8>); 5] {
        [
            (registers::DPI_ACTIVE, ModeCategory::Dpi, self.dpi_mode),
            (registers::LED_MODE, ModeCategory::Led, self.led_mode),
            (registers::LED_SPEED, ModeCategory::Speed, self.led_speed),
            (
                registers::LED_BRIGHTNESS,
                ModeCategory::Brightness,
                self.led_brightness,
            ),
            (registers::POLL_RATE, ModeCategory::PollRate, self.poll_rate),
        ]
    }

    /// Check every value against the catalogs.
    pub fn validate(&self) -> Result<()> {
        if self.version != PROFILE_VERSION {
            return Err(Error::Profile(format!(
                "unsupported profile version {} (expected {PROFILE_VERSION})",
                self.version
            )));
        }
        if self.dpi_resolutions.len() != DPI_RES_COUNT {
            return Err(Error::Profile(format!(
                "expected {DPI_RES_COUNT} DPI resolutions, found {}",
                self.dpi_resolutions.len()
            )));
        }
        for (_, category, raw) in self.settings() {
            if let Some(raw) = raw {
                safety::validate_raw_value(category, raw)?;
            }
        }
        for &raw in self.dpi_resolutions.iter().flatten() {
            safety::validate_raw_value(ModeCategory::DpiResolution, raw)?;
        }
        Ok(())
    }

    /// Validate, then stage every value into the image.
    ///
    /// Nothing is staged if any value is invalid.
    pub fn apply(&self, memory: &mut DeviceMemory) -> Result<()> {
        self.validate()?;
        for (address, _, raw) in self.settings() {
            if let Some(raw) = raw {
                memory.stage(address, raw)?;
            }
        }
        for (level, raw) in self.dpi_resolutions.iter().enumerate() {
            let address = safety::validate_dpi_level(level)?;
            if let Some(raw) = *raw {
                memory.stage(address, raw)?;
            }
        }
        Ok(())
    }
}

/// Write a profile to `path` as pretty-printed JSON.
pub fn save_profile(profile: &Profile, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(profile)
        .map_err(|e| Error::Profile(format!("serialize: {e}")))?;
    std::fs::write(path, json)
        .map_err(|e| Error::Profile(format!("write {}: {e}", path.display())))?;
    debug!(path = %path.display(), "profile saved");
    Ok(())
}

/// Read a profile from `path`.
pub fn load_profile(path: &Path) -> Result<Profile> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| Error::Profile(format!("read {}: {e}", path.display())))?;
    let profile: Profile = serde_json::from_str(&json)
        .map_err(|e| Error::Profile(format!("parse {}: {e}", path.display())))?;
    debug!(path = %path.display(), "profile loaded");
    Ok(profile)
}
