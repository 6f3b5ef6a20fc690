//! Device session: the operations the command-line front end drives.
//!
//! [`DeviceSession`] is the seam between orchestration and hardware.
//! [`HidSession`] implements it over any [`HidTransport`] by keeping a
//! register image: queries refresh the image, setters validate and stage
//! bytes into it, and [`DeviceSession::commit`] pushes staged bytes to the
//! mouse.

use crate::comm::{send_with_retry, MAX_RETRIES};
use crate::error::{Error, Result};
use crate::memory::DeviceMemory;
use crate::modes::{dpi_res_register, Mode, ModeCategory};
use crate::profile::{self, Profile};
use crate::protocol::Request;
use crate::safety;
use crate::transport::HidTransport;
use std::path::Path;
use tracing::{debug, info};

/// An open connection to the mouse.
///
/// All setters take 0-based indices into the category catalogs and only
/// stage changes; nothing reaches the hardware before [`commit`](Self::commit).
pub trait DeviceSession {
    /// Re-read the full device state.
    fn query(&mut self) -> Result<()>;

    /// The selected entry of `category`, if the register holds a known value.
    fn active_mode(&self, category: ModeCategory) -> Option<&'static Mode>;

    /// Resolution configured for DPI level `level`.
    fn dpi_resolution(&self, level: usize) -> Option<&'static Mode>;

    /// Select DPI level, LED mode and LED speed; `None` leaves a field unchanged.
    fn set_modes(
        &mut self,
        dpi: Option<usize>,
        led: Option<usize>,
        speed: Option<usize>,
    ) -> Result<()>;

    /// Set the resolution of DPI level `level` to catalog entry `value`.
    fn set_dpires(&mut self, level: usize, value: usize) -> Result<()>;

    fn set_poll_rate(&mut self, index: usize) -> Result<()>;

    fn set_brightness(&mut self, index: usize) -> Result<()>;

    /// Write one register byte verbatim.
    fn set_raw(&mut self, address: u8, value: u8) -> Result<()>;

    /// Push staged changes to the hardware.
    fn commit(&mut self) -> Result<()>;

    /// Human-readable rendering of the raw registers.
    fn dump_memory(&self) -> String;

    fn save_profile(&self, path: &Path) -> Result<()>;

    /// Stage the settings stored in a profile file.
    fn load_profile(&mut self, path: &Path) -> Result<()>;

    /// Release the device.
    fn close(self)
    where
        Self: Sized;
}

/// [`DeviceSession`] backed by a HID transport.
pub struct HidSession<T: HidTransport> {
    transport: T,
    memory: DeviceMemory,
}

impl<T: HidTransport> HidSession<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            memory: DeviceMemory::new(),
        }
    }

    /// The current register image.
    pub fn memory(&self) -> &DeviceMemory {
        &self.memory
    }

    fn stage_mode(&mut self, category: ModeCategory, index: usize) -> Result<()> {
        let mode = safety::validate_mode_index(category, index)?;
        let address = category.register().ok_or(Error::OutOfRange {
            field: category.name(),
            value: safety::clamp_u32(index),
            min: 0,
            max: 0,
        })?;
        debug!(category = category.name(), mode = mode.label, "staging mode");
        self.memory.stage(address, mode.value)
    }
}

impl<T: HidTransport> DeviceSession for HidSession<T> {
    fn query(&mut self) -> Result<()> {
        self.memory.load(&self.transport)
    }

    fn active_mode(&self, category: ModeCategory) -> Option<&'static Mode> {
        let raw = self.memory.get(category.register()?)?;
        category.find_by_value(raw)
    }

    fn dpi_resolution(&self, level: usize) -> Option<&'static Mode> {
        let raw = self.memory.get(dpi_res_register(level)?)?;
        ModeCategory::DpiResolution.find_by_value(raw)
    }

    fn set_modes(
        &mut self,
        dpi: Option<usize>,
        led: Option<usize>,
        speed: Option<usize>,
    ) -> Result<()> {
        let requested = [
            (ModeCategory::Dpi, dpi),
            (ModeCategory::Led, led),
            (ModeCategory::Speed, speed),
        ];

        // Validate everything first so a bad index stages nothing.
        for (category, index) in requested {
            if let Some(index) = index {
                safety::validate_mode_index(category, index)?;
            }
        }
        if !self.memory.is_loaded() {
            return Err(Error::NotQueried);
        }
        for (category, index) in requested {
            if let Some(index) = index {
                self.stage_mode(category, index)?;
            }
        }
        Ok(())
    }

    fn set_dpires(&mut self, level: usize, value: usize) -> Result<()> {
        let address = safety::validate_dpi_level(level)?;
        let mode = safety::validate_mode_index(ModeCategory::DpiResolution, value)?;
        debug!(level, resolution = mode.label, "staging DPI resolution");
        self.memory.stage(address, mode.value)
    }

    fn set_poll_rate(&mut self, index: usize) -> Result<()> {
        self.stage_mode(ModeCategory::PollRate, index)
    }

    fn set_brightness(&mut self, index: usize) -> Result<()> {
        self.stage_mode(ModeCategory::Brightness, index)
    }

    fn set_raw(&mut self, address: u8, value: u8) -> Result<()> {
        self.memory.stage(address, value)
    }

    fn commit(&mut self) -> Result<()> {
        let written = self.memory.flush(&self.transport)?;
        send_with_retry(&self.transport, &Request::commit(), MAX_RETRIES)?;
        info!(bytes = written, "device settings committed");
        Ok(())
    }

    fn dump_memory(&self) -> String {
        self.memory.hex_dump()
    }

    fn save_profile(&self, path: &Path) -> Result<()> {
        let profile = Profile::capture(&self.memory)?;
        profile::save_profile(&profile, path)
    }

    fn load_profile(&mut self, path: &Path) -> Result<()> {
        let profile = profile::load_profile(path)?;
        profile.apply(&mut self.memory)
    }

    fn close(self) {
        debug!("closing device session");
        drop(self.transport);
    }
}
