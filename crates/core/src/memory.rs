//! In-memory image of the device's register space.
//!
//! Reads fill the whole image at once; changes are staged byte by byte and
//! pushed back as contiguous runs on [`DeviceMemory::flush`].

use crate::comm::{send_with_retry, MAX_RETRIES};
use crate::error::{Error, Result};
use crate::protocol::{Request, MAX_CHUNK, REGISTER_SPACE};
use crate::transport::HidTransport;
use std::fmt::Write as _;
use tracing::{debug, trace};

/// Register image with per-byte dirty tracking.
#[derive(Debug, Clone)]
pub struct DeviceMemory {
    bytes: [u8; REGISTER_SPACE],
    dirty: [bool; REGISTER_SPACE],
    loaded: bool,
}

impl Default for DeviceMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceMemory {
    pub fn new() -> Self {
        Self {
            bytes: [0; REGISTER_SPACE],
            dirty: [false; REGISTER_SPACE],
            loaded: false,
        }
    }

    /// Whether the image has been read from the device.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Read the entire register space from the device.
    ///
    /// Discards any staged but unflushed changes.
    pub fn load(&mut self, transport: &dyn HidTransport) -> Result<()> {
        let mut image = [0u8; REGISTER_SPACE];
        for start in (0..REGISTER_SPACE).step_by(MAX_CHUNK) {
            let req = Request::read(start as u8, MAX_CHUNK as u8);
            let resp = send_with_retry(transport, &req, MAX_RETRIES)?;
            let payload = resp.payload();
            if payload.len() != MAX_CHUNK {
                return Err(Error::Hid(format!(
                    "short read at 0x{start:02X}: {} of {MAX_CHUNK} bytes",
                    payload.len()
                )));
            }
            image[start..start + MAX_CHUNK].copy_from_slice(payload);
        }

        self.bytes = image;
        self.dirty = [false; REGISTER_SPACE];
        self.loaded = true;
        debug!("register image loaded");
        Ok(())
    }

    /// Current value of a register, or `None` before the first load.
    pub fn get(&self, address: u8) -> Option<u8> {
        self.loaded.then(|| self.bytes[address as usize])
    }

    /// Change a register in the image and mark it for the next flush.
    pub fn stage(&mut self, address: u8, value: u8) -> Result<()> {
        if !self.loaded {
            return Err(Error::NotQueried);
        }
        trace!(
            address = format_args!("0x{address:02X}"),
            value = format_args!("0x{value:02X}"),
            "staged register write"
        );
        self.bytes[address as usize] = value;
        self.dirty[address as usize] = true;
        Ok(())
    }

    /// Whether any staged change is waiting to be flushed.
    pub fn is_dirty(&self) -> bool {
        self.dirty.iter().any(|&d| d)
    }

    /// Write every staged change to the device. Returns the number of bytes sent.
    pub fn flush(&mut self, transport: &dyn HidTransport) -> Result<usize> {
        let mut written = 0;
        let mut addr = 0;
        while addr < REGISTER_SPACE {
            if !self.dirty[addr] {
                addr += 1;
                continue;
            }

            let start = addr;
            while addr < REGISTER_SPACE && self.dirty[addr] && addr - start < MAX_CHUNK {
                addr += 1;
            }

            let req = Request::write(start as u8, &self.bytes[start..addr]);
            send_with_retry(transport, &req, MAX_RETRIES)?;
            self.dirty[start..addr].fill(false);
            written += addr - start;
        }

        debug!(bytes = written, "flushed staged registers");
        Ok(written)
    }

    /// Hex dump, 16 bytes per row, prefixed by the row address.
    pub fn hex_dump(&self) -> String {
        if !self.loaded {
            return "  (device memory not loaded)\n".to_string();
        }

        let mut out = String::new();
        for (row, chunk) in self.bytes.chunks(16).enumerate() {
            let _ = write!(out, "  {:02X}:", row * 16);
            for byte in chunk {
                let _ = write!(out, " {byte:02X}");
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::SimulatedDevice;

    fn sample_registers() -> [u8; REGISTER_SPACE] {
        let mut regs = [0u8; REGISTER_SPACE];
        for (i, b) in regs.iter_mut().enumerate() {
            *b = i as u8;
        }
        regs
    }

    #[test]
    fn get_before_load_is_none() {
        let memory = DeviceMemory::new();
        assert_eq!(memory.get(0x10), None);
        assert!(matches!(
            DeviceMemory::new().stage(0x10, 1),
            Err(Error::NotQueried)
        ));
    }

    #[test]
    fn load_reads_full_space() {
        let device = SimulatedDevice::new(sample_registers());
        let mut memory = DeviceMemory::new();
        memory.load(&device).unwrap();
        assert_eq!(memory.get(0x00), Some(0x00));
        assert_eq!(memory.get(0x7F), Some(0x7F));
        assert_eq!(memory.get(0xFF), Some(0xFF));
        assert!(!memory.is_dirty());
    }

    #[test]
    fn flush_groups_contiguous_runs() {
        let device = SimulatedDevice::new([0u8; REGISTER_SPACE]);
        let mut memory = DeviceMemory::new();
        memory.load(&device).unwrap();

        memory.stage(0x30, 0x05).unwrap();
        memory.stage(0x31, 0x02).unwrap();
        memory.stage(0x10, 0x08).unwrap();
        assert!(memory.is_dirty());

        assert_eq!(memory.flush(&device).unwrap(), 3);
        assert!(!memory.is_dirty());
        assert_eq!(
            device.writes(),
            vec![(0x10, vec![0x08]), (0x30, vec![0x05, 0x02])]
        );
        assert_eq!(device.register(0x31), 0x02);
    }

    #[test]
    fn flush_splits_long_runs() {
        let device = SimulatedDevice::new([0u8; REGISTER_SPACE]);
        let mut memory = DeviceMemory::new();
        memory.load(&device).unwrap();
        for addr in 0..20u8 {
            memory.stage(addr, 0xAA).unwrap();
        }

        assert_eq!(memory.flush(&device).unwrap(), 20);
        let writes = device.writes();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0].1.len(), MAX_CHUNK);
        assert_eq!(writes[1].0, MAX_CHUNK as u8);
    }

    #[test]
    fn flush_failure_keeps_changes_staged() {
        let device = SimulatedDevice::new([0u8; REGISTER_SPACE]);
        let mut memory = DeviceMemory::new();
        memory.load(&device).unwrap();
        memory.stage(0x30, 0x01).unwrap();
        device.reject_writes();

        assert!(memory.flush(&device).is_err());
        assert!(memory.is_dirty());
    }

    #[test]
    fn hex_dump_has_sixteen_rows() {
        let device = SimulatedDevice::new(sample_registers());
        let mut memory = DeviceMemory::new();
        memory.load(&device).unwrap();
        let dump = memory.hex_dump();
        assert_eq!(dump.lines().count(), 16);
        assert!(dump.starts_with("  00: 00 01 02"));
        assert!(dump.lines().last().unwrap().ends_with("FE FF"));
    }
}
