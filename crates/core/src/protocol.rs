//! Register protocol encoding and decoding.
//!
//! The mouse exposes its configuration as a flat 256-byte register space.
//! Every exchange is a single fixed-size report:
//!
//! ```text
//! [report_id, command, address, length, data[0..16]]
//! ```
//!
//! The device answers with the same header. On failure it sets
//! [`ERROR_FLAG`] in the echoed command byte and places an error code in
//! `data[0]`.

use crate::error::{Error, Result};

/// Report ID used for all register traffic.
pub const REPORT_ID: u8 = 0x08;

/// Total report length (including report ID).
pub const REPORT_LEN: usize = 20;

/// Bytes before the data payload.
pub const HEADER_LEN: usize = 4;

/// Maximum payload bytes per report.
pub const MAX_CHUNK: usize = REPORT_LEN - HEADER_LEN;

/// Size of the register address space.
pub const REGISTER_SPACE: usize = 256;

/// Set in the echoed command byte when the device rejects a request.
pub const ERROR_FLAG: u8 = 0x80;

/// Register commands understood by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    /// Read `length` bytes starting at `address`.
    Read = 0x01,
    /// Write the payload starting at `address`.
    Write = 0x02,
    /// Persist written registers to the device's flash.
    Commit = 0x03,
}

impl Command {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x01 => Some(Self::Read),
            0x02 => Some(Self::Write),
            0x03 => Some(Self::Commit),
            _ => None,
        }
    }
}

/// A register request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub command: Command,
    pub address: u8,
    /// Number of bytes to read, or payload length for writes.
    pub length: u8,
    pub data: Vec<u8>,
}

impl Request {
    /// Read `length` bytes starting at `address`.
    pub fn read(address: u8, length: u8) -> Self {
        Self {
            command: Command::Read,
            address,
            length,
            data: Vec::new(),
        }
    }

    /// Write `data` starting at `address`.
    pub fn write(address: u8, data: &[u8]) -> Self {
        Self {
            command: Command::Write,
            address,
            length: data.len().min(u8::MAX as usize) as u8,
            data: data.to_vec(),
        }
    }

    /// Persist pending register writes.
    pub fn commit() -> Self {
        Self {
            command: Command::Commit,
            address: 0,
            length: 0,
            data: Vec::new(),
        }
    }

    /// Encode into a HID report byte array.
    ///
    /// Rejects payloads that do not fit one report and ranges that run past
    /// the end of the register space.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let length = self.length as usize;
        if length > MAX_CHUNK || self.data.len() > MAX_CHUNK {
            return Err(Error::OutOfRange {
                field: "length",
                value: length.max(self.data.len()) as u32,
                min: 0,
                max: MAX_CHUNK as u32,
            });
        }
        if self.address as usize + length > REGISTER_SPACE {
            return Err(Error::OutOfRange {
                field: "address",
                value: self.address as u32,
                min: 0,
                max: (REGISTER_SPACE - length) as u32,
            });
        }

        let mut buf = vec![0u8; REPORT_LEN];
        buf[0] = REPORT_ID;
        buf[1] = self.command as u8;
        buf[2] = self.address;
        buf[3] = self.length;
        buf[HEADER_LEN..HEADER_LEN + self.data.len()].copy_from_slice(&self.data);
        Ok(buf)
    }
}

/// A decoded register response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Raw command byte as echoed by the device (may carry [`ERROR_FLAG`]).
    pub command: u8,
    pub address: u8,
    pub length: u8,
    pub data: Vec<u8>,
}

impl Response {
    /// Decode a raw HID report into a structured response.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < REPORT_LEN {
            return Err(Error::Hid(format!(
                "response too short: {} bytes (minimum {})",
                data.len(),
                REPORT_LEN
            )));
        }

        if data[0] != REPORT_ID {
            return Err(Error::Hid(format!("unknown report ID: 0x{:02X}", data[0])));
        }

        Ok(Self {
            command: data[1],
            address: data[2],
            length: data[3],
            data: data[HEADER_LEN..REPORT_LEN].to_vec(),
        })
    }

    /// Check if the device flagged this response as an error.
    pub fn is_error(&self) -> bool {
        self.command & ERROR_FLAG != 0
    }

    /// Device error code (meaningful only when [`Response::is_error`]).
    pub fn error_code(&self) -> u8 {
        self.data.first().copied().unwrap_or(0)
    }

    /// Whether this response answers `req` (same command and address).
    pub fn matches(&self, req: &Request) -> bool {
        self.command & !ERROR_FLAG == req.command as u8 && self.address == req.address
    }

    /// The payload bytes covered by the echoed length.
    pub fn payload(&self) -> &[u8] {
        let len = (self.length as usize).min(self.data.len());
        &self.data[..len]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_read_request() {
        let encoded = Request::read(0x20, 16).encode().unwrap();
        assert_eq!(encoded.len(), REPORT_LEN);
        assert_eq!(encoded[0], REPORT_ID);
        assert_eq!(encoded[1], 0x01);
        assert_eq!(encoded[2], 0x20);
        assert_eq!(encoded[3], 16);
        assert!(encoded[HEADER_LEN..].iter().all(|&b| b == 0));
    }

    #[test]
    fn encode_write_request() {
        let encoded = Request::write(0x30, &[0x05, 0x02]).encode().unwrap();
        assert_eq!(encoded[1], 0x02);
        assert_eq!(encoded[2], 0x30);
        assert_eq!(encoded[3], 2);
        assert_eq!(&encoded[4..6], &[0x05, 0x02]);
        assert_eq!(encoded[6], 0x00); // padding
    }

    #[test]
    fn encode_rejects_oversized_payload() {
        let req = Request::write(0x00, &[0u8; MAX_CHUNK + 1]);
        assert!(req.encode().is_err());
    }

    #[test]
    fn encode_rejects_range_past_end() {
        assert!(Request::read(0xF8, 16).encode().is_err());
        assert!(Request::read(0xF0, 16).encode().is_ok());
    }

    #[test]
    fn decode_response() {
        let mut data = vec![REPORT_ID, 0x01, 0x30, 0x03, 0x05, 0x02, 0x01];
        data.resize(REPORT_LEN, 0);
        let resp = Response::decode(&data).unwrap();
        assert!(!resp.is_error());
        assert_eq!(resp.address, 0x30);
        assert_eq!(resp.payload(), &[0x05, 0x02, 0x01]);
    }

    #[test]
    fn decode_rejects_short_data() {
        assert!(Response::decode(&[REPORT_ID, 0x01, 0x00]).is_err());
    }

    #[test]
    fn decode_rejects_unknown_report_id() {
        let data = vec![0x99; REPORT_LEN];
        assert!(Response::decode(&data).is_err());
    }

    #[test]
    fn error_response_detected() {
        let mut data = vec![REPORT_ID, 0x82, 0x30, 0x01, 0x04];
        data.resize(REPORT_LEN, 0);
        let resp = Response::decode(&data).unwrap();
        assert!(resp.is_error());
        assert_eq!(resp.error_code(), 0x04);
        assert!(resp.matches(&Request::write(0x30, &[0x01])));
    }

    #[test]
    fn command_from_byte() {
        assert_eq!(Command::from_byte(0x03), Some(Command::Commit));
        assert_eq!(Command::from_byte(0x7F), None);
    }
}
