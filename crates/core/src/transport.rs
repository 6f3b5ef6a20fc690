//! HID transport abstraction for device communication.
//!
//! Provides a trait-based transport layer so that real HID devices and
//! mock devices share the same interface.

use crate::error::{Error, Result};
use crate::protocol::{Request, Response};
use tracing::{trace, warn};

/// Abstraction over raw HID read/write.
///
/// Implementations must be able to send one report and receive the answer.
pub trait HidTransport: Send {
    /// Write a raw HID report and return the response.
    fn send_report(&self, data: &[u8]) -> Result<Vec<u8>>;
}

/// Send a register request and decode the response.
pub fn register_request(transport: &dyn HidTransport, req: &Request) -> Result<Response> {
    let encoded = req.encode()?;
    trace!(
        command = ?req.command,
        address = format_args!("0x{:02X}", req.address),
        length = req.length,
        report_hex = format_args!("{:02X?}", encoded),
        "register TX"
    );

    let raw = transport.send_report(&encoded)?;
    let resp = Response::decode(&raw)?;

    trace!(
        command = format_args!("0x{:02X}", resp.command),
        address = format_args!("0x{:02X}", resp.address),
        data_hex = format_args!("{:02X?}", resp.payload()),
        "register RX"
    );

    if resp.is_error() {
        warn!(
            command = ?req.command,
            error_code = resp.error_code(),
            "device error response"
        );
        return Err(Error::Protocol {
            command: req.command as u8,
            code: resp.error_code(),
        });
    }

    if !resp.matches(req) {
        return Err(Error::Hid(format!(
            "unexpected response: command 0x{:02X} address 0x{:02X}",
            resp.command, resp.address
        )));
    }

    Ok(resp)
}


#[cfg(test)]
mod tests {
    use super::mock::MockTransport;
    use super::*;
    use crate::protocol::{HEADER_LEN, REPORT_LEN};

    #[test]
    fn register_request_returns_payload() {
        let mock = MockTransport::new();
        let req = Request::read(0x30, 3);
        mock.on_register_request(&req, &[0x02, 0x01, 0x02]);

        let resp = register_request(&mock, &req).unwrap();
        assert_eq!(resp.payload(), &[0x02, 0x01, 0x02]);
    }

    #[test]
    fn register_request_detects_error_response() {
        let mock = MockTransport::new();
        let req = Request::write(0x30, &[0x09]);
        let encoded = req.encode().unwrap();

        let mut err_resp = encoded[..HEADER_LEN].to_vec();
        err_resp[1] |= 0x80;
        err_resp.push(0x04);
        err_resp.resize(REPORT_LEN, 0);
        mock.on_request(encoded, err_resp);

        match register_request(&mock, &req) {
            Err(Error::Protocol { command, code }) => {
                assert_eq!(command, 0x02);
                assert_eq!(code, 0x04);
            }
            other => panic!("expected protocol error, got {other:?}"),
        }
    }

    #[test]
    fn register_request_rejects_mismatched_echo() {
        let mock = MockTransport::new();
        let req = Request::read(0x10, 1);
        let mut resp = Request::read(0x11, 1).encode().unwrap();
        resp.truncate(HEADER_LEN);
        resp.resize(REPORT_LEN, 0);
        mock.on_request(req.encode().unwrap(), resp);

        assert!(register_request(&mock, &req).is_err());
    }

    #[test]
    fn register_request_unregistered_fails() {
        let mock = MockTransport::new();
        assert!(register_request(&mock, &Request::commit()).is_err());
    }
}
