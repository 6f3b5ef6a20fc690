//! Retry policy for register traffic.
//!
//! A USB mouse can drop a report or answer late while it is busy scanning
//! the sensor. Those failures are retried; everything else is returned as-is.

use crate::error::{Error, Result};
use crate::protocol::{Request, Response};
use crate::transport::{register_request, HidTransport};
use tracing::{debug, warn};

/// Extra attempts after the first one.
pub const MAX_RETRIES: u32 = 3;

/// Device error code meaning "busy, try again".
pub const DEVICE_BUSY: u8 = 0x05;

/// How a failed exchange should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Timeout or busy device; worth another attempt.
    Transient,
    /// The mouse went away.
    Disconnected,
    PermissionDenied,
    /// The mouse rejected the request.
    Protocol,
    /// Bad request, bad reply, or a caller-side error.
    InvalidResponse,
}

fn classify_hid_message(msg: &str) -> ErrorClass {
    let lower = msg.to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| lower.contains(*n));

    if has(&["disconnect", "not found", "no such device"][..]) {
        ErrorClass::Disconnected
    } else if has(&["permission", "access denied"][..]) {
        ErrorClass::PermissionDenied
    } else if has(&["timeout", "timed out"][..]) {
        ErrorClass::Transient
    } else {
        ErrorClass::InvalidResponse
    }
}

impl ErrorClass {
    pub fn classify(err: &Error) -> Self {
        match err {
            Error::Timeout(_) => Self::Transient,
            Error::Protocol { code, .. } if *code == DEVICE_BUSY => Self::Transient,
            Error::Protocol { .. } => Self::Protocol,
            Error::DeviceNotFound(_) => Self::Disconnected,
            Error::PermissionDenied(_) => Self::PermissionDenied,
            Error::Hid(msg) => classify_hid_message(msg),
            Error::OutOfRange { .. } | Error::Profile(_) | Error::NotQueried => {
                Self::InvalidResponse
            }
        }
    }

    pub fn is_retryable(&self) -> bool {
        *self == Self::Transient
    }
}

/// Send `req`, retrying transient failures up to `max_retries` more times.
pub fn send_with_retry(
    transport: &dyn HidTransport,
    req: &Request,
    max_retries: u32,
) -> Result<Response> {
    let mut attempt = 0;
    loop {
        let err = match register_request(transport, req) {
            Ok(resp) => {
                if attempt > 0 {
                    debug!(attempt = attempt + 1, "register request recovered");
                }
                return Ok(resp);
            }
            Err(e) => e,
        };

        let class = ErrorClass::classify(&err);
        if !class.is_retryable() || attempt >= max_retries {
            warn!(
                command = ?req.command,
                address = format_args!("0x{:02X}", req.address),
                ?class,
                attempts = attempt + 1,
                "register request failed: {err}"
            );
            return Err(err);
        }

        debug!(
            command = ?req.command,
            attempt = attempt + 1,
            "transient failure, retrying: {err}"
        );
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ERROR_FLAG, HEADER_LEN, REPORT_LEN};
    use crate::transport::mock::MockTransport;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails a fixed number of times with `failure` before delegating.
    struct FlakyTransport {
        failures_left: AtomicU32,
        failure: fn(&[u8]) -> Result<Vec<u8>>,
        inner: MockTransport,
    }

    impl FlakyTransport {
        fn timing_out(failures: u32, inner: MockTransport) -> Self {
            Self {
                failures_left: AtomicU32::new(failures),
                failure: |_| Err(Error::Timeout("hid_read timed out".into())),
                inner,
            }
        }
    }

    impl HidTransport for FlakyTransport {
        fn send_report(&self, data: &[u8]) -> Result<Vec<u8>> {
            if self.failures_left.load(Ordering::SeqCst) > 0 {
                self.failures_left.fetch_sub(1, Ordering::SeqCst);
                return (self.failure)(data);
            }
            self.inner.send_report(data)
        }
    }

    fn busy_reply(data: &[u8]) -> Result<Vec<u8>> {
        let mut resp = data[..HEADER_LEN].to_vec();
        resp[1] |= ERROR_FLAG;
        resp.push(DEVICE_BUSY);
        resp.resize(REPORT_LEN, 0);
        Ok(resp)
    }

    #[test]
    fn timeouts_and_busy_are_transient() {
        assert!(ErrorClass::classify(&Error::Timeout("1s".into())).is_retryable());
        let busy = Error::Protocol {
            command: 0x02,
            code: DEVICE_BUSY,
        };
        assert_eq!(ErrorClass::classify(&busy), ErrorClass::Transient);
    }

    #[test]
    fn device_rejection_is_not_retried() {
        let err = Error::Protocol {
            command: 0x02,
            code: 0x04,
        };
        assert_eq!(ErrorClass::classify(&err), ErrorClass::Protocol);
        assert!(!ErrorClass::classify(&err).is_retryable());
    }

    #[test]
    fn hid_messages_are_sorted_by_content() {
        let class = |m: &str| ErrorClass::classify(&Error::Hid(m.into()));
        assert_eq!(class("No such device"), ErrorClass::Disconnected);
        assert_eq!(class("Permission denied (os error 13)"), ErrorClass::PermissionDenied);
        assert_eq!(class("timed out waiting for response"), ErrorClass::Transient);
        assert_eq!(class("short report"), ErrorClass::InvalidResponse);
    }

    #[test]
    fn caller_errors_are_not_retried() {
        assert!(!ErrorClass::classify(&Error::NotQueried).is_retryable());
        assert_eq!(
            ErrorClass::classify(&Error::PermissionDenied("udev".into())),
            ErrorClass::PermissionDenied
        );
    }

    #[test]
    fn recovers_from_timeouts() {
        let inner = MockTransport::new();
        let req = Request::read(0x10, 1);
        inner.on_register_request(&req, &[0x01]);
        let flaky = FlakyTransport::timing_out(2, inner);

        let resp = send_with_retry(&flaky, &req, MAX_RETRIES).unwrap();
        assert_eq!(resp.payload(), &[0x01]);
    }

    #[test]
    fn recovers_from_busy_device() {
        let inner = MockTransport::new();
        let req = Request::commit();
        inner.on_register_request(&req, &[]);
        let flaky = FlakyTransport {
            failures_left: AtomicU32::new(1),
            failure: busy_reply,
            inner,
        };

        assert!(send_with_retry(&flaky, &req, MAX_RETRIES).is_ok());
    }

    #[test]
    fn gives_up_after_max_retries() {
        let flaky = FlakyTransport::timing_out(10, MockTransport::new());
        let result = send_with_retry(&flaky, &Request::commit(), 2);
        assert!(matches!(result, Err(Error::Timeout(_))));
        assert_eq!(flaky.failures_left.load(Ordering::SeqCst), 7);
    }

    #[test]
    fn unanswered_request_fails_without_retry() {
        let mock = MockTransport::new();
        assert!(send_with_retry(&mock, &Request::commit(), 3).is_err());
    }
}
