//! m8mouse CLI: command-line mouse configuration tool.

mod app;
mod args;
mod logging;
mod render;

use anyhow::Result;
use m8mouse_core::error::Error;
use m8mouse_core::transport::HidTransport;
use m8mouse_core::HidSession;
use std::process::ExitCode;
use tracing::debug;

const READ_TIMEOUT_MS: i32 = 1000;

struct CliHidTransport {
    device: hidapi::HidDevice,
}

impl CliHidTransport {
    fn open_first_supported() -> m8mouse_core::error::Result<Self> {
        let devices = m8mouse_core::device::discover_devices()?;
        let first = devices
            .first()
            .ok_or_else(|| Error::DeviceNotFound("no M8 mouse on the USB bus".to_string()))?;

        let api = hidapi::HidApi::new().map_err(|e| Error::Hid(format!("hidapi init: {e}")))?;
        let device = api.open_path(&first.hid_path()?).map_err(|e| {
            let msg = format!("open HID device {}: {e}", first.path);
            if msg.to_lowercase().contains("permission") {
                Error::PermissionDenied(msg)
            } else {
                Error::Hid(msg)
            }
        })?;
        debug!(
            path = %first.path,
            interface = first.interface_number,
            serial = first.serial.as_deref().unwrap_or("-"),
            "opened device"
        );

        Ok(Self { device })
    }
}

impl HidTransport for CliHidTransport {
    fn send_report(&self, data: &[u8]) -> m8mouse_core::error::Result<Vec<u8>> {
        self.device
            .write(data)
            .map_err(|e| Error::Hid(format!("write: {e}")))?;

        let mut response = [0u8; 64];
        let n = self
            .device
            .read_timeout(&mut response, READ_TIMEOUT_MS)
            .map_err(|e| Error::Hid(format!("read_timeout: {e}")))?;

        if n == 0 {
            return Err(Error::Timeout(format!(
                "hid_read timed out after {READ_TIMEOUT_MS}ms"
            )));
        }

        Ok(response[..n].to_vec())
    }
}

fn open_session() -> m8mouse_core::error::Result<HidSession<CliHidTransport>> {
    CliHidTransport::open_first_supported().map(HidSession::new)
}

fn main() -> Result<ExitCode> {
    let invocation = args::parse_args(std::env::args().skip(1));

    let log = match invocation.action {
        args::RunAction::Get | args::RunAction::Set => {
            Some(logging::LogContext::install(invocation.intent.debug_level))
        }
        _ => None,
    };
    if let Some(path) = log.as_ref().and_then(|ctx| ctx.log_file()) {
        debug!(file = %path.display(), "trace log enabled");
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let status = app::run(&invocation, open_session, &mut out)?;
    Ok(ExitCode::from(status))
}
