//! Device discovery.

use crate::error::{Error, Result};
use crate::{USB_M8_PID, USB_M8_VID};
use std::ffi::CString;
use tracing::{debug, info};

/// Information about a discovered mouse interface.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub vid: u16,
    pub pid: u16,
    pub path: String,
    pub interface_number: i32,
    pub serial: Option<String>,
}

impl DeviceInfo {
    /// Platform path in the form hidapi's `open_path` expects.
    pub fn hid_path(&self) -> Result<CString> {
        CString::new(self.path.as_str())
            .map_err(|e| Error::Hid(format!("invalid device path {:?}: {e}", self.path)))
    }
}

/// Whether a USB ID pair belongs to a supported mouse.
pub fn is_supported(vid: u16, pid: u16) -> bool {
    vid == USB_M8_VID && pid == USB_M8_PID
}

/// Discover all connected M8 mouse interfaces.
///
/// Enumerates USB HID devices and returns info for every matching interface.
pub fn discover_devices() -> Result<Vec<DeviceInfo>> {
    debug!("Starting HID device enumeration");
    let api = hidapi::HidApi::new().map_err(|e| Error::Hid(e.to_string()))?;

    let mut devices = Vec::new();
    for info in api.device_list() {
        if !is_supported(info.vendor_id(), info.product_id()) {
            continue;
        }

        info!(
            vid = format_args!("0x{:04X}", info.vendor_id()),
            pid = format_args!("0x{:04X}", info.product_id()),
            interface = info.interface_number(),
            path = %info.path().to_string_lossy(),
            "Found M8 mouse interface"
        );
        devices.push(DeviceInfo {
            vid: info.vendor_id(),
            pid: info.product_id(),
            path: info.path().to_string_lossy().into_owned(),
            interface_number: info.interface_number(),
            serial: info.serial_number().map(|s| s.to_string()),
        });
    }

    debug!(count = devices.len(), "Device enumeration complete");
    Ok(devices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supported_ids() {
        assert!(is_supported(USB_M8_VID, USB_M8_PID));
    }

    #[test]
    fn unsupported_ids() {
        assert!(!is_supported(USB_M8_VID, 0x0001));
        assert!(!is_supported(0x046D, USB_M8_PID));
    }

    fn info(path: &str) -> DeviceInfo {
        DeviceInfo {
            vid: USB_M8_VID,
            pid: USB_M8_PID,
            path: path.to_string(),
            interface_number: 1,
            serial: None,
        }
    }

    #[test]
    fn hid_path_keeps_discovered_path() {
        let path = info("/dev/hidraw3").hid_path().unwrap();
        assert_eq!(path.to_str().unwrap(), "/dev/hidraw3");
    }

    #[test]
    fn hid_path_rejects_interior_nul() {
        assert!(matches!(info("bad\0path").hid_path(), Err(Error::Hid(_))));
    }
}
