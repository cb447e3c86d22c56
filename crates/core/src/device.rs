//! Device model: discovery, matching, and the hidapi-backed handles.

use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::runtime::ReportSink;
use crate::surface::PRODUCT_NAME;
use crate::transport::HidTransport;
use crate::{ids, SYSTEMS_203_VID};
use std::ffi::CString;
use std::sync::Mutex;
use std::thread::JoinHandle;
use tracing::{debug, info, warn};

/// Information about an enumerated HID interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HidDeviceInfo {
    pub vendor_id: u16,
    pub product_id: u16,
    pub usage_page: u16,
    pub usage: u16,
    pub path: String,
    pub serial: Option<String>,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
}

impl From<&hidapi::DeviceInfo> for HidDeviceInfo {
    fn from(info: &hidapi::DeviceInfo) -> Self {
        Self {
            vendor_id: info.vendor_id(),
            product_id: info.product_id(),
            usage_page: info.usage_page(),
            usage: info.usage(),
            path: info.path().to_string_lossy().into_owned(),
            serial: info.serial_number().map(|s| s.to_string()),
            manufacturer: info.manufacturer_string().map(|s| s.to_string()),
            product: info.product_string().map(|s| s.to_string()),
        }
    }
}

/// A HID interface recognized as a Mystrix panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredSurface {
    pub surface_id: String,
    pub description: &'static str,
    pub device: HidDeviceInfo,
}

/// Match a HID interface against the Mystrix raw HID interface.
///
/// Several interfaces share the vendor/product ids; only the vendor usage
/// page carries the LED protocol.
pub fn check_supports_hid_device(info: &HidDeviceInfo) -> Option<DiscoveredSurface> {
    if info.vendor_id != SYSTEMS_203_VID
        || (info.product_id & ids::MYSTRIX_PID_MASK) != ids::MYSTRIX_PID
        || info.usage_page != ids::RAW_HID_USAGE_PAGE
        || info.usage != ids::RAW_HID_USAGE
    {
        return None;
    }

    debug!(
        manufacturer = info.manufacturer.as_deref().unwrap_or("?"),
        product = info.product.as_deref().unwrap_or("?"),
        "Checked HID device"
    );

    // The firmware reports a synthesized serial; fall back to the path
    let serial = info.serial.as_deref().unwrap_or(&info.path);
    Some(DiscoveredSurface {
        surface_id: format!("203-mystrix:{serial}"),
        description: PRODUCT_NAME,
        device: info.clone(),
    })
}

/// Discover all connected Mystrix panels.
pub fn discover_devices(api: &hidapi::HidApi) -> Vec<DiscoveredSurface> {
    debug!("Starting HID device enumeration");

    let surfaces: Vec<_> = api
        .device_list()
        .map(HidDeviceInfo::from)
        .filter_map(|info| check_supports_hid_device(&info))
        .inspect(|surface| {
            info!(
                surface_id = %surface.surface_id,
                vid = format_args!("0x{:04X}", surface.device.vendor_id),
                pid = format_args!("0x{:04X}", surface.device.product_id),
                path = %surface.device.path,
                "Found Mystrix"
            );
        })
        .collect();

    debug!(count = surfaces.len(), "Device enumeration complete");
    surfaces
}

fn open_path(api: &hidapi::HidApi, info: &HidDeviceInfo) -> Result<hidapi::HidDevice> {
    let path = CString::new(info.path.as_str())
        .map_err(|e| Error::DeviceNotFound(format!("bad HID path {:?}: {e}", info.path)))?;
    api.open_path(&path)
        .map_err(|e| Error::Hid(format!("open {}: {e}", info.path)))
}

/// Write half of an opened panel. `close` drops the hidapi handle, after
/// which every write fails.
pub struct HidapiTransport {
    device: Mutex<Option<hidapi::HidDevice>>,
}

impl HidapiTransport {
    pub fn open(api: &hidapi::HidApi, info: &HidDeviceInfo) -> Result<Self> {
        Ok(Self {
            device: Mutex::new(Some(open_path(api, info)?)),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<hidapi::HidDevice>>> {
        self.device
            .lock()
            .map_err(|_| Error::Hid("HID handle lock poisoned".into()))
    }
}

impl HidTransport for HidapiTransport {
    fn write_report(&self, data: &[u8]) -> Result<()> {
        let guard = self.lock()?;
        let device = guard
            .as_ref()
            .ok_or_else(|| Error::Hid("write: handle closed".into()))?;
        device
            .write(data)
            .map_err(|e| Error::Hid(format!("write: {e}")))?;
        Ok(())
    }

    fn close(&self) -> Result<()> {
        if self.lock()?.take().is_some() {
            debug!("HID write handle released");
        }
        Ok(())
    }
}

/// Read half of an opened panel, on its own handle so that reads never
/// hold up writes.
pub struct HidReader {
    device: hidapi::HidDevice,
    timeout_ms: i32,
    buffer_len: usize,
}

impl HidReader {
    pub fn open(api: &hidapi::HidApi, info: &HidDeviceInfo, config: &SessionConfig) -> Result<Self> {
        Ok(Self {
            device: open_path(api, info)?,
            timeout_ms: config.read_timeout_ms,
            buffer_len: config.read_buffer_len,
        })
    }

    /// Forward reports to `sink` on a background thread until the session
    /// goes away or the handle fails.
    pub fn spawn(self, sink: ReportSink) -> std::io::Result<JoinHandle<()>> {
        std::thread::Builder::new()
            .name("mystrix-reader".into())
            .spawn(move || self.run(&sink))
    }

    fn run(self, sink: &ReportSink) {
        let mut buf = vec![0u8; self.buffer_len];

        while !sink.is_closed() {
            match self.device.read_timeout(&mut buf, self.timeout_ms) {
                Ok(0) => {}
                Ok(n) => {
                    let report = buf[..n.min(buf.len())].to_vec();
                    if !sink.report(report) {
                        break;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "HID read failed");
                    sink.hardware_error(Error::Hid(format!("read: {e}")));
                    break;
                }
            }
        }

        debug!("Reader stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mystrix_interface() -> HidDeviceInfo {
        HidDeviceInfo {
            vendor_id: 0x0203,
            product_id: 0x1041,
            usage_page: 0xFF00,
            usage: 0x01,
            path: "/dev/hidraw3".into(),
            serial: Some("A1B2C3".into()),
            manufacturer: Some("203 Systems".into()),
            product: Some("Mystrix".into()),
        }
    }

    #[test]
    fn matches_raw_hid_interface() {
        let surface = check_supports_hid_device(&mystrix_interface()).unwrap();
        assert_eq!(surface.surface_id, "203-mystrix:A1B2C3");
        assert_eq!(surface.description, "203 Systems Mystrix");
    }

    #[test]
    fn product_id_low_bits_are_masked() {
        for pid in [0x1040, 0x1055, 0x107F] {
            let info = HidDeviceInfo {
                product_id: pid,
                ..mystrix_interface()
            };
            assert!(check_supports_hid_device(&info).is_some(), "pid 0x{pid:04X}");
        }
        let info = HidDeviceInfo {
            product_id: 0x1080,
            ..mystrix_interface()
        };
        assert!(check_supports_hid_device(&info).is_none());
    }

    #[test]
    fn rejects_other_interfaces() {
        let wrong_vendor = HidDeviceInfo {
            vendor_id: 0x046D,
            ..mystrix_interface()
        };
        let keyboard_usage = HidDeviceInfo {
            usage_page: 0x0001,
            usage: 0x06,
            ..mystrix_interface()
        };
        let wrong_usage = HidDeviceInfo {
            usage: 0x02,
            ..mystrix_interface()
        };
        assert!(check_supports_hid_device(&wrong_vendor).is_none());
        assert!(check_supports_hid_device(&keyboard_usage).is_none());
        assert!(check_supports_hid_device(&wrong_usage).is_none());
    }

    #[test]
    fn missing_serial_falls_back_to_path() {
        let info = HidDeviceInfo {
            serial: None,
            ..mystrix_interface()
        };
        let surface = check_supports_hid_device(&info).unwrap();
        assert_eq!(surface.surface_id, "203-mystrix:/dev/hidraw3");
    }
}
