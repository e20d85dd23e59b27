//! Device metadata snapshot.
//!
//! [`DeviceMeta`] is a lightweight, cloneable description of a raw-input device suitable
//! for diagnostics and logging. It is assembled from the directory's class info and
//! interface path; unknown fields remain `None`.
//!
//! # Conventions
//! - `bus` is a short hint: `"bluetooth-le"` when the interface path carries the GATT HID
//!   service UUID, `"usb"` when it names a USB `VID_`, `"rawinput"` otherwise.
//! - `path` is the device interface path. It is platform-specific and changes across
//!   re-pairing and reconnects; treat it as diagnostic first, identity second.

use crate::device::{DeviceClass, DeviceClassInfo};
use crate::registrar::GATT_HID_SERVICE_UUID;
use serde::{Deserialize, Serialize};

/// Snapshot of metadata describing a single device.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceMeta {
    /// High-level bus classification (see module docs).
    pub bus: Option<String>,

    pub class: Option<DeviceClass>,

    /// Vendor ID, if the device is HID.
    pub vid: Option<u32>,

    /// Product ID, if the device is HID.
    pub pid: Option<u32>,

    /// Firmware version number, if the device is HID.
    pub version: Option<u32>,

    /// HID Usage Page (e.g., `0x01` for Generic Desktop), if known.
    pub usage_page: Option<u16>,

    /// HID Usage within the page (e.g., `0x05` Gamepad), if known.
    pub usage: Option<u16>,

    /// Device interface path.
    pub path: Option<String>,
}

impl DeviceMeta {
    pub fn from_parts(info: &DeviceClassInfo, path: Option<&str>) -> Self {
        let hid = info.hid();
        Self {
            bus: path.map(|p| bus_hint(p).to_string()),
            class: info.class(),
            vid: hid.map(|h| h.vendor_id),
            pid: hid.map(|h| h.product_id),
            version: hid.map(|h| h.version),
            usage_page: hid.map(|h| h.usage.usage_page),
            usage: hid.map(|h| h.usage.usage),
            path: path.map(str::to_string),
        }
    }
}

fn bus_hint(path: &str) -> &'static str {
    let lower = path.to_ascii_lowercase();
    if lower.contains(GATT_HID_SERVICE_UUID) {
        "bluetooth-le"
    } else if lower.contains("vid_") {
        "usb"
    } else {
        "rawinput"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{HidInfo, UsagePair};

    #[test]
    fn bus_is_derived_from_path() {
        let info = DeviceClassInfo::Hid(HidInfo {
            vendor_id: 0x057e,
            product_id: 0x2009,
            version: 1,
            usage: UsagePair::GAMEPAD,
        });
        let ble = DeviceMeta::from_parts(
            &info,
            Some(r"\\?\HID#{00001812-0000-1000-8000-00805F9B34FB}_Dev_VID&02057e"),
        );
        assert_eq!(ble.bus.as_deref(), Some("bluetooth-le"));
        assert_eq!(ble.vid, Some(0x057e));
        assert_eq!(ble.usage, Some(0x05));

        let usb = DeviceMeta::from_parts(&info, Some(r"\\?\HID#VID_057E&PID_2009"));
        assert_eq!(usb.bus.as_deref(), Some("usb"));

        let none = DeviceMeta::from_parts(&DeviceClassInfo::Unknown, None);
        assert_eq!(none, DeviceMeta::default());
    }
}
