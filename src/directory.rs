//! Device directory: enumeration and per-handle metadata.
//!
//! Every call goes to the subsystem; nothing is cached. Handles are weak identities,
//! so every per-handle lookup here is allowed to fail and is folded into an empty
//! result instead of an error.

use crate::api::RawInputApi;
use crate::device::{DeviceClass, DeviceClassInfo, DeviceDescriptor, DeviceHandle};
use crate::layout::{parse_device_info, DEVICE_INFO_LEN};
use crate::negotiate::{query, query_into};
use log::{debug, trace, warn};
use std::collections::HashSet;

/// Borrowed view over a [`RawInputApi`] exposing the directory operations.
pub struct DeviceDirectory<'a> {
    api: &'a dyn RawInputApi,
}

impl<'a> DeviceDirectory<'a> {
    pub fn new(api: &'a dyn RawInputApi) -> Self {
        Self { api }
    }

    /// Enumerate attached devices.
    ///
    /// Tolerates the device count changing between the sizing and fill calls. A failed
    /// subsystem call yields an empty list. Duplicate handles are dropped, keeping the
    /// first occurrence.
    pub fn list_devices(&self) -> Vec<DeviceDescriptor> {
        let seed = DeviceDescriptor {
            handle: DeviceHandle(0),
            class: DeviceClass::GenericHid,
        };
        let mut raw = Vec::new();
        if let Err(e) = query_into(
            &mut raw,
            seed,
            || self.api.device_list_len(),
            |buf| self.api.fill_device_list(buf),
        ) {
            warn!("device enumeration failed: {e}");
            return Vec::new();
        }

        let mut seen = HashSet::with_capacity(raw.len());
        raw.retain(|d| seen.insert(d.handle));
        trace!("enumerated {} device(s)", raw.len());
        raw
    }

    /// Class-specific metadata for `handle`, or [`DeviceClassInfo::Unknown`] if the
    /// handle is stale or the query fails.
    pub fn device_info(&self, handle: DeviceHandle) -> DeviceClassInfo {
        let mut buf = [0u8; DEVICE_INFO_LEN];
        match self.api.device_info(handle, &mut buf) {
            Ok(n) => parse_device_info(&buf[..n.min(buf.len())]),
            Err(e) => {
                debug!("device_info({handle}) failed: {e}");
                DeviceClassInfo::Unknown
            }
        }
    }

    /// Device interface path for `handle` (trailing NULs removed).
    ///
    /// Returns `None` if the handle is stale or the path is empty.
    pub fn device_name(&self, handle: DeviceHandle) -> Option<String> {
        let mut wide: Vec<u16> = match query(
            || self.api.device_name_len(handle),
            |buf| self.api.fill_device_name(handle, buf),
        ) {
            Ok(w) => w,
            Err(e) => {
                debug!("device_name({handle}) failed: {e}");
                return None;
            }
        };

        while wide.last() == Some(&0) {
            wide.pop();
        }
        if wide.is_empty() {
            return None;
        }
        Some(String::from_utf16_lossy(&wide))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::virtual_input::{VirtualDevice, VirtualRawInput};
    use crate::device::{HidInfo, UsagePair};

    fn pad(handle: usize) -> VirtualDevice {
        VirtualDevice::hid(
            handle,
            HidInfo {
                vendor_id: 0x045e,
                product_id: 0x0b13,
                version: 0x0509,
                usage: UsagePair::GAMEPAD,
            },
            r"\\?\HID#{00001812-0000-1000-8000-00805f9b34fb}_Dev_VID&02045e_PID&0b13#9&1&0000#{4d1e55b2-f16f-11cf-88cb-001111000030}",
        )
    }

    #[test]
    fn lists_every_attached_device_once() {
        let api = VirtualRawInput::new();
        api.add_device(pad(0x10));
        api.add_device(VirtualDevice::keyboard(0x20));
        api.add_device(pad(0x10));

        let list = DeviceDirectory::new(&api).list_devices();
        let handles: Vec<_> = list.iter().map(|d| d.handle.raw()).collect();
        assert_eq!(handles, vec![0x10, 0x20]);
        assert_eq!(list[1].class, DeviceClass::Keyboard);
    }

    #[test]
    fn shrinking_enumeration_returns_only_written_entries() {
        let api = VirtualRawInput::new();
        api.add_device(pad(1));
        api.add_device(pad(2));
        api.add_device(pad(3));
        api.detach_between_phases(2);

        let list = DeviceDirectory::new(&api).list_devices();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].handle, DeviceHandle(1));
    }

    #[test]
    fn growing_enumeration_is_benign() {
        let api = VirtualRawInput::new();
        api.add_device(pad(1));
        api.attach_between_phases(pad(2));

        let list = DeviceDirectory::new(&api).list_devices();
        assert!(list.is_empty());
        // The race is one-shot; the next enumeration sees both devices.
        assert_eq!(DeviceDirectory::new(&api).list_devices().len(), 2);
    }

    #[test]
    fn stale_handle_yields_empty_metadata() {
        let api = VirtualRawInput::new();
        api.add_device(pad(7));
        let dir = DeviceDirectory::new(&api);
        assert!(dir.device_info(DeviceHandle(7)).hid().is_some());
        assert!(dir.device_name(DeviceHandle(7)).is_some());

        api.remove_device(DeviceHandle(7));
        assert_eq!(dir.device_info(DeviceHandle(7)), DeviceClassInfo::Unknown);
        assert_eq!(dir.device_name(DeviceHandle(7)), None);
    }

    #[test]
    fn device_name_strips_terminator() {
        let api = VirtualRawInput::new();
        api.add_device(VirtualDevice::mouse(3).with_name(r"\\?\HID#VID_046D&PID_C52B"));
        let name = DeviceDirectory::new(&api).device_name(DeviceHandle(3)).unwrap();
        assert_eq!(name, r"\\?\HID#VID_046D&PID_C52B");
    }
}
