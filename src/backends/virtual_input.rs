//! In-memory raw-input subsystem.
//!
//! [`VirtualRawInput`] implements [`RawInputApi`] over a scripted device table and
//! event queue, so the whole discovery → registration → decode pipeline can run on any
//! host. It behaves like a strict backend:
//!
//! - removing a registration that does not exist fails,
//! - `INPUT_SINK` without a target surface fails,
//! - fill calls with a too-small buffer fail with `InsufficientBuffer`,
//! - queries against a removed handle fail.
//!
//! Every call is counted (see [`CallCounts`]) and every registration entry is logged, so
//! tests can assert not only on results but on which subsystem calls were made.

use crate::api::{EventPart, PayloadToken, RawInputApi, Registration, RegistrationFlags};
use crate::decoder::encode_hid_event;
use crate::device::{
    DeviceClass, DeviceClassInfo, DeviceDescriptor, DeviceHandle, HidInfo, KeyboardInfo,
    MouseInfo, UsagePair,
};
use crate::error::{RawInputError, Result};
use crate::layout::{encode_device_info, HEADER_LEN};
use crate::registrar::GATT_HID_SERVICE_UUID;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

const ERROR_INVALID_HANDLE: u32 = 6;
const ERROR_INVALID_PARAMETER: u32 = 87;

/// A scripted device.
#[derive(Clone, Debug)]
pub struct VirtualDevice {
    pub handle: DeviceHandle,
    pub class: DeviceClass,
    pub info: DeviceClassInfo,
    /// Interface path; `None` makes name queries fail like a stale handle.
    pub name: Option<String>,
}

impl VirtualDevice {
    pub fn hid(handle: usize, info: HidInfo, name: &str) -> Self {
        Self {
            handle: DeviceHandle(handle),
            class: DeviceClass::GenericHid,
            info: DeviceClassInfo::Hid(info),
            name: Some(name.to_string()),
        }
    }

    /// A Bluetooth LE gamepad whose path carries the GATT HID service UUID.
    pub fn gatt_gamepad(handle: usize) -> Self {
        Self::hid(
            handle,
            HidInfo {
                vendor_id: 0x045e,
                product_id: 0x0b13,
                version: 0x0509,
                usage: UsagePair::GAMEPAD,
            },
            &format!(
                r"\\?\HID#{GATT_HID_SERVICE_UUID}_Dev_VID&02045e_PID&0b13_REV&0509_{handle:012x}&Col01#a&1&0000#{{4d1e55b2-f16f-11cf-88cb-001111000030}}"
            ),
        )
    }

    /// A wired gamepad on the same usage that must not be selected.
    pub fn usb_gamepad(handle: usize) -> Self {
        Self::hid(
            handle,
            HidInfo {
                vendor_id: 0x054c,
                product_id: 0x09cc,
                version: 0x0100,
                usage: UsagePair::GAMEPAD,
            },
            &format!(
                r"\\?\HID#VID_054C&PID_09CC&MI_03#7&{handle:x}&0&0000#{{4d1e55b2-f16f-11cf-88cb-001111000030}}"
            ),
        )
    }

    pub fn keyboard(handle: usize) -> Self {
        Self {
            handle: DeviceHandle(handle),
            class: DeviceClass::Keyboard,
            info: DeviceClassInfo::Keyboard(KeyboardInfo {
                kind: 4,
                sub_kind: 0,
                mode: 1,
                function_keys: 12,
                indicators: 3,
                total_keys: 101,
            }),
            name: Some(format!(r"\\?\HID#VID_046D&PID_C31C&MI_00#{handle:x}")),
        }
    }

    pub fn mouse(handle: usize) -> Self {
        Self {
            handle: DeviceHandle(handle),
            class: DeviceClass::Mouse,
            info: DeviceClassInfo::Mouse(MouseInfo {
                id: 256,
                buttons: 5,
                sample_rate: 0,
                has_horizontal_wheel: true,
            }),
            name: Some(format!(r"\\?\HID#VID_046D&PID_C077#{handle:x}")),
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn without_name(mut self) -> Self {
        self.name = None;
        self
    }
}

/// Number of calls made into each subsystem entry point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub device_list_len: usize,
    pub fill_device_list: usize,
    pub device_info: usize,
    pub device_name_len: usize,
    pub fill_device_name: usize,
    pub register_devices: usize,
    /// Header-only sizing and fetches.
    pub event_header: usize,
    /// Full-payload size queries.
    pub event_len: usize,
    /// Full-payload fetches.
    pub fill_event: usize,
}

#[derive(Default)]
struct State {
    devices: Vec<VirtualDevice>,
    events: HashMap<PayloadToken, Vec<u8>>,
    len_overrides: HashMap<PayloadToken, usize>,
    failing_fetches: HashSet<PayloadToken>,
    registrations: Vec<Registration>,
    active: Vec<UsagePair>,
    fail_registration: bool,
    detach_between: usize,
    attach_between: Vec<VirtualDevice>,
    calls: CallCounts,
}

impl State {
    fn device(&self, handle: DeviceHandle) -> Result<&VirtualDevice> {
        self.devices
            .iter()
            .find(|d| d.handle == handle)
            .ok_or(RawInputError::Subsystem {
                call: "GetRawInputDeviceInfoW",
                code: ERROR_INVALID_HANDLE,
            })
    }

    fn event(&self, token: PayloadToken) -> Result<&Vec<u8>> {
        self.events.get(&token).ok_or(RawInputError::Subsystem {
            call: "GetRawInputData",
            code: ERROR_INVALID_HANDLE,
        })
    }
}

/// Scripted, instrumented [`RawInputApi`].
#[derive(Default)]
pub struct VirtualRawInput {
    state: RefCell<State>,
}

impl VirtualRawInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a device. Duplicate handles are kept, as a misbehaving subsystem might.
    pub fn add_device(&self, device: VirtualDevice) {
        self.state.borrow_mut().devices.push(device);
    }

    /// Detach every device with `handle`. Its handle goes stale.
    pub fn remove_device(&self, handle: DeviceHandle) {
        self.state.borrow_mut().devices.retain(|d| d.handle != handle);
    }

    /// On the next enumeration, detach the last `n` devices after the sizing call.
    pub fn detach_between_phases(&self, n: usize) {
        self.state.borrow_mut().detach_between = n;
    }

    /// On the next enumeration, attach `device` after the sizing call.
    pub fn attach_between_phases(&self, device: VirtualDevice) {
        self.state.borrow_mut().attach_between.push(device);
    }

    /// Make every registration call fail.
    pub fn fail_registration(&self, fail: bool) {
        self.state.borrow_mut().fail_registration = fail;
    }

    /// Queue a HID event delivered in the foreground.
    pub fn push_hid_event(
        &self,
        token: PayloadToken,
        device: DeviceHandle,
        unit_size: i32,
        unit_count: i32,
        data: &[u8],
    ) {
        self.push_raw_event(token, encode_hid_event(device, 0, unit_size, unit_count, data));
    }

    /// Queue an arbitrary native payload.
    pub fn push_raw_event(&self, token: PayloadToken, bytes: Vec<u8>) {
        self.state.borrow_mut().events.insert(token, bytes);
    }

    /// Make the full-payload size query for `token` report `len`.
    pub fn override_event_len(&self, token: PayloadToken, len: usize) {
        self.state.borrow_mut().len_overrides.insert(token, len);
    }

    /// Make the full-payload fetch for `token` fail.
    pub fn fail_event_fetch(&self, token: PayloadToken) {
        self.state.borrow_mut().failing_fetches.insert(token);
    }

    pub fn calls(&self) -> CallCounts {
        self.state.borrow().calls
    }

    pub fn reset_calls(&self) {
        self.state.borrow_mut().calls = CallCounts::default();
    }

    /// Every registration entry submitted so far, failed ones included.
    pub fn registrations(&self) -> Vec<Registration> {
        self.state.borrow().registrations.clone()
    }

    /// Number of usages currently registered.
    pub fn active_registrations(&self) -> usize {
        self.state.borrow().active.len()
    }
}

impl RawInputApi for VirtualRawInput {
    fn device_list_len(&self) -> Result<usize> {
        let mut st = self.state.borrow_mut();
        st.calls.device_list_len += 1;
        let len = st.devices.len();

        let detach = std::mem::take(&mut st.detach_between);
        let keep = st.devices.len().saturating_sub(detach);
        st.devices.truncate(keep);
        let attach = std::mem::take(&mut st.attach_between);
        st.devices.extend(attach);

        Ok(len)
    }

    fn fill_device_list(&self, out: &mut [DeviceDescriptor]) -> Result<usize> {
        let mut st = self.state.borrow_mut();
        st.calls.fill_device_list += 1;
        if out.len() < st.devices.len() {
            return Err(RawInputError::InsufficientBuffer {
                required: st.devices.len(),
            });
        }
        for (slot, dev) in out.iter_mut().zip(st.devices.iter()) {
            *slot = DeviceDescriptor {
                handle: dev.handle,
                class: dev.class,
            };
        }
        Ok(st.devices.len())
    }

    fn device_info(&self, handle: DeviceHandle, out: &mut [u8]) -> Result<usize> {
        let mut st = self.state.borrow_mut();
        st.calls.device_info += 1;
        let blob = encode_device_info(&st.device(handle)?.info);
        if out.len() < blob.len() {
            return Err(RawInputError::InsufficientBuffer {
                required: blob.len(),
            });
        }
        out[..blob.len()].copy_from_slice(&blob);
        Ok(blob.len())
    }

    fn device_name_len(&self, handle: DeviceHandle) -> Result<usize> {
        let mut st = self.state.borrow_mut();
        st.calls.device_name_len += 1;
        let name = st.device(handle)?.name.as_deref().ok_or(RawInputError::Subsystem {
            call: "GetRawInputDeviceInfoW",
            code: ERROR_INVALID_HANDLE,
        })?;
        Ok(name.encode_utf16().count() + 1)
    }

    fn fill_device_name(&self, handle: DeviceHandle, out: &mut [u16]) -> Result<usize> {
        let mut st = self.state.borrow_mut();
        st.calls.fill_device_name += 1;
        let name = st.device(handle)?.name.clone().ok_or(RawInputError::Subsystem {
            call: "GetRawInputDeviceInfoW",
            code: ERROR_INVALID_HANDLE,
        })?;
        let wide: Vec<u16> = name.encode_utf16().chain(std::iter::once(0)).collect();
        if out.len() < wide.len() {
            return Err(RawInputError::InsufficientBuffer {
                required: wide.len(),
            });
        }
        out[..wide.len()].copy_from_slice(&wide);
        Ok(wide.len())
    }

    fn register_devices(&self, entries: &[Registration]) -> Result<()> {
        let mut st = self.state.borrow_mut();
        st.calls.register_devices += 1;
        st.registrations.extend_from_slice(entries);

        let invalid = RawInputError::Subsystem {
            call: "RegisterRawInputDevices",
            code: ERROR_INVALID_PARAMETER,
        };
        if st.fail_registration {
            return Err(invalid);
        }
        for e in entries {
            if e.is_removal() {
                if e.target.is_some() || !st.active.contains(&e.usage) {
                    return Err(invalid);
                }
            } else if e.flags.contains(RegistrationFlags::INPUT_SINK) && e.target.is_none() {
                return Err(invalid);
            }
        }
        for e in entries {
            if e.is_removal() {
                st.active.retain(|u| *u != e.usage);
            } else if !st.active.contains(&e.usage) {
                st.active.push(e.usage);
            }
        }
        Ok(())
    }

    fn event_len(&self, token: PayloadToken, part: EventPart) -> Result<usize> {
        let mut st = self.state.borrow_mut();
        match part {
            EventPart::Header => {
                st.calls.event_header += 1;
                st.event(token)?;
                Ok(HEADER_LEN)
            }
            EventPart::Input => {
                st.calls.event_len += 1;
                let len = st.event(token)?.len();
                Ok(st.len_overrides.get(&token).copied().unwrap_or(len))
            }
        }
    }

    fn fill_event(&self, token: PayloadToken, part: EventPart, out: &mut [u8]) -> Result<usize> {
        let mut st = self.state.borrow_mut();
        match part {
            EventPart::Header => {
                st.calls.event_header += 1;
                let bytes = st.event(token)?;
                let n = bytes.len().min(HEADER_LEN).min(out.len());
                out[..n].copy_from_slice(&bytes[..n]);
                Ok(n)
            }
            EventPart::Input => {
                st.calls.fill_event += 1;
                if st.failing_fetches.contains(&token) {
                    return Err(RawInputError::Subsystem {
                        call: "GetRawInputData",
                        code: ERROR_INVALID_PARAMETER,
                    });
                }
                let bytes = st.event(token)?;
                if out.len() < bytes.len() {
                    return Err(RawInputError::InsufficientBuffer {
                        required: bytes.len(),
                    });
                }
                out[..bytes.len()].copy_from_slice(bytes);
                Ok(bytes.len())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_registration_rules() {
        let api = VirtualRawInput::new();
        let remove = Registration {
            usage: UsagePair::GAMEPAD,
            flags: RegistrationFlags::REMOVE,
            target: None,
        };
        assert!(api.register_devices(&[remove]).is_err());

        let sink_without_target = Registration {
            usage: UsagePair::GAMEPAD,
            flags: RegistrationFlags::INPUT_SINK,
            target: None,
        };
        assert!(api.register_devices(&[sink_without_target]).is_err());
        assert_eq!(api.active_registrations(), 0);
        assert_eq!(api.registrations().len(), 2);
    }

    #[test]
    fn gatt_gamepad_path_carries_uuid() {
        let dev = VirtualDevice::gatt_gamepad(0x1f);
        assert!(dev.name.unwrap().contains(GATT_HID_SERVICE_UUID));
        let usb = VirtualDevice::usb_gamepad(0x1f);
        assert!(!usb.name.unwrap().contains(GATT_HID_SERVICE_UUID));
    }
}
