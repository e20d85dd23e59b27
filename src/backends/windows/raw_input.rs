//! Win32 Raw Input backend.
//!
//! [`Win32RawInput`] is a thin FFI shim: each [`RawInputApi`] method is one call into
//! `user32`. Nothing here interprets payload bytes beyond copying them out; decoding
//! lives in [`crate::decoder`] and [`crate::layout`].
//!
//! ## Conventions
//! - Every Raw Input call signals failure by returning `u32::MAX` (`(UINT)-1`).
//!   `ERROR_INSUFFICIENT_BUFFER` maps to [`RawInputError::InsufficientBuffer`], any other
//!   last-error to [`RawInputError::Subsystem`].
//! - Handles cross the trait boundary as integers and are cast back to pointers here.

#![cfg(target_os = "windows")]

use crate::api::{EventPart, PayloadToken, RawInputApi, Registration};
use crate::device::{DeviceClass, DeviceDescriptor, DeviceHandle};
use crate::error::{RawInputError, Result};
use core::ffi::c_void;
use core::mem::size_of;
use windows_sys::Win32::Foundation::{GetLastError, ERROR_INSUFFICIENT_BUFFER, HANDLE, HWND};
use windows_sys::Win32::UI::Input::*;

const FAILED: u32 = u32::MAX;

/// Translate a failed call into an error, using `required` for undersized buffers.
fn last_error(call: &'static str, required: u32) -> RawInputError {
    // SAFETY: reads thread-local error state only.
    let code = unsafe { GetLastError() };
    if code == ERROR_INSUFFICIENT_BUFFER {
        RawInputError::InsufficientBuffer {
            required: required as usize,
        }
    } else {
        RawInputError::Subsystem { call, code }
    }
}

#[inline]
fn as_handle(handle: DeviceHandle) -> HANDLE {
    handle.raw() as HANDLE
}

#[inline]
fn as_hrawinput(token: PayloadToken) -> HRAWINPUT {
    token.0 as HRAWINPUT
}

#[inline]
fn command(part: EventPart) -> RAW_INPUT_DATA_COMMAND_FLAGS {
    match part {
        EventPart::Header => RID_HEADER,
        EventPart::Input => RID_INPUT,
    }
}

/// Raw Input as provided by the running Windows session.
#[derive(Clone, Copy, Debug, Default)]
pub struct Win32RawInput;

impl Win32RawInput {
    pub fn new() -> Self {
        Self
    }
}

impl RawInputApi for Win32RawInput {
    fn device_list_len(&self) -> Result<usize> {
        let mut count: u32 = 0;
        // SAFETY: null list pointer is the documented sizing form.
        let r = unsafe {
            GetRawInputDeviceList(
                core::ptr::null_mut(),
                &mut count,
                size_of::<RAWINPUTDEVICELIST>() as u32,
            )
        };
        if r == FAILED {
            return Err(last_error("GetRawInputDeviceList", count));
        }
        Ok(count as usize)
    }

    fn fill_device_list(&self, out: &mut [DeviceDescriptor]) -> Result<usize> {
        // SAFETY: RAWINPUTDEVICELIST is plain data; all-zero is a valid value.
        let mut raw: Vec<RAWINPUTDEVICELIST> = vec![unsafe { core::mem::zeroed() }; out.len()];
        let mut count = raw.len() as u32;
        // SAFETY: `raw` holds `count` entries of the size passed.
        let r = unsafe {
            GetRawInputDeviceList(
                raw.as_mut_ptr(),
                &mut count,
                size_of::<RAWINPUTDEVICELIST>() as u32,
            )
        };
        if r == FAILED {
            return Err(last_error("GetRawInputDeviceList", count));
        }

        let mut written = 0;
        for entry in raw.iter().take((r as usize).min(out.len())) {
            let Some(class) = DeviceClass::from_raw(entry.dwType) else {
                continue;
            };
            out[written] = DeviceDescriptor {
                handle: DeviceHandle(entry.hDevice as usize),
                class,
            };
            written += 1;
        }
        Ok(written)
    }

    fn device_info(&self, handle: DeviceHandle, out: &mut [u8]) -> Result<usize> {
        // SAFETY: RID_DEVICE_INFO is plain data; all-zero is a valid value.
        let mut info: RID_DEVICE_INFO = unsafe { core::mem::zeroed() };
        info.cbSize = size_of::<RID_DEVICE_INFO>() as u32;
        let mut size = info.cbSize;
        // SAFETY: `info` is a properly sized and aligned RID_DEVICE_INFO.
        let r = unsafe {
            GetRawInputDeviceInfoW(
                as_handle(handle),
                RIDI_DEVICEINFO,
                &mut info as *mut RID_DEVICE_INFO as *mut c_void,
                &mut size,
            )
        };
        if r == FAILED {
            return Err(last_error("GetRawInputDeviceInfoW", size));
        }

        // SAFETY: reading the initialized struct as bytes.
        let bytes = unsafe {
            core::slice::from_raw_parts(
                &info as *const RID_DEVICE_INFO as *const u8,
                size_of::<RID_DEVICE_INFO>(),
            )
        };
        let n = (r as usize).min(bytes.len());
        if out.len() < n {
            return Err(RawInputError::InsufficientBuffer { required: n });
        }
        out[..n].copy_from_slice(&bytes[..n]);
        Ok(n)
    }

    fn device_name_len(&self, handle: DeviceHandle) -> Result<usize> {
        let mut size: u32 = 0;
        // SAFETY: null data pointer is the documented sizing form.
        let r = unsafe {
            GetRawInputDeviceInfoW(
                as_handle(handle),
                RIDI_DEVICENAME,
                core::ptr::null_mut(),
                &mut size,
            )
        };
        if r == FAILED {
            return Err(last_error("GetRawInputDeviceInfoW", size));
        }
        Ok(size as usize)
    }

    fn fill_device_name(&self, handle: DeviceHandle, out: &mut [u16]) -> Result<usize> {
        let mut size = out.len() as u32;
        // SAFETY: `out` holds `size` UTF-16 units.
        let r = unsafe {
            GetRawInputDeviceInfoW(
                as_handle(handle),
                RIDI_DEVICENAME,
                out.as_mut_ptr() as *mut c_void,
                &mut size,
            )
        };
        if r == FAILED {
            return Err(last_error("GetRawInputDeviceInfoW", size));
        }
        Ok(r as usize)
    }

    fn register_devices(&self, entries: &[Registration]) -> Result<()> {
        let raw: Vec<RAWINPUTDEVICE> = entries
            .iter()
            .map(|e| RAWINPUTDEVICE {
                usUsagePage: e.usage.usage_page,
                usUsage: e.usage.usage,
                dwFlags: e.flags.bits(),
                hwndTarget: e.target.map_or(core::ptr::null_mut(), |s| s.0 as HWND),
            })
            .collect();
        // SAFETY: `raw` holds `raw.len()` entries of the size passed.
        let ok = unsafe {
            RegisterRawInputDevices(
                raw.as_ptr(),
                raw.len() as u32,
                size_of::<RAWINPUTDEVICE>() as u32,
            )
        };
        if ok == 0 {
            return Err(last_error("RegisterRawInputDevices", 0));
        }
        Ok(())
    }

    fn event_len(&self, token: PayloadToken, part: EventPart) -> Result<usize> {
        let mut size: u32 = 0;
        // SAFETY: null data pointer is the documented sizing form.
        let r = unsafe {
            GetRawInputData(
                as_hrawinput(token),
                command(part),
                core::ptr::null_mut(),
                &mut size,
                size_of::<RAWINPUTHEADER>() as u32,
            )
        };
        if r == FAILED {
            return Err(last_error("GetRawInputData", size));
        }
        Ok(size as usize)
    }

    fn fill_event(&self, token: PayloadToken, part: EventPart, out: &mut [u8]) -> Result<usize> {
        let mut size = out.len() as u32;
        // SAFETY: `out` holds `size` bytes.
        let r = unsafe {
            GetRawInputData(
                as_hrawinput(token),
                command(part),
                out.as_mut_ptr() as *mut c_void,
                &mut size,
                size_of::<RAWINPUTHEADER>() as u32,
            )
        };
        if r == FAILED {
            return Err(last_error("GetRawInputData", size));
        }
        Ok(r as usize)
    }
}
