//! The input subsystem seam.
//!
//! [`RawInputApi`] is the narrow set of calls this crate makes into the OS raw-input
//! channel. Every variable-length query is split into a *sizing* call and a *fill*
//! call so that the race-tolerant negotiation in [`crate::negotiate`] is written once
//! and shared. Implementations stay thin: the Win32 backend is a direct FFI shim and
//! [`VirtualRawInput`](crate::backends::virtual_input::VirtualRawInput) is a scripted
//! in-memory stand-in. All decoding of native bytes lives outside the trait.

use crate::device::{DeviceDescriptor, DeviceHandle, UsagePair};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::ops::{BitOr, BitOrAssign};

/// Opaque token carried by an "input arrived" notification (`WM_INPUT` lParam).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PayloadToken(pub isize);

/// Addressable handle of the message-receiving surface (an `HWND` on Windows).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub usize);

/// Which portion of an event payload to fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventPart {
    /// Fixed-size `RAWINPUTHEADER` only (`RID_HEADER`).
    Header,
    /// Header plus class-specific body (`RID_INPUT`).
    Input,
}

/// `RIDEV_*` registration flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegistrationFlags(pub u32);

impl RegistrationFlags {
    pub const NONE: Self = Self(0);
    /// Remove the collection from the inclusion list. Target surface must be absent.
    pub const REMOVE: Self = Self(0x0000_0001);
    pub const EXCLUDE: Self = Self(0x0000_0010);
    pub const PAGE_ONLY: Self = Self(0x0000_0020);
    pub const NO_LEGACY: Self = Self(0x0000_0030);
    /// Deliver input even when the surface is not in the foreground.
    pub const INPUT_SINK: Self = Self(0x0000_0100);
    pub const CAPTURE_MOUSE: Self = Self(0x0000_0200);
    pub const NO_HOTKEYS: Self = Self(0x0000_0200);
    pub const APP_KEYS: Self = Self(0x0000_0400);
    pub const EX_INPUT_SINK: Self = Self(0x0000_1000);
    /// Deliver device arrival/removal notifications.
    pub const DEV_NOTIFY: Self = Self(0x0000_2000);

    #[inline]
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn bits(self) -> u32 {
        self.0
    }
}

impl BitOr for RegistrationFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for RegistrationFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// One `RAWINPUTDEVICE` registration entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Registration {
    pub usage: UsagePair,
    pub flags: RegistrationFlags,
    /// `None` means "follow keyboard focus" for adds and is required for removals.
    pub target: Option<SurfaceId>,
}

impl Registration {
    pub fn is_removal(&self) -> bool {
        self.flags.contains(RegistrationFlags::REMOVE)
    }
}

/// Calls into the host raw-input subsystem.
///
/// Sizes returned by sizing calls are in *items* of the slice type the matching fill
/// call takes (descriptors, UTF-16 units, bytes). Fill calls return how many items were
/// actually written, which may differ from the sizing result when devices are hot-plugged
/// in between; a fill that does not fit must fail with
/// [`RawInputError::InsufficientBuffer`](crate::error::RawInputError::InsufficientBuffer).
pub trait RawInputApi {
    /// Number of attached raw-input devices.
    fn device_list_len(&self) -> Result<usize>;

    /// Fill `out` with attached devices.
    fn fill_device_list(&self, out: &mut [DeviceDescriptor]) -> Result<usize>;

    /// Write the native `RID_DEVICE_INFO` blob for `handle` into `out`, returning its length.
    fn device_info(&self, handle: DeviceHandle, out: &mut [u8]) -> Result<usize>;

    /// Length of the device interface path in UTF-16 units, terminator included.
    fn device_name_len(&self, handle: DeviceHandle) -> Result<usize>;

    /// Fill `out` with the device interface path.
    fn fill_device_name(&self, handle: DeviceHandle, out: &mut [u16]) -> Result<usize>;

    /// Submit registration entries (`RegisterRawInputDevices`).
    fn register_devices(&self, entries: &[Registration]) -> Result<()>;

    /// Size in bytes of the requested part of an event payload.
    fn event_len(&self, token: PayloadToken, part: EventPart) -> Result<usize>;

    /// Copy the requested part of an event payload into `out`.
    fn fill_event(&self, token: PayloadToken, part: EventPart, out: &mut [u8]) -> Result<usize>;
}

impl<T: RawInputApi + ?Sized> RawInputApi for &T {
    fn device_list_len(&self) -> Result<usize> {
        (**self).device_list_len()
    }
    fn fill_device_list(&self, out: &mut [DeviceDescriptor]) -> Result<usize> {
        (**self).fill_device_list(out)
    }
    fn device_info(&self, handle: DeviceHandle, out: &mut [u8]) -> Result<usize> {
        (**self).device_info(handle, out)
    }
    fn device_name_len(&self, handle: DeviceHandle) -> Result<usize> {
        (**self).device_name_len(handle)
    }
    fn fill_device_name(&self, handle: DeviceHandle, out: &mut [u16]) -> Result<usize> {
        (**self).fill_device_name(handle, out)
    }
    fn register_devices(&self, entries: &[Registration]) -> Result<()> {
        (**self).register_devices(entries)
    }
    fn event_len(&self, token: PayloadToken, part: EventPart) -> Result<usize> {
        (**self).event_len(token, part)
    }
    fn fill_event(&self, token: PayloadToken, part: EventPart, out: &mut [u8]) -> Result<usize> {
        (**self).fill_event(token, part, out)
    }
}
