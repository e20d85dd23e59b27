//! Device identity and per-class metadata.
//!
//! ## Handle lifetime
//! A [`DeviceHandle`] is an opaque value assigned by the OS input subsystem. It is
//! valid only while the device stays connected and there is no "destroyed" callback:
//! a handle simply stops showing up in enumeration. Treat every lookup against a
//! handle as fallible and never carry one across a device-change notification
//! without re-checking it against a fresh enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identity of a connected raw-input device.
///
/// Stored as a plain integer; this crate never dereferences it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeviceHandle(pub usize);

impl DeviceHandle {
    #[inline]
    pub fn raw(self) -> usize {
        self.0
    }
}

impl fmt::Display for DeviceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Top-level device class as reported by the subsystem (`RIM_TYPE*`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceClass {
    Mouse,
    Keyboard,
    GenericHid,
}

impl DeviceClass {
    /// Map the native discriminant (`0` mouse, `1` keyboard, `2` HID).
    pub fn from_raw(v: u32) -> Option<Self> {
        match v {
            0 => Some(DeviceClass::Mouse),
            1 => Some(DeviceClass::Keyboard),
            2 => Some(DeviceClass::GenericHid),
            _ => None,
        }
    }

    pub fn to_raw(self) -> u32 {
        match self {
            DeviceClass::Mouse => 0,
            DeviceClass::Keyboard => 1,
            DeviceClass::GenericHid => 2,
        }
    }
}

/// One entry of a device enumeration. Immutable snapshot, never cached.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub handle: DeviceHandle,
    pub class: DeviceClass,
}

/// HID usage page + usage pair identifying a top-level collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UsagePair {
    pub usage_page: u16,
    pub usage: u16,
}

/// Generic Desktop Controls usage page.
pub const USAGE_PAGE_GENERIC_DESKTOP: u16 = 0x01;
/// Game Controls usage page.
pub const USAGE_PAGE_GAME_CONTROLS: u16 = 0x05;
/// LED usage page.
pub const USAGE_PAGE_LEDS: u16 = 0x08;
/// Button usage page.
pub const USAGE_PAGE_BUTTON: u16 = 0x09;
/// Digitizer usage page.
pub const USAGE_PAGE_DIGITIZER: u16 = 0x0D;

impl UsagePair {
    pub const MOUSE: UsagePair = UsagePair::new(USAGE_PAGE_GENERIC_DESKTOP, 0x02);
    pub const JOYSTICK: UsagePair = UsagePair::new(USAGE_PAGE_GENERIC_DESKTOP, 0x04);
    pub const GAMEPAD: UsagePair = UsagePair::new(USAGE_PAGE_GENERIC_DESKTOP, 0x05);
    pub const KEYBOARD: UsagePair = UsagePair::new(USAGE_PAGE_GENERIC_DESKTOP, 0x06);
    pub const KEYPAD: UsagePair = UsagePair::new(USAGE_PAGE_GENERIC_DESKTOP, 0x07);
    pub const MULTI_AXIS: UsagePair = UsagePair::new(USAGE_PAGE_GENERIC_DESKTOP, 0x08);
    pub const PEN: UsagePair = UsagePair::new(USAGE_PAGE_DIGITIZER, 0x02);
    pub const TOUCH_SCREEN: UsagePair = UsagePair::new(USAGE_PAGE_DIGITIZER, 0x04);
    pub const TOUCH_PAD: UsagePair = UsagePair::new(USAGE_PAGE_DIGITIZER, 0x05);

    pub const fn new(usage_page: u16, usage: u16) -> Self {
        Self { usage_page, usage }
    }
}

impl fmt::Display for UsagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}:{:02X}", self.usage_page, self.usage)
    }
}

/// `RID_DEVICE_INFO_HID`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HidInfo {
    pub vendor_id: u32,
    pub product_id: u32,
    pub version: u32,
    pub usage: UsagePair,
}

/// `RID_DEVICE_INFO_MOUSE`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MouseInfo {
    pub id: u32,
    pub buttons: u32,
    pub sample_rate: u32,
    pub has_horizontal_wheel: bool,
}

/// `RID_DEVICE_INFO_KEYBOARD`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyboardInfo {
    pub kind: u32,
    pub sub_kind: u32,
    pub mode: u32,
    pub function_keys: u32,
    pub indicators: u32,
    pub total_keys: u32,
}

/// Class-specific metadata for one handle.
///
/// `Unknown` is what a stale handle (or any failed query) resolves to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceClassInfo {
    Mouse(MouseInfo),
    Keyboard(KeyboardInfo),
    Hid(HidInfo),
    #[default]
    Unknown,
}

impl DeviceClassInfo {
    pub fn class(&self) -> Option<DeviceClass> {
        match self {
            DeviceClassInfo::Mouse(_) => Some(DeviceClass::Mouse),
            DeviceClassInfo::Keyboard(_) => Some(DeviceClass::Keyboard),
            DeviceClassInfo::Hid(_) => Some(DeviceClass::GenericHid),
            DeviceClassInfo::Unknown => None,
        }
    }

    pub fn hid(&self) -> Option<&HidInfo> {
        match self {
            DeviceClassInfo::Hid(h) => Some(h),
            _ => None,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, DeviceClassInfo::Unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_raw_values_match_native_discriminants() {
        for class in [DeviceClass::Mouse, DeviceClass::Keyboard, DeviceClass::GenericHid] {
            assert_eq!(DeviceClass::from_raw(class.to_raw()), Some(class));
        }
        assert_eq!(DeviceClass::from_raw(3), None);
    }

    #[test]
    fn usage_pair_display_is_hex() {
        assert_eq!(UsagePair::GAMEPAD.to_string(), "01:05");
        assert_eq!(UsagePair::TOUCH_PAD.to_string(), "0D:05");
    }

    #[test]
    fn unknown_info_has_no_class() {
        let info = DeviceClassInfo::default();
        assert!(!info.is_known());
        assert_eq!(info.class(), None);
        assert!(info.hid().is_none());
    }
}
