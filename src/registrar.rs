//! Device filter & registrar.
//!
//! Owns two things:
//! - the registration of one HID top-level collection with the subsystem, bound to a
//!   message surface, and
//! - the selection of *target* devices out of everything the directory enumerates.
//!
//! A device is a target when it is a generic HID device **and** its interface path
//! contains the configured signature. For Bluetooth LE HID peripherals that signature is
//! the GATT HID service UUID, which Windows embeds in the device interface path.
//!
//! The class test reads the enumeration entry and costs nothing; the path test needs a
//! per-device name query, so it only runs for devices that passed the class test.

use crate::api::{RawInputApi, Registration, RegistrationFlags, SurfaceId};
use crate::device::{DeviceClass, DeviceDescriptor, DeviceHandle, UsagePair};
use crate::directory::DeviceDirectory;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// GATT HID service UUID (`0x1812`) as it appears in device interface paths.
pub const GATT_HID_SERVICE_UUID: &str = "{00001812-0000-1000-8000-00805f9b34fb}";

/// Why a device was not selected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropStage {
    /// Not a generic HID device.
    ClassRejected,
    /// Interface path could not be read (stale handle or empty path).
    NameUnavailable,
    /// Interface path does not contain the signature.
    SignatureMismatch,
}

/// Target identity predicate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetFilter {
    signature: String,
    case_insensitive: bool,
}

impl Default for TargetFilter {
    fn default() -> Self {
        Self::new(GATT_HID_SERVICE_UUID, true)
    }
}

impl TargetFilter {
    pub fn new(signature: impl Into<String>, case_insensitive: bool) -> Self {
        let signature = signature.into();
        let signature = if case_insensitive {
            signature.to_ascii_lowercase()
        } else {
            signature
        };
        Self {
            signature,
            case_insensitive,
        }
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    #[inline]
    pub fn accepts_class(&self, class: DeviceClass) -> bool {
        class == DeviceClass::GenericHid
    }

    pub fn accepts_name(&self, name: &str) -> bool {
        if self.case_insensitive {
            name.to_ascii_lowercase().contains(&self.signature)
        } else {
            name.contains(&self.signature)
        }
    }

    /// Run both checks against one enumeration entry, cheapest first.
    ///
    /// Returns the device path on acceptance so diagnostics can reuse it.
    pub fn evaluate(
        &self,
        dir: &DeviceDirectory<'_>,
        desc: &DeviceDescriptor,
    ) -> Result<String, (DropStage, Option<String>)> {
        if !self.accepts_class(desc.class) {
            return Err((DropStage::ClassRejected, None));
        }
        let Some(name) = dir.device_name(desc.handle) else {
            return Err((DropStage::NameUnavailable, None));
        };
        if !self.accepts_name(&name) {
            return Err((DropStage::SignatureMismatch, Some(name)));
        }
        Ok(name)
    }
}

/// Ordered, duplicate-free set of accepted device handles.
///
/// Replaced wholesale on every recomputation; never edited in place.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TargetDeviceSet(Vec<DeviceHandle>);

impl TargetDeviceSet {
    /// Build from handles in order, dropping repeats.
    pub fn from_handles(handles: impl IntoIterator<Item = DeviceHandle>) -> Self {
        let mut out: Vec<DeviceHandle> = Vec::new();
        for h in handles {
            if !out.contains(&h) {
                out.push(h);
            }
        }
        Self(out)
    }

    #[inline]
    pub fn contains(&self, handle: DeviceHandle) -> bool {
        self.0.contains(&handle)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = DeviceHandle> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &[DeviceHandle] {
        &self.0
    }
}

/// Registration state for one usage pair.
#[derive(Debug)]
pub struct Registrar {
    usage: UsagePair,
    flags: RegistrationFlags,
    filter: TargetFilter,
    surface: Option<SurfaceId>,
}

impl Registrar {
    pub fn new(usage: UsagePair, flags: RegistrationFlags, filter: TargetFilter) -> Self {
        Self {
            usage,
            flags,
            filter,
            surface: None,
        }
    }

    pub fn usage(&self) -> UsagePair {
        self.usage
    }

    pub fn filter(&self) -> &TargetFilter {
        &self.filter
    }

    pub fn is_registered(&self) -> bool {
        self.surface.is_some()
    }

    /// Surface currently receiving events, if registered.
    pub fn surface(&self) -> Option<SurfaceId> {
        self.surface
    }

    /// Route future events for the configured usage to `surface`.
    ///
    /// Any existing registration is removed first so events are never delivered twice.
    /// On failure the registrar is left unregistered.
    pub fn register(&mut self, api: &dyn RawInputApi, surface: SurfaceId) -> bool {
        if self.is_registered() {
            self.unregister(api);
        }

        let entry = Registration {
            usage: self.usage,
            flags: self.flags,
            target: Some(surface),
        };
        match api.register_devices(&[entry]) {
            Ok(()) => {
                debug!("registered {} -> surface {:#x}", self.usage, surface.0);
                self.surface = Some(surface);
                true
            }
            Err(e) => {
                warn!("registration for {} failed: {e}", self.usage);
                self.surface = None;
                false
            }
        }
    }

    /// Remove the registration. A no-op success when not registered.
    ///
    /// On failure the registrar stays registered, so a later call (or dropping the
    /// owning [`Manager`](crate::manager::Manager)) tries again.
    pub fn unregister(&mut self, api: &dyn RawInputApi) -> bool {
        if !self.is_registered() {
            return true;
        }

        let entry = Registration {
            usage: self.usage,
            flags: RegistrationFlags::REMOVE,
            target: None,
        };
        match api.register_devices(&[entry]) {
            Ok(()) => {
                debug!("unregistered {}", self.usage);
                self.surface = None;
                true
            }
            Err(e) => {
                warn!("unregistration for {} failed: {e}", self.usage);
                false
            }
        }
    }

    /// Enumerate devices and keep the ones that pass [`TargetFilter`].
    ///
    /// An empty result is a normal state (no target peripheral is on yet).
    pub fn compute_target_set(&self, api: &dyn RawInputApi) -> TargetDeviceSet {
        let dir = DeviceDirectory::new(api);
        let set = TargetDeviceSet::from_handles(
            dir.list_devices()
                .iter()
                .filter(|d| self.filter.evaluate(&dir, d).is_ok())
                .map(|d| d.handle),
        );
        debug!("target set: {} device(s)", set.len());
        set
    }
}
