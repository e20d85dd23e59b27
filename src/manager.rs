//! Session manager: the piece that ties registration, target selection and decoding to
//! the two notifications a message surface delivers.
//!
//! ```text
//! Manager::new ─► register(usage → surface) ─► compute_target_set
//!                                   │
//!   DeviceSetChanged ───────────────┴──► compute_target_set (full replace)
//!   InputArrived(token) ─► ReportDecoder::decode(token, targets, buffer) ─► ReportBus
//! ```
//!
//! Everything runs on the thread that pumps the surface's messages. The target set is
//! written only by device-change handling and read only by decoding; both are `&mut self`
//! calls, so they never overlap and no locking is involved.
//!
//! The destination buffer is allocated once at construction (`Config::buffer_size`) and
//! reused for every report.

use crate::api::{PayloadToken, RawInputApi, SurfaceId};
use crate::config::{Config, EmptyTargetPolicy};
use crate::decoder::{DecodeOutcome, ReportDecoder};
use crate::device::DeviceHandle;
use crate::error::Result;
use crate::event::ReportEvent;
use crate::eventbus::{EventFilter, ReportBus, ReportListener};
use crate::registrar::{Registrar, TargetDeviceSet};
use log::{debug, info, trace};

/// `WM_INPUT_DEVICE_CHANGE` wParam values.
const GIDC_ARRIVAL: usize = 1;
const GIDC_REMOVAL: usize = 2;

/// Kind of device-set change, from the notification's wParam.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceChange {
    Arrival(DeviceHandle),
    Removal(DeviceHandle),
    Unknown,
}

impl DeviceChange {
    /// Interpret `WM_INPUT_DEVICE_CHANGE` (`wParam` = `GIDC_*`, `lParam` = device handle).
    pub fn from_raw(wparam: usize, lparam: isize) -> Self {
        let handle = DeviceHandle(lparam as usize);
        match wparam {
            GIDC_ARRIVAL => DeviceChange::Arrival(handle),
            GIDC_REMOVAL => DeviceChange::Removal(handle),
            _ => DeviceChange::Unknown,
        }
    }
}

/// The two notifications the message surface delivers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Notification {
    InputArrived(PayloadToken),
    DeviceSetChanged(DeviceChange),
}

pub struct Manager<A: RawInputApi> {
    api: A,
    config: Config,
    registrar: Registrar,
    targets: TargetDeviceSet,
    decoder: ReportDecoder,
    buffer: Vec<u8>,
    bus: ReportBus,
}

impl<A: RawInputApi> Manager<A> {
    /// Validate `config`, register against `surface` and select the initial targets.
    ///
    /// A failed registration is not an error here; check [`Manager::is_registered`] and
    /// call [`Manager::initialize`] again when appropriate.
    pub fn new(api: A, config: Config, surface: SurfaceId) -> Result<Self> {
        let mut mgr = Self::detached(api, config)?;
        mgr.initialize(surface);
        Ok(mgr)
    }

    /// Build a manager without touching the subsystem.
    pub fn detached(api: A, config: Config) -> Result<Self> {
        config.validate()?;
        let registrar = Registrar::new(
            config.usage_pair(),
            config.registration_flags(),
            config.target_filter(),
        );
        Ok(Self {
            buffer: vec![0u8; config.buffer_size],
            api,
            config,
            registrar,
            targets: TargetDeviceSet::default(),
            decoder: ReportDecoder::new(),
            bus: ReportBus::new(),
        })
    }

    /// Register (dropping any previous registration first) and recompute the target set.
    ///
    /// Returns whether the registration call succeeded. With
    /// [`EmptyTargetPolicy::Unregister`] an empty target set unregisters again right
    /// away, so [`Manager::is_registered`] can be `false` after a `true` return.
    pub fn initialize(&mut self, surface: SurfaceId) -> bool {
        self.targets = TargetDeviceSet::default();
        if !self.registrar.register(&self.api, surface) {
            return false;
        }

        self.targets = self.registrar.compute_target_set(&self.api);
        let drop_when_empty = self.config.empty_target_policy == EmptyTargetPolicy::Unregister;
        if self.targets.is_empty() && drop_when_empty {
            debug!("no target devices; dropping registration");
            self.registrar.unregister(&self.api);
        } else {
            info!(
                "{} target device(s) selected for {}",
                self.targets.len(),
                self.registrar.usage()
            );
        }
        true
    }

    /// Drop the registration and forget the target set.
    pub fn shutdown(&mut self) -> bool {
        self.targets = TargetDeviceSet::default();
        self.registrar.unregister(&self.api)
    }

    /// Dispatch one surface notification.
    pub fn handle(&mut self, notification: Notification) -> Result<Option<DecodeOutcome>> {
        match notification {
            Notification::InputArrived(token) => self.on_input(token).map(Some),
            Notification::DeviceSetChanged(change) => {
                self.on_device_change(change);
                Ok(None)
            }
        }
    }

    /// Recompute the target set from scratch. Any change kind triggers a full recompute.
    pub fn on_device_change(&mut self, change: DeviceChange) -> &TargetDeviceSet {
        let before = self.targets.len();
        self.targets = self.registrar.compute_target_set(&self.api);
        debug!(
            "device change {:?}: targets {} -> {}",
            change,
            before,
            self.targets.len()
        );
        &self.targets
    }

    /// Decode one input notification and notify listeners on success.
    pub fn on_input(&mut self, token: PayloadToken) -> Result<DecodeOutcome> {
        let outcome = self
            .decoder
            .decode(&self.api, token, &self.targets, &mut self.buffer)?;
        if let DecodeOutcome::Decoded(report) = &outcome {
            let event = ReportEvent::new(report, &self.buffer);
            self.bus.emit(&event);
        } else {
            trace!("input {:?} ignored", token);
        }
        Ok(outcome)
    }

    /// Convenience for `bus_mut().add_listener(listener, EventFilter::All, None)`.
    pub fn add_listener(&mut self, listener: impl ReportListener + 'static) -> u64 {
        self.bus.add_listener(listener, EventFilter::All, None)
    }

    pub fn bus_mut(&mut self) -> &mut ReportBus {
        &mut self.bus
    }

    pub fn is_registered(&self) -> bool {
        self.registrar.is_registered()
    }

    pub fn targets(&self) -> &TargetDeviceSet {
        &self.targets
    }

    /// Destination buffer, holding the most recent report at its front.
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registrar(&self) -> &Registrar {
        &self.registrar
    }

    pub fn api(&self) -> &A {
        &self.api
    }
}

impl<A: RawInputApi> Drop for Manager<A> {
    fn drop(&mut self) {
        if self.registrar.is_registered() {
            self.registrar.unregister(&self.api);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_change_maps_gidc_codes() {
        assert_eq!(
            DeviceChange::from_raw(1, 0x55),
            DeviceChange::Arrival(DeviceHandle(0x55))
        );
        assert_eq!(
            DeviceChange::from_raw(2, 0x55),
            DeviceChange::Removal(DeviceHandle(0x55))
        );
        assert_eq!(DeviceChange::from_raw(7, 0), DeviceChange::Unknown);
    }
}
