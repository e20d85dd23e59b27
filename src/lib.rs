//! Raw Input discovery, registration and report decoding for Bluetooth LE HID gamepads.
//!
//! The pipeline:
//!
//! 1. [`Registrar`] registers one HID usage (Generic Desktop / Gamepad by default) with
//!    the raw-input subsystem, bound to a message surface.
//! 2. [`DeviceDirectory`] enumerates attached devices; the registrar keeps those whose
//!    interface path carries the GATT HID service UUID as the [`TargetDeviceSet`].
//! 3. On every input notification [`ReportDecoder`] fetches the header, drops events
//!    from non-target devices and copies the HID report bytes of target devices into a
//!    caller buffer.
//!
//! [`Manager`] ties these together and fans decoded reports out to [`ReportListener`]s.
//! The subsystem is reached through the [`RawInputApi`] trait; the Win32 implementation
//! lives in `backends::windows`, and [`backends::virtual_input`] provides a scripted one.

pub mod api;
pub mod backends;
pub mod config;
pub mod decoder;
pub mod device;
pub mod directory;
pub mod discovery;
pub mod error;
pub mod event;
pub mod eventbus;
pub mod filtered_listener;
pub mod layout;
pub mod logger;
pub mod manager;
pub mod metadata;
pub mod negotiate;
pub mod registrar;

pub use api::*;
pub use config::{Config, EmptyTargetPolicy};
pub use decoder::{DecodeOutcome, DecodedReport, Delivery, ReportDecoder};
pub use device::*;
pub use directory::DeviceDirectory;
pub use error::{RawInputError, Result};
pub use event::*;
pub use eventbus::{EventFilter, ReportBus, ReportListener};
pub use manager::*;
pub use registrar::{DropStage, Registrar, TargetDeviceSet, TargetFilter, GATT_HID_SERVICE_UUID};
