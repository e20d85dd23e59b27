//! Runtime configuration.
//!
//! Defaults target Bluetooth LE gamepads: Generic Desktop / Gamepad registration and the
//! GATT HID service UUID as the path signature. Everything can be overridden from TOML:
//!
//! ```toml
//! usage_page = 1
//! usage = 5
//! signature = "{00001812-0000-1000-8000-00805f9b34fb}"
//! buffer_size = 64
//! empty_target_policy = "stay_registered"
//! ```

use crate::api::RegistrationFlags;
use crate::device::UsagePair;
use crate::error::{RawInputError, Result};
use crate::registrar::{TargetFilter, GATT_HID_SERVICE_UUID};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What to do when the initial target set comes back empty.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyTargetPolicy {
    /// Drop the registration right away. Later arrivals are not seen until the caller
    /// initializes again.
    #[default]
    Unregister,
    /// Keep the registration so device-change notifications keep arriving.
    StayRegistered,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub usage_page: u16,
    pub usage: u16,
    /// Substring a device interface path must contain to be accepted.
    pub signature: String,
    pub case_insensitive_signature: bool,
    /// Capacity of the destination report buffer in bytes.
    pub buffer_size: usize,
    /// Receive input while the surface is not in the foreground.
    pub input_sink: bool,
    /// Receive device arrival/removal notifications.
    pub device_notify: bool,
    pub empty_target_policy: EmptyTargetPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            usage_page: UsagePair::GAMEPAD.usage_page,
            usage: UsagePair::GAMEPAD.usage,
            signature: GATT_HID_SERVICE_UUID.to_string(),
            case_insensitive_signature: true,
            buffer_size: 64,
            input_sink: true,
            device_notify: true,
            empty_target_policy: EmptyTargetPolicy::default(),
        }
    }
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(s).map_err(|e| RawInputError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| RawInputError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.buffer_size == 0 {
            return Err(RawInputError::Config("buffer_size must be non-zero".into()));
        }
        if self.signature.trim().is_empty() {
            return Err(RawInputError::Config("signature must not be empty".into()));
        }
        Ok(())
    }

    pub fn usage_pair(&self) -> UsagePair {
        UsagePair::new(self.usage_page, self.usage)
    }

    pub fn registration_flags(&self) -> RegistrationFlags {
        let mut flags = RegistrationFlags::NONE;
        if self.input_sink {
            flags |= RegistrationFlags::INPUT_SINK;
        }
        if self.device_notify {
            flags |= RegistrationFlags::DEV_NOTIFY;
        }
        flags
    }

    pub fn target_filter(&self) -> TargetFilter {
        TargetFilter::new(self.signature.clone(), self.case_insensitive_signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_ble_gamepads() {
        let cfg = Config::default();
        assert_eq!(cfg.usage_pair(), UsagePair::GAMEPAD);
        assert_eq!(cfg.signature, GATT_HID_SERVICE_UUID);
        assert_eq!(
            cfg.registration_flags(),
            RegistrationFlags::INPUT_SINK | RegistrationFlags::DEV_NOTIFY
        );
        assert_eq!(cfg.empty_target_policy, EmptyTargetPolicy::Unregister);
        cfg.validate().unwrap();
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = Config::from_toml_str(
            r#"
            usage = 4
            buffer_size = 128
            empty_target_policy = "stay_registered"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.usage_pair(), UsagePair::JOYSTICK);
        assert_eq!(cfg.buffer_size, 128);
        assert_eq!(cfg.empty_target_policy, EmptyTargetPolicy::StayRegistered);
        assert!(cfg.input_sink);
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(
            Config::from_toml_str("buffer_size = 0"),
            Err(RawInputError::Config(_))
        ));
        assert!(Config::from_toml_str("signature = \"  \"").is_err());
        assert!(Config::from_toml_str("usage = \"gamepad\"").is_err());
    }

    #[test]
    fn toml_output_reloads() {
        let mut cfg = Config::default();
        cfg.input_sink = false;
        let text = cfg.to_toml_string().unwrap();
        assert_eq!(Config::from_toml_str(&text).unwrap(), cfg);
    }
}
