//! Discovery diagnostics.
//!
//! [`probe_with_debug`] walks the same pipeline as
//! [`Registrar::compute_target_set`](crate::registrar::Registrar::compute_target_set)
//! but records, for every enumerated device, whether it was accepted and if not at
//! which stage it was dropped. It also fetches class info for every device, which the
//! runtime path never does, so use it for tooling and bug reports rather than per event.

use crate::api::RawInputApi;
use crate::device::{DeviceClass, DeviceHandle};
use crate::directory::DeviceDirectory;
use crate::metadata::DeviceMeta;
use crate::registrar::{DropStage, TargetFilter};
use serde::Serialize;

/// Debug view of a single enumerated device.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceReport {
    pub handle: DeviceHandle,
    pub class: DeviceClass,
    /// `true` if the device would be in the target set.
    pub accepted: bool,
    /// `None` when accepted.
    pub drop_stage: Option<DropStage>,
    pub meta: DeviceMeta,
}

pub fn probe_with_debug(api: &dyn RawInputApi, filter: &TargetFilter) -> Vec<DeviceReport> {
    let dir = DeviceDirectory::new(api);
    dir.list_devices()
        .into_iter()
        .map(|desc| {
            let info = dir.device_info(desc.handle);
            let (path, drop_stage) = match filter.evaluate(&dir, &desc) {
                Ok(path) => (Some(path), None),
                // Rejected on class before the name was read; read it now for the report.
                Err((DropStage::ClassRejected, _)) => {
                    (dir.device_name(desc.handle), Some(DropStage::ClassRejected))
                }
                Err((stage, path)) => (path, Some(stage)),
            };
            DeviceReport {
                handle: desc.handle,
                class: desc.class,
                accepted: drop_stage.is_none(),
                drop_stage,
                meta: DeviceMeta::from_parts(&info, path.as_deref()),
            }
        })
        .collect()
}

/// Render reports as pretty-printed JSON.
pub fn to_json(reports: &[DeviceReport]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::virtual_input::{VirtualDevice, VirtualRawInput};

    #[test]
    fn every_device_gets_a_verdict() {
        let api = VirtualRawInput::new();
        api.add_device(VirtualDevice::keyboard(1));
        api.add_device(VirtualDevice::usb_gamepad(2));
        api.add_device(VirtualDevice::gatt_gamepad(3));
        api.add_device(VirtualDevice::gatt_gamepad(4).without_name());

        let reports = probe_with_debug(&api, &TargetFilter::default());
        let stages: Vec<_> = reports.iter().map(|r| r.drop_stage.clone()).collect();
        assert_eq!(
            stages,
            vec![
                Some(DropStage::ClassRejected),
                Some(DropStage::SignatureMismatch),
                None,
                Some(DropStage::NameUnavailable),
            ]
        );
        assert!(reports[2].accepted);
        assert_eq!(reports[2].meta.bus.as_deref(), Some("bluetooth-le"));
        assert_eq!(reports[1].meta.bus.as_deref(), Some("usb"));
    }

    #[test]
    fn reports_serialize_to_json() {
        let api = VirtualRawInput::new();
        api.add_device(VirtualDevice::gatt_gamepad(9));
        let json = to_json(&probe_with_debug(&api, &TargetFilter::default())).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["accepted"], serde_json::Value::Bool(true));
        assert_eq!(value[0]["class"], "GenericHid");
        assert_eq!(value[0]["handle"], 9);
    }
}
