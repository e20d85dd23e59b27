use rawpad::backends::virtual_input::{VirtualDevice, VirtualRawInput};
use rawpad::logger::LogListener;
use rawpad::{Config, DeviceChange, DeviceHandle, Manager, Notification, PayloadToken, SurfaceId};

fn main() -> rawpad::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    // A keyboard, a wired pad and one Bluetooth LE pad.
    let api = VirtualRawInput::new();
    api.add_device(VirtualDevice::keyboard(0x10));
    api.add_device(VirtualDevice::usb_gamepad(0x20));
    api.add_device(VirtualDevice::gatt_gamepad(0x30));

    let mut manager = Manager::new(&api, Config::default(), SurfaceId(0x1))?;
    manager.add_listener(LogListener::new());
    manager.add_listener(|ev: &rawpad::ReportEvent<'_>| {
        println!("(Virtual) {} -> {:02x?}", ev.device, ev.report());
    });
    println!("targets: {:?}", manager.targets().as_slice());

    // The wired pad shares the usage but is filtered out after the header.
    api.push_hid_event(PayloadToken(1), DeviceHandle(0x20), 4, 1, &[0, 0, 0, 0]);
    api.push_hid_event(PayloadToken(2), DeviceHandle(0x30), 8, 1, &[1, 0x80, 0x7f, 0, 0, 0, 0, 2]);
    for token in [PayloadToken(1), PayloadToken(2)] {
        let outcome = manager.handle(Notification::InputArrived(token))?;
        println!("{token:?}: {outcome:?}");
    }

    // Second pad pairs.
    api.add_device(VirtualDevice::gatt_gamepad(0x40));
    manager.handle(Notification::DeviceSetChanged(DeviceChange::Arrival(DeviceHandle(0x40))))?;
    for handle in manager.targets().iter() {
        println!("target {handle}");
    }

    Ok(())
}
