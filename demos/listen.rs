//! Log every report from Bluetooth LE gamepads until the process is killed.
//!
//! `RUST_LOG=trace` also shows ignored events and target-set changes.
//! An optional first argument is a TOML config file.

#[cfg(windows)]
fn main() -> rawpad::Result<()> {
    use log::warn;
    use rawpad::backends::windows::{MessageWindow, Win32RawInput};
    use rawpad::logger::LogListener;
    use rawpad::{Config, EmptyTargetPolicy, Manager};

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(path)?,
        // Keep listening for pads that pair later.
        None => Config {
            empty_target_policy: EmptyTargetPolicy::StayRegistered,
            ..Config::default()
        },
    };

    let window = MessageWindow::new()?;
    let mut manager = Manager::new(Win32RawInput::new(), config, window.surface())?;
    if !manager.is_registered() {
        warn!("registration failed; nothing to listen to");
        return Ok(());
    }
    manager.add_listener(LogListener::with_level(log::Level::Info));

    window.set_handler(move |n| {
        if let Err(e) = manager.handle(n) {
            warn!("{n:?}: {e}");
        }
    });
    window.run()
}

#[cfg(not(windows))]
fn main() {
    eprintln!("listen needs the Windows raw-input backend");
}
