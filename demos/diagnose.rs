//! Print every raw-input device with the filter's verdict, as JSON.
//!
//! Pass a signature as the first argument to try a different path filter.

#[cfg(windows)]
fn main() {
    use rawpad::backends::windows::Win32RawInput;
    use rawpad::discovery::{probe_with_debug, to_json};
    use rawpad::TargetFilter;

    env_logger::init();

    let filter = match std::env::args().nth(1) {
        Some(sig) => TargetFilter::new(sig, true),
        None => TargetFilter::default(),
    };
    let reports = probe_with_debug(&Win32RawInput::new(), &filter);
    match to_json(&reports) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("failed to render report: {e}"),
    }
}

#[cfg(not(windows))]
fn main() {
    eprintln!("diagnose needs the Windows raw-input backend");
}
