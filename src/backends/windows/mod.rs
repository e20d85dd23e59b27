#![cfg(target_os = "windows")]

//! Windows raw-input backend.
//!
//! - [`raw_input`]: [`Win32RawInput`], the `user32` implementation of
//!   [`RawInputApi`](crate::api::RawInputApi)
//! - [`message_window`]: [`MessageWindow`], a message-only window that receives
//!   `WM_INPUT` / `WM_INPUT_DEVICE_CHANGE` and forwards them as
//!   [`Notification`](crate::manager::Notification)s
//!
//! Most users only need both together:
//!
//! ```no_run
//! use rawpad::backends::windows::{MessageWindow, Win32RawInput};
//! use rawpad::{Config, Manager};
//!
//! let window = MessageWindow::new()?;
//! let mut manager = Manager::new(Win32RawInput::new(), Config::default(), window.surface())?;
//! manager.add_listener(|ev: &rawpad::ReportEvent<'_>| println!("{:02x?}", ev.report()));
//! window.set_handler(move |n| {
//!     let _ = manager.handle(n);
//! });
//! window.run()?;
//! # Ok::<(), rawpad::RawInputError>(())
//! ```

pub mod message_window;
pub mod raw_input;

pub use message_window::MessageWindow;
pub use raw_input::Win32RawInput;
