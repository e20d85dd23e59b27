//! Raw-input backends.
//!
//! Implementations of [`RawInputApi`](crate::api::RawInputApi):
//!
//! - [`virtual_input`]: scripted in-memory subsystem, available everywhere. Used by the
//!   tests and by the `virtual_demo` example.
//! - `windows`: the Win32 Raw Input backend plus a message-only window.
//!
//! # Feature flags
//! - **`rawinput`**: enables the Windows backend (default).

pub mod virtual_input;

#[cfg(all(feature = "rawinput", target_os = "windows"))]
#[cfg_attr(docsrs, doc(cfg(all(feature = "rawinput", target_os = "windows"))))]
pub mod windows;
