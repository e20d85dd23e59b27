//! Message-only window that turns `WM_INPUT` / `WM_INPUT_DEVICE_CHANGE` into
//! [`Notification`]s.
//!
//! The window is invisible (`HWND_MESSAGE` parent) and exists only to be a registration
//! target. Messages are handed to a per-thread handler installed with
//! [`MessageWindow::set_handler`]; the usual handler owns a [`Manager`] and forwards
//! each notification to [`Manager::handle`].
//!
//! A `MessageWindow` is tied to the thread that created it: the window procedure and
//! the handler slot are thread-local, and [`MessageWindow::run`] must be called on that
//! thread.
//!
//! [`Manager`]: crate::manager::Manager
//! [`Manager::handle`]: crate::manager::Manager::handle

#![cfg(target_os = "windows")]

use crate::api::{PayloadToken, SurfaceId};
use crate::error::{RawInputError, Result};
use crate::manager::{DeviceChange, Notification};
use log::{debug, warn};
use std::cell::RefCell;
use windows_sys::Win32::Foundation::{GetLastError, HINSTANCE, HWND, LPARAM, LRESULT, WPARAM};
use windows_sys::Win32::System::LibraryLoader::GetModuleHandleW;
use windows_sys::Win32::UI::WindowsAndMessaging::*;

const CLASS_NAME: &str = "rawpad.message-window";
const ERROR_CLASS_ALREADY_EXISTS: u32 = 1410;

type Handler = Box<dyn FnMut(Notification)>;

thread_local! {
    static HANDLER: RefCell<Option<Handler>> = const { RefCell::new(None) };
}

fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

fn dispatch(notification: Notification) {
    HANDLER.with(|slot| match slot.try_borrow_mut() {
        Ok(mut guard) => {
            if let Some(handler) = guard.as_mut() {
                handler(notification);
            }
        }
        // A handler that pumps messages itself re-enters here.
        Err(_) => warn!("dropping re-entrant notification {notification:?}"),
    });
}

unsafe extern "system" fn window_proc(
    hwnd: HWND,
    msg: u32,
    w_param: WPARAM,
    l_param: LPARAM,
) -> LRESULT {
    match msg {
        WM_INPUT => {
            dispatch(Notification::InputArrived(PayloadToken(l_param)));
            // WM_INPUT requires DefWindowProc for cleanup.
            unsafe { DefWindowProcW(hwnd, msg, w_param, l_param) }
        }
        WM_INPUT_DEVICE_CHANGE => {
            dispatch(Notification::DeviceSetChanged(DeviceChange::from_raw(
                w_param, l_param,
            )));
            0
        }
        WM_CLOSE | WM_DESTROY => {
            unsafe { PostQuitMessage(0) };
            0
        }
        _ => unsafe { DefWindowProcW(hwnd, msg, w_param, l_param) },
    }
}

pub struct MessageWindow {
    hwnd: HWND,
    hinstance: HINSTANCE,
    class: Vec<u16>,
}

impl MessageWindow {
    /// Register the window class (once per process) and create the window.
    pub fn new() -> Result<Self> {
        let class = wide(CLASS_NAME);
        let title = wide("rawpad");
        unsafe {
            let hinstance = GetModuleHandleW(core::ptr::null());
            if hinstance.is_null() {
                return Err(RawInputError::Subsystem {
                    call: "GetModuleHandleW",
                    code: GetLastError(),
                });
            }

            let mut wc: WNDCLASSW = core::mem::zeroed();
            wc.lpfnWndProc = Some(window_proc);
            wc.hInstance = hinstance;
            wc.lpszClassName = class.as_ptr();
            if RegisterClassW(&wc) == 0 {
                let code = GetLastError();
                if code != ERROR_CLASS_ALREADY_EXISTS {
                    return Err(RawInputError::Subsystem {
                        call: "RegisterClassW",
                        code,
                    });
                }
            }

            let hwnd = CreateWindowExW(
                0,
                class.as_ptr(),
                title.as_ptr(),
                0,
                0,
                0,
                0,
                0,
                HWND_MESSAGE,
                core::ptr::null_mut(),
                hinstance,
                core::ptr::null(),
            );
            if hwnd.is_null() {
                return Err(RawInputError::Subsystem {
                    call: "CreateWindowExW",
                    code: GetLastError(),
                });
            }
            debug!("message window {:#x} created", hwnd as usize);

            Ok(Self {
                hwnd,
                hinstance,
                class,
            })
        }
    }

    /// Registration target for this window.
    pub fn surface(&self) -> SurfaceId {
        SurfaceId(self.hwnd as usize)
    }

    /// Install the notification handler for this thread, replacing any previous one.
    pub fn set_handler(&self, handler: impl FnMut(Notification) + 'static) {
        HANDLER.with(|slot| *slot.borrow_mut() = Some(Box::new(handler)));
    }

    /// Remove and drop the handler for this thread.
    pub fn clear_handler(&self) {
        let old = HANDLER.with(|slot| slot.borrow_mut().take());
        drop(old);
    }

    /// Pump messages until `WM_QUIT`.
    pub fn run(&self) -> Result<()> {
        unsafe {
            let mut msg: MSG = core::mem::zeroed();
            loop {
                match GetMessageW(&mut msg, core::ptr::null_mut(), 0, 0) {
                    0 => return Ok(()),
                    -1 => {
                        return Err(RawInputError::Subsystem {
                            call: "GetMessageW",
                            code: GetLastError(),
                        })
                    }
                    _ => {
                        TranslateMessage(&msg);
                        DispatchMessageW(&msg);
                    }
                }
            }
        }
    }

    /// Ask [`MessageWindow::run`] to return after the current message.
    pub fn quit(&self) {
        unsafe { PostQuitMessage(0) };
    }
}

impl Drop for MessageWindow {
    fn drop(&mut self) {
        // The handler usually owns a Manager; drop it while the window is still valid.
        self.clear_handler();
        unsafe {
            DestroyWindow(self.hwnd);
            UnregisterClassW(self.class.as_ptr(), self.hinstance);
        }
    }
}
