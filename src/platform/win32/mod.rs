//! Win32 backend built on WinEvent hooks and user32 window queries

mod hooks;
mod process;
mod window;

pub use hooks::Win32EventSource;
pub use process::Win32ProcessInspector;
pub use window::Win32WindowSystem;

use crate::models::WindowHandle;
use std::ffi::c_void;
use windows::Win32::Foundation::HWND;

pub(crate) fn to_hwnd(handle: WindowHandle) -> HWND {
    HWND(handle.raw() as *mut c_void)
}

pub(crate) fn from_hwnd(hwnd: HWND) -> WindowHandle {
    WindowHandle::new(hwnd.0 as isize)
}

/// Decode a NUL-terminated or exactly sized UTF-16 buffer
pub(crate) fn wide_to_string(buffer: &[u16]) -> String {
    let end = buffer.iter().position(|&c| c == 0).unwrap_or(buffer.len());
    String::from_utf16_lossy(&buffer[..end])
}
