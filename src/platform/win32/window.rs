use super::{from_hwnd, to_hwnd};
use crate::models::WindowHandle;
use crate::platform::WindowSystem;
use crate::{Result, WinTrackError};
use windows::Win32::Foundation::{BOOL, HWND, LPARAM};
use windows::Win32::UI::WindowsAndMessaging::{
    EnumWindows, GetShellWindow, GetWindowTextLengthW, IsIconic, IsWindow, IsWindowVisible,
    IsZoomed,
};

/// Window queries answered by user32
#[derive(Debug, Default)]
pub struct Win32WindowSystem;

impl Win32WindowSystem {
    pub fn new() -> Self {
        Self
    }
}

impl WindowSystem for Win32WindowSystem {
    fn enumerate(&self) -> Result<Vec<WindowHandle>> {
        let mut handles: Vec<WindowHandle> = Vec::new();
        // SAFETY: the callback only runs during this call and `handles` outlives it
        unsafe {
            EnumWindows(
                Some(collect_window),
                LPARAM(&mut handles as *mut Vec<WindowHandle> as isize),
            )
        }
        .map_err(|err| WinTrackError::Platform(format!("EnumWindows failed: {err}")))?;
        Ok(handles)
    }

    fn shell_window(&self) -> Option<WindowHandle> {
        let hwnd = unsafe { GetShellWindow() };
        if hwnd.0.is_null() {
            None
        } else {
            Some(from_hwnd(hwnd))
        }
    }

    fn is_valid(&self, handle: WindowHandle) -> bool {
        unsafe { IsWindow(to_hwnd(handle)) }.as_bool()
    }

    fn is_visible(&self, handle: WindowHandle) -> bool {
        unsafe { IsWindowVisible(to_hwnd(handle)) }.as_bool()
    }

    fn is_zoomed(&self, handle: WindowHandle) -> bool {
        unsafe { IsZoomed(to_hwnd(handle)) }.as_bool()
    }

    fn is_minimized(&self, handle: WindowHandle) -> bool {
        unsafe { IsIconic(to_hwnd(handle)) }.as_bool()
    }

    fn title_len(&self, handle: WindowHandle) -> usize {
        let len = unsafe { GetWindowTextLengthW(to_hwnd(handle)) };
        len.max(0) as usize
    }
}

unsafe extern "system" fn collect_window(hwnd: HWND, lparam: LPARAM) -> BOOL {
    let handles = &mut *(lparam.0 as *mut Vec<WindowHandle>);
    handles.push(from_hwnd(hwnd));
    BOOL(1)
}
