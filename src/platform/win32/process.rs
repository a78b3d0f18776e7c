use super::{to_hwnd, wide_to_string};
use crate::models::WindowHandle;
use crate::platform::{ProcessDetails, ProcessInspector};
use crate::{Result, WinTrackError};
use std::ffi::c_void;
use std::path::{Path, PathBuf};
use windows::core::{HSTRING, PCWSTR, PWSTR};
use windows::Win32::Foundation::{CloseHandle, HANDLE};
use windows::Win32::Storage::FileSystem::{
    GetFileVersionInfoSizeW, GetFileVersionInfoW, VerQueryValueW,
};
use windows::Win32::System::Threading::{
    GetProcessId, QueryFullProcessImageNameW, PROCESS_NAME_WIN32,
};
use windows::Win32::UI::Accessibility::GetProcessHandleFromHwnd;
use windows::Win32::UI::WindowsAndMessaging::GetWindowTextW;

/// Process lookup through oleacc, kernel32 and the version resource API
#[derive(Debug, Default)]
pub struct Win32ProcessInspector;

impl Win32ProcessInspector {
    pub fn new() -> Self {
        Self
    }
}

/// Closes the wrapped process handle on drop
struct OwnedProcess(HANDLE);

impl Drop for OwnedProcess {
    fn drop(&mut self) {
        unsafe {
            let _ = CloseHandle(self.0);
        }
    }
}

impl ProcessInspector for Win32ProcessInspector {
    fn process_details(&self, handle: WindowHandle) -> Result<ProcessDetails> {
        let process = unsafe { GetProcessHandleFromHwnd(to_hwnd(handle)) };
        if process.is_invalid() {
            return Err(WinTrackError::ProcessLookup {
                handle,
                reason: "process handle unavailable".to_string(),
            }
            .into());
        }
        let process = OwnedProcess(process);

        let pid = unsafe { GetProcessId(process.0) };
        if pid == 0 {
            return Err(WinTrackError::ProcessLookup {
                handle,
                reason: "process id unavailable".to_string(),
            }
            .into());
        }

        let executable = image_path(&process);
        let file_description = executable.as_deref().and_then(file_description);

        Ok(ProcessDetails {
            pid,
            main_window_title: window_title(handle),
            executable,
            file_description,
        })
    }
}

fn window_title(handle: WindowHandle) -> Option<String> {
    let mut buffer = [0u16; 512];
    let copied = unsafe { GetWindowTextW(to_hwnd(handle), &mut buffer) };
    if copied <= 0 {
        return None;
    }
    Some(wide_to_string(&buffer[..copied as usize]))
}

fn image_path(process: &OwnedProcess) -> Option<PathBuf> {
    let mut buffer = vec![0u16; 1024];
    let mut size = buffer.len() as u32;
    unsafe {
        QueryFullProcessImageNameW(
            process.0,
            PROCESS_NAME_WIN32,
            PWSTR(buffer.as_mut_ptr()),
            &mut size,
        )
    }
    .ok()?;
    Some(PathBuf::from(wide_to_string(&buffer[..size as usize])))
}

fn file_description(path: &Path) -> Option<String> {
    let file = HSTRING::from(path.as_os_str());
    let file = PCWSTR(file.as_ptr());

    let size = unsafe { GetFileVersionInfoSizeW(file, None) };
    if size == 0 {
        return None;
    }

    let mut block = vec![0u8; size as usize];
    unsafe { GetFileVersionInfoW(file, 0, size, block.as_mut_ptr() as *mut c_void) }.ok()?;

    let (language, codepage) = translation(&block)?;
    let query = format!("\\StringFileInfo\\{language:04x}{codepage:04x}\\FileDescription");
    let value = query_value(&block, &query)?;

    // Length is in characters and includes the terminator
    let chars = unsafe { std::slice::from_raw_parts(value.0 as *const u16, value.1 as usize) };
    let description = wide_to_string(chars);
    if description.is_empty() {
        None
    } else {
        Some(description)
    }
}

fn translation(block: &[u8]) -> Option<(u16, u16)> {
    let (pointer, len) = query_value(block, "\\VarFileInfo\\Translation")?;
    if (len as usize) < 2 * std::mem::size_of::<u16>() {
        return None;
    }
    let pair = unsafe { std::slice::from_raw_parts(pointer as *const u16, 2) };
    Some((pair[0], pair[1]))
}

fn query_value(block: &[u8], sub_block: &str) -> Option<(*mut c_void, u32)> {
    let sub_block = HSTRING::from(sub_block);
    let mut pointer: *mut c_void = std::ptr::null_mut();
    let mut len = 0u32;
    let found = unsafe {
        VerQueryValueW(
            block.as_ptr() as *const c_void,
            PCWSTR(sub_block.as_ptr()),
            &mut pointer,
            &mut len,
        )
    };
    if !found.as_bool() || pointer.is_null() || len == 0 {
        return None;
    }
    Some((pointer, len))
}
