//! WinEvent hook thread
//!
//! Out-of-context WinEvent hooks deliver their callbacks through the message
//! queue of the thread that installed them. A dedicated thread therefore owns
//! every hook: register/unregister requests are queued to it, it is woken with
//! a thread message, and it pumps messages so callbacks keep flowing.

use super::from_hwnd;
use crate::models::{ChildId, ObjectId, RawEventKind, RawWindowEvent};
use crate::platform::{EventSource, HookHandle, RawEventCallback};
use crate::{Result, WinTrackError};
use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Mutex, OnceLock, PoisonError};
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};
use windows::Win32::Foundation::{HMODULE, HWND, LPARAM, WPARAM};
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::Accessibility::{SetWinEventHook, UnhookWinEvent, HWINEVENTHOOK};
use windows::Win32::UI::WindowsAndMessaging::{
    DispatchMessageW, GetMessageW, PeekMessageW, PostThreadMessageW, TranslateMessage, MSG,
    PM_NOREMOVE, WINEVENT_OUTOFCONTEXT, WM_APP, WM_QUIT, WM_USER,
};

const WM_HOOK_REQUEST: u32 = WM_APP + 1;

enum HookRequest {
    Register {
        kind: RawEventKind,
        callback: RawEventCallback,
        reply: Sender<Result<HookHandle>>,
    },
    Unregister {
        hook: HookHandle,
        reply: Sender<Result<()>>,
    },
}

/// Callbacks keyed by raw hook handle; consulted from `win_event_proc`
fn registry() -> &'static Mutex<HashMap<u64, RawEventCallback>> {
    static REGISTRY: OnceLock<Mutex<HashMap<u64, RawEventCallback>>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

fn hook_key(hook: HWINEVENTHOOK) -> u64 {
    hook.0 as usize as u64
}

/// Event source backed by `SetWinEventHook`
pub struct Win32EventSource {
    thread_id: u32,
    requests: Mutex<Sender<HookRequest>>,
    join_handle: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for Win32EventSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Win32EventSource")
            .field("thread_id", &self.thread_id)
            .finish_non_exhaustive()
    }
}

impl Win32EventSource {
    /// Start the hook thread and wait until its message queue exists
    pub fn spawn() -> Result<Self> {
        let (request_tx, request_rx) = mpsc::channel::<HookRequest>();
        let (ready_tx, ready_rx) = mpsc::channel::<u32>();

        let join_handle = thread::Builder::new()
            .name("wintrack-hooks".to_string())
            .spawn(move || run_hook_thread(request_rx, ready_tx))
            .map_err(|err| {
                WinTrackError::Platform(format!("Failed to spawn hook thread: {err}"))
            })?;

        let thread_id = ready_rx.recv().map_err(|_| {
            WinTrackError::Platform("Hook thread exited before becoming ready".to_string())
        })?;
        debug!(thread_id, "WinEvent hook thread ready");

        Ok(Self {
            thread_id,
            requests: Mutex::new(request_tx),
            join_handle: Mutex::new(Some(join_handle)),
        })
    }

    fn submit<T>(&self, request: HookRequest, reply: Receiver<Result<T>>) -> Result<T> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .send(request)
            .map_err(|_| WinTrackError::Platform("Hook thread is gone".to_string()))?;

        unsafe { PostThreadMessageW(self.thread_id, WM_HOOK_REQUEST, WPARAM(0), LPARAM(0)) }
            .map_err(|err| WinTrackError::Platform(format!("Failed to wake hook thread: {err}")))?;

        reply
            .recv()
            .map_err(|_| WinTrackError::Platform("Hook thread dropped the request".to_string()))?
    }
}

impl EventSource for Win32EventSource {
    fn register(&self, kind: RawEventKind, callback: RawEventCallback) -> Result<HookHandle> {
        let (reply, response) = mpsc::channel();
        self.submit(
            HookRequest::Register {
                kind,
                callback,
                reply,
            },
            response,
        )
    }

    fn unregister(&self, hook: HookHandle) -> Result<()> {
        let (reply, response) = mpsc::channel();
        self.submit(HookRequest::Unregister { hook, reply }, response)
    }
}

impl Drop for Win32EventSource {
    fn drop(&mut self) {
        if let Err(err) =
            unsafe { PostThreadMessageW(self.thread_id, WM_QUIT, WPARAM(0), LPARAM(0)) }
        {
            warn!("Failed to stop WinEvent hook thread: {}", err);
            return;
        }

        let handle = self
            .join_handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!("WinEvent hook thread panicked during shutdown");
            }
        }
    }
}

fn run_hook_thread(requests: Receiver<HookRequest>, ready: Sender<u32>) {
    let mut msg = MSG::default();
    // Touching the queue forces Windows to create it before anyone posts to us
    unsafe {
        let _ = PeekMessageW(&mut msg, HWND::default(), WM_USER, WM_USER, PM_NOREMOVE);
    }
    if ready.send(unsafe { GetCurrentThreadId() }).is_err() {
        return;
    }

    let mut installed: Vec<HWINEVENTHOOK> = Vec::new();
    loop {
        let status = unsafe { GetMessageW(&mut msg, HWND::default(), 0, 0) };
        // 0 means WM_QUIT, -1 means the call itself failed
        if status.0 <= 0 {
            break;
        }

        if msg.message == WM_HOOK_REQUEST {
            while let Ok(request) = requests.try_recv() {
                handle_request(request, &mut installed);
            }
            continue;
        }

        unsafe {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }

    for hook in installed {
        remove_hook(hook);
    }
    debug!("WinEvent hook thread exited");
}

fn handle_request(request: HookRequest, installed: &mut Vec<HWINEVENTHOOK>) {
    match request {
        HookRequest::Register {
            kind,
            callback,
            reply,
        } => {
            let hook = unsafe {
                SetWinEventHook(
                    kind.code(),
                    kind.code(),
                    HMODULE::default(),
                    Some(win_event_proc),
                    0,
                    0,
                    WINEVENT_OUTOFCONTEXT,
                )
            };

            let result = if hook.0.is_null() {
                Err(WinTrackError::HookRegistration {
                    kind,
                    reason: "SetWinEventHook returned a null handle".to_string(),
                }
                .into())
            } else {
                registry()
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(hook_key(hook), callback);
                installed.push(hook);
                Ok(HookHandle(hook_key(hook)))
            };
            let _ = reply.send(result);
        }
        HookRequest::Unregister { hook, reply } => {
            let position = installed.iter().position(|h| hook_key(*h) == hook.0);
            let result = match position {
                Some(index) => {
                    remove_hook(installed.swap_remove(index));
                    Ok(())
                }
                None => Err(WinTrackError::HookNotFound(hook.0).into()),
            };
            let _ = reply.send(result);
        }
    }
}

fn remove_hook(hook: HWINEVENTHOOK) {
    registry()
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .remove(&hook_key(hook));
    if !unsafe { UnhookWinEvent(hook) }.as_bool() {
        warn!(hook = hook_key(hook), "UnhookWinEvent failed");
    }
}

unsafe extern "system" fn win_event_proc(
    hook: HWINEVENTHOOK,
    event: u32,
    hwnd: HWND,
    id_object: i32,
    id_child: i32,
    _event_thread: u32,
    _event_time: u32,
) {
    if hwnd.0.is_null() {
        return;
    }
    let Some(kind) = RawEventKind::from_code(event) else {
        return;
    };

    let callback = registry()
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&hook_key(hook))
        .cloned();

    if let Some(callback) = callback {
        callback(RawWindowEvent::new(
            from_hwnd(hwnd),
            kind,
            ObjectId(id_object),
            ChildId(id_child),
        ));
    }
}
