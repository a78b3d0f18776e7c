//! Platform integration layer for wintrack
//!
//! The tracker never talks to the OS directly. It consumes three
//! collaborators: an [`EventSource`] delivering raw notifications, a
//! [`WindowSystem`] answering live attribute queries, and a
//! [`ProcessInspector`] feeding description lookup. The Win32 backend
//! implements them for real; the in-memory backend drives tests and demos.

pub mod memory;

#[cfg(not(windows))]
pub mod system;

#[cfg(windows)]
pub mod win32;

pub use memory::*;

use crate::models::{RawEventKind, RawWindowEvent, WindowHandle, WindowSnapshot};
use crate::Result;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Identifier of one registered event subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookHandle(pub u64);

impl fmt::Display for HookHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hook#{:X}", self.0)
    }
}

/// Callback invoked by an event source for every matching raw event.
/// May run on a thread owned by the event source.
pub type RawEventCallback = Arc<dyn Fn(RawWindowEvent) + Send + Sync>;

/// Source of raw window notifications
pub trait EventSource: Send + Sync {
    /// Subscribe `callback` to notifications of `kind`
    fn register(&self, kind: RawEventKind, callback: RawEventCallback) -> Result<HookHandle>;

    /// Release a subscription obtained from [`EventSource::register`]
    fn unregister(&self, hook: HookHandle) -> Result<()>;
}

/// Live window attribute queries plus top-level enumeration
pub trait WindowSystem: Send + Sync {
    /// All top-level windows, shell window included
    fn enumerate(&self) -> Result<Vec<WindowHandle>>;

    /// The desktop shell window, if there is one
    fn shell_window(&self) -> Option<WindowHandle>;

    fn is_valid(&self, handle: WindowHandle) -> bool;

    fn is_visible(&self, handle: WindowHandle) -> bool;

    fn is_zoomed(&self, handle: WindowHandle) -> bool;

    fn is_minimized(&self, handle: WindowHandle) -> bool;

    fn title_len(&self, handle: WindowHandle) -> usize;
}

/// Query every attribute the transition rules look at.
///
/// Returns `None` once the handle no longer names a live window; callers treat
/// that as "window gone" and suppress the transition.
pub fn capture_snapshot(system: &dyn WindowSystem, handle: WindowHandle) -> Option<WindowSnapshot> {
    if handle.is_null() || !system.is_valid(handle) {
        return None;
    }

    let snapshot = WindowSnapshot {
        visible: system.is_visible(handle),
        zoomed: system.is_zoomed(handle),
        minimized: system.is_minimized(handle),
        title_len: system.title_len(handle),
    };

    // The window may have been destroyed while we were querying it
    if system.is_valid(handle) {
        Some(snapshot)
    } else {
        None
    }
}

/// Facts about the process owning a window, used to build its description
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcessDetails {
    pub pid: u32,
    pub main_window_title: Option<String>,
    /// Full path of the main module; `None` when module info is unavailable
    pub executable: Option<PathBuf>,
    pub file_description: Option<String>,
}

impl ProcessDetails {
    /// Executable name without directory or extension
    pub fn process_name(&self) -> Option<String> {
        self.executable
            .as_ref()
            .and_then(|path| path.file_stem())
            .map(|stem| stem.to_string_lossy().into_owned())
    }
}

/// Looks up the process that owns a window
#[cfg_attr(test, mockall::automock)]
pub trait ProcessInspector: Send + Sync {
    fn process_details(&self, handle: WindowHandle) -> Result<ProcessDetails>;
}

/// The three collaborators bundled for one platform
#[derive(Clone)]
pub struct Backend {
    pub windows: Arc<dyn WindowSystem>,
    pub events: Arc<dyn EventSource>,
    pub processes: Arc<dyn ProcessInspector>,
}

impl Backend {
    /// Backend for the platform this binary was built for
    #[cfg(windows)]
    pub fn native() -> Result<Self> {
        Ok(Self {
            windows: Arc::new(win32::Win32WindowSystem::new()),
            events: Arc::new(win32::Win32EventSource::spawn()?),
            processes: Arc::new(win32::Win32ProcessInspector::new()),
        })
    }

    /// Backend for the platform this binary was built for
    #[cfg(not(windows))]
    pub fn native() -> Result<Self> {
        Ok(Self {
            windows: Arc::new(system::SystemWindowSystem::new()),
            events: Arc::new(system::SystemEventSource::new()),
            processes: Arc::new(system::SystemProcessInspector::new()),
        })
    }

    /// Backend over the in-memory fakes, sharing them with the caller
    pub fn in_memory(
        windows: Arc<InMemoryWindowSystem>,
        events: Arc<InMemoryEventSource>,
        processes: Arc<InMemoryProcessInspector>,
    ) -> Self {
        Self {
            windows,
            events,
            processes,
        }
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend").finish_non_exhaustive()
    }
}
