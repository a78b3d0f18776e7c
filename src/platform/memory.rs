//! In-memory platform providers
//!
//! Used by tests, benchmarks and the `demo` command. Window state is mutated
//! directly; raw events are injected with [`InMemoryEventSource::emit`].

use super::{EventSource, HookHandle, ProcessDetails, ProcessInspector, RawEventCallback, WindowSystem};
use crate::models::{RawEventKind, RawWindowEvent, WindowHandle};
use crate::{Result, WinTrackError};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

/// State of a simulated top-level window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeWindow {
    pub title: String,
    pub visible: bool,
    pub zoomed: bool,
    pub minimized: bool,
}

impl FakeWindow {
    /// A visible, restored window with the given title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            visible: true,
            zoomed: false,
            minimized: false,
        }
    }

    pub fn maximized(mut self) -> Self {
        self.zoomed = true;
        self.minimized = false;
        self
    }

    pub fn minimized(mut self) -> Self {
        self.minimized = true;
        self.zoomed = false;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

/// Window system backed by an ordered list of fake windows
#[derive(Debug, Default)]
pub struct InMemoryWindowSystem {
    windows: RwLock<Vec<(WindowHandle, FakeWindow)>>,
    shell: RwLock<Option<WindowHandle>>,
}

impl InMemoryWindowSystem {
    pub fn new_with(windows: Vec<(WindowHandle, FakeWindow)>) -> Self {
        Self {
            windows: RwLock::new(windows),
            shell: RwLock::new(None),
        }
    }

    pub fn set_shell_window(&self, handle: WindowHandle) {
        *self.shell.write().unwrap_or_else(PoisonError::into_inner) = Some(handle);
    }

    /// Add a window at the end of the enumeration order, replacing any
    /// existing window with the same handle
    pub fn open(&self, handle: WindowHandle, window: FakeWindow) {
        let mut windows = self.windows.write().unwrap_or_else(PoisonError::into_inner);
        windows.retain(|(existing, _)| *existing != handle);
        windows.push((handle, window));
    }

    /// Mutate a live window. Returns `false` if the handle is not open.
    pub fn update<F>(&self, handle: WindowHandle, change: F) -> bool
    where
        F: FnOnce(&mut FakeWindow),
    {
        let mut windows = self.windows.write().unwrap_or_else(PoisonError::into_inner);
        match windows.iter_mut().find(|(existing, _)| *existing == handle) {
            Some((_, window)) => {
                change(window);
                true
            }
            None => false,
        }
    }

    pub fn maximize(&self, handle: WindowHandle) -> bool {
        self.update(handle, |window| {
            window.zoomed = true;
            window.minimized = false;
        })
    }

    pub fn restore(&self, handle: WindowHandle) -> bool {
        self.update(handle, |window| {
            window.zoomed = false;
            window.minimized = false;
        })
    }

    pub fn minimize(&self, handle: WindowHandle) -> bool {
        self.update(handle, |window| {
            window.zoomed = false;
            window.minimized = true;
        })
    }

    /// Remove the window; its handle becomes invalid
    pub fn destroy(&self, handle: WindowHandle) -> bool {
        let mut windows = self.windows.write().unwrap_or_else(PoisonError::into_inner);
        let before = windows.len();
        windows.retain(|(existing, _)| *existing != handle);
        windows.len() != before
    }

    fn with_window<T>(&self, handle: WindowHandle, read: impl FnOnce(&FakeWindow) -> T) -> Option<T> {
        let windows = self.windows.read().unwrap_or_else(PoisonError::into_inner);
        windows
            .iter()
            .find(|(existing, _)| *existing == handle)
            .map(|(_, window)| read(window))
    }
}

impl WindowSystem for InMemoryWindowSystem {
    fn enumerate(&self) -> Result<Vec<WindowHandle>> {
        let windows = self.windows.read().unwrap_or_else(PoisonError::into_inner);
        Ok(windows.iter().map(|(handle, _)| *handle).collect())
    }

    fn shell_window(&self) -> Option<WindowHandle> {
        *self.shell.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_valid(&self, handle: WindowHandle) -> bool {
        self.with_window(handle, |_| ()).is_some()
    }

    fn is_visible(&self, handle: WindowHandle) -> bool {
        self.with_window(handle, |window| window.visible).unwrap_or(false)
    }

    fn is_zoomed(&self, handle: WindowHandle) -> bool {
        self.with_window(handle, |window| window.zoomed).unwrap_or(false)
    }

    fn is_minimized(&self, handle: WindowHandle) -> bool {
        self.with_window(handle, |window| window.minimized).unwrap_or(false)
    }

    fn title_len(&self, handle: WindowHandle) -> usize {
        self.with_window(handle, |window| window.title.encode_utf16().count())
            .unwrap_or(0)
    }
}

/// Event source that delivers injected events synchronously to subscribers
#[derive(Default)]
pub struct InMemoryEventSource {
    hooks: RwLock<HashMap<HookHandle, (RawEventKind, RawEventCallback)>>,
    failing: RwLock<HashSet<RawEventKind>>,
    next_id: AtomicU64,
}

impl InMemoryEventSource {
    /// Make every future registration for `kind` fail
    pub fn fail_registration(&self, kind: RawEventKind) {
        self.failing
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(kind);
    }

    /// Deliver `event` to every subscriber of its kind. Returns how many
    /// callbacks ran.
    pub fn emit(&self, event: RawWindowEvent) -> usize {
        let callbacks: Vec<RawEventCallback> = {
            let hooks = self.hooks.read().unwrap_or_else(PoisonError::into_inner);
            hooks
                .values()
                .filter(|(kind, _)| *kind == event.kind)
                .map(|(_, callback)| callback.clone())
                .collect()
        };

        for callback in &callbacks {
            callback(event);
        }
        callbacks.len()
    }

    pub fn active_hooks(&self) -> usize {
        self.hooks.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_subscribed(&self, kind: RawEventKind) -> bool {
        self.hooks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .any(|(registered, _)| *registered == kind)
    }
}

impl EventSource for InMemoryEventSource {
    fn register(&self, kind: RawEventKind, callback: RawEventCallback) -> Result<HookHandle> {
        if self
            .failing
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&kind)
        {
            return Err(WinTrackError::HookRegistration {
                kind,
                reason: "registration disabled in in-memory source".to_string(),
            }
            .into());
        }

        let hook = HookHandle(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        self.hooks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(hook, (kind, callback));
        Ok(hook)
    }

    fn unregister(&self, hook: HookHandle) -> Result<()> {
        match self
            .hooks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&hook)
        {
            Some(_) => Ok(()),
            None => Err(WinTrackError::HookNotFound(hook.0).into()),
        }
    }
}

/// Process inspector answering from a fixed table
#[derive(Debug, Default)]
pub struct InMemoryProcessInspector {
    processes: RwLock<HashMap<WindowHandle, ProcessDetails>>,
}

impl InMemoryProcessInspector {
    pub fn insert(&self, handle: WindowHandle, details: ProcessDetails) {
        self.processes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(handle, details);
    }
}

impl ProcessInspector for InMemoryProcessInspector {
    fn process_details(&self, handle: WindowHandle) -> Result<ProcessDetails> {
        self.processes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&handle)
            .cloned()
            .ok_or_else(|| {
                WinTrackError::ProcessLookup {
                    handle,
                    reason: "no process recorded for window".to_string(),
                }
                .into()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    fn handle(raw: isize) -> WindowHandle {
        WindowHandle::new(raw)
    }

    #[test]
    fn enumerate_keeps_insertion_order() {
        let system = InMemoryWindowSystem::default();
        system.open(handle(3), FakeWindow::new("c"));
        system.open(handle(1), FakeWindow::new("a"));
        system.open(handle(2), FakeWindow::new("b"));

        assert_eq!(
            system.enumerate().unwrap(),
            vec![handle(3), handle(1), handle(2)]
        );
    }

    #[test]
    fn destroyed_window_reads_as_invalid() {
        let system = InMemoryWindowSystem::new_with(vec![(handle(1), FakeWindow::new("a").maximized())]);
        assert!(system.is_zoomed(handle(1)));
        assert!(system.destroy(handle(1)));
        assert!(!system.is_valid(handle(1)));
        assert!(!system.is_zoomed(handle(1)));
        assert!(!system.destroy(handle(1)));
    }

    #[test]
    fn emit_reaches_only_matching_kind() {
        let source = InMemoryEventSource::default();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        source
            .register(
                RawEventKind::Destroyed,
                Arc::new(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .unwrap();

        source.emit(RawWindowEvent::for_window(handle(1), RawEventKind::LocationChanged));
        source.emit(RawWindowEvent::for_window(handle(1), RawEventKind::Destroyed));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unregister_unknown_hook_fails() {
        let source = InMemoryEventSource::default();
        let hook = source
            .register(RawEventKind::MinimizeStart, Arc::new(|_| {}))
            .unwrap();
        assert!(source.unregister(hook).is_ok());
        assert!(source.unregister(hook).is_err());
        assert_eq!(source.active_hooks(), 0);
    }

    #[test]
    fn failing_registration_is_reported() {
        let source = InMemoryEventSource::default();
        source.fail_registration(RawEventKind::ForegroundChanged);
        let error = source
            .register(RawEventKind::ForegroundChanged, Arc::new(|_| {}))
            .unwrap_err();
        assert!(error.to_string().contains("foreground"));
    }

    #[test]
    fn process_lookup_misses_are_errors() {
        let inspector = InMemoryProcessInspector::default();
        assert!(inspector.process_details(handle(8)).is_err());

        inspector.insert(
            handle(8),
            ProcessDetails {
                pid: 100,
                ..Default::default()
            },
        );
        assert_eq!(inspector.process_details(handle(8)).unwrap().pid, 100);
    }
}
