//! Placeholder system providers for platforms without a native backend
//!
//! Every operation reports [`WinTrackError::Unsupported`] so higher layers can
//! detect the degraded state instead of silently tracking nothing.

use super::{EventSource, HookHandle, ProcessDetails, ProcessInspector, RawEventCallback, WindowSystem};
use crate::models::{RawEventKind, WindowHandle};
use crate::{Result, WinTrackError};

const UNSUPPORTED: &str = "window event hooks are only available on Windows";

#[derive(Debug, Default)]
pub struct SystemWindowSystem;

impl SystemWindowSystem {
    pub fn new() -> Self {
        Self
    }
}

impl WindowSystem for SystemWindowSystem {
    fn enumerate(&self) -> Result<Vec<WindowHandle>> {
        Err(WinTrackError::Unsupported(UNSUPPORTED.to_string()).into())
    }

    fn shell_window(&self) -> Option<WindowHandle> {
        None
    }

    fn is_valid(&self, _handle: WindowHandle) -> bool {
        false
    }

    fn is_visible(&self, _handle: WindowHandle) -> bool {
        false
    }

    fn is_zoomed(&self, _handle: WindowHandle) -> bool {
        false
    }

    fn is_minimized(&self, _handle: WindowHandle) -> bool {
        false
    }

    fn title_len(&self, _handle: WindowHandle) -> usize {
        0
    }
}

#[derive(Debug, Default)]
pub struct SystemEventSource;

impl SystemEventSource {
    pub fn new() -> Self {
        Self
    }
}

impl EventSource for SystemEventSource {
    fn register(&self, kind: RawEventKind, _callback: RawEventCallback) -> Result<HookHandle> {
        Err(WinTrackError::HookRegistration {
            kind,
            reason: UNSUPPORTED.to_string(),
        }
        .into())
    }

    fn unregister(&self, hook: HookHandle) -> Result<()> {
        Err(WinTrackError::HookNotFound(hook.0).into())
    }
}

#[derive(Debug, Default)]
pub struct SystemProcessInspector;

impl SystemProcessInspector {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessInspector for SystemProcessInspector {
    fn process_details(&self, handle: WindowHandle) -> Result<ProcessDetails> {
        Err(WinTrackError::ProcessLookup {
            handle,
            reason: UNSUPPORTED.to_string(),
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn placeholder_backend_reports_unsupported() {
        assert!(SystemWindowSystem::new().enumerate().is_err());
        assert!(SystemEventSource::new()
            .register(RawEventKind::Destroyed, Arc::new(|_| {}))
            .is_err());
        assert!(SystemProcessInspector::new()
            .process_details(WindowHandle::new(1))
            .is_err());
    }
}
