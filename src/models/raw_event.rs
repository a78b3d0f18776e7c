//! Raw window notifications as delivered by the event source

use super::window::WindowHandle;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kinds of raw notification the tracker subscribes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RawEventKind {
    ForegroundChanged,
    LocationChanged,
    MinimizeStart,
    Destroyed,
}

impl RawEventKind {
    pub const ALL: [RawEventKind; 4] = [
        RawEventKind::ForegroundChanged,
        RawEventKind::LocationChanged,
        RawEventKind::MinimizeStart,
        RawEventKind::Destroyed,
    ];

    /// Win32 WinEvent code for this kind
    pub fn code(self) -> u32 {
        match self {
            RawEventKind::ForegroundChanged => 0x0003,
            RawEventKind::LocationChanged => 0x800B,
            RawEventKind::MinimizeStart => 0x0016,
            RawEventKind::Destroyed => 0x8001,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }

    /// Whether handling this kind requires live window attributes
    pub fn needs_snapshot(self) -> bool {
        matches!(
            self,
            RawEventKind::ForegroundChanged | RawEventKind::LocationChanged
        )
    }
}

impl fmt::Display for RawEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RawEventKind::ForegroundChanged => "foreground",
            RawEventKind::LocationChanged => "location",
            RawEventKind::MinimizeStart => "minimize-start",
            RawEventKind::Destroyed => "destroy",
        };
        f.write_str(name)
    }
}

/// Target object classifier of a raw event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub i32);

impl ObjectId {
    /// The window itself, as opposed to its caret, cursor or scrollbars
    pub const WINDOW: ObjectId = ObjectId(0);
}

/// Target child classifier of a raw event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChildId(pub i32);

impl ChildId {
    pub const SELF: ChildId = ChildId(0);
}

/// A single notification from the event source. Not retained after handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawWindowEvent {
    pub handle: WindowHandle,
    pub kind: RawEventKind,
    pub object: ObjectId,
    pub child: ChildId,
}

impl RawWindowEvent {
    pub fn new(handle: WindowHandle, kind: RawEventKind, object: ObjectId, child: ChildId) -> Self {
        Self {
            handle,
            kind,
            object,
            child,
        }
    }

    /// Event targeting the window itself (object WINDOW, child SELF)
    pub fn for_window(handle: WindowHandle, kind: RawEventKind) -> Self {
        Self::new(handle, kind, ObjectId::WINDOW, ChildId::SELF)
    }

    pub fn targets_window(&self) -> bool {
        self.object == ObjectId::WINDOW
    }

    pub fn targets_self(&self) -> bool {
        self.child == ChildId::SELF
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_winevent_constants() {
        assert_eq!(RawEventKind::ForegroundChanged.code(), 0x0003);
        assert_eq!(RawEventKind::MinimizeStart.code(), 0x0016);
        assert_eq!(RawEventKind::Destroyed.code(), 0x8001);
        assert_eq!(RawEventKind::LocationChanged.code(), 0x800B);
    }

    #[test]
    fn unknown_code_is_rejected() {
        assert_eq!(RawEventKind::from_code(0x8000), None);
        assert_eq!(
            RawEventKind::from_code(0x800B),
            Some(RawEventKind::LocationChanged)
        );
    }

    #[test]
    fn for_window_targets_self() {
        let event = RawWindowEvent::for_window(WindowHandle::new(5), RawEventKind::Destroyed);
        assert!(event.targets_window());
        assert!(event.targets_self());

        let child = RawWindowEvent::new(
            WindowHandle::new(5),
            RawEventKind::Destroyed,
            ObjectId::WINDOW,
            ChildId(3),
        );
        assert!(!child.targets_self());
    }
}
