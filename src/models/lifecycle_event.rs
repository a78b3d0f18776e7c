//! Lifecycle transitions emitted to observers

use super::window::WindowHandle;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Payload-free discriminant of a [`LifecycleEvent`], used as subscription key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleKind {
    Float,
    Maximize,
    Unmaximize,
    Minimize,
    Close,
}

impl LifecycleKind {
    pub const ALL: [LifecycleKind; 5] = [
        LifecycleKind::Float,
        LifecycleKind::Maximize,
        LifecycleKind::Unmaximize,
        LifecycleKind::Minimize,
        LifecycleKind::Close,
    ];

    /// How emitting this kind changes tracked-set membership
    pub fn membership_effect(self) -> MembershipEffect {
        match self {
            LifecycleKind::Float => MembershipEffect::Unchanged,
            LifecycleKind::Maximize => MembershipEffect::Insert,
            LifecycleKind::Unmaximize | LifecycleKind::Minimize | LifecycleKind::Close => {
                MembershipEffect::Remove
            }
        }
    }
}

impl fmt::Display for LifecycleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleKind::Float => "float",
            LifecycleKind::Maximize => "maximize",
            LifecycleKind::Unmaximize => "unmaximize",
            LifecycleKind::Minimize => "minimize",
            LifecycleKind::Close => "close",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipEffect {
    Insert,
    Remove,
    Unchanged,
}

/// A deduplicated, semantically meaningful window transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LifecycleEvent {
    Float {
        handle: WindowHandle,
    },
    Maximize {
        handle: WindowHandle,
        description: Option<String>,
    },
    Unmaximize {
        handle: WindowHandle,
    },
    Minimize {
        handle: WindowHandle,
    },
    Close {
        handle: WindowHandle,
    },
}

impl LifecycleEvent {
    /// Build an event of the given kind. `description` is only kept for Maximize.
    pub fn new(kind: LifecycleKind, handle: WindowHandle, description: Option<String>) -> Self {
        match kind {
            LifecycleKind::Float => LifecycleEvent::Float { handle },
            LifecycleKind::Maximize => LifecycleEvent::Maximize {
                handle,
                description,
            },
            LifecycleKind::Unmaximize => LifecycleEvent::Unmaximize { handle },
            LifecycleKind::Minimize => LifecycleEvent::Minimize { handle },
            LifecycleKind::Close => LifecycleEvent::Close { handle },
        }
    }

    pub fn kind(&self) -> LifecycleKind {
        match self {
            LifecycleEvent::Float { .. } => LifecycleKind::Float,
            LifecycleEvent::Maximize { .. } => LifecycleKind::Maximize,
            LifecycleEvent::Unmaximize { .. } => LifecycleKind::Unmaximize,
            LifecycleEvent::Minimize { .. } => LifecycleKind::Minimize,
            LifecycleEvent::Close { .. } => LifecycleKind::Close,
        }
    }

    pub fn handle(&self) -> WindowHandle {
        match self {
            LifecycleEvent::Float { handle }
            | LifecycleEvent::Maximize { handle, .. }
            | LifecycleEvent::Unmaximize { handle }
            | LifecycleEvent::Minimize { handle }
            | LifecycleEvent::Close { handle } => *handle,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            LifecycleEvent::Maximize { description, .. } => description.as_deref(),
            _ => None,
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.description() {
            Some(description) => write!(f, "{} {} ({})", self.kind(), self.handle(), description),
            None => write!(f, "{} {}", self.kind(), self.handle()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn description_only_survives_on_maximize() {
        let handle = WindowHandle::new(1);
        let float = LifecycleEvent::new(LifecycleKind::Float, handle, Some("Editor".into()));
        assert_eq!(float, LifecycleEvent::Float { handle });
        assert_eq!(float.description(), None);

        let max = LifecycleEvent::new(LifecycleKind::Maximize, handle, Some("Editor".into()));
        assert_eq!(max.description(), Some("Editor"));
        assert_eq!(max.kind(), LifecycleKind::Maximize);
    }

    #[test]
    fn membership_effects() {
        assert_eq!(
            LifecycleKind::Maximize.membership_effect(),
            MembershipEffect::Insert
        );
        assert_eq!(
            LifecycleKind::Float.membership_effect(),
            MembershipEffect::Unchanged
        );
        for kind in [
            LifecycleKind::Unmaximize,
            LifecycleKind::Minimize,
            LifecycleKind::Close,
        ] {
            assert_eq!(kind.membership_effect(), MembershipEffect::Remove);
        }
    }

    #[test]
    fn json_shape_is_tagged() {
        let event = LifecycleEvent::Maximize {
            handle: WindowHandle::new(16),
            description: Some("Notepad".to_string()),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "maximize");
        assert_eq!(value["handle"], 16);
        assert_eq!(value["description"], "Notepad");
    }

    #[test]
    fn display_includes_description() {
        let event = LifecycleEvent::Maximize {
            handle: WindowHandle::new(0x10),
            description: Some("Notepad".to_string()),
        };
        assert_eq!(event.to_string(), "maximize 0x00000010 (Notepad)");
        assert_eq!(
            LifecycleEvent::Close {
                handle: WindowHandle::new(0x10)
            }
            .to_string(),
            "close 0x00000010"
        );
    }
}
