//! Window identity and live attribute snapshots
//!
//! A [`WindowHandle`] only identifies a window while that window is alive; the
//! OS is free to hand the same value to a new window after destruction.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier for a top-level window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowHandle(pub isize);

impl WindowHandle {
    pub fn new(raw: isize) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> isize {
        self.0
    }

    /// The null handle never names a real window
    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

impl From<isize> for WindowHandle {
    fn from(raw: isize) -> Self {
        Self(raw)
    }
}

/// Window attributes queried live at the moment an event is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowSnapshot {
    pub visible: bool,
    pub zoomed: bool,
    pub minimized: bool,
    pub title_len: usize,
}

impl WindowSnapshot {
    pub fn has_title(&self) -> bool {
        self.title_len > 0
    }
}
