//! Transition rules as pure functions
//!
//! Each rule looks only at the raw event, a live attribute snapshot and
//! whether the handle is currently tracked as maximized. Applying the result
//! (membership change plus emission) is the tracker's job.

use crate::models::{LifecycleKind, RawEventKind, RawWindowEvent, WindowSnapshot};

/// Outcome of evaluating one raw event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Emit this transition and apply its membership effect
    Emit(LifecycleKind),
    /// Re-check validity after the close delay before deciding
    ScheduleCloseCheck,
    Ignore,
}

/// Evaluate a raw event.
///
/// `snapshot` is `None` when the window could not be queried (already gone);
/// kinds that depend on live attributes are then ignored.
pub fn evaluate(
    event: &RawWindowEvent,
    snapshot: Option<&WindowSnapshot>,
    tracked: bool,
) -> Decision {
    match event.kind {
        RawEventKind::ForegroundChanged => snapshot
            .map(|snapshot| on_foreground(event, snapshot))
            .unwrap_or(Decision::Ignore),
        RawEventKind::LocationChanged => snapshot
            .map(|snapshot| on_location(event, snapshot, tracked))
            .unwrap_or(Decision::Ignore),
        RawEventKind::MinimizeStart => on_minimize_start(tracked),
        RawEventKind::Destroyed => on_destroyed(event, tracked),
    }
}

fn on_foreground(event: &RawWindowEvent, snapshot: &WindowSnapshot) -> Decision {
    if event.targets_window()
        && event.targets_self()
        && !snapshot.zoomed
        && snapshot.visible
        && snapshot.has_title()
    {
        Decision::Emit(LifecycleKind::Float)
    } else {
        Decision::Ignore
    }
}

fn on_location(event: &RawWindowEvent, snapshot: &WindowSnapshot, tracked: bool) -> Decision {
    if !event.targets_window() || !snapshot.visible {
        return Decision::Ignore;
    }

    // Snapped into maximized bounds
    if !tracked && snapshot.zoomed && snapshot.has_title() {
        return Decision::Emit(LifecycleKind::Maximize);
    }

    // Restored out of maximized bounds. Minimizing is left to MinimizeStart so
    // it is not reported as an unmaximize first.
    if tracked && event.targets_self() && !snapshot.zoomed && !snapshot.minimized {
        return Decision::Emit(LifecycleKind::Unmaximize);
    }

    Decision::Ignore
}

fn on_minimize_start(tracked: bool) -> Decision {
    if tracked {
        Decision::Emit(LifecycleKind::Minimize)
    } else {
        Decision::Ignore
    }
}

fn on_destroyed(event: &RawWindowEvent, tracked: bool) -> Decision {
    if event.targets_window() && event.targets_self() && tracked {
        Decision::ScheduleCloseCheck
    } else {
        Decision::Ignore
    }
}

/// Second half of the close rule, run after the re-check delay
pub fn evaluate_close(still_valid: bool, tracked: bool) -> Decision {
    if tracked && !still_valid {
        Decision::Emit(LifecycleKind::Close)
    } else {
        Decision::Ignore
    }
}

/// Cold-start classification of a window found by enumeration
pub fn classify_existing(snapshot: &WindowSnapshot) -> Option<LifecycleKind> {
    if snapshot.zoomed {
        Some(LifecycleKind::Maximize)
    } else if !snapshot.minimized {
        Some(LifecycleKind::Float)
    } else {
        None
    }
}
