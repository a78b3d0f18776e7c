//! Window lifecycle tracker
//!
//! Owns the set of windows currently known to be maximized and turns raw
//! window notifications into lifecycle transitions. Dispatch is serialized:
//! one raw event is decided, applied to the tracked set and delivered to
//! observers before the next one starts, so observers see transitions in the
//! order the tracked set went through them. Observers must not call back into
//! `handle_raw_event`, `confirm_close` or `sort_current_windows`.

use crate::config::{TrackerConfig, TrackerSettings};
use crate::models::{LifecycleEvent, LifecycleKind, MembershipEffect, RawWindowEvent, WindowHandle};
use crate::platform::{capture_snapshot, Backend, ProcessInspector, WindowSystem};
use crate::services::description::DescriptionService;
use crate::services::observers::{ObserverRegistry, SubscriptionId};
use crate::services::transitions::{self, Decision};
use crate::{trace_performance, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use tracing::{debug, info, trace};

/// What happened to one raw event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Emitted(LifecycleEvent),
    /// A tracked window reported destruction; call
    /// [`WindowTracker::confirm_close`] once the re-check delay has passed
    CloseCheckScheduled(WindowHandle),
    Ignored,
}

/// Result of a cold-start scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub maximized: usize,
    pub floating: usize,
    /// Minimized windows plus windows that vanished mid-scan
    pub skipped: usize,
    pub events: Vec<LifecycleEvent>,
}

/// Counters for tracker activity
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TrackerMetrics {
    pub raw_events: u64,
    pub ignored_events: u64,
    pub transitions: u64,
    pub close_checks_scheduled: u64,
    pub close_checks_dismissed: u64,
    pub scans: u64,
}

#[derive(Debug, Default)]
struct TrackerState {
    tracked: HashSet<WindowHandle>,
    metrics: TrackerMetrics,
}

impl TrackerState {
    fn apply(&mut self, kind: LifecycleKind, handle: WindowHandle) {
        match kind.membership_effect() {
            MembershipEffect::Insert => {
                self.tracked.insert(handle);
            }
            MembershipEffect::Remove => {
                self.tracked.remove(&handle);
            }
            MembershipEffect::Unchanged => {}
        }
        self.metrics.transitions += 1;
    }
}

pub struct WindowTracker {
    windows: Arc<dyn WindowSystem>,
    descriptions: DescriptionService,
    settings: TrackerSettings,
    /// Held for a whole decide, apply and notify step
    dispatch: Mutex<()>,
    state: Mutex<TrackerState>,
    observers: ObserverRegistry,
}

impl WindowTracker {
    pub fn new(
        windows: Arc<dyn WindowSystem>,
        processes: Arc<dyn ProcessInspector>,
        config: &TrackerConfig,
    ) -> Self {
        Self {
            windows,
            descriptions: DescriptionService::new(processes, config.description.clone()),
            settings: config.tracker.clone(),
            dispatch: Mutex::new(()),
            state: Mutex::new(TrackerState::default()),
            observers: ObserverRegistry::default(),
        }
    }

    pub fn from_backend(backend: &Backend, config: &TrackerConfig) -> Self {
        Self::new(backend.windows.clone(), backend.processes.clone(), config)
    }

    pub fn settings(&self) -> &TrackerSettings {
        &self.settings
    }

    pub fn subscribe<F>(&self, kind: LifecycleKind, observer: F) -> SubscriptionId
    where
        F: Fn(&LifecycleEvent) + Send + Sync + 'static,
    {
        self.observers.subscribe(kind, Arc::new(observer))
    }

    pub fn subscribe_all<F>(&self, observer: F) -> Vec<SubscriptionId>
    where
        F: Fn(&LifecycleEvent) + Send + Sync + 'static,
    {
        self.observers.subscribe_all(Arc::new(observer))
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Receiver of every emitted event, for async consumers
    pub fn events(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.observers.events()
    }

    /// Classify every open top-level window without relying on prior events.
    ///
    /// Maximized windows are tracked and announced, other non-minimized
    /// windows float. Intended to run once, before incremental events.
    pub fn sort_current_windows(&self) -> Result<ScanSummary> {
        let _dispatch = self.lock_dispatch();
        let handles = self.windows.enumerate()?;
        let shell = self.windows.shell_window();

        trace_performance!("sort_current_windows", {
            let mut summary = ScanSummary::default();
            for handle in handles {
                if Some(handle) == shell {
                    continue;
                }

                let kind = capture_snapshot(self.windows.as_ref(), handle)
                    .and_then(|snapshot| transitions::classify_existing(&snapshot));
                let Some(kind) = kind else {
                    trace!(%handle, "Skipping minimized or vanished window");
                    summary.skipped += 1;
                    continue;
                };

                self.lock_state().apply(kind, handle);
                match kind {
                    LifecycleKind::Maximize => summary.maximized += 1,
                    _ => summary.floating += 1,
                }
                summary.events.push(self.emit(kind, handle));
            }

            self.lock_state().metrics.scans += 1;
            info!(
                maximized = summary.maximized,
                floating = summary.floating,
                skipped = summary.skipped,
                "Sorted current windows"
            );
            Ok(summary)
        })
    }

    /// Evaluate one raw event against live window state
    pub fn handle_raw_event(&self, event: RawWindowEvent) -> Dispatch {
        let _dispatch = self.lock_dispatch();
        let handle = event.handle;
        let snapshot = if event.kind.needs_snapshot() {
            capture_snapshot(self.windows.as_ref(), handle)
        } else {
            None
        };

        let decision = {
            let mut state = self.lock_state();
            state.metrics.raw_events += 1;
            let tracked = state.tracked.contains(&handle);
            let decision = transitions::evaluate(&event, snapshot.as_ref(), tracked);
            match decision {
                Decision::Emit(kind) => state.apply(kind, handle),
                Decision::ScheduleCloseCheck => state.metrics.close_checks_scheduled += 1,
                Decision::Ignore => state.metrics.ignored_events += 1,
            }
            decision
        };

        match decision {
            Decision::Emit(kind) => Dispatch::Emitted(self.emit(kind, handle)),
            Decision::ScheduleCloseCheck => {
                debug!(%handle, "Tracked window destroyed, re-checking after delay");
                Dispatch::CloseCheckScheduled(handle)
            }
            Decision::Ignore => {
                trace!(%handle, kind = %event.kind, "Raw event ignored");
                Dispatch::Ignored
            }
        }
    }

    /// Deferred half of the close rule. Emits Close only if the handle is
    /// still tracked and no longer names a live window.
    pub fn confirm_close(&self, handle: WindowHandle) -> Option<LifecycleEvent> {
        let _dispatch = self.lock_dispatch();
        let still_valid = self.windows.is_valid(handle);

        let decision = {
            let mut state = self.lock_state();
            let tracked = state.tracked.contains(&handle);
            let decision = transitions::evaluate_close(still_valid, tracked);
            match decision {
                Decision::Emit(kind) => state.apply(kind, handle),
                _ => state.metrics.close_checks_dismissed += 1,
            }
            decision
        };

        match decision {
            Decision::Emit(kind) => Some(self.emit(kind, handle)),
            _ => {
                debug!(%handle, still_valid, "Close check dismissed");
                None
            }
        }
    }

    /// Currently tracked (maximized) windows in handle order
    pub fn tracked_windows(&self) -> Vec<WindowHandle> {
        let mut handles: Vec<_> = self.lock_state().tracked.iter().copied().collect();
        handles.sort();
        handles
    }

    pub fn is_tracked(&self, handle: WindowHandle) -> bool {
        self.lock_state().tracked.contains(&handle)
    }

    pub fn metrics(&self) -> TrackerMetrics {
        self.lock_state().metrics.clone()
    }

    fn emit(&self, kind: LifecycleKind, handle: WindowHandle) -> LifecycleEvent {
        let description = (kind == LifecycleKind::Maximize && self.settings.describe_maximized)
            .then(|| self.descriptions.describe(handle));
        let event = LifecycleEvent::new(kind, handle, description);

        info!(%event, "Window transition");
        self.observers.notify(&event);
        event
    }

    fn lock_dispatch(&self) -> MutexGuard<'_, ()> {
        self.dispatch.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_state(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
