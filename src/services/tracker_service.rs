//! Async host for the window tracker
//!
//! Raw events from the event source are funnelled through one queue and
//! handled by a single dispatch task. Close confirmation is a timer task that
//! re-enters that same queue after the configured delay, so waiting on one
//! window never holds up events for another.

use crate::config::TrackerConfig;
use crate::models::{RawEventKind, RawWindowEvent, WindowHandle};
use crate::platform::{Backend, EventSource, HookHandle, RawEventCallback};
use crate::services::window_tracker::{Dispatch, ScanSummary, WindowTracker};
use crate::{Result, WinTrackError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

/// Work item for the dispatch task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerMessage {
    Raw(RawWindowEvent),
    ConfirmClose(WindowHandle),
}

/// Registered hooks, released together when dropped
pub struct Subscriptions {
    source: Arc<dyn EventSource>,
    hooks: Vec<(RawEventKind, HookHandle)>,
    unavailable: Vec<RawEventKind>,
}

impl Subscriptions {
    /// Register one hook per kind, forwarding raw events into `sink`.
    ///
    /// A kind that fails to register is logged and reported through
    /// [`Subscriptions::unavailable_kinds`]; it is an error only if no kind
    /// could be registered at all.
    pub fn acquire(
        source: Arc<dyn EventSource>,
        kinds: &[RawEventKind],
        sink: mpsc::UnboundedSender<TrackerMessage>,
    ) -> Result<Self> {
        let mut subscriptions = Self {
            source,
            hooks: Vec::with_capacity(kinds.len()),
            unavailable: Vec::new(),
        };

        for &kind in kinds {
            let sink = sink.clone();
            let callback: RawEventCallback = Arc::new(move |event| {
                // Receiver gone means the tracker is shutting down
                let _ = sink.send(TrackerMessage::Raw(event));
            });

            match subscriptions.source.register(kind, callback) {
                Ok(hook) => {
                    debug!(%kind, %hook, "Registered window event hook");
                    subscriptions.hooks.push((kind, hook));
                }
                Err(error) => {
                    warn!(%kind, error = %error, "Window event hook unavailable");
                    subscriptions.unavailable.push(kind);
                }
            }
        }

        if subscriptions.hooks.is_empty() && !kinds.is_empty() {
            return Err(WinTrackError::Platform(
                "No window event hooks could be registered".to_string(),
            )
            .into());
        }
        Ok(subscriptions)
    }

    pub fn active_kinds(&self) -> Vec<RawEventKind> {
        self.hooks.iter().map(|(kind, _)| *kind).collect()
    }

    pub fn unavailable_kinds(&self) -> &[RawEventKind] {
        &self.unavailable
    }

    /// Unregister every hook. Safe to call more than once.
    pub fn release(&mut self) {
        for (kind, hook) in self.hooks.drain(..) {
            match self.source.unregister(hook) {
                Ok(()) => debug!(%kind, %hook, "Released window event hook"),
                Err(error) => warn!(%kind, %hook, error = %error, "Failed to release hook"),
            }
        }
    }
}

impl Drop for Subscriptions {
    fn drop(&mut self) {
        self.release();
    }
}

pub struct TrackerService {
    tracker: Arc<WindowTracker>,
    source: Arc<dyn EventSource>,
}

impl TrackerService {
    pub fn new(tracker: Arc<WindowTracker>, source: Arc<dyn EventSource>) -> Self {
        Self { tracker, source }
    }

    pub fn from_backend(backend: &Backend, config: &TrackerConfig) -> Self {
        Self::new(
            Arc::new(WindowTracker::from_backend(backend, config)),
            backend.events.clone(),
        )
    }

    pub fn tracker(&self) -> &Arc<WindowTracker> {
        &self.tracker
    }

    /// Subscribe to the event source, optionally sort existing windows, then
    /// spawn the dispatch task. Must be called inside a tokio runtime.
    pub fn start(&self) -> Result<RunningTracker> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let subscriptions =
            Subscriptions::acquire(self.source.clone(), &RawEventKind::ALL, sender.clone())?;

        // Events raised during the scan stay queued until the loop starts
        let initial_scan = if self.tracker.settings().scan_on_start {
            match self.tracker.sort_current_windows() {
                Ok(summary) => Some(summary),
                Err(error) => {
                    warn!(error = %error, "Initial window scan failed");
                    None
                }
            }
        } else {
            None
        };

        let (shutdown, shutdown_rx) = broadcast::channel(1);
        let task = tokio::spawn(dispatch_loop(
            self.tracker.clone(),
            receiver,
            sender.clone(),
            shutdown_rx,
            self.tracker.settings().close_recheck_delay(),
        ));

        info!(
            hooks = subscriptions.active_kinds().len(),
            unavailable = subscriptions.unavailable_kinds().len(),
            "Window tracker started"
        );

        Ok(RunningTracker {
            tracker: self.tracker.clone(),
            subscriptions,
            sender,
            shutdown,
            task: Some(task),
            initial_scan,
        })
    }
}

async fn dispatch_loop(
    tracker: Arc<WindowTracker>,
    mut receiver: mpsc::UnboundedReceiver<TrackerMessage>,
    sender: mpsc::UnboundedSender<TrackerMessage>,
    mut shutdown: broadcast::Receiver<()>,
    close_delay: Duration,
) {
    // Dropped on exit, which aborts outstanding close checks
    let mut pending_checks = JoinSet::new();

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                debug!("Dispatch loop received shutdown");
                break;
            }
            Some(_) = pending_checks.join_next() => {}
            message = receiver.recv() => match message {
                Some(TrackerMessage::Raw(event)) => {
                    if let Dispatch::CloseCheckScheduled(handle) = tracker.handle_raw_event(event) {
                        let sender = sender.clone();
                        pending_checks.spawn(async move {
                            tokio::time::sleep(close_delay).await;
                            let _ = sender.send(TrackerMessage::ConfirmClose(handle));
                        });
                    }
                }
                Some(TrackerMessage::ConfirmClose(handle)) => {
                    tracker.confirm_close(handle);
                }
                None => break,
            }
        }
    }

    debug!(pending = pending_checks.len(), "Dispatch loop stopped");
}

/// Handle to a started tracker. Dropping it releases the hooks and stops
/// dispatch; [`RunningTracker::shutdown`] does the same and waits for the
/// dispatch task.
pub struct RunningTracker {
    tracker: Arc<WindowTracker>,
    subscriptions: Subscriptions,
    sender: mpsc::UnboundedSender<TrackerMessage>,
    shutdown: broadcast::Sender<()>,
    task: Option<JoinHandle<()>>,
    initial_scan: Option<ScanSummary>,
}

impl RunningTracker {
    pub fn tracker(&self) -> &Arc<WindowTracker> {
        &self.tracker
    }

    /// Kinds whose hooks could not be registered at startup
    pub fn unavailable_kinds(&self) -> &[RawEventKind] {
        self.subscriptions.unavailable_kinds()
    }

    pub fn initial_scan(&self) -> Option<&ScanSummary> {
        self.initial_scan.as_ref()
    }

    /// Queue a raw event as if the event source had delivered it
    pub fn inject(&self, event: RawWindowEvent) -> Result<()> {
        self.sender
            .send(TrackerMessage::Raw(event))
            .map_err(|_| WinTrackError::Platform("Dispatch loop has stopped".to_string()))?;
        Ok(())
    }

    pub async fn shutdown(mut self) -> Result<()> {
        self.subscriptions.release();
        let _ = self.shutdown.send(());

        if let Some(task) = self.task.take() {
            task.await
                .map_err(|e| WinTrackError::Platform(format!("Dispatch task failed: {}", e)))?;
        }

        info!(tracked = self.tracker.tracked_windows().len(), "Window tracker stopped");
        Ok(())
    }
}

impl Drop for RunningTracker {
    fn drop(&mut self) {
        let _ = self.shutdown.send(());
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LifecycleEvent, LifecycleKind};
    use crate::platform::{
        FakeWindow, InMemoryEventSource, InMemoryProcessInspector, InMemoryWindowSystem,
    };
    use tokio::time::timeout;

    const A: WindowHandle = WindowHandle(0xA);
    const B: WindowHandle = WindowHandle(0xB);

    struct Fixture {
        windows: Arc<InMemoryWindowSystem>,
        events: Arc<InMemoryEventSource>,
        service: TrackerService,
    }

    fn fixture(delay_ms: u64, scan_on_start: bool) -> Fixture {
        let windows = Arc::new(InMemoryWindowSystem::default());
        let events = Arc::new(InMemoryEventSource::default());
        let backend = Backend::in_memory(
            windows.clone(),
            events.clone(),
            Arc::new(InMemoryProcessInspector::default()),
        );
        let mut config = TrackerConfig::default();
        config.tracker.close_recheck_delay_ms = delay_ms;
        config.tracker.scan_on_start = scan_on_start;

        Fixture {
            windows,
            events,
            service: TrackerService::from_backend(&backend, &config),
        }
    }

    async fn next_event(events: &mut broadcast::Receiver<LifecycleEvent>) -> LifecycleEvent {
        timeout(Duration::from_secs(2), events.recv())
            .await
            .expect("timed out waiting for lifecycle event")
            .expect("event channel closed")
    }

    #[tokio::test]
    async fn start_and_shutdown_manage_hooks() {
        let fx = fixture(20, false);
        let running = fx.service.start().unwrap();
        assert_eq!(fx.events.active_hooks(), 4);
        assert!(running.unavailable_kinds().is_empty());

        running.shutdown().await.unwrap();
        assert_eq!(fx.events.active_hooks(), 0);
    }

    #[tokio::test]
    async fn dropping_running_tracker_releases_hooks() {
        let fx = fixture(20, false);
        let running = fx.service.start().unwrap();
        drop(running);
        assert_eq!(fx.events.active_hooks(), 0);
    }

    #[tokio::test]
    async fn partial_registration_failure_is_tolerated() {
        let fx = fixture(20, false);
        fx.events.fail_registration(RawEventKind::MinimizeStart);

        let running = fx.service.start().unwrap();
        assert_eq!(running.unavailable_kinds(), &[RawEventKind::MinimizeStart]);
        assert!(!fx.events.is_subscribed(RawEventKind::MinimizeStart));
        running.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn start_fails_when_no_hook_registers() {
        let fx = fixture(20, false);
        for kind in RawEventKind::ALL {
            fx.events.fail_registration(kind);
        }
        assert!(fx.service.start().is_err());
    }

    #[tokio::test]
    async fn initial_scan_runs_before_dispatch() {
        let fx = fixture(20, true);
        fx.windows.open(A, FakeWindow::new("Editor").maximized());
        fx.windows.open(B, FakeWindow::new("Browser"));
        let mut events = fx.service.tracker().events();

        let running = fx.service.start().unwrap();
        let scan = running.initial_scan().cloned().unwrap();
        assert_eq!((scan.maximized, scan.floating), (1, 1));
        assert_eq!(next_event(&mut events).await.kind(), LifecycleKind::Maximize);
        assert_eq!(next_event(&mut events).await.kind(), LifecycleKind::Float);
        running.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn destroyed_window_closes_after_delay() {
        let fx = fixture(20, true);
        fx.windows.open(A, FakeWindow::new("Editor").maximized());
        let running = fx.service.start().unwrap();
        let mut events = running.tracker().events();

        fx.windows.destroy(A);
        fx.events
            .emit(RawWindowEvent::for_window(A, RawEventKind::Destroyed));

        assert_eq!(next_event(&mut events).await, LifecycleEvent::Close { handle: A });
        assert!(running.tracker().tracked_windows().is_empty());
        running.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn close_delay_does_not_hold_up_other_windows() {
        let fx = fixture(200, true);
        fx.windows.open(A, FakeWindow::new("Editor").maximized());
        fx.windows.open(B, FakeWindow::new("Browser"));
        let running = fx.service.start().unwrap();
        let mut events = running.tracker().events();

        fx.windows.destroy(A);
        fx.events
            .emit(RawWindowEvent::for_window(A, RawEventKind::Destroyed));
        fx.events
            .emit(RawWindowEvent::for_window(B, RawEventKind::ForegroundChanged));

        assert_eq!(next_event(&mut events).await, LifecycleEvent::Float { handle: B });
        assert_eq!(next_event(&mut events).await, LifecycleEvent::Close { handle: A });
        running.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn minimize_inside_close_delay_suppresses_close() {
        let fx = fixture(100, true);
        fx.windows.open(A, FakeWindow::new("Editor").maximized());
        let running = fx.service.start().unwrap();
        let mut events = running.tracker().events();

        fx.events
            .emit(RawWindowEvent::for_window(A, RawEventKind::Destroyed));
        fx.windows.minimize(A);
        fx.events
            .emit(RawWindowEvent::for_window(A, RawEventKind::MinimizeStart));
        fx.windows.destroy(A);

        assert_eq!(next_event(&mut events).await, LifecycleEvent::Minimize { handle: A });
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(events.try_recv().is_err());
        assert!(!running.tracker().is_tracked(A));
        assert_eq!(running.tracker().metrics().close_checks_dismissed, 1);
        running.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn surviving_window_is_not_closed() {
        let fx = fixture(20, true);
        fx.windows.open(A, FakeWindow::new("Editor").maximized());
        let running = fx.service.start().unwrap();
        let mut events = running.tracker().events();

        fx.events
            .emit(RawWindowEvent::for_window(A, RawEventKind::Destroyed));
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(events.try_recv().is_err());
        assert!(running.tracker().is_tracked(A));
        running.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn injected_events_are_dispatched() {
        let fx = fixture(20, false);
        fx.windows.open(B, FakeWindow::new("Browser"));
        let running = fx.service.start().unwrap();
        let mut events = running.tracker().events();

        running
            .inject(RawWindowEvent::for_window(B, RawEventKind::ForegroundChanged))
            .unwrap();
        assert_eq!(next_event(&mut events).await, LifecycleEvent::Float { handle: B });
        running.shutdown().await.unwrap();
    }
}
