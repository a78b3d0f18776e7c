//! Observer registry for lifecycle events
//!
//! Callbacks are grouped by [`LifecycleKind`]; every callback registered for a
//! kind runs for each event of that kind. Async consumers can instead take a
//! broadcast receiver that sees every event.

use crate::models::{LifecycleEvent, LifecycleKind};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;
use tracing::trace;
use uuid::Uuid;

/// Callback invoked synchronously for each matching event
pub type Observer = Arc<dyn Fn(&LifecycleEvent) + Send + Sync>;

/// Identifies a registered observer so it can be removed again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

pub struct ObserverRegistry {
    observers: RwLock<HashMap<LifecycleKind, Vec<(SubscriptionId, Observer)>>>,
    broadcast: broadcast::Sender<LifecycleEvent>,
}

impl ObserverRegistry {
    pub fn new(broadcast_capacity: usize) -> Self {
        let (broadcast, _) = broadcast::channel(broadcast_capacity.max(1));
        Self {
            observers: RwLock::new(HashMap::new()),
            broadcast,
        }
    }

    pub fn subscribe(&self, kind: LifecycleKind, observer: Observer) -> SubscriptionId {
        let id = SubscriptionId::new();
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(kind)
            .or_default()
            .push((id, observer));
        id
    }

    /// Register one observer for every kind, returning one id per kind
    pub fn subscribe_all(&self, observer: Observer) -> Vec<SubscriptionId> {
        LifecycleKind::ALL
            .into_iter()
            .map(|kind| self.subscribe(kind, observer.clone()))
            .collect()
    }

    /// Returns whether an observer was removed
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut observers = self.observers.write().unwrap_or_else(PoisonError::into_inner);
        let mut removed = false;
        for entries in observers.values_mut() {
            let before = entries.len();
            entries.retain(|(existing, _)| *existing != id);
            removed |= entries.len() != before;
        }
        removed
    }

    pub fn events(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.broadcast.subscribe()
    }

    pub fn observer_count(&self, kind: LifecycleKind) -> usize {
        self.observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .map_or(0, Vec::len)
    }

    /// Fan `event` out to its observers, then to broadcast receivers.
    /// Observers are cloned out first so they may (un)subscribe re-entrantly.
    pub fn notify(&self, event: &LifecycleEvent) {
        let observers: Vec<Observer> = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&event.kind())
            .map(|entries| entries.iter().map(|(_, observer)| observer.clone()).collect())
            .unwrap_or_default();

        trace!(kind = %event.kind(), observers = observers.len(), "Notifying observers");
        for observer in observers {
            observer(event);
        }

        // No receivers is fine
        let _ = self.broadcast.send(event.clone());
    }
}

impl Default for ObserverRegistry {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WindowHandle;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, Observer) {
        let count = Arc::new(AtomicUsize::new(0));
        let cloned = count.clone();
        let observer: Observer = Arc::new(move |_| {
            cloned.fetch_add(1, Ordering::SeqCst);
        });
        (count, observer)
    }

    #[test]
    fn notify_reaches_every_observer_of_kind() {
        let registry = ObserverRegistry::default();
        let (first, first_observer) = counter();
        let (second, second_observer) = counter();
        let (other, other_observer) = counter();
        registry.subscribe(LifecycleKind::Close, first_observer);
        registry.subscribe(LifecycleKind::Close, second_observer);
        registry.subscribe(LifecycleKind::Float, other_observer);

        registry.notify(&LifecycleEvent::Close {
            handle: WindowHandle::new(1),
        });

        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 1);
        assert_eq!(other.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let registry = ObserverRegistry::default();
        let (count, observer) = counter();
        let id = registry.subscribe(LifecycleKind::Minimize, observer);

        assert!(registry.unsubscribe(id));
        assert!(!registry.unsubscribe(id));
        registry.notify(&LifecycleEvent::Minimize {
            handle: WindowHandle::new(1),
        });
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(registry.observer_count(LifecycleKind::Minimize), 0);
    }

    #[test]
    fn subscribe_all_covers_every_kind() {
        let registry = ObserverRegistry::default();
        let (count, observer) = counter();
        let ids = registry.subscribe_all(observer);
        assert_eq!(ids.len(), LifecycleKind::ALL.len());

        let handle = WindowHandle::new(4);
        for kind in LifecycleKind::ALL {
            registry.notify(&LifecycleEvent::new(kind, handle, None));
        }
        assert_eq!(count.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn broadcast_receivers_see_events() {
        let registry = ObserverRegistry::default();
        let mut events = registry.events();
        let event = LifecycleEvent::Float {
            handle: WindowHandle::new(2),
        };

        registry.notify(&event);
        assert_eq!(events.recv().await.unwrap(), event);
    }
}
