//! Window adapter
//!
//! Back/forward navigation events and the full-page fallback
//! navigation the engine uses when no route claims a path.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::history::HistoryState;

/// A back/forward navigation event. `state` is whatever the engine
/// wrote on push/replace; events without state are synthetic (e.g.
/// hash changes) and carry nothing to re-dispatch.
#[derive(Debug, Clone)]
pub struct PopstateEvent {
    pub state: Option<HistoryState>,
}

pub type PopstateListener = Arc<dyn Fn(PopstateEvent) + Send + Sync>;

/// Handle returned by listener registration, used to detach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Window event and navigation surface.
pub trait WindowDriver: Send + Sync {
    fn add_popstate_listener(&self, listener: PopstateListener) -> ListenerId;

    fn remove_popstate_listener(&self, id: ListenerId);

    /// Full-page navigation, leaving the application entirely.
    fn navigate(&self, location: &str);
}

/// In-memory window for tests and headless embedders. Records
/// full-page navigations and can synthesize popstate events toward
/// its registered listeners.
#[derive(Default)]
pub struct MemoryWindow {
    listeners: RwLock<HashMap<ListenerId, PopstateListener>>,
    next_listener_id: AtomicU64,
    navigations: RwLock<Vec<String>>,
}

impl MemoryWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a popstate event to every registered listener.
    pub fn emit_popstate(&self, event: PopstateEvent) {
        // Snapshot so a listener may detach itself while handling.
        let listeners: Vec<PopstateListener> = self.listeners.read().values().cloned().collect();
        for listener in listeners {
            listener(event.clone());
        }
    }

    /// Full-page navigations performed so far, oldest first.
    pub fn navigations(&self) -> Vec<String> {
        self.navigations.read().clone()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }
}

impl WindowDriver for MemoryWindow {
    fn add_popstate_listener(&self, listener: PopstateListener) -> ListenerId {
        let id = ListenerId(self.next_listener_id.fetch_add(1, Ordering::SeqCst));
        self.listeners.write().insert(id, listener);
        id
    }

    fn remove_popstate_listener(&self, id: ListenerId) {
        self.listeners.write().remove(&id);
    }

    fn navigate(&self, location: &str) {
        tracing::debug!(location = %location, "full-page navigation");
        self.navigations.write().push(location.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_emit_reaches_listeners() {
        let window = MemoryWindow::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_by_listener = Arc::clone(&seen);
        window.add_popstate_listener(Arc::new(move |event| {
            seen_by_listener.lock().push(event.state);
        }));

        window.emit_popstate(PopstateEvent {
            state: Some(HistoryState::new("/a")),
        });
        window.emit_popstate(PopstateEvent { state: None });

        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], Some(HistoryState::new("/a")));
        assert_eq!(seen[1], None);
    }

    #[test]
    fn test_removed_listener_stops_receiving() {
        let window = MemoryWindow::new();
        let seen = Arc::new(Mutex::new(0u32));

        let seen_by_listener = Arc::clone(&seen);
        let id = window.add_popstate_listener(Arc::new(move |_| {
            *seen_by_listener.lock() += 1;
        }));

        window.emit_popstate(PopstateEvent { state: None });
        window.remove_popstate_listener(id);
        window.emit_popstate(PopstateEvent { state: None });

        assert_eq!(*seen.lock(), 1);
        assert_eq!(window.listener_count(), 0);
    }

    #[test]
    fn test_navigations_are_recorded() {
        let window = MemoryWindow::new();
        window.navigate("/404");
        assert_eq!(window.navigations(), vec!["/404".to_string()]);
    }
}
