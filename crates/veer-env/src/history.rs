//! History adapter
//!
//! The state object written per navigation is the sole source of truth
//! read back on pop navigation, so it must round-trip the canonical
//! path.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// State payload attached to every history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryState {
    pub canonical_path: String,
}

impl HistoryState {
    pub fn new(canonical_path: impl Into<String>) -> Self {
        Self {
            canonical_path: canonical_path.into(),
        }
    }
}

/// Mutation surface of the browsing history.
pub trait HistoryDriver: Send + Sync {
    /// Append a new entry.
    fn push_state(&self, state: HistoryState, title: &str, url: &str);

    /// Overwrite the current entry.
    fn replace_state(&self, state: HistoryState, title: &str, url: &str);
}

/// One recorded history entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    pub state: HistoryState,
    pub title: String,
    pub url: String,
}

/// In-memory history stack for tests and headless embedders.
#[derive(Default)]
pub struct MemoryHistory {
    entries: RwLock<Vec<HistoryRecord>>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded entries, oldest first.
    pub fn entries(&self) -> Vec<HistoryRecord> {
        self.entries.read().clone()
    }

    /// The entry the history currently points at.
    pub fn current(&self) -> Option<HistoryRecord> {
        self.entries.read().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl HistoryDriver for MemoryHistory {
    fn push_state(&self, state: HistoryState, title: &str, url: &str) {
        tracing::debug!(url = %url, "history push");
        self.entries.write().push(HistoryRecord {
            state,
            title: title.to_string(),
            url: url.to_string(),
        });
    }

    fn replace_state(&self, state: HistoryState, title: &str, url: &str) {
        tracing::debug!(url = %url, "history replace");
        let record = HistoryRecord {
            state,
            title: title.to_string(),
            url: url.to_string(),
        };
        let mut entries = self.entries.write();
        match entries.last_mut() {
            Some(last) => *last = record,
            None => entries.push(record),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_replace() {
        let history = MemoryHistory::new();

        history.push_state(HistoryState::new("/a"), "A", "/a");
        history.push_state(HistoryState::new("/b"), "B", "/b");
        assert_eq!(history.len(), 2);

        history.replace_state(HistoryState::new("/c"), "C", "/c");
        assert_eq!(history.len(), 2);
        assert_eq!(history.current().unwrap().state.canonical_path, "/c");
    }

    #[test]
    fn test_replace_on_empty_history_creates_entry() {
        let history = MemoryHistory::new();
        history.replace_state(HistoryState::new("/only"), "", "/only");
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_state_round_trips_canonical_path() {
        let state = HistoryState::new("/bar/123/baz?account_id=4");
        let json = serde_json::to_string(&state).unwrap();
        let back: HistoryState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
