//! Veer environment adapters
//!
//! The dispatch engine never touches the browser directly. Everything
//! environment-shaped goes through the three driver traits here:
//! history entry mutation, window events and full-page navigation, and
//! the document title. Real embedders bind these to their platform;
//! the in-memory implementations serve tests and headless use.

mod document;
mod history;
mod window;

pub use document::{DocumentDriver, MemoryDocument};
pub use history::{HistoryDriver, HistoryRecord, HistoryState, MemoryHistory};
pub use window::{ListenerId, MemoryWindow, PopstateEvent, PopstateListener, WindowDriver};
