//! Document adapter

use parking_lot::RwLock;

/// Read surface of the document. The engine captures the title once
/// per dispatch and stamps it into the navigation context.
pub trait DocumentDriver: Send + Sync {
    fn title(&self) -> String;
}

/// In-memory document for tests and headless embedders.
#[derive(Default)]
pub struct MemoryDocument {
    title: RwLock<String>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            title: RwLock::new(title.into()),
        }
    }

    pub fn set_title(&self, title: impl Into<String>) {
        *self.title.write() = title.into();
    }
}

impl DocumentDriver for MemoryDocument {
    fn title(&self) -> String {
        self.title.read().clone()
    }
}
