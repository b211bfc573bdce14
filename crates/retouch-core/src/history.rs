use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Opaque identifier of an image state (a data URL, a path, a content hash).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ImageRef {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ImageRef {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Linear undo/redo history.
///
/// Invariant: `entries` is never empty and `cursor < entries.len()`.
/// Committing while not at the end discards everything after the cursor.
/// Every method that moves the cursor returns the entry that became
/// current, which is how callers learn the displayed image changed.
#[derive(Clone, Debug)]
pub struct HistoryStack {
    entries: Vec<ImageRef>,
    cursor: usize,
}

impl HistoryStack {
    pub fn new(initial: ImageRef) -> Self {
        Self {
            entries: vec![initial],
            cursor: 0,
        }
    }

    pub fn current(&self) -> &ImageRef {
        &self.entries[self.cursor]
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ImageRef] {
        &self.entries
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// Append after the cursor, dropping any redo branch.
    pub fn commit(&mut self, entry: ImageRef) -> &ImageRef {
        let dropped = self.entries.len() - (self.cursor + 1);
        self.entries.truncate(self.cursor + 1);
        self.entries.push(entry);
        self.cursor = self.entries.len() - 1;
        info!(
            depth = self.entries.len(),
            discarded = dropped,
            "History entry committed"
        );
        self.current()
    }

    pub fn undo(&mut self) -> Option<&ImageRef> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        debug!(cursor = self.cursor, "Undo");
        Some(self.current())
    }

    pub fn redo(&mut self) -> Option<&ImageRef> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        debug!(cursor = self.cursor, "Redo");
        Some(self.current())
    }

    /// Start over with a single entry.
    pub fn reset(&mut self, entry: ImageRef) {
        self.entries.clear();
        self.entries.push(entry);
        self.cursor = 0;
    }
}
