//! Single-slot memory of an uploaded but not yet analyzed document.

/// Holds at most one pending filename. Setting a new one silently
/// replaces the old; there is no queue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingUploadCache {
    filename: Option<String>,
}

impl PendingUploadCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, filename: impl Into<String>) {
        self.filename = Some(filename.into());
    }

    pub fn get(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn clear(&mut self) {
        self.filename = None;
    }

    /// Clears the slot only if it still holds `filename`, so a workflow
    /// finishing late does not wipe out a newer upload.
    pub fn clear_if(&mut self, filename: &str) -> bool {
        if self.get() == Some(filename) {
            self.clear();
            true
        } else {
            false
        }
    }
}
