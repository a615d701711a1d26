//! Shared document content

/// Latest known document content plus what was last put on the wire
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentSnapshot {
    content: String,
    /// Content last broadcast by us or received from the holder
    synced: String,
}

impl DocumentSnapshot {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Current content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Check for local edits not yet broadcast
    pub fn has_unsynced_changes(&self) -> bool {
        self.content != self.synced
    }

    /// Apply a local edit
    pub fn edit(&mut self, content: String) {
        self.content = content;
    }

    /// Replace the content with a remote update
    pub fn replace(&mut self, content: String) {
        self.synced.clone_from(&content);
        self.content = content;
    }

    /// Drop local edits not yet broadcast
    pub fn discard_unsynced(&mut self) {
        self.content.clone_from(&self.synced);
    }

    /// Mark the current content as broadcast and return it
    pub fn mark_synced(&mut self) -> String {
        self.synced.clone_from(&self.content);
        self.content.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_tracking() {
        let mut doc = DocumentSnapshot::new();
        assert!(!doc.has_unsynced_changes());

        doc.edit("draft".into());
        assert!(doc.has_unsynced_changes());

        assert_eq!(doc.mark_synced(), "draft");
        assert!(!doc.has_unsynced_changes());

        doc.replace("remote".into());
        assert_eq!(doc.content(), "remote");
        assert!(!doc.has_unsynced_changes());
    }

    #[test]
    fn test_discard_unsynced() {
        let mut doc = DocumentSnapshot::new();
        doc.replace("agreed".into());
        doc.edit("local draft".into());

        doc.discard_unsynced();

        assert_eq!(doc.content(), "agreed");
        assert!(!doc.has_unsynced_changes());
    }
}
