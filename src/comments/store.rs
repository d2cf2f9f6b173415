//! Per-anchor UI state for the comment threads of one review.
//!
//! Keyed by the printable anchor key so state survives any number of
//! layout rebuilds; rebuilding a view re-resolves anchors and re-reads
//! state from here, it never resets it.

use std::collections::HashMap;

use crate::domain::{AnchorKey, CommentState, PendingComment};

#[derive(Debug, Default)]
pub struct CommentStore {
    states: HashMap<String, CommentState>,
}

impl CommentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &AnchorKey) -> Option<&CommentState> {
        self.states.get(&key.to_string())
    }

    /// Merges `pending` into the state at `key`, creating the entry on
    /// first use. Collapse state at the key is left untouched.
    pub fn upsert_pending(&mut self, key: &AnchorKey, pending: PendingComment) {
        let state = self.states.entry(key.to_string()).or_default();
        state.pending = Some(pending);
    }

    pub fn take_pending(&mut self, key: &AnchorKey) -> Option<PendingComment> {
        self.states
            .get_mut(&key.to_string())
            .and_then(|s| s.pending.take())
    }

    pub fn set_collapsed(&mut self, key: &AnchorKey, collapsed: bool) {
        let state = self.states.entry(key.to_string()).or_default();
        state.collapsed = collapsed;
    }

    pub fn is_collapsed(&self, key: &AnchorKey) -> bool {
        self.get(key).map(|s| s.collapsed).unwrap_or(false)
    }

    /// Drops entries holding no information; called after a thread is
    /// submitted or discarded so stale keys do not accumulate.
    pub fn prune(&mut self) {
        self.states
            .retain(|_, s| s.pending.is_some() || s.collapsed);
    }

    pub fn clear(&mut self) {
        self.states.clear();
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(left: Option<u32>, right: Option<u32>) -> AnchorKey {
        AnchorKey::Line { left, right }
    }

    fn draft(body: &str) -> PendingComment {
        PendingComment {
            body: body.to_string(),
            uploaders: vec![],
            login: None,
        }
    }

    #[test]
    fn upsert_preserves_collapse() {
        let mut store = CommentStore::new();
        let k = key(Some(3), Some(3));
        store.set_collapsed(&k, true);
        store.upsert_pending(&k, draft("wip"));
        assert!(store.is_collapsed(&k));
        assert_eq!(store.get(&k).unwrap().pending.as_ref().unwrap().body, "wip");
    }

    #[test]
    fn state_survives_key_roundtrip() {
        // Rebuilding a layout produces fresh AnchorKey values; equal keys
        // must reach the same entry.
        let mut store = CommentStore::new();
        store.upsert_pending(&key(Some(7), None), draft("left-side note"));
        let rebuilt = key(Some(7), None);
        assert_eq!(
            store.take_pending(&rebuilt).unwrap().body,
            "left-side note"
        );
    }

    #[test]
    fn prune_drops_empty_entries() {
        let mut store = CommentStore::new();
        let a = key(Some(1), Some(1));
        let b = key(Some(2), Some(2));
        store.upsert_pending(&a, draft("keep"));
        store.set_collapsed(&b, true);
        store.set_collapsed(&b, false);
        store.prune();
        assert_eq!(store.len(), 1);
        assert!(store.get(&a).is_some());
        assert!(store.get(&b).is_none());
    }

    #[test]
    fn file_level_key_is_distinct() {
        let mut store = CommentStore::new();
        store.upsert_pending(&AnchorKey::File, draft("overall"));
        assert!(store.get(&key(None, None)).is_none());
        assert!(store.get(&AnchorKey::File).is_some());
    }
}
