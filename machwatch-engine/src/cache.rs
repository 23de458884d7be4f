//! Single-slot snapshot cache.

use std::sync::Arc;

use machwatch_types::RawSnapshot;
use parking_lot::RwLock;

/// Holds the most recently fetched snapshot.
///
/// Last write wins. Readers get a shared handle, so evaluating every series on
/// a tick never copies the payload.
#[derive(Debug, Default)]
pub struct SnapshotCache {
    slot: RwLock<Option<Arc<RawSnapshot>>>,
}

impl SnapshotCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached snapshot.
    pub fn set(&self, snapshot: RawSnapshot) {
        *self.slot.write() = Some(Arc::new(snapshot));
    }

    /// The latest snapshot, or `None` before the first successful fetch.
    pub fn get(&self) -> Option<Arc<RawSnapshot>> {
        self.slot.read().clone()
    }

    /// Drop the cached snapshot.
    pub fn clear(&self) {
        *self.slot.write() = None;
    }

    /// Check if nothing has been cached.
    pub fn is_empty(&self) -> bool {
        self.slot.read().is_none()
    }
}
