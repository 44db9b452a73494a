// src/status/cache.rs
use parking_lot::RwLock;
use std::sync::Arc;
use crate::models::status::StatusSnapshot;

struct Published {
    cycle: u64,
    snapshots: Arc<Vec<StatusSnapshot>>,
}

/// Last published cycle result. Readers clone an `Arc`; writers swap it.
pub struct StatusCache {
    inner: RwLock<Published>,
}

impl StatusCache {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Published {
                cycle: 0,
                snapshots: Arc::new(Vec::new()),
            }),
        }
    }

    pub fn snapshot(&self) -> Arc<Vec<StatusSnapshot>> {
        self.inner.read().snapshots.clone()
    }

    pub fn get(&self, server_id: u32) -> Option<StatusSnapshot> {
        self.snapshot().iter().find(|s| s.server_id == server_id).cloned()
    }

    /// Cycle number of the result currently held (0 before the first publish).
    pub fn cycle(&self) -> u64 {
        self.inner.read().cycle
    }

    /// Replaces the whole sequence if `cycle` is newer than what is held.
    /// Returns false when a later cycle already published.
    pub fn publish(&self, cycle: u64, snapshots: Vec<StatusSnapshot>) -> bool {
        let snapshots = Arc::new(snapshots);
        let mut inner = self.inner.write();
        if cycle <= inner.cycle {
            return false;
        }
        inner.cycle = cycle;
        inner.snapshots = snapshots;
        true
    }
}

impl Default for StatusCache {
    fn default() -> Self {
        Self::new()
    }
}
