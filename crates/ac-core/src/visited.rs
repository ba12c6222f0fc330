//! Visited-datapoint store
//!
//! The map marks the cursor's datapoints visited on every step; the
//! store itself belongs to the host, which reads it back for styling.

use ahash::AHashSet;
use parking_lot::RwLock;

use crate::model::DatapointId;

/// Mutable store of datapoints the user has visited
pub trait VisitedStore: Send + Sync {
    /// Mark datapoints as visited
    fn visit(&self, datapoints: &[DatapointId]);

    /// Whether a datapoint has been visited
    fn is_visited(&self, datapoint: &DatapointId) -> bool;

    /// Forget all visits
    fn clear(&self);
}

/// In-memory visited store
#[derive(Default)]
pub struct MemoryVisitedStore {
    visited: RwLock<AHashSet<DatapointId>>,
}

impl MemoryVisitedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct visited datapoints
    pub fn len(&self) -> usize {
        self.visited.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.visited.read().is_empty()
    }
}

impl VisitedStore for MemoryVisitedStore {
    fn visit(&self, datapoints: &[DatapointId]) {
        let mut visited = self.visited.write();
        for datapoint in datapoints {
            visited.insert(datapoint.clone());
        }
    }

    fn is_visited(&self, datapoint: &DatapointId) -> bool {
        self.visited.read().contains(datapoint)
    }

    fn clear(&self) {
        self.visited.write().clear();
    }
}
