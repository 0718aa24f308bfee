//! Snapshot-retained blocks.

use crate::ports::outbound::SnapshotQuery;
use parking_lot::RwLock;
use shared_types::{BlockId, FileId};
use std::collections::HashSet;

/// Set of (file, block) pairs referenced by the latest snapshot of the file.
#[derive(Debug, Default)]
pub struct RetainedSnapshots {
    retained: RwLock<HashSet<(FileId, BlockId)>>,
}

impl RetainedSnapshots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn retain(&self, file: FileId, block: BlockId) {
        self.retained.write().insert((file, block));
    }

    pub fn release(&self, file: FileId, block: BlockId) -> bool {
        self.retained.write().remove(&(file, block))
    }
}

impl SnapshotQuery for RetainedSnapshots {
    fn is_block_in_latest_snapshot(&self, file: FileId, block: BlockId) -> bool {
        self.retained.read().contains(&(file, block))
    }
}
