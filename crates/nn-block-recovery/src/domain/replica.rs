//! Replica location index
//!
//! Maps a stored block to the storages holding a replica of it. Each entry
//! remembers what the replica was reported as, so replicas left behind by a
//! recovery can be told apart from the agreed ones.

use serde::{Deserialize, Serialize};
use shared_types::{BlockId, GenerationStamp, ReplicaLocation};
use std::collections::HashMap;
use std::fmt;

/// Why a replica was marked corrupt
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorruptReason {
    /// Replica still carries a generation stamp older than the block's
    GenstampMismatch,
    /// Generation stamp matches but the length does not
    SizeMismatch,
}

impl fmt::Display for CorruptReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorruptReason::GenstampMismatch => write!(f, "GENSTAMP_MISMATCH"),
            CorruptReason::SizeMismatch => write!(f, "SIZE_MISMATCH"),
        }
    }
}

/// What a datanode reported for one replica.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportedReplica {
    /// Block id as stored on the datanode. Differs from the stored block id
    /// for the internal blocks of a striped group.
    pub block_id: BlockId,
    pub generation_stamp: GenerationStamp,
    pub num_bytes: u64,
}

/// One replica of a block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicaEntry {
    pub location: ReplicaLocation,
    pub reported: ReportedReplica,
    pub corrupt: Option<CorruptReason>,
}

impl ReplicaEntry {
    pub fn is_corrupt(&self) -> bool {
        self.corrupt.is_some()
    }

    /// Whether the replica was reported with exactly this (genstamp, length).
    pub fn reports(&self, generation_stamp: GenerationStamp, num_bytes: u64) -> bool {
        self.reported.generation_stamp == generation_stamp && self.reported.num_bytes == num_bytes
    }
}

/// Block → replica entries.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReplicaLocationIndex {
    replicas: HashMap<BlockId, Vec<ReplicaEntry>>,
}

impl ReplicaLocationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a replica of `block` at `location`.
    ///
    /// A storage holds at most one replica of a block: re-adding replaces
    /// the previous entry and clears its corrupt mark. Returns `true` if the
    /// storage was not registered before.
    pub fn add_replica(
        &mut self,
        block: BlockId,
        location: ReplicaLocation,
        reported: ReportedReplica,
    ) -> bool {
        let entries = self.replicas.entry(block).or_default();
        match entries.iter_mut().find(|e| e.location == location) {
            Some(existing) => {
                existing.reported = reported;
                existing.corrupt = None;
                false
            }
            None => {
                entries.push(ReplicaEntry {
                    location,
                    reported,
                    corrupt: None,
                });
                true
            }
        }
    }

    /// Mark the replica of `block` at `location` corrupt.
    ///
    /// Returns `false` if no such replica is registered or it was already
    /// marked.
    pub fn mark_corrupt(
        &mut self,
        block: BlockId,
        location: &ReplicaLocation,
        reason: CorruptReason,
    ) -> bool {
        let Some(entry) = self
            .replicas
            .get_mut(&block)
            .and_then(|entries| entries.iter_mut().find(|e| &e.location == location))
        else {
            return false;
        };
        if entry.is_corrupt() {
            return false;
        }
        entry.corrupt = Some(reason);
        true
    }

    pub fn replicas(&self, block: BlockId) -> &[ReplicaEntry] {
        self.replicas.get(&block).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, block: BlockId, location: &ReplicaLocation) -> bool {
        self.replicas(block).iter().any(|e| &e.location == location)
    }

    pub fn live_replica_count(&self, block: BlockId) -> usize {
        self.replicas(block).iter().filter(|e| !e.is_corrupt()).count()
    }

    pub fn corrupt_replicas(&self, block: BlockId) -> Vec<&ReplicaEntry> {
        self.replicas(block).iter().filter(|e| e.is_corrupt()).collect()
    }

    /// Drop every replica of `block`. Returns how many were registered.
    pub fn remove_block(&mut self, block: BlockId) -> usize {
        self.replicas.remove(&block).map(|e| e.len()).unwrap_or(0)
    }

    /// Replace the entries of `block` wholesale.
    pub fn restore_block(&mut self, block: BlockId, entries: Vec<ReplicaEntry>) {
        if entries.is_empty() {
            self.replicas.remove(&block);
        } else {
            self.replicas.insert(block, entries);
        }
    }
}
