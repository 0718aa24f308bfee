//! Recovery commit request and outcome types

use serde::{Deserialize, Serialize};
use shared_types::{DatanodeId, ExtendedBlock, GenerationStamp, ReplicaLocation, StorageId};
use std::fmt;

/// Final agreed state of a block, as reported by the recovery agent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryCommitRequest {
    /// The block as the agent knew it when recovery started.
    pub old_block: ExtendedBlock,
    /// Recovery id of the attempt; becomes the block's generation stamp.
    pub new_generation_stamp: GenerationStamp,
    pub new_length: u64,
    pub close_file: bool,
    pub delete_block: bool,
    /// Datanodes holding the recovered replica, matched by index with
    /// `new_target_storages`.
    pub new_targets: Vec<DatanodeId>,
    pub new_target_storages: Vec<StorageId>,
}

impl RecoveryCommitRequest {
    /// A non-closing, non-deleting commit with no targets.
    pub fn new(old_block: ExtendedBlock, new_generation_stamp: GenerationStamp, new_length: u64) -> Self {
        Self {
            old_block,
            new_generation_stamp,
            new_length,
            close_file: false,
            delete_block: false,
            new_targets: Vec::new(),
            new_target_storages: Vec::new(),
        }
    }

    pub fn closing(mut self) -> Self {
        self.close_file = true;
        self
    }

    pub fn deleting(mut self) -> Self {
        self.delete_block = true;
        self
    }

    /// Set both parallel target sequences from one list of locations.
    pub fn with_targets(mut self, targets: impl IntoIterator<Item = ReplicaLocation>) -> Self {
        let (nodes, storages) = targets
            .into_iter()
            .map(|loc| (loc.datanode, loc.storage))
            .unzip();
        self.new_targets = nodes;
        self.new_target_storages = storages;
        self
    }

    /// Structural checks that need no namespace state.
    pub fn validate(&self) -> Result<(), String> {
        if self.new_targets.len() != self.new_target_storages.len() {
            return Err(format!(
                "{} targets but {} target storages",
                self.new_targets.len(),
                self.new_target_storages.len()
            ));
        }
        Ok(())
    }

    /// `D1/S1, D2/S2` rendering of the target pairs for log fields.
    pub fn targets_summary(&self) -> String {
        let pairs: Vec<String> = self
            .new_targets
            .iter()
            .zip(self.new_target_storages.iter())
            .map(|(node, storage)| format!("{node}/{storage}"))
            .collect();
        format!("[{}]", pairs.join(", "))
    }
}

/// One entry of the resolved target sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolvedTarget {
    Location(ReplicaLocation),
    /// The datanode or storage could not be resolved.
    Absent,
}

impl ResolvedTarget {
    pub fn location(&self) -> Option<&ReplicaLocation> {
        match self {
            ResolvedTarget::Location(loc) => Some(loc),
            ResolvedTarget::Absent => None,
        }
    }
}

/// Which block the recovery produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecoveryKind {
    /// The reported block itself is updated in place.
    Direct,
    /// A truncate produced a new, shorter block; the reported block is
    /// superseded.
    CopyTruncate,
}

impl fmt::Display for RecoveryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryKind::Direct => write!(f, "direct"),
            RecoveryKind::CopyTruncate => write!(f, "copy-truncate"),
        }
    }
}

/// Successful result of a commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommitOutcome {
    /// Block state was committed; `closed` tells whether the file was closed.
    Committed { kind: RecoveryKind, closed: bool },
    /// Delete-intent removed the block.
    Deleted,
    /// Delete-intent for a block that is already gone.
    AlreadyRemoved,
    /// Report for a file whose last block is already complete.
    StaleDuplicate,
}

impl CommitOutcome {
    /// Whether the namespace changed.
    pub fn mutated(&self) -> bool {
        matches!(self, CommitOutcome::Committed { .. } | CommitOutcome::Deleted)
    }

    /// Metric / log label.
    pub fn label(&self) -> &'static str {
        match self {
            CommitOutcome::Committed { closed: true, .. } => "closed",
            CommitOutcome::Committed { closed: false, .. } => "committed",
            CommitOutcome::Deleted => "deleted",
            CommitOutcome::AlreadyRemoved => "already_removed",
            CommitOutcome::StaleDuplicate => "stale_duplicate",
        }
    }
}
