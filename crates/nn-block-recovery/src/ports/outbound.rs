//! # Outbound Ports (Driven Ports)
//!
//! Collaborators the recovery commit depends on. Implementations shipped with
//! the crate live in `adapters/`.

use crate::domain::{LogRecord, ResolvedTarget, TxId};
use crate::error::{DurableLogError, RecoveryResult};
use shared_types::{BlockId, DatanodeId, FileId, StorageId};

/// HA state and safe-mode checks.
pub trait OperationGate: Send + Sync {
    /// Fails with `NotWritable` unless this is the active write-serving
    /// instance.
    fn check_writable(&self) -> RecoveryResult<()>;

    /// Fails with `MaintenanceMode` while in read-only bootstrap mode.
    /// `reason` names the rejected operation.
    fn check_not_safe_mode(&self, reason: &str) -> RecoveryResult<()>;
}

/// Turns the reported (datanode, storage) pairs into locations.
pub trait ReplicaResolver: Send + Sync {
    /// Resolve `targets[i]` / `storages[i]` pairwise.
    ///
    /// The result has one entry per pair, in order. Pairs that cannot be
    /// resolved yield `ResolvedTarget::Absent`; this never fails.
    fn resolve_locations(&self, targets: &[DatanodeId], storages: &[StorageId]) -> Vec<ResolvedTarget>;
}

/// Append-only durable log.
///
/// `append` only buffers and must not block. `sync` blocks until every
/// record appended so far is durable.
pub trait DurableLog: Send + Sync {
    fn append(&self, record: LogRecord) -> Result<TxId, DurableLogError>;

    fn sync(&self) -> Result<(), DurableLogError>;
}

/// Snapshot reference check.
pub trait SnapshotQuery: Send + Sync {
    /// Whether the latest snapshot of `file` still references `block`.
    fn is_block_in_latest_snapshot(&self, file: FileId, block: BlockId) -> bool;
}
