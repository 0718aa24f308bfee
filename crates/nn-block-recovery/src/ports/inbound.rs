//! # Inbound Ports (Driving Ports)
//!
//! The operation a recovery agent's report is dispatched to.

use crate::domain::{CommitOutcome, RecoveryCommitRequest};
use crate::error::RecoveryResult;

/// Block-recovery commit API.
pub trait BlockRecoveryApi: Send + Sync {
    /// Reconcile a recovery report with the namespace.
    ///
    /// Validation and mutation run under the exclusive namespace lock. The
    /// durable log is synced after the lock is released and before this
    /// returns `Ok`.
    ///
    /// ## Errors
    ///
    /// - `NotWritable` / `MaintenanceMode`: instance cannot accept writes
    /// - `BlockNotFound`: unknown block and no delete intent
    /// - `OwningFileGone`: block detached by a delayed delete
    /// - `FileNotFound`: owning file is marked deleted
    /// - `StaleRecoveryAttempt`: a newer attempt superseded this one
    /// - `InvalidRequest`: malformed request
    /// - `DurableLog`: the log could not be appended or synced
    fn commit_block_synchronization(
        &self,
        request: RecoveryCommitRequest,
    ) -> RecoveryResult<CommitOutcome>;
}
