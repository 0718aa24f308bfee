//! Error types for the block-recovery commit
//!
//! Every failure of `commit_block_synchronization` is one of these variants.
//! The only silent successes are the two documented no-op outcomes, which
//! are reported through `CommitOutcome`, never through an error.

use shared_types::{BlockId, GenerationStamp};
use thiserror::Error;

/// Severity of a recovery error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The request failed; namespace state is consistent.
    Recoverable,
    /// Namespace or durable log is inconsistent; operators must look.
    Fatal,
}

/// Durable log failures surfaced by the `DurableLog` port.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurableLogError {
    /// Record could not be buffered.
    #[error("append failed: {0}")]
    AppendFailed(String),

    /// Buffered records could not be flushed.
    #[error("sync failed: {0}")]
    SyncFailed(String),
}

/// Block-recovery commit errors
#[derive(Debug, Error)]
pub enum RecoveryError {
    /// This instance is not serving writes (standby, observer, stopping).
    #[error("Operation category WRITE is not supported in state {state}")]
    NotWritable { state: String },

    /// Read-only bootstrap/recovery mode.
    #[error("{reason}: name node is in safe mode")]
    MaintenanceMode { reason: String },

    /// The reported block is unknown to the block store.
    #[error("Block not found: {block_id}")]
    BlockNotFound { block_id: BlockId },

    /// The block's owning-file reference was cleared by a delayed delete.
    #[error(
        "Owning file of {block_id} is gone: the file was deleted and the block removal is delayed"
    )]
    OwningFileGone { block_id: BlockId },

    /// The owning file is marked deleted.
    #[error("File not found: {path} (owner of {block_id})")]
    FileNotFound { path: String, block_id: BlockId },

    /// The recovery id recorded on the block differs from the report.
    #[error(
        "Stale recovery attempt for {block_id}: recorded recovery id {}, reported {reported}",
        .recorded.map_or_else(|| "none".to_string(), |id| id.to_string())
    )]
    StaleRecoveryAttempt {
        block_id: BlockId,
        recorded: Option<GenerationStamp>,
        reported: GenerationStamp,
    },

    /// Structural violation in the request itself.
    #[error("Invalid commit request: {reason}")]
    InvalidRequest { reason: String },

    /// Durable log append or sync failed.
    #[error("Durable log failure: {0}")]
    DurableLog(#[from] DurableLogError),
}

impl RecoveryError {
    /// Stable identifier for log fields and metric labels.
    pub fn code(&self) -> &'static str {
        match self {
            RecoveryError::NotWritable { .. } => "NOT_WRITABLE",
            RecoveryError::MaintenanceMode { .. } => "MAINTENANCE_MODE",
            RecoveryError::BlockNotFound { .. } => "BLOCK_NOT_FOUND",
            RecoveryError::OwningFileGone { .. } => "OWNING_FILE_GONE",
            RecoveryError::FileNotFound { .. } => "FILE_NOT_FOUND",
            RecoveryError::StaleRecoveryAttempt { .. } => "STALE_RECOVERY_ATTEMPT",
            RecoveryError::InvalidRequest { .. } => "INVALID_REQUEST",
            RecoveryError::DurableLog(_) => "DURABLE_LOG",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            RecoveryError::OwningFileGone { .. } | RecoveryError::DurableLog(_) => Severity::Fatal,
            _ => Severity::Recoverable,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }

    /// Whether the caller may resend the identical request without first
    /// re-reading block and file state.
    ///
    /// Only a delete-intent that hit `BlockNotFound` qualifies, and the
    /// coordinator already answers that case with a no-op success. The
    /// availability errors qualify too since nothing was evaluated.
    pub fn is_retry_safe(&self, delete_intent: bool) -> bool {
        match self {
            RecoveryError::BlockNotFound { .. } => delete_intent,
            RecoveryError::NotWritable { .. } | RecoveryError::MaintenanceMode { .. } => true,
            _ => false,
        }
    }
}

/// Result type for recovery operations
pub type RecoveryResult<T> = Result<T, RecoveryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_attempt_display_includes_both_ids() {
        let err = RecoveryError::StaleRecoveryAttempt {
            block_id: BlockId(5),
            recorded: Some(GenerationStamp(9)),
            reported: GenerationStamp(11),
        };
        let msg = err.to_string();
        assert!(msg.contains("blk_5"));
        assert!(msg.contains("recorded recovery id 9"));
        assert!(msg.contains("reported 11"));
    }

    #[test]
    fn test_stale_attempt_display_without_recorded_id() {
        let err = RecoveryError::StaleRecoveryAttempt {
            block_id: BlockId(5),
            recorded: None,
            reported: GenerationStamp(11),
        };
        assert!(err.to_string().contains("recorded recovery id none"));
    }

    #[test]
    fn test_fatal_classification() {
        assert!(RecoveryError::OwningFileGone { block_id: BlockId(1) }.is_fatal());
        assert!(RecoveryError::from(DurableLogError::SyncFailed("disk".into())).is_fatal());
        assert!(!RecoveryError::BlockNotFound { block_id: BlockId(1) }.is_fatal());
    }

    #[test]
    fn test_retry_safety() {
        let not_found = RecoveryError::BlockNotFound { block_id: BlockId(1) };
        assert!(not_found.is_retry_safe(true));
        assert!(!not_found.is_retry_safe(false));

        let stale = RecoveryError::StaleRecoveryAttempt {
            block_id: BlockId(1),
            recorded: Some(GenerationStamp(12)),
            reported: GenerationStamp(11),
        };
        assert!(!stale.is_retry_safe(true));
    }

    #[test]
    fn test_codes_are_distinct() {
        let errors = [
            RecoveryError::NotWritable { state: "standby".into() },
            RecoveryError::MaintenanceMode { reason: "x".into() },
            RecoveryError::BlockNotFound { block_id: BlockId(1) },
            RecoveryError::OwningFileGone { block_id: BlockId(1) },
            RecoveryError::FileNotFound { path: "/a".into(), block_id: BlockId(1) },
            RecoveryError::InvalidRequest { reason: "x".into() },
        ];
        let mut codes: Vec<_> = errors.iter().map(|e| e.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }
}
