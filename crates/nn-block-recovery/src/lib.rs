//! # Block Recovery Commit
//!
//! When a writer's lease expires, or a client truncates a file, a recovery
//! agent settles the final state of the file's last block and reports it
//! back. This crate is the transaction that reconciles that report with the
//! namespace: it validates the attempt, updates block metadata and replica
//! locations, quarantines replicas the recovery left behind, and closes the
//! file or persists its block list.
//!
//! ## Flow
//!
//! ```text
//! report ──→ exclusive lock ──→ validate ──→ mutate ──→ append record
//!                                                            │
//!            reply ←── durable sync ←── release lock ←───────┘
//! ```
//!
//! ## Domain Invariants
//!
//! | Invariant | Description |
//! |-----------|-------------|
//! | Monotonic generation stamps | A commit never lowers a block's generation stamp |
//! | Recovery id ownership | Only the report carrying the recorded recovery id may mutate |
//! | Idempotent delete | Delete-intent for a removed block is a successful no-op |
//! | Duplicate reports | Reports for an already-complete last block change nothing |
//! | Durability before reply | `Ok` is returned only after the log record is synced |
//! | No I/O under the lock | The log is synced after the namespace lock is released |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Namespace stores, request/outcome types, log records
//! - `ports/` - Port traits (inbound API, outbound SPI)
//! - `adapters/` - In-process implementations of the outbound ports
//! - `lock.rs` - Scoped namespace lock guards
//! - `service.rs` - `RecoveryCommitCoordinator`
//!
//! ## Usage
//!
//! ```ignore
//! use nn_block_recovery::{BlockRecoveryApi, DefaultCoordinator, RecoveryConfig};
//!
//! let coordinator = DefaultCoordinator::in_memory(RecoveryConfig::from_env());
//! let outcome = coordinator.commit_block_synchronization(request)?;
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod lock;
pub mod metrics;
pub mod ports;
pub mod service;

// Re-export key types for convenience
pub use adapters::{DatanodeRegistry, InMemoryDurableLog, RetainedSnapshots, ServiceModeGate};
pub use config::RecoveryConfig;
pub use domain::{
    BlockRecord, BlockState, BlockSummary, CommitOutcome, CorruptReason, FileRecord, LogRecord,
    Namespace, RecoveryCommitRequest, RecoveryKind, ReplicaEntry, ReportedReplica, ResolvedTarget,
    TxId,
};
pub use error::{DurableLogError, RecoveryError, RecoveryResult, Severity};
pub use lock::{NamespaceLock, NamespaceReadGuard, NamespaceWriteGuard};
pub use ports::inbound::BlockRecoveryApi;
pub use ports::outbound::{DurableLog, OperationGate, ReplicaResolver, SnapshotQuery};
pub use service::{DefaultCoordinator, RecoveryCommitCoordinator, RecoveryDependencies};
