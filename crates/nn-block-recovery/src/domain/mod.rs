//! Domain layer: namespace stores, request/outcome types and log records.

pub mod block;
pub mod edit;
pub mod file;
pub mod namespace;
pub mod replica;
pub mod request;

pub use block::{BlockMetadataStore, BlockRecord, BlockState};
pub use edit::{BlockSummary, LogRecord, TxId};
pub use file::{FileMetadataStore, FileRecord};
pub use namespace::{Namespace, NamespaceCheckpoint};
pub use replica::{CorruptReason, ReplicaEntry, ReplicaLocationIndex, ReportedReplica};
pub use request::{CommitOutcome, RecoveryCommitRequest, RecoveryKind, ResolvedTarget};
