//! # Adapters Module
//!
//! In-process implementations of the outbound ports.
//!
//! ## Modules
//!
//! - `service_mode`: HA-active and safe-mode flags (`OperationGate`)
//! - `datanode_registry`: registered datanodes and storages (`ReplicaResolver`)
//! - `durable_log`: buffered in-memory log with txid bookkeeping (`DurableLog`)
//! - `snapshots`: snapshot-retained blocks (`SnapshotQuery`)

pub mod datanode_registry;
pub mod durable_log;
pub mod service_mode;
pub mod snapshots;

pub use datanode_registry::DatanodeRegistry;
pub use durable_log::InMemoryDurableLog;
pub use service_mode::ServiceModeGate;
pub use snapshots::RetainedSnapshots;
