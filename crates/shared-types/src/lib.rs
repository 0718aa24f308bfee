//! # Shared Types Crate
//!
//! Identifiers and value types shared by the metadata service and the
//! processes that talk to it (recovery agents, datanodes).
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: block, storage and datanode identifiers are
//!   defined once and reused by every crate in the workspace.
//! - **Newtypes over primitives**: a `BlockId` can never be passed where a
//!   `GenerationStamp` is expected.

pub mod entities;

pub use entities::*;
