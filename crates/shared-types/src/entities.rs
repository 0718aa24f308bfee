//! # Core Entities
//!
//! Identifiers for blocks, files, datanodes and storages, plus the
//! `ExtendedBlock` shape a recovery agent reports back.
//!
//! ## Clusters
//!
//! - **Blocks**: `BlockId`, `GenerationStamp`, `ExtendedBlock`
//! - **Namespace**: `FileId`
//! - **Placement**: `DatanodeId`, `StorageId`, `ReplicaLocation`

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// CLUSTER A: BLOCKS
// =============================================================================

/// Numeric block identifier, unique within a block pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct BlockId(pub u64);

impl BlockId {
    /// Identifier of the `index`-th internal block of a striped group.
    ///
    /// Striped groups reserve consecutive ids after the group id.
    pub fn striped_member(self, index: usize) -> BlockId {
        BlockId(self.0.wrapping_add(index as u64))
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "blk_{}", self.0)
    }
}

/// Monotonic version counter of a block's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct GenerationStamp(pub u64);

impl fmt::Display for GenerationStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A block as named on the wire: pool, id, generation stamp and length.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExtendedBlock {
    /// Block pool the block belongs to.
    pub pool_id: String,
    /// Block identifier.
    pub block_id: BlockId,
    /// Generation stamp known to the sender.
    pub generation_stamp: GenerationStamp,
    /// Length in bytes known to the sender.
    pub num_bytes: u64,
}

impl ExtendedBlock {
    pub fn new(
        pool_id: impl Into<String>,
        block_id: BlockId,
        generation_stamp: GenerationStamp,
        num_bytes: u64,
    ) -> Self {
        Self {
            pool_id: pool_id.into(),
            block_id,
            generation_stamp,
            num_bytes,
        }
    }
}

impl fmt::Display for ExtendedBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}_{}",
            self.pool_id, self.block_id, self.generation_stamp
        )
    }
}

// =============================================================================
// CLUSTER B: NAMESPACE
// =============================================================================

/// Inode identifier of a file. Used as the owning-file reference of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FileId(pub u64);

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "inode#{}", self.0)
    }
}

// =============================================================================
// CLUSTER C: PLACEMENT
// =============================================================================

/// Identifier of a datanode (its `host:port` transfer address).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct DatanodeId(pub String);

impl DatanodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The placeholder sent for a pipeline slot with no datanode.
    pub fn empty() -> Self {
        Self(String::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for DatanodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of one storage volume on a datanode.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct StorageId(pub String);

impl StorageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for StorageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A concrete place a replica can live: one storage on one datanode.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReplicaLocation {
    pub datanode: DatanodeId,
    pub storage: StorageId,
}

impl ReplicaLocation {
    pub fn new(datanode: impl Into<String>, storage: impl Into<String>) -> Self {
        Self {
            datanode: DatanodeId::new(datanode),
            storage: StorageId::new(storage),
        }
    }
}

impl fmt::Display for ReplicaLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.datanode, self.storage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_striped_member_offsets_id() {
        let group = BlockId(1_000);
        assert_eq!(group.striped_member(0), group);
        assert_eq!(group.striped_member(3), BlockId(1_003));
    }

    #[test]
    fn test_display_formats() {
        let block = ExtendedBlock::new("BP-1", BlockId(5), GenerationStamp(10), 0);
        assert_eq!(block.to_string(), "BP-1:blk_5_10");

        let location = ReplicaLocation::new("D1", "S1");
        assert_eq!(location.to_string(), "D1/S1");
    }

    #[test]
    fn test_empty_datanode_id() {
        assert!(DatanodeId::empty().is_empty());
        assert!(!DatanodeId::new("10.0.0.1:9866").is_empty());
    }
}
