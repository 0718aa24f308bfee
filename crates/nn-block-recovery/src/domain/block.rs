//! Block records and the block metadata store
//!
//! State progression: UnderConstruction → Committed → Complete. Recovery
//! can turn a non-complete block back into UnderConstruction.

use serde::{Deserialize, Serialize};
use shared_types::{BlockId, FileId, GenerationStamp, ReplicaLocation};
use std::collections::HashMap;

/// Block lifecycle state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockState {
    /// Being written or recovered; length and generation stamp may change
    UnderConstruction,
    /// Length and generation stamp are final; not enough replicas yet
    Committed,
    /// Final and sufficiently replicated
    Complete,
}

/// Authoritative metadata of one block.
///
/// `recovery_id` is only present while the block is not complete.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub id: BlockId,
    pub generation_stamp: GenerationStamp,
    pub num_bytes: u64,
    pub state: BlockState,
    /// Generation stamp chosen for the in-progress recovery attempt.
    pub recovery_id: Option<GenerationStamp>,
    pub is_striped: bool,
    /// Owning file. `None` once a delayed delete has detached the block.
    pub owner: Option<FileId>,
    /// Candidate locations recorded when the block was last turned into an
    /// under-construction block.
    pub expected_locations: Vec<ReplicaLocation>,
}

impl BlockRecord {
    /// A freshly allocated block, owned by `owner`.
    pub fn new_under_construction(
        id: BlockId,
        generation_stamp: GenerationStamp,
        owner: FileId,
    ) -> Self {
        Self {
            id,
            generation_stamp,
            num_bytes: 0,
            state: BlockState::UnderConstruction,
            recovery_id: None,
            is_striped: false,
            owner: Some(owner),
            expected_locations: Vec::new(),
        }
    }

    pub fn with_num_bytes(mut self, num_bytes: u64) -> Self {
        self.num_bytes = num_bytes;
        self
    }

    pub fn striped(mut self) -> Self {
        self.is_striped = true;
        self
    }

    pub fn is_complete(&self) -> bool {
        self.state == BlockState::Complete
    }

    /// Apply the agreed generation stamp and length.
    ///
    /// Returns `false` without touching the block if `generation_stamp`
    /// would move backwards.
    pub fn update(&mut self, generation_stamp: GenerationStamp, num_bytes: u64) -> bool {
        if generation_stamp < self.generation_stamp {
            return false;
        }
        self.generation_stamp = generation_stamp;
        self.num_bytes = num_bytes;
        true
    }

    /// Record a new recovery attempt. A complete block is reopened first.
    pub fn begin_recovery(&mut self, recovery_id: GenerationStamp) {
        if self.state != BlockState::UnderConstruction {
            self.state = BlockState::UnderConstruction;
        }
        self.recovery_id = Some(recovery_id);
    }

    /// Reopen as under construction with the given candidate locations.
    ///
    /// Keeps the recovery id; the attempt is still in progress.
    pub fn convert_to_under_construction(&mut self, locations: Vec<ReplicaLocation>) {
        self.state = BlockState::UnderConstruction;
        self.expected_locations = locations;
    }

    pub fn commit(&mut self) {
        self.state = BlockState::Committed;
        self.recovery_id = None;
    }

    pub fn complete(&mut self) {
        self.state = BlockState::Complete;
        self.recovery_id = None;
        self.expected_locations.clear();
    }

    pub fn clear_recovery(&mut self) {
        self.recovery_id = None;
    }
}

/// Authoritative mapping block-id → block record.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockMetadataStore {
    blocks: HashMap<BlockId, BlockRecord>,
}

impl BlockMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: BlockId) -> Option<&BlockRecord> {
        self.blocks.get(&id)
    }

    pub fn get_mut(&mut self, id: BlockId) -> Option<&mut BlockRecord> {
        self.blocks.get_mut(&id)
    }

    /// Insert or replace a block record.
    pub fn insert(&mut self, record: BlockRecord) -> Option<BlockRecord> {
        self.blocks.insert(record.id, record)
    }

    pub fn remove(&mut self, id: BlockId) -> Option<BlockRecord> {
        self.blocks.remove(&id)
    }

    pub fn contains(&self, id: BlockId) -> bool {
        self.blocks.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
