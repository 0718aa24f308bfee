//! The namespace state guarded by the namespace lock
//!
//! Bundles the three stores the recovery commit touches, plus the mutations
//! that lead up to a recovery report: file creation, block allocation,
//! starting a recovery attempt, preparing a copy-truncate, and the two halves
//! of a delayed delete.

use super::block::{BlockMetadataStore, BlockRecord};
use super::edit::BlockSummary;
use super::file::{FileMetadataStore, FileRecord};
use super::replica::{ReplicaEntry, ReplicaLocationIndex};
use crate::error::{RecoveryError, RecoveryResult};
use shared_types::{BlockId, FileId, GenerationStamp};

/// Pre-mutation copy of one file record and a handful of blocks with their
/// replicas. Taken before a commit mutates, restored if it fails.
#[derive(Clone, Debug)]
pub struct NamespaceCheckpoint {
    file_id: FileId,
    file: Option<FileRecord>,
    blocks: Vec<(BlockId, Option<BlockRecord>)>,
    replicas: Vec<(BlockId, Vec<ReplicaEntry>)>,
}

/// Block store, file store and replica index.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Namespace {
    pub blocks: BlockMetadataStore,
    pub files: FileMetadataStore,
    pub replicas: ReplicaLocationIndex,
}

impl Namespace {
    pub fn new() -> Self {
        Self {
            blocks: BlockMetadataStore::new(),
            files: FileMetadataStore::new(),
            replicas: ReplicaLocationIndex::new(),
        }
    }

    pub fn create_file(&mut self, path: impl Into<String>) -> FileId {
        self.files.create(path)
    }

    /// Append a new under-construction block to `file`.
    pub fn allocate_block(
        &mut self,
        file: FileId,
        id: BlockId,
        generation_stamp: GenerationStamp,
        num_bytes: u64,
        striped: bool,
    ) -> RecoveryResult<()> {
        if self.blocks.contains(id) {
            return Err(RecoveryError::InvalidRequest {
                reason: format!("{id} is already allocated"),
            });
        }
        let record = self.file_mut(file)?;
        record.push_block(id);

        let mut block =
            BlockRecord::new_under_construction(id, generation_stamp, file).with_num_bytes(num_bytes);
        if striped {
            block = block.striped();
        }
        self.blocks.insert(block);
        Ok(())
    }

    /// Record a recovery attempt on the last block of `file`.
    pub fn begin_recovery(&mut self, file: FileId, recovery_id: GenerationStamp) -> RecoveryResult<BlockId> {
        let last = self.last_block_of(file)?;
        let block = self
            .blocks
            .get_mut(last)
            .ok_or(RecoveryError::BlockNotFound { block_id: last })?;
        block.begin_recovery(recovery_id);
        Ok(last)
    }

    /// Replace the last block of `file` by a new, shorter block for a
    /// copy-on-truncate recovery.
    ///
    /// The new block takes the recovery id as both its generation stamp and
    /// its pending recovery id. The superseded block stays in the block store
    /// and keeps its owner, so a report naming it still resolves.
    pub fn prepare_copy_truncate(
        &mut self,
        file: FileId,
        new_id: BlockId,
        new_length: u64,
        recovery_id: GenerationStamp,
    ) -> RecoveryResult<BlockId> {
        if self.blocks.contains(new_id) {
            return Err(RecoveryError::InvalidRequest {
                reason: format!("{new_id} is already allocated"),
            });
        }
        self.last_block_of(file)?;
        let record = self.file_mut(file)?;
        record.under_construction = true;
        let superseded = record
            .replace_last_block(new_id)
            .ok_or_else(|| RecoveryError::InvalidRequest {
                reason: format!("{file} has no block to truncate"),
            })?;

        let mut block = BlockRecord::new_under_construction(new_id, recovery_id, file)
            .with_num_bytes(new_length);
        block.recovery_id = Some(recovery_id);
        self.blocks.insert(block);
        Ok(superseded)
    }

    /// Flag `file` as deleted while its blocks are still being reclaimed.
    pub fn mark_file_deleted(&mut self, file: FileId) -> RecoveryResult<()> {
        self.file_mut(file)?.deleted = true;
        Ok(())
    }

    /// Clear the owning-file reference of `block`, as a delayed delete does.
    pub fn detach_block_owner(&mut self, block: BlockId) -> RecoveryResult<()> {
        self.blocks
            .get_mut(block)
            .ok_or(RecoveryError::BlockNotFound { block_id: block })?
            .owner = None;
        Ok(())
    }

    /// Current block list of `file` for log records.
    ///
    /// Blocks missing from the store are skipped.
    pub fn block_summaries(&self, file: FileId) -> Vec<BlockSummary> {
        let Some(record) = self.files.get(file) else {
            return Vec::new();
        };
        record
            .blocks()
            .iter()
            .filter_map(|id| self.blocks.get(*id))
            .map(|b| BlockSummary {
                block_id: b.id,
                generation_stamp: b.generation_stamp,
                num_bytes: b.num_bytes,
            })
            .collect()
    }

    /// Capture `file` and `blocks` (absent blocks included) for [`restore`].
    ///
    /// [`restore`]: Namespace::restore
    pub fn checkpoint(
        &self,
        file: FileId,
        blocks: impl IntoIterator<Item = BlockId>,
    ) -> NamespaceCheckpoint {
        let ids: Vec<BlockId> = blocks.into_iter().collect();
        NamespaceCheckpoint {
            file_id: file,
            file: self.files.get(file).cloned(),
            blocks: ids.iter().map(|id| (*id, self.blocks.get(*id).cloned())).collect(),
            replicas: ids
                .iter()
                .map(|id| (*id, self.replicas.replicas(*id).to_vec()))
                .collect(),
        }
    }

    /// Put every captured entry back as it was.
    pub fn restore(&mut self, checkpoint: NamespaceCheckpoint) {
        if let (Some(record), Some(slot)) = (checkpoint.file, self.files.get_mut(checkpoint.file_id)) {
            *slot = record;
        }
        for (id, block) in checkpoint.blocks {
            match block {
                Some(block) => {
                    self.blocks.insert(block);
                }
                None => {
                    self.blocks.remove(id);
                }
            }
        }
        for (id, entries) in checkpoint.replicas {
            self.replicas.restore_block(id, entries);
        }
    }

    fn last_block_of(&self, file: FileId) -> RecoveryResult<BlockId> {
        let record = self.files.get(file).ok_or_else(|| unknown_file(file))?;
        record.last_block().ok_or_else(|| RecoveryError::InvalidRequest {
            reason: format!("{file} has no blocks"),
        })
    }

    fn file_mut(&mut self, file: FileId) -> RecoveryResult<&mut FileRecord> {
        self.files.get_mut(file).ok_or_else(|| unknown_file(file))
    }
}

fn unknown_file(file: FileId) -> RecoveryError {
    RecoveryError::InvalidRequest {
        reason: format!("unknown file {file}"),
    }
}
