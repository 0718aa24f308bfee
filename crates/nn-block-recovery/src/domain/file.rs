//! File records and the file metadata store

use serde::{Deserialize, Serialize};
use shared_types::{BlockId, FileId};
use std::collections::HashMap;

/// Metadata of one file: its block sequence and open/deleted flags.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: FileId,
    pub path: String,
    pub under_construction: bool,
    /// Set by a namespace delete whose block reclamation has not finished.
    pub deleted: bool,
    blocks: Vec<BlockId>,
}

impl FileRecord {
    /// A new, empty file open for writing.
    pub fn new_under_construction(id: FileId, path: impl Into<String>) -> Self {
        Self {
            id,
            path: path.into(),
            under_construction: true,
            deleted: false,
            blocks: Vec::new(),
        }
    }

    /// All blocks, in file order.
    pub fn blocks(&self) -> &[BlockId] {
        &self.blocks
    }

    pub fn last_block(&self) -> Option<BlockId> {
        self.blocks.last().copied()
    }

    /// Blocks before the last one.
    pub fn other_blocks(&self) -> &[BlockId] {
        match self.blocks.split_last() {
            Some((_, rest)) => rest,
            None => &[],
        }
    }

    pub fn push_block(&mut self, id: BlockId) {
        self.blocks.push(id);
    }

    /// Remove `id` if it is the last block. Returns whether it was removed.
    pub fn remove_last_block(&mut self, id: BlockId) -> bool {
        if self.last_block() == Some(id) {
            self.blocks.pop();
            true
        } else {
            false
        }
    }

    /// Swap the last block for `id`, returning the previous last block.
    pub fn replace_last_block(&mut self, id: BlockId) -> Option<BlockId> {
        let previous = self.blocks.pop();
        self.blocks.push(id);
        previous
    }

    pub fn close(&mut self) {
        self.under_construction = false;
    }
}

/// Mapping file → file record.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileMetadataStore {
    files: HashMap<FileId, FileRecord>,
    next_id: u64,
}

impl FileMetadataStore {
    pub fn new() -> Self {
        Self {
            files: HashMap::new(),
            next_id: 1,
        }
    }

    /// Create an empty under-construction file and return its id.
    pub fn create(&mut self, path: impl Into<String>) -> FileId {
        let id = FileId(self.next_id.max(1));
        self.next_id = id.0 + 1;
        self.files
            .insert(id, FileRecord::new_under_construction(id, path));
        id
    }

    pub fn get(&self, id: FileId) -> Option<&FileRecord> {
        self.files.get(&id)
    }

    pub fn get_mut(&mut self, id: FileId) -> Option<&mut FileRecord> {
        self.files.get_mut(&id)
    }

    pub fn remove(&mut self, id: FileId) -> Option<FileRecord> {
        self.files.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
