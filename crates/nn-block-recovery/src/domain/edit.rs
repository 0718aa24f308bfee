//! Durable log records written by the recovery commit

use serde::{Deserialize, Serialize};
use shared_types::{BlockId, FileId, GenerationStamp};

/// Transaction id assigned by the durable log.
pub type TxId = u64;

/// Block entry of a persisted block list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSummary {
    pub block_id: BlockId,
    pub generation_stamp: GenerationStamp,
    pub num_bytes: u64,
}

/// A namespace mutation to persist.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op")]
pub enum LogRecord {
    /// File closed with its final block list.
    CloseFile {
        file: FileId,
        path: String,
        blocks: Vec<BlockSummary>,
    },
    /// Block list of a file that stays open.
    UpdateBlocks {
        file: FileId,
        path: String,
        blocks: Vec<BlockSummary>,
    },
}

impl LogRecord {
    pub fn file(&self) -> FileId {
        match self {
            LogRecord::CloseFile { file, .. } | LogRecord::UpdateBlocks { file, .. } => *file,
        }
    }

    pub fn blocks(&self) -> &[BlockSummary] {
        match self {
            LogRecord::CloseFile { blocks, .. } | LogRecord::UpdateBlocks { blocks, .. } => blocks,
        }
    }

    pub fn op_name(&self) -> &'static str {
        match self {
            LogRecord::CloseFile { .. } => "OP_CLOSE",
            LogRecord::UpdateBlocks { .. } => "OP_UPDATE_BLOCKS",
        }
    }
}
