//! # In-Memory Durable Log
//!
//! Buffered append-only log. `append` assigns the next txid and buffers the
//! record; `sync` moves everything buffered into the durable segment and
//! advances `synced_txid`. Used in tests and by embedded deployments that
//! persist elsewhere.

use crate::domain::{LogRecord, TxId};
use crate::error::DurableLogError;
use crate::ports::outbound::DurableLog;
use parking_lot::Mutex;

#[derive(Debug, Default)]
struct LogState {
    last_txid: TxId,
    synced_txid: TxId,
    pending: Vec<(TxId, LogRecord)>,
    durable: Vec<(TxId, LogRecord)>,
}

/// In-memory `DurableLog`.
#[derive(Debug, Default)]
pub struct InMemoryDurableLog {
    state: Mutex<LogState>,
}

impl InMemoryDurableLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Highest txid handed out by `append`.
    pub fn last_txid(&self) -> TxId {
        self.state.lock().last_txid
    }

    /// Highest txid known to be durable.
    pub fn synced_txid(&self) -> TxId {
        self.state.lock().synced_txid
    }

    /// Records appended but not yet synced.
    pub fn pending_count(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Durable records in txid order.
    pub fn durable_records(&self) -> Vec<(TxId, LogRecord)> {
        self.state.lock().durable.clone()
    }
}

impl DurableLog for InMemoryDurableLog {
    fn append(&self, record: LogRecord) -> Result<TxId, DurableLogError> {
        let mut state = self.state.lock();
        state.last_txid += 1;
        let txid = state.last_txid;
        state.pending.push((txid, record));
        Ok(txid)
    }

    fn sync(&self) -> Result<(), DurableLogError> {
        let mut state = self.state.lock();
        let pending = std::mem::take(&mut state.pending);
        state.durable.extend(pending);
        state.synced_txid = state.last_txid;
        Ok(())
    }
}
