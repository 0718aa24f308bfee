//! Datanode registry: which datanodes are known and which storages they own.

use crate::domain::ResolvedTarget;
use crate::ports::outbound::ReplicaResolver;
use parking_lot::RwLock;
use shared_types::{DatanodeId, ReplicaLocation, StorageId};
use std::collections::{HashMap, HashSet};

/// Registered datanodes and their storages.
#[derive(Debug, Default)]
pub struct DatanodeRegistry {
    nodes: RwLock<HashMap<DatanodeId, HashSet<StorageId>>>,
}

impl DatanodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `storage` on `datanode`, registering the datanode if needed.
    pub fn register(&self, datanode: DatanodeId, storage: StorageId) {
        self.nodes.write().entry(datanode).or_default().insert(storage);
    }

    /// Register every location of `locations`.
    pub fn register_all<'a>(&self, locations: impl IntoIterator<Item = &'a ReplicaLocation>) {
        let mut nodes = self.nodes.write();
        for loc in locations {
            nodes
                .entry(loc.datanode.clone())
                .or_default()
                .insert(loc.storage.clone());
        }
    }

    /// Forget a datanode and all of its storages.
    pub fn unregister(&self, datanode: &DatanodeId) -> bool {
        self.nodes.write().remove(datanode).is_some()
    }

    pub fn datanode_count(&self) -> usize {
        self.nodes.read().len()
    }
}

impl ReplicaResolver for DatanodeRegistry {
    fn resolve_locations(&self, targets: &[DatanodeId], storages: &[StorageId]) -> Vec<ResolvedTarget> {
        let nodes = self.nodes.read();
        targets
            .iter()
            .enumerate()
            .map(|(i, node)| {
                let storage = match storages.get(i) {
                    Some(s) if !node.is_empty() => s,
                    _ => return ResolvedTarget::Absent,
                };
                match nodes.get(node) {
                    Some(owned) if owned.contains(storage) => {
                        ResolvedTarget::Location(ReplicaLocation {
                            datanode: node.clone(),
                            storage: storage.clone(),
                        })
                    }
                    _ => ResolvedTarget::Absent,
                }
            })
            .collect()
    }
}
