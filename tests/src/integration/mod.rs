//! Integration tests driving `nn-block-recovery` through its public API.

pub mod concurrency;
pub mod lease_recovery;
pub mod telemetry;

/// Shared fixtures for the integration modules.
#[cfg(test)]
pub(crate) mod fixtures {
    use nn_block_recovery::{DefaultCoordinator, RecoveryCommitRequest, RecoveryConfig};
    use shared_types::{BlockId, ExtendedBlock, FileId, GenerationStamp, ReplicaLocation};

    pub(crate) const POOL: &str = "BP-526805057-10.0.0.1-1700000000000";

    /// `n` datanodes `10.0.0.i:9866`, each with one storage `DS-i`.
    pub(crate) fn datanodes(n: usize) -> Vec<ReplicaLocation> {
        (1..=n)
            .map(|i| ReplicaLocation::new(format!("10.0.0.{i}:9866"), format!("DS-{i}")))
            .collect()
    }

    /// Coordinator whose registry knows `datanodes(count)`.
    pub(crate) fn cluster(config: RecoveryConfig, count: usize) -> DefaultCoordinator {
        let coordinator = DefaultCoordinator::in_memory(config);
        coordinator.resolver().register_all(&datanodes(count));
        coordinator
    }

    /// A file being written whose writer died: one full block, one partial
    /// last block under recovery with `recovery_id`.
    pub(crate) fn abandoned_file(
        coordinator: &DefaultCoordinator,
        path: &str,
        last_block: BlockId,
        generation_stamp: GenerationStamp,
        recovery_id: GenerationStamp,
    ) -> FileId {
        let mut ns = coordinator.namespace().write("setup");
        let file = ns.create_file(path);
        let first = BlockId(last_block.0 + 1_000_000);
        ns.allocate_block(file, first, generation_stamp, 128 * 1024 * 1024, false)
            .expect("allocate first block");
        ns.blocks
            .get_mut(first)
            .expect("first block")
            .complete();
        ns.allocate_block(file, last_block, generation_stamp, 4_096, false)
            .expect("allocate last block");
        ns.begin_recovery(file, recovery_id).expect("begin recovery");
        file
    }

    pub(crate) fn recovery_report(
        block: BlockId,
        generation_stamp: GenerationStamp,
        recovery_id: GenerationStamp,
        new_length: u64,
    ) -> RecoveryCommitRequest {
        RecoveryCommitRequest::new(
            ExtendedBlock::new(POOL, block, generation_stamp, 4_096),
            recovery_id,
            new_length,
        )
    }
}
