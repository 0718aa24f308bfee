//! # Lease Recovery Flows
//!
//! End-to-end recovery reports against a namespace seeded the way a writer
//! leaves it: a crashed writer's open file, a truncate in progress, an
//! abandoned last block, and a recovery superseded by a newer attempt.

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use nn_block_recovery::{
        BlockRecoveryApi, BlockState, CommitOutcome, CorruptReason, LogRecord,
        RecoveryCommitRequest, RecoveryConfig, RecoveryError, RecoveryKind, ReportedReplica,
    };
    use shared_types::{BlockId, ExtendedBlock, GenerationStamp};

    const GEN: GenerationStamp = GenerationStamp(1_001);
    const RECOVERY: GenerationStamp = GenerationStamp(1_002);

    // =========================================================================
    // WRITER CRASH
    // =========================================================================

    #[test]
    fn test_crashed_writer_file_is_closed_and_stragglers_quarantined() {
        let coordinator = cluster(RecoveryConfig::default(), 4);
        let nodes = datanodes(4);
        let file = abandoned_file(&coordinator, "/hbase/wal/rs1.1", BlockId(42), GEN, RECOVERY);
        {
            let mut ns = coordinator.namespace().write("setup");
            for node in &nodes {
                ns.replicas.add_replica(
                    BlockId(42),
                    node.clone(),
                    ReportedReplica {
                        block_id: BlockId(42),
                        generation_stamp: GEN,
                        num_bytes: 4_096,
                    },
                );
            }
        }

        let outcome = coordinator
            .commit_block_synchronization(
                recovery_report(BlockId(42), GEN, RECOVERY, 3_000)
                    .closing()
                    .with_targets(nodes[..3].to_vec()),
            )
            .unwrap();
        assert_eq!(
            outcome,
            CommitOutcome::Committed {
                kind: RecoveryKind::Direct,
                closed: true
            }
        );

        let ns = coordinator.namespace().read("check");
        let record = ns.files.get(file).unwrap();
        assert!(!record.under_construction);
        assert_eq!(record.blocks().len(), 2);

        let last = ns.blocks.get(BlockId(42)).unwrap();
        assert_eq!(last.state, BlockState::Complete);
        assert_eq!(last.generation_stamp, RECOVERY);
        assert_eq!(last.num_bytes, 3_000);

        let corrupt = ns.replicas.corrupt_replicas(BlockId(42));
        assert_eq!(corrupt.len(), 1);
        assert_eq!(corrupt[0].location, nodes[3]);
        assert_eq!(corrupt[0].corrupt, Some(CorruptReason::GenstampMismatch));
        assert_eq!(ns.replicas.live_replica_count(BlockId(42)), 3);
        drop(ns);

        let log = coordinator.log();
        assert_eq!(log.synced_txid(), log.last_txid());
        let records = log.durable_records();
        assert_eq!(records.len(), 1);
        match &records[0].1 {
            LogRecord::CloseFile { path, blocks, .. } => {
                assert_eq!(path, "/hbase/wal/rs1.1");
                assert_eq!(blocks.len(), 2);
                assert_eq!(blocks[1].block_id, BlockId(42));
                assert_eq!(blocks[1].num_bytes, 3_000);
            }
            other => panic!("expected a close record, got {other:?}"),
        }
    }

    #[test]
    fn test_newer_attempt_supersedes_older_report() {
        let coordinator = cluster(RecoveryConfig::default(), 3);
        let file = abandoned_file(&coordinator, "/tmp/job-7/part-0", BlockId(7), GEN, RECOVERY);
        let newer = GenerationStamp(1_003);
        coordinator
            .namespace()
            .write("setup")
            .begin_recovery(file, newer)
            .unwrap();

        let stale = coordinator
            .commit_block_synchronization(
                recovery_report(BlockId(7), GEN, RECOVERY, 10)
                    .closing()
                    .with_targets(datanodes(1)),
            )
            .unwrap_err();
        assert!(matches!(
            stale,
            RecoveryError::StaleRecoveryAttempt { recorded: Some(r), .. } if r == newer
        ));
        assert!(!stale.is_retry_safe(false));

        let outcome = coordinator
            .commit_block_synchronization(
                recovery_report(BlockId(7), GEN, newer, 10)
                    .closing()
                    .with_targets(datanodes(1)),
            )
            .unwrap();
        assert!(outcome.mutated());
        assert_eq!(
            coordinator
                .namespace()
                .read("check")
                .blocks
                .get(BlockId(7))
                .unwrap()
                .generation_stamp,
            newer
        );
    }

    #[test]
    fn test_commit_then_later_attempt_closes_file() {
        let coordinator = cluster(RecoveryConfig::default(), 2);
        let file = abandoned_file(&coordinator, "/user/bob/stream", BlockId(9), GEN, RECOVERY);

        coordinator
            .commit_block_synchronization(
                recovery_report(BlockId(9), GEN, RECOVERY, 2_048).with_targets(datanodes(2)),
            )
            .unwrap();
        assert!(coordinator
            .namespace()
            .read("check")
            .files
            .get(file)
            .unwrap()
            .under_construction);

        let next = GenerationStamp(1_010);
        coordinator
            .namespace()
            .write("setup")
            .begin_recovery(file, next)
            .unwrap();
        coordinator
            .commit_block_synchronization(
                recovery_report(BlockId(9), RECOVERY, next, 2_048)
                    .closing()
                    .with_targets(datanodes(2)),
            )
            .unwrap();

        let ns = coordinator.namespace().read("check");
        assert!(!ns.files.get(file).unwrap().under_construction);
        assert!(ns.blocks.get(BlockId(9)).unwrap().is_complete());
        drop(ns);

        let ops: Vec<_> = coordinator
            .log()
            .durable_records()
            .iter()
            .map(|(_, r)| r.op_name())
            .collect();
        assert_eq!(ops, vec!["OP_UPDATE_BLOCKS", "OP_CLOSE"]);
    }

    // =========================================================================
    // TRUNCATE
    // =========================================================================

    #[test]
    fn test_truncate_recovery_swaps_in_shorter_block() {
        let coordinator = cluster(RecoveryConfig::default(), 3);
        let file = {
            let mut ns = coordinator.namespace().write("setup");
            let file = ns.create_file("/warehouse/t1/000000_0");
            ns.allocate_block(file, BlockId(300), GEN, 64 * 1024, false)
                .unwrap();
            ns.blocks.get_mut(BlockId(300)).unwrap().complete();
            ns.files.get_mut(file).unwrap().close();
            ns.prepare_copy_truncate(file, BlockId(301), 1_000, RECOVERY)
                .unwrap();
            file
        };

        let request = RecoveryCommitRequest::new(
            ExtendedBlock::new(POOL, BlockId(300), GEN, 64 * 1024),
            RECOVERY,
            1_000,
        )
        .closing()
        .with_targets(datanodes(3));
        let outcome = coordinator.commit_block_synchronization(request.clone()).unwrap();
        assert_eq!(
            outcome,
            CommitOutcome::Committed {
                kind: RecoveryKind::CopyTruncate,
                closed: true
            }
        );

        {
            let ns = coordinator.namespace().read("check");
            assert_eq!(ns.files.get(file).unwrap().blocks(), &[BlockId(301)]);
            assert!(!ns.blocks.contains(BlockId(300)));
            assert_eq!(ns.replicas.live_replica_count(BlockId(301)), 3);
            assert!(ns.replicas.corrupt_replicas(BlockId(301)).is_empty());
        }

        // Replay names the superseded block, which no longer exists.
        let replay = coordinator.commit_block_synchronization(request).unwrap_err();
        assert!(matches!(replay, RecoveryError::BlockNotFound { .. }));
    }

    // =========================================================================
    // ABANDONED BLOCK
    // =========================================================================

    #[test]
    fn test_abandoned_last_block_is_dropped_once() {
        let coordinator = cluster(RecoveryConfig::default(), 3);
        let file = abandoned_file(&coordinator, "/logs/app/current", BlockId(11), GEN, RECOVERY);
        let delete = recovery_report(BlockId(11), GEN, RECOVERY, 0).deleting();

        assert_eq!(
            coordinator.commit_block_synchronization(delete.clone()).unwrap(),
            CommitOutcome::Deleted
        );
        let after_delete = coordinator.namespace().read("check").clone();
        assert_eq!(after_delete.files.get(file).unwrap().blocks().len(), 1);

        let retry = coordinator.commit_block_synchronization(delete).unwrap();
        assert_eq!(retry, CommitOutcome::AlreadyRemoved);
        assert_eq!(*coordinator.namespace().read("check"), after_delete);

        let records = coordinator.log().durable_records();
        assert_eq!(records.len(), 1);
        match &records[0].1 {
            LogRecord::UpdateBlocks { blocks, .. } => assert_eq!(blocks.len(), 1),
            other => panic!("expected a block update, got {other:?}"),
        }
    }
}
