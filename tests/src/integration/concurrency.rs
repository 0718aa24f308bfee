//! # Concurrent Commits
//!
//! Commits from many handler threads serialize on the namespace lock. The
//! durable log therefore sees one total order, and racing duplicates of the
//! same report collapse into a single mutation.

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use nn_block_recovery::{
        BlockRecoveryApi, CommitOutcome, DefaultCoordinator, LogRecord, RecoveryConfig,
    };
    use parking_lot::Mutex;
    use rand::seq::SliceRandom;
    use rand::Rng;
    use shared_types::{BlockId, FileId, GenerationStamp};
    use std::collections::HashSet;
    use std::thread;

    const GEN: GenerationStamp = GenerationStamp(5_000);
    const RECOVERY: GenerationStamp = GenerationStamp(5_001);

    fn open_files(coordinator: &DefaultCoordinator, count: u64) -> Vec<(FileId, BlockId)> {
        (0..count)
            .map(|i| {
                let block = BlockId(10_000 + i);
                let file =
                    abandoned_file(coordinator, &format!("/ingest/part-{i:05}"), block, GEN, RECOVERY);
                (file, block)
            })
            .collect()
    }

    #[test]
    fn test_distinct_files_commit_in_one_total_order() {
        let coordinator = cluster(RecoveryConfig::default(), 3);
        let mut files = open_files(&coordinator, 16);
        files.shuffle(&mut rand::thread_rng());

        let outcomes = Mutex::new(Vec::new());
        thread::scope(|s| {
            for &(file, block) in &files {
                let coordinator = &coordinator;
                let outcomes = &outcomes;
                s.spawn(move || {
                    let length = rand::thread_rng().gen_range(1..4_096);
                    let result = coordinator.commit_block_synchronization(
                        recovery_report(block, GEN, RECOVERY, length)
                            .closing()
                            .with_targets(datanodes(3)),
                    );
                    outcomes.lock().push((file, result));
                });
            }
        });

        let outcomes = outcomes.into_inner();
        assert_eq!(outcomes.len(), 16);
        for (file, result) in &outcomes {
            assert!(
                matches!(result, Ok(CommitOutcome::Committed { closed: true, .. })),
                "{file}: {result:?}"
            );
        }

        let log = coordinator.log();
        assert_eq!(log.synced_txid(), 16);
        let records = log.durable_records();
        let txids: Vec<_> = records.iter().map(|(txid, _)| *txid).collect();
        assert_eq!(txids, (1..=16).collect::<Vec<_>>());

        let closed: HashSet<FileId> = records
            .iter()
            .map(|(_, record)| {
                assert!(matches!(record, LogRecord::CloseFile { .. }));
                record.file()
            })
            .collect();
        assert_eq!(closed.len(), 16);

        let ns = coordinator.namespace().read("check");
        for (file, _) in &files {
            assert!(!ns.files.get(*file).unwrap().under_construction);
        }
    }

    #[test]
    fn test_racing_duplicate_reports_mutate_once() {
        let coordinator = cluster(RecoveryConfig::default(), 3);
        let (_, block) = open_files(&coordinator, 1)[0];
        let request = recovery_report(block, GEN, RECOVERY, 777)
            .closing()
            .with_targets(datanodes(2));

        let outcomes = Mutex::new(Vec::new());
        thread::scope(|s| {
            for _ in 0..8 {
                let request = request.clone();
                let coordinator = &coordinator;
                let outcomes = &outcomes;
                s.spawn(move || {
                    let outcome = coordinator.commit_block_synchronization(request).unwrap();
                    outcomes.lock().push(outcome);
                });
            }
        });

        let outcomes = outcomes.into_inner();
        let committed = outcomes.iter().filter(|o| o.mutated()).count();
        let duplicates = outcomes
            .iter()
            .filter(|o| **o == CommitOutcome::StaleDuplicate)
            .count();
        assert_eq!(committed, 1);
        assert_eq!(duplicates, 7);
        assert_eq!(coordinator.log().durable_records().len(), 1);
    }

    #[test]
    fn test_racing_deletes_remove_once() {
        let coordinator = cluster(RecoveryConfig::default(), 3);
        let (file, block) = open_files(&coordinator, 1)[0];
        let request = recovery_report(block, GEN, RECOVERY, 0).deleting();

        let outcomes = Mutex::new(Vec::new());
        thread::scope(|s| {
            for _ in 0..8 {
                let request = request.clone();
                let coordinator = &coordinator;
                let outcomes = &outcomes;
                s.spawn(move || {
                    let outcome = coordinator.commit_block_synchronization(request).unwrap();
                    outcomes.lock().push(outcome);
                });
            }
        });

        let outcomes = outcomes.into_inner();
        assert_eq!(
            outcomes.iter().filter(|o| **o == CommitOutcome::Deleted).count(),
            1
        );
        assert_eq!(
            outcomes
                .iter()
                .filter(|o| **o == CommitOutcome::AlreadyRemoved)
                .count(),
            7
        );

        let ns = coordinator.namespace().read("check");
        assert!(!ns.blocks.contains(block));
        assert_eq!(ns.files.get(file).unwrap().blocks().len(), 1);
    }
}
