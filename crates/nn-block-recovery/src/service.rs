//! # Block Recovery Commit Service
//!
//! `RecoveryCommitCoordinator` reconciles a recovery agent's report with the
//! namespace.
//!
//! ## Transaction
//!
//! 1. Writable check (also repeated under the lock)
//! 2. Exclusive namespace lock: gate checks, structural checks, block and
//!    file resolution, staleness check, checkpoint, mutation, log append
//!    (the checkpoint is restored if mutation or append fails)
//! 3. Lock released
//! 4. Durable log sync
//! 5. Reply
//!
//! Validation decides a `RecoveryKind` once; mutation and finalization
//! branch on it instead of re-deriving the path.


use crate::adapters::{DatanodeRegistry, InMemoryDurableLog, RetainedSnapshots, ServiceModeGate};
use crate::config::RecoveryConfig;
use crate::domain::{
    BlockRecord, CommitOutcome, CorruptReason, LogRecord, Namespace, RecoveryCommitRequest,
    RecoveryKind, ReportedReplica, ResolvedTarget,
};
use crate::error::{RecoveryError, RecoveryResult};
use crate::lock::NamespaceLock;
use crate::metrics;
use crate::ports::inbound::BlockRecoveryApi;
use crate::ports::outbound::{DurableLog, OperationGate, ReplicaResolver, SnapshotQuery};
use nn_telemetry::{log_block_event, log_event, subsystem_span};
use shared_types::{BlockId, FileId, GenerationStamp, ReplicaLocation};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

/// `subsystem` field of every event emitted here.
pub const SUBSYSTEM: &str = "block-recovery";

/// Namespace lock tag of the commit.
pub const LOCK_TAG: &str = "commitBlockSynchronization";

const SAFE_MODE_REASON: &str = "Cannot commitBlockSynchronization while in safe mode";

/// The block-recovery commit coordinator.
pub struct RecoveryCommitCoordinator<G, R, L, S>
where
    G: OperationGate,
    R: ReplicaResolver,
    L: DurableLog,
    S: SnapshotQuery,
{
    config: RecoveryConfig,
    namespace: Arc<NamespaceLock>,
    gate: Arc<G>,
    resolver: Arc<R>,
    log: Arc<L>,
    snapshots: Arc<S>,
}

/// Dependencies for RecoveryCommitCoordinator
pub struct RecoveryDependencies<G, R, L, S> {
    pub namespace: Arc<NamespaceLock>,
    pub gate: Arc<G>,
    pub resolver: Arc<R>,
    pub log: Arc<L>,
    pub snapshots: Arc<S>,
}

/// Coordinator wired to the in-process adapters.
pub type DefaultCoordinator =
    RecoveryCommitCoordinator<ServiceModeGate, DatanodeRegistry, InMemoryDurableLog, RetainedSnapshots>;

impl DefaultCoordinator {
    /// Coordinator over an empty namespace and fresh in-process adapters.
    pub fn in_memory(config: RecoveryConfig) -> Self {
        let namespace = Arc::new(NamespaceLock::with_report_threshold(
            Namespace::new(),
            config.lock_report_threshold(),
        ));
        Self::new(
            RecoveryDependencies {
                namespace,
                gate: Arc::new(ServiceModeGate::new()),
                resolver: Arc::new(DatanodeRegistry::new()),
                log: Arc::new(InMemoryDurableLog::new()),
                snapshots: Arc::new(RetainedSnapshots::new()),
            },
            config,
        )
    }
}

/// What validation established about a report that needs mutation.
struct ValidatedReport {
    file: FileId,
    path: String,
    /// Block named by the report.
    stored: BlockId,
    /// Current last block of the file.
    target: BlockId,
    /// Block before the last one, which a delete-and-close finalizes.
    previous: Option<BlockId>,
    kind: RecoveryKind,
}

enum Validation {
    Proceed(ValidatedReport),
    NoOp(CommitOutcome),
}

/// A namespace mutation waiting for its log record.
struct Mutation {
    record: LogRecord,
    outcome: CommitOutcome,
    corrupt_marked: usize,
}

/// How a commit settled, with what the success log needs.
enum Settled {
    Applied {
        outcome: CommitOutcome,
        path: String,
        /// Set when a copy-truncate produced a new block.
        new_block: Option<BlockId>,
    },
    NoOp(CommitOutcome),
}

impl Settled {
    fn outcome(&self) -> CommitOutcome {
        match self {
            Settled::Applied { outcome, .. } | Settled::NoOp(outcome) => *outcome,
        }
    }
}

impl<G, R, L, S> RecoveryCommitCoordinator<G, R, L, S>
where
    G: OperationGate,
    R: ReplicaResolver,
    L: DurableLog,
    S: SnapshotQuery,
{
    pub fn new(deps: RecoveryDependencies<G, R, L, S>, config: RecoveryConfig) -> Self {
        Self {
            config,
            namespace: deps.namespace,
            gate: deps.gate,
            resolver: deps.resolver,
            log: deps.log,
            snapshots: deps.snapshots,
        }
    }

    pub fn config(&self) -> &RecoveryConfig {
        &self.config
    }

    pub fn namespace(&self) -> &Arc<NamespaceLock> {
        &self.namespace
    }

    pub fn gate(&self) -> &Arc<G> {
        &self.gate
    }

    pub fn resolver(&self) -> &Arc<R> {
        &self.resolver
    }

    pub fn log(&self) -> &Arc<L> {
        &self.log
    }

    pub fn snapshots(&self) -> &Arc<S> {
        &self.snapshots
    }

    fn commit(&self, request: &RecoveryCommitRequest) -> RecoveryResult<Settled> {
        self.gate.check_writable()?;

        let settled = {
            let mut ns = self.namespace.write(LOCK_TAG);
            self.commit_locked(&mut ns, request)?
        };

        let started = Instant::now();
        self.log.sync()?;
        metrics::observe_log_sync(started.elapsed().as_secs_f64());

        Ok(settled)
    }

    fn commit_locked(
        &self,
        ns: &mut Namespace,
        request: &RecoveryCommitRequest,
    ) -> RecoveryResult<Settled> {
        self.gate.check_writable()?;
        self.gate.check_not_safe_mode(SAFE_MODE_REASON)?;
        request
            .validate()
            .map_err(|reason| RecoveryError::InvalidRequest { reason })?;

        let report = match validate_report(ns, request)? {
            Validation::Proceed(report) => report,
            Validation::NoOp(outcome) => return Ok(Settled::NoOp(outcome)),
        };

        if request.delete_block && report.kind == RecoveryKind::CopyTruncate {
            debug!(
                block_id = %report.stored,
                kind = %report.kind,
                "[nn-recovery] Reported block is not the file's last block, nothing to delete"
            );
            return Ok(Settled::NoOp(CommitOutcome::AlreadyRemoved));
        }

        let checkpoint = ns.checkpoint(
            report.file,
            [report.stored, report.target].into_iter().chain(report.previous),
        );
        let applied = self.apply(ns, request, &report).and_then(
            |Mutation {
                 record,
                 outcome,
                 corrupt_marked,
             }| {
                self.append(record)?;
                Ok((outcome, corrupt_marked))
            },
        );

        match applied {
            Ok((outcome, corrupt_marked)) => {
                metrics::record_corrupt_replicas(corrupt_marked);
                Ok(Settled::Applied {
                    outcome,
                    new_block: (report.kind == RecoveryKind::CopyTruncate).then_some(report.target),
                    path: report.path,
                })
            }
            Err(e) => {
                ns.restore(checkpoint);
                debug!(
                    block_id = %report.stored,
                    code = e.code(),
                    "[nn-recovery] Commit failed, namespace changes rolled back"
                );
                Err(e)
            }
        }
    }

    fn apply(
        &self,
        ns: &mut Namespace,
        request: &RecoveryCommitRequest,
        report: &ValidatedReport,
    ) -> RecoveryResult<Mutation> {
        if request.delete_block {
            self.delete_last_block(ns, request, report)
        } else {
            self.commit_last_block(ns, request, report)
        }
    }

    /// Delete path: drop the reported block from the file's tail and from
    /// the block store, then close the file if asked to.
    fn delete_last_block(
        &self,
        ns: &mut Namespace,
        request: &RecoveryCommitRequest,
        report: &ValidatedReport,
    ) -> RecoveryResult<Mutation> {
        let file = ns
            .files
            .get_mut(report.file)
            .ok_or(RecoveryError::OwningFileGone {
                block_id: report.stored,
            })?;
        file.remove_last_block(report.stored);
        let remaining_last = file.last_block();

        ns.blocks.remove(report.stored);
        let dropped = ns.replicas.remove_block(report.stored);
        debug!(
            block_id = %report.stored,
            replicas = dropped,
            "[nn-recovery] Removed recovered block"
        );

        let record = if request.close_file {
            if let Some(last) = remaining_last {
                if !ns.blocks.get(last).is_some_and(BlockRecord::is_complete) {
                    self.commit_or_complete(ns, last)?;
                }
            }
            if let Some(file) = ns.files.get_mut(report.file) {
                file.close();
            }
            LogRecord::CloseFile {
                file: report.file,
                path: report.path.clone(),
                blocks: ns.block_summaries(report.file),
            }
        } else {
            LogRecord::UpdateBlocks {
                file: report.file,
                path: report.path.clone(),
                blocks: ns.block_summaries(report.file),
            }
        };

        Ok(Mutation {
            record,
            outcome: CommitOutcome::Deleted,
            corrupt_marked: 0,
        })
    }

    /// Commit path: apply the agreed state, register the new replicas and
    /// close or persist the file.
    fn commit_last_block(
        &self,
        ns: &mut Namespace,
        request: &RecoveryCommitRequest,
        report: &ValidatedReport,
    ) -> RecoveryResult<Mutation> {
        let stored = block_mut(ns, report.stored)?;
        let (old_generation_stamp, old_num_bytes) = (stored.generation_stamp, stored.num_bytes);

        if report.kind == RecoveryKind::Direct
            && !stored.update(request.new_generation_stamp, request.new_length)
        {
            return Err(RecoveryError::InvalidRequest {
                reason: format!(
                    "new generation stamp {} is older than stored {}",
                    request.new_generation_stamp, old_generation_stamp
                ),
            });
        }

        let resolved = self
            .resolver
            .resolve_locations(&request.new_targets, &request.new_target_storages);
        let locations: Vec<ReplicaLocation> = resolved
            .iter()
            .filter_map(ResolvedTarget::location)
            .cloned()
            .collect();
        if locations.len() < resolved.len() {
            debug!(
                block_id = %report.target,
                absent = resolved.len() - locations.len(),
                "[nn-recovery] Some recovery targets could not be resolved"
            );
        }

        if request.close_file {
            register_replicas(ns, report.target, report.kind, &resolved)?;
        }
        block_mut(ns, report.target)?.convert_to_under_construction(locations.clone());

        let corrupt_marked = if request.close_file && report.kind == RecoveryKind::Direct {
            quarantine_stale_replicas(
                ns,
                report.stored,
                (old_generation_stamp, old_num_bytes),
                (request.new_generation_stamp, request.new_length),
                &locations,
            )
        } else {
            0
        };

        let record = if request.close_file {
            self.close_file(ns, report)?
        } else {
            LogRecord::UpdateBlocks {
                file: report.file,
                path: report.path.clone(),
                blocks: ns.block_summaries(report.file),
            }
        };

        for id in [report.stored, report.target] {
            if let Some(block) = ns.blocks.get_mut(id) {
                block.clear_recovery();
            }
        }

        Ok(Mutation {
            record,
            outcome: CommitOutcome::Committed {
                kind: report.kind,
                closed: request.close_file,
            },
            corrupt_marked,
        })
    }

    /// Commit-or-complete the last block, close the file and, after a
    /// copy-truncate, drop the superseded block unless a snapshot keeps it.
    fn close_file(&self, ns: &mut Namespace, report: &ValidatedReport) -> RecoveryResult<LogRecord> {
        self.commit_or_complete(ns, report.target)?;

        if let Some(file) = ns.files.get_mut(report.file) {
            file.close();
        }

        if report.kind == RecoveryKind::CopyTruncate {
            if self
                .snapshots
                .is_block_in_latest_snapshot(report.file, report.stored)
            {
                debug!(
                    block_id = %report.stored,
                    "[nn-recovery] Superseded block retained by snapshot"
                );
            } else {
                ns.blocks.remove(report.stored);
                ns.replicas.remove_block(report.stored);
            }
        }

        Ok(LogRecord::CloseFile {
            file: report.file,
            path: report.path.clone(),
            blocks: ns.block_summaries(report.file),
        })
    }

    /// Commit `block`, and complete it once it has `min_replication` live
    /// replicas.
    fn commit_or_complete(&self, ns: &mut Namespace, block: BlockId) -> RecoveryResult<()> {
        let live = ns.replicas.live_replica_count(block);
        let record = block_mut(ns, block)?;
        record.commit();
        if live >= self.config.min_replication {
            record.complete();
        } else {
            debug!(
                block_id = %block,
                live,
                min_replication = self.config.min_replication,
                "[nn-recovery] Last block committed, waiting for replicas to complete"
            );
        }
        Ok(())
    }

    fn append(&self, record: LogRecord) -> RecoveryResult<()> {
        let op = record.op_name();
        let txid = self.log.append(record)?;
        log_event!(debug, SUBSYSTEM, "[nn-recovery] Appended log record", txid, op);
        Ok(())
    }
}

impl<G, R, L, S> BlockRecoveryApi for RecoveryCommitCoordinator<G, R, L, S>
where
    G: OperationGate,
    R: ReplicaResolver,
    L: DurableLog,
    S: SnapshotQuery,
{
    fn commit_block_synchronization(
        &self,
        request: RecoveryCommitRequest,
    ) -> RecoveryResult<CommitOutcome> {
        let correlation_id = Uuid::new_v4();
        let span = subsystem_span!(
            "commit_block_synchronization",
            subsystem = SUBSYSTEM,
            %correlation_id,
            block = %request.old_block
        );
        let _entered = span.enter();

        let result = self.commit(&request);
        let block_id = request.old_block.block_id;
        let new_generation_stamp = request.new_generation_stamp;

        match &result {
            Ok(Settled::Applied {
                outcome,
                path,
                new_block,
            }) => {
                metrics::record_commit(outcome.label());
                log_block_event!(
                    info,
                    SUBSYSTEM,
                    "[nn-recovery] Block recovery committed",
                    block_id,
                    new_generation_stamp,
                    correlation_id = %correlation_id,
                    outcome = outcome.label(),
                    path = %path,
                    new_block = new_block.map(tracing::field::display),
                    new_length = request.new_length,
                    close_file = request.close_file,
                    delete_block = request.delete_block,
                    targets = %request.targets_summary()
                );
            }
            Ok(Settled::NoOp(outcome)) => {
                metrics::record_commit(outcome.label());
                log_block_event!(
                    debug,
                    SUBSYSTEM,
                    "[nn-recovery] Block recovery report was a no-op",
                    block_id,
                    new_generation_stamp,
                    correlation_id = %correlation_id,
                    outcome = outcome.label()
                );
            }
            Err(e) if e.is_fatal() => {
                metrics::record_failure(e.code());
                log_block_event!(
                    error,
                    SUBSYSTEM,
                    "[nn-recovery] Block recovery failed",
                    block_id,
                    new_generation_stamp,
                    correlation_id = %correlation_id,
                    code = e.code(),
                    error = %e,
                    old_generation_stamp = %request.old_block.generation_stamp,
                    new_length = request.new_length,
                    close_file = request.close_file,
                    delete_block = request.delete_block,
                    targets = %request.targets_summary()
                );
            }
            Err(e) => {
                metrics::record_failure(e.code());
                log_block_event!(
                    warn,
                    SUBSYSTEM,
                    "[nn-recovery] Block recovery rejected",
                    block_id,
                    new_generation_stamp,
                    correlation_id = %correlation_id,
                    code = e.code(),
                    error = %e,
                    old_generation_stamp = %request.old_block.generation_stamp,
                    new_length = request.new_length,
                    close_file = request.close_file,
                    delete_block = request.delete_block,
                    targets = %request.targets_summary()
                );
            }
        }

        result.map(|settled| settled.outcome())
    }
}

/// Resolve the reported block to its file and decide the recovery path.
///
/// Reads only; nothing is mutated before this returns `Proceed`.
fn validate_report(ns: &Namespace, request: &RecoveryCommitRequest) -> RecoveryResult<Validation> {
    let block_id = request.old_block.block_id;

    let Some(stored) = ns.blocks.get(block_id) else {
        if request.delete_block {
            return Ok(Validation::NoOp(CommitOutcome::AlreadyRemoved));
        }
        return Err(RecoveryError::BlockNotFound { block_id });
    };

    let gone = || RecoveryError::OwningFileGone { block_id };
    let owner = stored.owner.ok_or_else(gone)?;
    let file = ns.files.get(owner).ok_or_else(gone)?;
    if file.deleted {
        return Err(RecoveryError::FileNotFound {
            path: file.path.clone(),
            block_id,
        });
    }

    let last_id = file.last_block().ok_or_else(gone)?;
    let previous = file.other_blocks().last().copied();
    let last = ns.blocks.get(last_id).ok_or_else(gone)?;

    if (!file.under_construction || stored.is_complete()) && last.is_complete() {
        return Ok(Validation::NoOp(CommitOutcome::StaleDuplicate));
    }

    let kind = if last_id == block_id {
        RecoveryKind::Direct
    } else {
        RecoveryKind::CopyTruncate
    };

    if last.recovery_id != Some(request.new_generation_stamp) {
        return Err(RecoveryError::StaleRecoveryAttempt {
            block_id: last_id,
            recorded: last.recovery_id,
            reported: request.new_generation_stamp,
        });
    }

    Ok(Validation::Proceed(ValidatedReport {
        file: owner,
        path: file.path.clone(),
        stored: block_id,
        target: last_id,
        previous,
        kind,
    }))
}

/// Register every resolved target as a replica of `block`.
///
/// On the direct path, internal blocks of a striped group are reported as
/// `block + index`, with the index taken over the full target sequence. A
/// copy-truncate registers the new block id as is.
fn register_replicas(
    ns: &mut Namespace,
    block: BlockId,
    kind: RecoveryKind,
    resolved: &[ResolvedTarget],
) -> RecoveryResult<()> {
    let record = ns
        .blocks
        .get(block)
        .ok_or(RecoveryError::BlockNotFound { block_id: block })?;
    let (generation_stamp, num_bytes) = (record.generation_stamp, record.num_bytes);
    let offset_members = record.is_striped && kind == RecoveryKind::Direct;

    for (index, target) in resolved.iter().enumerate() {
        let Some(location) = target.location() else {
            continue;
        };
        let reported = ReportedReplica {
            block_id: if offset_members {
                block.striped_member(index)
            } else {
                block
            },
            generation_stamp,
            num_bytes,
        };
        ns.replicas.add_replica(block, location.clone(), reported);
    }
    Ok(())
}

/// Mark replicas left at the pre-recovery (genstamp, length) and outside the
/// new target set as corrupt. Returns how many were marked.
fn quarantine_stale_replicas(
    ns: &mut Namespace,
    block: BlockId,
    (old_generation_stamp, old_num_bytes): (GenerationStamp, u64),
    (new_generation_stamp, new_num_bytes): (GenerationStamp, u64),
    new_locations: &[ReplicaLocation],
) -> usize {
    let reason = if old_generation_stamp != new_generation_stamp {
        CorruptReason::GenstampMismatch
    } else if old_num_bytes != new_num_bytes {
        CorruptReason::SizeMismatch
    } else {
        return 0;
    };

    let stale: Vec<ReplicaLocation> = ns
        .replicas
        .replicas(block)
        .iter()
        .filter(|e| {
            !e.is_corrupt()
                && e.reports(old_generation_stamp, old_num_bytes)
                && !new_locations.contains(&e.location)
        })
        .map(|e| e.location.clone())
        .collect();

    for location in &stale {
        if ns.replicas.mark_corrupt(block, location, reason) {
            warn!(
                block_id = %block,
                replica = %location,
                %reason,
                old_generation_stamp = %old_generation_stamp,
                old_num_bytes,
                "[nn-recovery] Marking stale replica corrupt after recovery"
            );
        }
    }
    stale.len()
}

fn block_mut(ns: &mut Namespace, id: BlockId) -> RecoveryResult<&mut BlockRecord> {
    ns.blocks
        .get_mut(id)
        .ok_or(RecoveryError::BlockNotFound { block_id: id })
}
