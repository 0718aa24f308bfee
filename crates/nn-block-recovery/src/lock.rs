//! # Namespace Lock
//!
//! One process-wide read/write lock over all namespace and block state.
//!
//! Acquisition hands out a scoped guard; the lock is released when the guard
//! drops, on every exit path. The tag passed at acquisition is only used to
//! attribute long holds in logs and metrics.

use crate::domain::Namespace;
use crate::metrics;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::ops::{Deref, DerefMut};
use std::time::{Duration, Instant};
use nn_telemetry::log_event;

/// Default hold time above which a release is logged.
pub const DEFAULT_REPORT_THRESHOLD: Duration = Duration::from_secs(5);

/// Global namespace lock.
#[derive(Debug)]
pub struct NamespaceLock {
    inner: RwLock<Namespace>,
    report_threshold: Duration,
}

impl NamespaceLock {
    pub fn new(namespace: Namespace) -> Self {
        Self::with_report_threshold(namespace, DEFAULT_REPORT_THRESHOLD)
    }

    pub fn with_report_threshold(namespace: Namespace, report_threshold: Duration) -> Self {
        Self {
            inner: RwLock::new(namespace),
            report_threshold,
        }
    }

    /// Take exclusive access.
    pub fn write(&self, tag: &'static str) -> NamespaceWriteGuard<'_> {
        NamespaceWriteGuard {
            guard: self.inner.write(),
            tag,
            acquired: Instant::now(),
            report_threshold: self.report_threshold,
        }
    }

    /// Take shared access.
    pub fn read(&self, tag: &'static str) -> NamespaceReadGuard<'_> {
        NamespaceReadGuard {
            guard: self.inner.read(),
            tag,
        }
    }

    /// Whether some thread currently holds exclusive access.
    pub fn is_write_locked(&self) -> bool {
        self.inner.is_locked_exclusive()
    }
}

/// Exclusive access to the namespace; released on drop.
pub struct NamespaceWriteGuard<'a> {
    guard: RwLockWriteGuard<'a, Namespace>,
    tag: &'static str,
    acquired: Instant,
    report_threshold: Duration,
}

impl NamespaceWriteGuard<'_> {
    pub fn tag(&self) -> &'static str {
        self.tag
    }
}

impl Deref for NamespaceWriteGuard<'_> {
    type Target = Namespace;

    fn deref(&self) -> &Namespace {
        &self.guard
    }
}

impl DerefMut for NamespaceWriteGuard<'_> {
    fn deref_mut(&mut self) -> &mut Namespace {
        &mut self.guard
    }
}

impl Drop for NamespaceWriteGuard<'_> {
    fn drop(&mut self) {
        let held = self.acquired.elapsed();
        metrics::observe_lock_hold(self.tag, held.as_secs_f64());
        if held > self.report_threshold {
            log_event!(
                warn,
                "namespace-lock",
                "[nn-recovery] Namespace write lock held too long",
                tag = self.tag,
                held_ms = held.as_millis() as u64,
                threshold_ms = self.report_threshold.as_millis() as u64
            );
        }
    }
}

/// Shared access to the namespace; released on drop.
pub struct NamespaceReadGuard<'a> {
    guard: RwLockReadGuard<'a, Namespace>,
    tag: &'static str,
}

impl NamespaceReadGuard<'_> {
    pub fn tag(&self) -> &'static str {
        self.tag
    }
}

impl Deref for NamespaceReadGuard<'_> {
    type Target = Namespace;

    fn deref(&self) -> &Namespace {
        &self.guard
    }
}
