//! # Block Recovery Metrics
//!
//! Prometheus metrics for the recovery commit path.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! nn-block-recovery = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `nn_recovery_commits_total` - Successful commits (by outcome)
//! - `nn_recovery_failures_total` - Failed commits (by error code)
//! - `nn_recovery_corrupt_replicas_total` - Replicas marked corrupt by recovery
//! - `nn_namespace_lock_hold_seconds` - Exclusive lock hold time (by tag)
//! - `nn_durable_log_sync_seconds` - Durable log sync latency

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_histogram, register_histogram_vec, register_int_counter, register_int_counter_vec,
    Histogram, HistogramVec, IntCounter, IntCounterVec,
};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Successful commits, labeled by outcome
    pub static ref COMMITS: IntCounterVec = register_int_counter_vec!(
        "nn_recovery_commits_total",
        "Total number of successful block recovery commits",
        &["outcome"]
    )
    .expect("Failed to create COMMITS metric");

    /// Failed commits, labeled by error code
    pub static ref FAILURES: IntCounterVec = register_int_counter_vec!(
        "nn_recovery_failures_total",
        "Total number of failed block recovery commits",
        &["code"]
    )
    .expect("Failed to create FAILURES metric");

    /// Replicas quarantined after a recovery
    pub static ref CORRUPT_REPLICAS: IntCounter = register_int_counter!(
        "nn_recovery_corrupt_replicas_total",
        "Total number of replicas marked corrupt by block recovery"
    )
    .expect("Failed to create CORRUPT_REPLICAS metric");

    /// Exclusive namespace lock hold time
    pub static ref LOCK_HOLD: HistogramVec = register_histogram_vec!(
        "nn_namespace_lock_hold_seconds",
        "Namespace write lock hold time",
        &["tag"]
    )
    .expect("Failed to create LOCK_HOLD metric");

    /// Durable log sync latency
    pub static ref LOG_SYNC: Histogram = register_histogram!(
        "nn_durable_log_sync_seconds",
        "Durable log sync latency"
    )
    .expect("Failed to create LOG_SYNC metric");
}

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

/// Record a successful commit
#[cfg(feature = "metrics")]
pub fn record_commit(outcome: &str) {
    COMMITS.with_label_values(&[outcome]).inc();
}

/// Record a failed commit with its error code
#[cfg(feature = "metrics")]
pub fn record_failure(code: &str) {
    FAILURES.with_label_values(&[code]).inc();
}

/// Record replicas marked corrupt
#[cfg(feature = "metrics")]
pub fn record_corrupt_replicas(count: usize) {
    CORRUPT_REPLICAS.inc_by(count as u64);
}

/// Observe how long the write lock was held
#[cfg(feature = "metrics")]
pub fn observe_lock_hold(tag: &str, seconds: f64) {
    LOCK_HOLD.with_label_values(&[tag]).observe(seconds);
}

/// Observe a durable log sync
#[cfg(feature = "metrics")]
pub fn observe_log_sync(seconds: f64) {
    LOG_SYNC.observe(seconds);
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn record_commit(_outcome: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_failure(_code: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_corrupt_replicas(_count: usize) {}

#[cfg(not(feature = "metrics"))]
pub fn observe_lock_hold(_tag: &str, _seconds: f64) {}

#[cfg(not(feature = "metrics"))]
pub fn observe_log_sync(_seconds: f64) {}
