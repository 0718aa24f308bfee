//! Recovery commit configuration

use serde::Deserialize;
use std::env;
use std::time::Duration;

/// Block-recovery commit configuration
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RecoveryConfig {
    /// Live replicas a committed last block needs before it is completed
    /// while closing the file.
    pub min_replication: usize,
    /// Exclusive lock holds longer than this are logged at WARN.
    pub lock_report_threshold_ms: u64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            min_replication: 1,
            lock_report_threshold_ms: 5_000,
        }
    }
}

impl RecoveryConfig {
    /// Create configuration from environment variables.
    ///
    /// - `NN_MIN_REPLICATION` (default: 1)
    /// - `NN_LOCK_REPORT_THRESHOLD_MS` (default: 5000)
    ///
    /// Unparseable values fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            min_replication: env::var("NN_MIN_REPLICATION")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.min_replication),
            lock_report_threshold_ms: env::var("NN_LOCK_REPORT_THRESHOLD_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.lock_report_threshold_ms),
        }
    }

    pub fn with_min_replication(mut self, min_replication: usize) -> Self {
        self.min_replication = min_replication;
        self
    }

    pub fn lock_report_threshold(&self) -> Duration {
        Duration::from_millis(self.lock_report_threshold_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RecoveryConfig::default();
        assert_eq!(config.min_replication, 1);
        assert_eq!(config.lock_report_threshold(), Duration::from_secs(5));
    }

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config: RecoveryConfig = serde_json::from_str(r#"{"min_replication": 3}"#).unwrap();
        assert_eq!(config.min_replication, 3);
        assert_eq!(config.lock_report_threshold_ms, 5_000);
    }
}
