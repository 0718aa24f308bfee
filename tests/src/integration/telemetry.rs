//! # Telemetry Bootstrap
//!
//! Installs the process subscriber and runs a commit under it. Only one
//! global subscriber can exist per test binary, so an "already installed"
//! error is accepted.

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use nn_block_recovery::{BlockRecoveryApi, RecoveryConfig, RecoveryError};
    use nn_telemetry::{init_telemetry, log_event, TelemetryConfig, TelemetryError};
    use shared_types::{BlockId, GenerationStamp};

    #[test]
    fn test_commit_runs_under_json_subscriber() {
        let config = TelemetryConfig {
            log_level: "nn_block_recovery=debug".to_string(),
            json_logs: true,
            ..TelemetryConfig::for_component("tests")
        };
        let _guard = match init_telemetry(&config) {
            Ok(guard) => Some(guard),
            Err(TelemetryError::SubscriberInit(_)) => None,
            Err(e) => panic!("telemetry init failed: {e}"),
        };
        log_event!(info, "tests", "Telemetry test starting", component = "integration");

        let coordinator = cluster(RecoveryConfig::default(), 1);
        let err = coordinator
            .commit_block_synchronization(recovery_report(
                BlockId(1),
                GenerationStamp(1),
                GenerationStamp(2),
                0,
            ))
            .unwrap_err();
        assert!(matches!(err, RecoveryError::BlockNotFound { .. }));
    }

    #[test]
    fn test_component_config_suffixes_service_name() {
        let config = TelemetryConfig::for_component("recovery");
        assert!(config.service_name.ends_with("-recovery"));
    }
}
