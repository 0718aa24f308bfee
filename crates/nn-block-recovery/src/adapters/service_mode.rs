//! Service-mode gate backed by two atomic flags.

use crate::error::{RecoveryError, RecoveryResult};
use crate::ports::outbound::OperationGate;
use std::sync::atomic::{AtomicBool, Ordering};

/// HA-active and safe-mode flags.
///
/// Starts active and out of safe mode.
#[derive(Debug)]
pub struct ServiceModeGate {
    active: AtomicBool,
    safe_mode: AtomicBool,
}

impl Default for ServiceModeGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceModeGate {
    pub fn new() -> Self {
        Self {
            active: AtomicBool::new(true),
            safe_mode: AtomicBool::new(false),
        }
    }

    /// Enter (`false`) or leave (`true`) standby.
    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }

    pub fn set_safe_mode(&self, on: bool) {
        self.safe_mode.store(on, Ordering::SeqCst);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn in_safe_mode(&self) -> bool {
        self.safe_mode.load(Ordering::SeqCst)
    }
}

impl OperationGate for ServiceModeGate {
    fn check_writable(&self) -> RecoveryResult<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(RecoveryError::NotWritable {
                state: "standby".to_string(),
            })
        }
    }

    fn check_not_safe_mode(&self, reason: &str) -> RecoveryResult<()> {
        if self.in_safe_mode() {
            Err(RecoveryError::MaintenanceMode {
                reason: reason.to_string(),
            })
        } else {
            Ok(())
        }
    }
}
