//! # Namenode Recovery Test Suite
//!
//! Cross-crate tests for the block-recovery commit.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── lease_recovery.rs   # Writer crash, truncate and abandon-block flows
//!     ├── concurrency.rs      # Commits racing on the namespace lock
//!     └── telemetry.rs        # Logging bootstrap with the coordinator
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p nn-tests
//!
//! # By category
//! cargo test -p nn-tests integration::concurrency::
//! ```

#![allow(dead_code)]

pub mod integration;
