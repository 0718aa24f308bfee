//! # Ports Layer
//!
//! Port traits of the block-recovery commit.
//!
//! ## Hexagonal Architecture
//!
//! - `inbound.rs` - Driving port (the commit operation)
//! - `outbound.rs` - Driven ports (service-mode checks, replica resolution,
//!   durable log, snapshot query)

pub mod inbound;
pub mod outbound;
