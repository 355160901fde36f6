//! Interface layer - External interfaces
//!
//! This layer handles:
//! - Prometheus metrics export

pub mod metrics;
