//! Infrastructure layer - Technical implementations
//!
//! This layer contains adapters for the domain ports:
//! - Loopback media server (endpoint, dialog, resource provider)
//! - Loopback speech synthesizer

pub mod loopback;
