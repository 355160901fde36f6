//! Domain layer - Core model of a bridged bot call
//!
//! This layer contains:
//! - Call context: identity, lifecycle and notifications of one call
//! - Bot vocabulary: events, commands and session settings
//! - Ports: media server, dialog and speech synthesis traits

pub mod bot;
pub mod call;
pub mod media;
pub mod shared;
pub mod speech;

// Re-export commonly used types
pub use shared::{BridgeError, Result};
