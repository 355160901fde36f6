//! Application layer - Use cases and application services
//!
//! This layer orchestrates domain objects to fulfill use cases.
//! It's responsible for:
//! - Running one session per inbound call
//! - Routing bot events, playback and keypresses within a session
//! - Logging session notifications

pub mod bridge;
pub mod notification_log;
pub mod session;
