//! Lexgate - bridges inbound SIP calls to a conversational bot
//!
//! Each answered call gets one session: the caller's audio is streamed to
//! the bot through the media server, the bot's replies are played back
//! (synthesized locally or as audio from the bot), caller keypresses are
//! forwarded, and everything the session created is released when the
//! call ends.
//!
//! The layout follows Domain-Driven Design: domain ports and value types,
//! the per-call session in the application layer, adapters in
//! infrastructure and the metrics exporter in the interface layer.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interface;

// Re-export commonly used types
pub use application::bridge::LexBridge;
pub use domain::shared::error::BridgeError;
pub use domain::shared::result::Result;
