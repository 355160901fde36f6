//! In-process adapters for the media server and the speech backend.
//!
//! Used by the demo binary and by the tests.

pub mod media;
pub mod speech;
pub mod wav;

pub use media::{LoopbackCall, LoopbackDialog, LoopbackEndpoint, LoopbackMediaServer, PlayMode};
pub use speech::LoopbackSynthesizer;
