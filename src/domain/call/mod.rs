//! Call context - identity, lifecycle and notifications of one bridged call

pub mod context;
pub mod notification;
pub mod state;

pub use context::{CallContext, CallMetadata, InboundCall};
pub use notification::{CleanupReport, NotificationBroadcaster, SessionNotification};
pub use state::SessionState;
