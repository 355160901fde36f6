//! Session notifications observable by anything attached to a call session

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;

/// Outcome of releasing the session's temporary files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupReport {
    /// Deletions issued
    pub attempted: usize,
    /// Deletions that succeeded
    pub removed: usize,
    /// Deletions that failed (logged)
    pub failed: usize,
}

/// Notification emitted by a call session.
///
/// Payload-carrying variants hold the originating event unmodified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum SessionNotification {
    Intent(Value),
    Transcription(Value),
    Text(Value),
    StartPlay { path: String },
    StopPlay { path: String },
    PlaybackInterrupted(Value),
    Dtmf(Value),
    Error(Value),
    /// Conversation over: empty on a bot Close, the error when the call could not start
    End(Option<String>),
    /// Teardown finished; emitted exactly once per started session
    Terminated(CleanupReport),
}

impl SessionNotification {
    pub fn name(&self) -> &'static str {
        match self {
            SessionNotification::Intent(_) => "intent",
            SessionNotification::Transcription(_) => "transcription",
            SessionNotification::Text(_) => "text",
            SessionNotification::StartPlay { .. } => "start-play",
            SessionNotification::StopPlay { .. } => "stop-play",
            SessionNotification::PlaybackInterrupted(_) => "playback-interrupted",
            SessionNotification::Dtmf(_) => "dtmf",
            SessionNotification::Error(_) => "error",
            SessionNotification::End(_) => "end",
            SessionNotification::Terminated(_) => "terminated",
        }
    }
}

/// Fan-out of one session's notifications
#[derive(Debug, Clone)]
pub struct NotificationBroadcaster {
    tx: broadcast::Sender<SessionNotification>,
}

impl NotificationBroadcaster {
    /// Create new broadcaster with specified capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to notifications
    pub fn subscribe(&self) -> broadcast::Receiver<SessionNotification> {
        self.tx.subscribe()
    }

    /// Emit a notification; having no listeners is not an error
    pub fn emit(&self, notification: SessionNotification) {
        let name = notification.name();
        if self.tx.send(notification).is_err() {
            debug!(notification = name, "No listeners for session notification");
        }
    }

    /// Get number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for NotificationBroadcaster {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_emit_without_subscribers() {
        let broadcaster = NotificationBroadcaster::default();
        broadcaster.emit(SessionNotification::End(None));
        assert_eq!(broadcaster.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_subscribers_receive_in_order() {
        let broadcaster = NotificationBroadcaster::new(8);
        let mut rx = broadcaster.subscribe();

        broadcaster.emit(SessionNotification::Intent(json!({"name": "Order"})));
        broadcaster.emit(SessionNotification::End(None));

        assert_eq!(rx.recv().await.unwrap().name(), "intent");
        assert_eq!(rx.recv().await.unwrap(), SessionNotification::End(None));
    }

    #[test]
    fn test_notification_serialization() {
        let value = serde_json::to_value(SessionNotification::StartPlay {
            path: "/tmp/a.wav".to_string(),
        })
        .unwrap();
        assert_eq!(value, json!({"type": "start-play", "data": {"path": "/tmp/a.wav"}}));
    }
}
