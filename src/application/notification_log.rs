//! Logs every notification of one session
//!
//! The default listener attached by the bridge. It stops after the
//! session's final notification or once every sender is gone.

use crate::domain::call::notification::SessionNotification;
use crate::domain::shared::value_objects::CallId;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub fn spawn_notification_logger(
    call_id: CallId,
    mut rx: broadcast::Receiver<SessionNotification>,
) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let mut logged = 0;
        loop {
            match rx.recv().await {
                Ok(notification) => {
                    logged += 1;
                    let done = matches!(notification, SessionNotification::Terminated(_));
                    log_notification(&call_id, &notification);
                    if done {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(call_id = %call_id, skipped, "Notification logger lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
        logged
    })
}

fn log_notification(call_id: &CallId, notification: &SessionNotification) {
    match notification {
        SessionNotification::Intent(intent) => info!(call_id = %call_id, %intent, "received intent"),
        SessionNotification::Transcription(transcript) => {
            info!(call_id = %call_id, %transcript, "received transcription")
        }
        SessionNotification::Text(text) => info!(call_id = %call_id, %text, "text response"),
        SessionNotification::StartPlay { path } => info!(call_id = %call_id, path = %path, "starting playback"),
        SessionNotification::StopPlay { path } => info!(call_id = %call_id, path = %path, "stopping playback"),
        SessionNotification::PlaybackInterrupted(event) => {
            info!(call_id = %call_id, %event, "received playback interruption")
        }
        SessionNotification::Dtmf(dtmf) => info!(call_id = %call_id, %dtmf, "received dtmf"),
        SessionNotification::Error(err) => info!(call_id = %call_id, %err, "received error"),
        SessionNotification::End(None) => info!(call_id = %call_id, "received dialog close"),
        SessionNotification::End(Some(reason)) => {
            info!(call_id = %call_id, reason = %reason, "session ended before the bot started")
        }
        SessionNotification::Terminated(report) => info!(
            call_id = %call_id,
            removed = report.removed,
            failed = report.failed,
            "session terminated"
        ),
    }
}
