//! Per-session dispatcher
//!
//! One task per call drains the session queue. Handlers never overlap;
//! anything slow runs detached and reports back through the queue.

use crate::application::session::dtmf::DtmfBridge;
use crate::application::session::event::SessionEvent;
use crate::application::session::playback::{PlaybackController, PromptSource};
use crate::application::session::router::{BotEventRouter, Route};
use crate::application::session::temp_files::{remove_file, TempResourceRegistry};
use crate::domain::call::context::CallContext;
use crate::domain::call::notification::{NotificationBroadcaster, SessionNotification};
use crate::domain::call::state::SessionState;
use crate::domain::media::{Dialog, MediaEndpoint};
use chrono::{DateTime, Utc};
use metrics::gauge;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

pub(crate) struct SessionWorker {
    pub(crate) context: CallContext,
    pub(crate) endpoint: Arc<dyn MediaEndpoint>,
    pub(crate) dialog: Arc<dyn Dialog>,
    pub(crate) router: BotEventRouter,
    pub(crate) playback: PlaybackController,
    pub(crate) dtmf: DtmfBridge,
    pub(crate) registry: TempResourceRegistry,
    pub(crate) notifier: NotificationBroadcaster,
    pub(crate) state: watch::Sender<SessionState>,
    pub(crate) connected_at: DateTime<Utc>,
    pub(crate) hang_up_on_close: bool,
    pub(crate) events: mpsc::UnboundedReceiver<SessionEvent>,
}

impl SessionWorker {
    pub(crate) async fn run(mut self) {
        // the playback controller holds a sender, so only teardown ends this
        while let Some(event) = self.events.recv().await {
            trace!(call_id = %self.context.call_id(), event = event.kind(), "Dispatching");
            if self.handle(event).await == Flow::Stop {
                break;
            }
        }

        self.drain_after_teardown().await;
    }

    async fn handle(&mut self, event: SessionEvent) -> Flow {
        match event {
            SessionEvent::Bot(event) => {
                for route in self.router.route(event) {
                    if self.apply(route).await == Flow::Stop {
                        return Flow::Stop;
                    }
                }
                Flow::Continue
            }
            SessionEvent::Dtmf(event) => {
                self.dtmf.forward(event);
                Flow::Continue
            }
            SessionEvent::SpeechReady { path } => {
                self.playback.on_speech_ready(path, &mut self.registry);
                Flow::Continue
            }
            SessionEvent::PlaybackFinished {
                token,
                path,
                outcome,
            } => {
                self.playback.on_finished(token, path, outcome);
                Flow::Continue
            }
            SessionEvent::DialogDestroyed => {
                self.teardown("dialog destroyed").await;
                Flow::Stop
            }
            SessionEvent::Hangup => {
                self.hangup().await;
                Flow::Stop
            }
        }
    }

    async fn apply(&mut self, route: Route) -> Flow {
        match route {
            Route::Notify(notification) => self.notifier.emit(notification),
            Route::Speak(message) => self.playback.speak(message),
            Route::Play(path) => self.playback.play(path, PromptSource::Engine),
            Route::Interrupt => self.playback.interrupt(),
            Route::EndConversation => {
                info!(call_id = %self.context.call_id(), "Bot closed the conversation");
                self.notifier.emit(SessionNotification::End(None));
                if self.hang_up_on_close {
                    self.hangup().await;
                    return Flow::Stop;
                }
            }
        }
        Flow::Continue
    }

    async fn hangup(&mut self) {
        if let Err(e) = self.dialog.destroy().await {
            error!(call_id = %self.context.call_id(), error = %e, "Error hanging up dialog");
        }
        self.teardown("local hangup").await;
    }

    /// The one teardown path. Runs at most once; every step is best-effort.
    async fn teardown(&mut self, reason: &str) {
        let mut state = *self.state.borrow();
        if state.transition(SessionState::Terminated).is_err() {
            debug!(call_id = %self.context.call_id(), reason, "Session already terminated");
            return;
        }
        self.state.send_replace(state);

        if let Err(e) = self.endpoint.destroy().await {
            info!(call_id = %self.context.call_id(), error = %e, "Error deleting endpoint");
        }

        let report = self.registry.clear().await;
        gauge!("lexgate_active_sessions").decrement(1.0);
        info!(
            call_id = %self.context.call_id(),
            reason,
            duration_secs = (Utc::now() - self.connected_at).num_seconds(),
            tmp_files = report.attempted,
            tmp_file_errors = report.failed,
            "call ended"
        );

        self.notifier.emit(SessionNotification::Terminated(report));
    }

    /// Close the queue; late arrivals become no-ops, except synthesized
    /// files that made it in before the close, which are still ours.
    async fn drain_after_teardown(&mut self) {
        self.events.close();
        while let Ok(event) = self.events.try_recv() {
            match event {
                SessionEvent::SpeechReady { path } => {
                    remove_file(Path::new(&path)).await;
                }
                other => debug!(call_id = %self.context.call_id(), event = other.kind(), "Dropped after teardown"),
            }
        }
    }
}
