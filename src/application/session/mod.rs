//! Call session: one inbound call bridged to one bot session
//!
//! `CallSession::start` acquires the media endpoint, wires the bot event
//! listeners, pushes channel variables and starts the bot. From then on a
//! dedicated worker reacts to events until the call ends, and tears the
//! session down exactly once.

pub mod commands;
pub mod dtmf;
pub(crate) mod event;
pub mod playback;
pub mod router;
pub mod temp_files;
mod worker;

use crate::domain::bot::channel_vars::ChannelVariables;
use crate::domain::bot::command::EngineCommand;
use crate::domain::bot::event::{BotEvent, BOT_EVENTS};
use crate::domain::bot::settings::SessionConfig;
use crate::domain::call::context::{CallContext, InboundCall};
use crate::domain::call::notification::{NotificationBroadcaster, SessionNotification};
use crate::domain::call::state::SessionState;
use crate::domain::media::{BridgedCall, MediaResourceProvider};
use crate::domain::shared::error::BridgeError;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::{CallId, EndpointUuid};
use crate::domain::speech::SpeechSynthesizer;
use commands::CommandQueue;
use dtmf::DtmfBridge;
use event::SessionEvent;
use chrono::{DateTime, Utc};
use metrics::{counter, gauge};
use playback::PlaybackController;
use router::BotEventRouter;
use std::sync::Arc;
use temp_files::TempResourceRegistry;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, Instrument};
use worker::SessionWorker;

/// A call waiting to be bridged to the bot
pub struct CallSession {
    call: InboundCall,
    context: CallContext,
    config: Arc<SessionConfig>,
    media: Arc<dyn MediaResourceProvider>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    notifier: NotificationBroadcaster,
    state: SessionState,
}

impl CallSession {
    pub fn new(
        call: InboundCall,
        config: Arc<SessionConfig>,
        media: Arc<dyn MediaResourceProvider>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> Self {
        let context = CallContext::new(&call, config.platform.clone());
        Self {
            call,
            context,
            config,
            media,
            synthesizer,
            notifier: NotificationBroadcaster::default(),
            state: SessionState::Connecting,
        }
    }

    pub fn call_id(&self) -> &CallId {
        self.context.call_id()
    }

    pub fn context(&self) -> &CallContext {
        &self.context
    }

    /// Subscribe before `start` to see every notification
    pub fn subscribe(&self) -> broadcast::Receiver<SessionNotification> {
        self.notifier.subscribe()
    }

    /// Bridge the call and start the bot.
    ///
    /// Failing to reach the media server or to bridge the caller is fatal
    /// for this call: it is logged, `end` carries the error, and nothing is
    /// left registered. Everything after the endpoint is wired fails per
    /// operation and leaves the call up.
    pub async fn start(mut self) -> Result<SessionHandle> {
        counter!("lexgate_sessions_started_total").increment(1);

        let connected = self.media.connect(&self.config.media_server).await;
        let service = match connected {
            Ok(service) => service,
            Err(e) => return Err(self.abort(e)),
        };

        let bridged = service.connect_caller(&self.call).await;
        let BridgedCall { endpoint, dialog } = match bridged {
            Ok(bridged) => bridged,
            Err(e) => return Err(self.abort(e)),
        };

        let call_id = self.context.call_id().clone();
        let uuid = endpoint.uuid();
        let (events_tx, events_rx) = mpsc::unbounded_channel::<SessionEvent>();

        let destroyed = events_tx.clone();
        dialog.on_destroy(Box::new(move || {
            let _ = destroyed.send(SessionEvent::DialogDestroyed);
        }));

        for name in BOT_EVENTS {
            let tx = events_tx.clone();
            endpoint.add_custom_event_listener(
                name,
                Box::new(move |payload| {
                    if let Some(event) = BotEvent::from_custom_event(name, payload) {
                        let _ = tx.send(SessionEvent::Bot(event));
                    }
                }),
            );
        }

        let dtmf_tx = events_tx.clone();
        endpoint.on_dtmf(Box::new(move |payload| {
            let _ = dtmf_tx.send(SessionEvent::Dtmf(payload));
        }));

        self.state.transition(SessionState::Active)?;
        let connected_at = Utc::now();
        gauge!("lexgate_active_sessions").increment(1.0);
        info!(
            call_id = %call_id,
            uuid = %uuid,
            "call connected, starting lex bot {} using locale {}",
            self.config.bot,
            self.config.locale
        );

        // the bot reads these when it starts, so they go first
        let vars = ChannelVariables::for_session(&self.config);
        if let Err(e) = endpoint.set_variables(&vars).await {
            error!(call_id = %call_id, error = %e, "Error setting channel variables");
        }

        let (commands, _command_worker) = CommandQueue::spawn(endpoint.clone(), call_id.clone());
        match EngineCommand::start(&uuid, &self.config, &self.context) {
            Ok(command) => {
                debug!(call_id = %call_id, cmd = %command.args, "starting lex bot {}", self.config.bot);
                commands.submit(command);
            }
            Err(e) => error!(call_id = %call_id, error = %e, "Error building start command for {}", self.config.bot),
        }

        let (state_tx, state_rx) = watch::channel(self.state);
        let playback = PlaybackController::new(
            call_id.clone(),
            endpoint.clone(),
            self.synthesizer.clone(),
            self.config.tts.clone(),
            commands.clone(),
            self.notifier.clone(),
            events_tx.clone(),
        );
        let dtmf = DtmfBridge::new(call_id.clone(), uuid.clone(), commands, self.notifier.clone());

        let worker = SessionWorker {
            context: self.context.clone(),
            endpoint,
            dialog,
            router: BotEventRouter::new(self.config.use_tts()),
            playback,
            dtmf,
            registry: TempResourceRegistry::new(),
            notifier: self.notifier.clone(),
            state: state_tx,
            connected_at,
            hang_up_on_close: self.config.hang_up_on_close,
            events: events_rx,
        };

        let span = info_span!("session", call_id = %call_id);
        let task = tokio::spawn(worker.run().instrument(span));

        Ok(SessionHandle {
            call_id,
            uuid,
            events: events_tx,
            state: state_rx,
            connected_at,
            notifier: self.notifier,
            task,
        })
    }

    fn abort(mut self, err: BridgeError) -> BridgeError {
        counter!("lexgate_sessions_failed_total").increment(1);
        error!(call_id = %self.context.call_id(), error = %err, "Error connecting call");

        // Connecting -> Terminated is always valid here
        let _ = self.state.transition(SessionState::Terminated);
        self.notifier.emit(SessionNotification::End(Some(err.to_string())));
        err
    }
}

/// Handle to a running session
pub struct SessionHandle {
    call_id: CallId,
    uuid: EndpointUuid,
    events: mpsc::UnboundedSender<SessionEvent>,
    state: watch::Receiver<SessionState>,
    connected_at: DateTime<Utc>,
    notifier: NotificationBroadcaster,
    task: JoinHandle<()>,
}

impl SessionHandle {
    pub fn call_id(&self) -> &CallId {
        &self.call_id
    }

    pub fn endpoint_uuid(&self) -> &EndpointUuid {
        &self.uuid
    }

    /// When the caller was bridged
    pub fn connected_at(&self) -> DateTime<Utc> {
        self.connected_at
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionNotification> {
        self.notifier.subscribe()
    }

    /// Hang the call up. A no-op once the session has ended.
    pub fn hangup(&self) {
        if self.events.send(SessionEvent::Hangup).is_err() {
            debug!(call_id = %self.call_id, "Hangup after session end ignored");
        }
    }

    /// Wait for the session to finish its teardown
    pub async fn closed(self) -> Result<()> {
        self.task
            .await
            .map_err(|e| BridgeError::Internal(format!("session task failed: {}", e)))
    }
}
