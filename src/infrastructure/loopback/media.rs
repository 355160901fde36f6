//! In-process media server
//!
//! Stands in for the media server and the signaling dialog. Every command,
//! variable push and playback is recorded, and bot events, keypresses and
//! remote hangups can be injected.

use crate::domain::bot::channel_vars::ChannelVariables;
use crate::domain::bot::command::BREAK_COMMAND;
use crate::domain::call::context::InboundCall;
use crate::domain::media::{
    BridgedCall, DestroyListener, Dialog, EventListener, MediaEndpoint, MediaResourceProvider,
    MediaServerAddress, MediaService,
};
use crate::domain::shared::error::BridgeError;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::{CallId, EndpointUuid};
use crate::infrastructure::loopback::wav;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Notify;
use tracing::debug;
use uuid::Uuid;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// How `play` behaves
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayMode {
    /// Resolve at once without touching the file
    Immediate,
    /// Read the WAV and wait for its duration times `time_scale`
    Simulated { time_scale: f64 },
    /// Keep playing until `uuid_break`
    UntilBreak,
    /// Fail every playback
    Fail,
}

/// A loopback media endpoint
pub struct LoopbackEndpoint {
    uuid: EndpointUuid,
    play_mode: Mutex<PlayMode>,
    listeners: Mutex<HashMap<String, Vec<EventListener>>>,
    dtmf_listeners: Mutex<Vec<EventListener>>,
    variables: Mutex<Vec<ChannelVariables>>,
    plays: Mutex<Vec<String>>,
    api_calls: Mutex<Vec<(String, String)>>,
    failing_commands: Mutex<HashSet<String>>,
    fail_variables: AtomicBool,
    destroyed: AtomicUsize,
    breaks: Notify,
}

impl LoopbackEndpoint {
    pub fn new(uuid: impl Into<String>) -> Self {
        Self {
            uuid: EndpointUuid::new(uuid),
            play_mode: Mutex::new(PlayMode::Immediate),
            listeners: Mutex::new(HashMap::new()),
            dtmf_listeners: Mutex::new(Vec::new()),
            variables: Mutex::new(Vec::new()),
            plays: Mutex::new(Vec::new()),
            api_calls: Mutex::new(Vec::new()),
            failing_commands: Mutex::new(HashSet::new()),
            fail_variables: AtomicBool::new(false),
            destroyed: AtomicUsize::new(0),
            breaks: Notify::new(),
        }
    }

    pub fn set_play_mode(&self, mode: PlayMode) {
        *lock(&self.play_mode) = mode;
    }

    /// Make every `api` call for `command` fail
    pub fn fail_command(&self, command: &str) {
        lock(&self.failing_commands).insert(command.to_string());
    }

    pub fn fail_set_variables(&self) {
        self.fail_variables.store(true, Ordering::SeqCst);
    }

    /// Raise a custom event as the bot module would
    pub fn emit(&self, event_name: &str, payload: Value) {
        let listeners = lock(&self.listeners);
        match listeners.get(event_name) {
            Some(handlers) => handlers.iter().for_each(|handler| handler(payload.clone())),
            None => debug!(event = event_name, "No listener for loopback event"),
        }
    }

    /// Caller presses a key
    pub fn press(&self, digit: &str) {
        let payload = serde_json::json!({ "dtmf": digit, "duration": "1600" });
        lock(&self.dtmf_listeners)
            .iter()
            .for_each(|handler| handler(payload.clone()));
    }

    pub fn listener_count(&self, event_name: &str) -> usize {
        lock(&self.listeners).get(event_name).map(Vec::len).unwrap_or(0)
    }

    pub fn variables(&self) -> Vec<ChannelVariables> {
        lock(&self.variables).clone()
    }

    pub fn plays(&self) -> Vec<String> {
        lock(&self.plays).clone()
    }

    /// Every `api` call as `(command, args)`, failed ones included
    pub fn api_calls(&self) -> Vec<(String, String)> {
        lock(&self.api_calls).clone()
    }

    pub fn commands_named(&self, command: &str) -> Vec<String> {
        lock(&self.api_calls)
            .iter()
            .filter(|(name, _)| name == command)
            .map(|(_, args)| args.clone())
            .collect()
    }

    pub fn destroy_count(&self) -> usize {
        self.destroyed.load(Ordering::SeqCst)
    }

    async fn simulate(&self, path: &str, time_scale: f64) -> Result<()> {
        let bytes = tokio::fs::read(path).await.map_err(|e| BridgeError::Playback {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        let length = wav::duration(&bytes).ok_or_else(|| BridgeError::Playback {
            path: path.to_string(),
            reason: "not a WAV file".to_string(),
        })?;

        let length = length.mul_f64(time_scale.max(0.0));
        tokio::select! {
            _ = tokio::time::sleep(length) => {}
            _ = self.breaks.notified() => debug!(path = %path, "Playback broken"),
        }
        Ok(())
    }
}

#[async_trait]
impl MediaEndpoint for LoopbackEndpoint {
    fn uuid(&self) -> EndpointUuid {
        self.uuid.clone()
    }

    async fn set_variables(&self, vars: &ChannelVariables) -> Result<()> {
        if self.fail_variables.load(Ordering::SeqCst) {
            return Err(BridgeError::command("set", "channel gone"));
        }
        lock(&self.variables).push(vars.clone());
        Ok(())
    }

    async fn play(&self, path: &str) -> Result<()> {
        lock(&self.plays).push(path.to_string());
        let mode = *lock(&self.play_mode);

        match mode {
            PlayMode::Immediate => Ok(()),
            PlayMode::Simulated { time_scale } => self.simulate(path, time_scale).await,
            PlayMode::UntilBreak => {
                self.breaks.notified().await;
                Ok(())
            }
            PlayMode::Fail => Err(BridgeError::Playback {
                path: path.to_string(),
                reason: "file not found".to_string(),
            }),
        }
    }

    async fn api(&self, command: &str, args: &str) -> Result<String> {
        lock(&self.api_calls).push((command.to_string(), args.to_string()));

        if command == BREAK_COMMAND {
            self.breaks.notify_waiters();
        }

        if lock(&self.failing_commands).contains(command) {
            return Err(BridgeError::command(command, "-ERR loopback failure"));
        }
        Ok("+OK".to_string())
    }

    fn add_custom_event_listener(&self, event_name: &str, listener: EventListener) {
        lock(&self.listeners)
            .entry(event_name.to_string())
            .or_default()
            .push(listener);
    }

    fn on_dtmf(&self, listener: EventListener) {
        lock(&self.dtmf_listeners).push(listener);
    }

    async fn destroy(&self) -> Result<()> {
        let previous = self.destroyed.fetch_add(1, Ordering::SeqCst);
        lock(&self.listeners).clear();
        lock(&self.dtmf_listeners).clear();

        if previous > 0 {
            return Err(BridgeError::EndpointGone(self.uuid.to_string()));
        }
        Ok(())
    }
}

/// A loopback signaling dialog
pub struct LoopbackDialog {
    call_id: CallId,
    on_destroy: Mutex<Option<DestroyListener>>,
    local_hangups: AtomicUsize,
}

impl LoopbackDialog {
    pub fn new(call_id: CallId) -> Self {
        Self {
            call_id,
            on_destroy: Mutex::new(None),
            local_hangups: AtomicUsize::new(0),
        }
    }

    /// The far end hangs up (BYE received)
    pub fn hang_up_remote(&self) {
        let listener = lock(&self.on_destroy).take();
        match listener {
            Some(listener) => listener(),
            None => debug!(call_id = %self.call_id, "Dialog already destroyed"),
        }
    }

    pub fn local_hangups(&self) -> usize {
        self.local_hangups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Dialog for LoopbackDialog {
    fn call_id(&self) -> CallId {
        self.call_id.clone()
    }

    fn on_destroy(&self, listener: DestroyListener) {
        *lock(&self.on_destroy) = Some(listener);
    }

    async fn destroy(&self) -> Result<()> {
        self.local_hangups.fetch_add(1, Ordering::SeqCst);
        // we sent the BYE; no destroy event follows for our own hangup
        lock(&self.on_destroy).take();
        Ok(())
    }
}

/// One bridged call, as handed out by the loopback server
#[derive(Clone)]
pub struct LoopbackCall {
    pub endpoint: Arc<LoopbackEndpoint>,
    pub dialog: Arc<LoopbackDialog>,
}


struct ServerState {
    play_mode: PlayMode,
    fail_connect: AtomicBool,
    fail_bridge: AtomicBool,
    connects: AtomicUsize,
    calls: Mutex<Vec<LoopbackCall>>,
}

/// Loopback media server: resource provider and media service in one
#[derive(Clone)]
pub struct LoopbackMediaServer {
    state: Arc<ServerState>,
}

impl LoopbackMediaServer {
    pub fn new(play_mode: PlayMode) -> Self {
        Self {
            state: Arc::new(ServerState {
                play_mode,
                fail_connect: AtomicBool::new(false),
                fail_bridge: AtomicBool::new(false),
                connects: AtomicUsize::new(0),
                calls: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Refuse the next connections
    pub fn fail_connect(&self) {
        self.state.fail_connect.store(true, Ordering::SeqCst);
    }

    /// Connect, but fail to bridge callers
    pub fn fail_bridge(&self) {
        self.state.fail_bridge.store(true, Ordering::SeqCst);
    }

    pub fn connect_count(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<LoopbackCall> {
        lock(&self.state.calls).clone()
    }

    pub fn last_call(&self) -> Option<LoopbackCall> {
        lock(&self.state.calls).last().cloned()
    }
}

#[async_trait]
impl MediaResourceProvider for LoopbackMediaServer {
    async fn connect(&self, address: &MediaServerAddress) -> Result<Arc<dyn MediaService>> {
        self.state.connects.fetch_add(1, Ordering::SeqCst);

        if self.state.fail_connect.load(Ordering::SeqCst) {
            return Err(BridgeError::MediaConnect(format!(
                "{}:{}: connection refused",
                address.host, address.port
            )));
        }

        debug!(host = %address.host, port = address.port, "Connected to loopback media server");
        Ok(Arc::new(self.clone()))
    }
}

#[async_trait]
impl MediaService for LoopbackMediaServer {
    async fn connect_caller(&self, call: &InboundCall) -> Result<BridgedCall> {
        if self.state.fail_bridge.load(Ordering::SeqCst) {
            return Err(BridgeError::ConnectCaller(format!(
                "{}: 488 Not Acceptable Here",
                call.call_id
            )));
        }

        let endpoint = Arc::new(LoopbackEndpoint::new(Uuid::new_v4().to_string()));
        endpoint.set_play_mode(self.state.play_mode);
        let dialog = Arc::new(LoopbackDialog::new(call.call_id.clone()));

        lock(&self.state.calls).push(LoopbackCall {
            endpoint: endpoint.clone(),
            dialog: dialog.clone(),
        });

        Ok(BridgedCall {
            endpoint,
            dialog,
        })
    }
}
