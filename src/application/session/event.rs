//! Events funneled into a session's single dispatch queue

use crate::application::session::playback::PlaybackToken;
use crate::domain::bot::event::BotEvent;
use crate::domain::shared::result::Result;
use serde_json::Value;

/// Everything a session reacts to, from every source, in arrival order
#[derive(Debug)]
pub(crate) enum SessionEvent {
    /// Custom event raised by the bot module on the endpoint
    Bot(BotEvent),
    /// Caller keypress on the endpoint
    Dtmf(Value),
    /// The far end tore the dialog down
    DialogDestroyed,
    /// Local hangup request
    Hangup,
    /// Synthesized prompt is ready to play
    SpeechReady { path: String },
    /// A playback started by this session stopped
    PlaybackFinished {
        token: PlaybackToken,
        path: String,
        outcome: Result<()>,
    },
}

impl SessionEvent {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            SessionEvent::Bot(event) => event.event_name(),
            SessionEvent::Dtmf(_) => "dtmf",
            SessionEvent::DialogDestroyed => "dialog-destroyed",
            SessionEvent::Hangup => "hangup",
            SessionEvent::SpeechReady { .. } => "speech-ready",
            SessionEvent::PlaybackFinished { .. } => "playback-finished",
        }
    }
}
