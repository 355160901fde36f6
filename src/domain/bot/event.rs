//! Bot engine events as raised on the media endpoint

use serde_json::Value;

/// Custom endpoint event names raised by the bot module
pub const INTENT_EVENT: &str = "lex::intent";
pub const TRANSCRIPTION_EVENT: &str = "lex::transcription";
pub const AUDIO_PROVIDED_EVENT: &str = "lex::audio_provided";
pub const TEXT_RESPONSE_EVENT: &str = "lex::text_response";
pub const PLAYBACK_INTERRUPTION_EVENT: &str = "lex::playback_interruption";
pub const ERROR_EVENT: &str = "lex::error";

/// All six bot event names, in registration order
pub const BOT_EVENTS: [&str; 6] = [
    INTENT_EVENT,
    TRANSCRIPTION_EVENT,
    AUDIO_PROVIDED_EVENT,
    TEXT_RESPONSE_EVENT,
    PLAYBACK_INTERRUPTION_EVENT,
    ERROR_EVENT,
];

/// Normalized bot engine event. Payloads are opaque and passed through.
#[derive(Debug, Clone, PartialEq)]
pub enum BotEvent {
    Intent(Value),
    Transcription(Value),
    TextResponse(Value),
    AudioProvided(Value),
    PlaybackInterruption(Value),
    EngineError(Value),
}

impl BotEvent {
    /// Map a custom endpoint event onto its category
    pub fn from_custom_event(name: &str, payload: Value) -> Option<Self> {
        match name {
            INTENT_EVENT => Some(BotEvent::Intent(payload)),
            TRANSCRIPTION_EVENT => Some(BotEvent::Transcription(payload)),
            TEXT_RESPONSE_EVENT => Some(BotEvent::TextResponse(payload)),
            AUDIO_PROVIDED_EVENT => Some(BotEvent::AudioProvided(payload)),
            PLAYBACK_INTERRUPTION_EVENT => Some(BotEvent::PlaybackInterruption(payload)),
            ERROR_EVENT => Some(BotEvent::EngineError(payload)),
            _ => None,
        }
    }

    pub fn event_name(&self) -> &'static str {
        match self {
            BotEvent::Intent(_) => INTENT_EVENT,
            BotEvent::Transcription(_) => TRANSCRIPTION_EVENT,
            BotEvent::TextResponse(_) => TEXT_RESPONSE_EVENT,
            BotEvent::AudioProvided(_) => AUDIO_PROVIDED_EVENT,
            BotEvent::PlaybackInterruption(_) => PLAYBACK_INTERRUPTION_EVENT,
            BotEvent::EngineError(_) => ERROR_EVENT,
        }
    }
}

/// True when an intent's `sessionState.dialogAction.type` is `Close`
pub fn is_dialog_close(intent: &Value) -> bool {
    intent
        .pointer("/sessionState/dialogAction/type")
        .and_then(Value::as_str)
        .map(|kind| kind == "Close")
        .unwrap_or(false)
}

/// Kind of a bot text message that can be spoken
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    PlainText,
    Ssml,
}

impl MessageKind {
    pub fn parse(kind: &str) -> Option<Self> {
        match kind {
            "PlainText" => Some(MessageKind::PlainText),
            "SSML" => Some(MessageKind::Ssml),
            _ => None,
        }
    }
}

/// First message of a text response, when it is speakable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpokenMessage {
    pub kind: MessageKind,
    pub text: String,
}

/// Extract the first message of a text response if it is PlainText or SSML
/// with non-empty text. Other kinds (image cards, custom payloads) are skipped.
pub fn first_spoken_message(text_response: &Value) -> Option<SpokenMessage> {
    let first = text_response.get("messages")?.as_array()?.first()?;

    let kind = first
        .get("type")
        .or_else(|| first.get("contentType"))
        .and_then(Value::as_str)
        .and_then(MessageKind::parse)?;

    let text = first
        .get("msg")
        .or_else(|| first.get("content"))
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())?;

    Some(SpokenMessage {
        kind,
        text: text.to_string(),
    })
}

/// Path of the audio file written by the bot module
pub fn audio_path(audio_provided: &Value) -> Option<&str> {
    audio_provided
        .get("path")
        .and_then(Value::as_str)
        .filter(|path| !path.is_empty())
}

/// Digit carried by a DTMF endpoint event (`{"dtmf": "5", "duration": "1600"}`)
pub fn dtmf_digit(dtmf: &Value) -> Option<&str> {
    dtmf.get("dtmf")
        .and_then(Value::as_str)
        .filter(|digit| !digit.is_empty())
}
