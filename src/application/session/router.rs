//! Bot event router
//!
//! Turns each normalized bot event into the actions the session must
//! take. Routing is pure; the session worker executes the actions.

use crate::domain::bot::event::{audio_path, first_spoken_message, is_dialog_close, BotEvent, SpokenMessage};
use crate::domain::call::notification::SessionNotification;
use tracing::{debug, warn};

/// One action derived from a bot event
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    Notify(SessionNotification),
    /// Synthesize and play bot text
    Speak(SpokenMessage),
    /// Play an audio file supplied by the bot module
    Play(String),
    /// Kill current audio
    Interrupt,
    /// The bot closed the conversation
    EndConversation,
}

#[derive(Debug, Clone, Copy)]
pub struct BotEventRouter {
    use_tts: bool,
}

impl BotEventRouter {
    pub fn new(use_tts: bool) -> Self {
        Self { use_tts }
    }

    /// Actions for one event, in the order they must run
    pub fn route(&self, event: BotEvent) -> Vec<Route> {
        match event {
            BotEvent::Intent(intent) => {
                let close = is_dialog_close(&intent);
                let mut routes = vec![Route::Notify(SessionNotification::Intent(intent))];
                if close {
                    routes.push(Route::EndConversation);
                }
                routes
            }
            BotEvent::Transcription(transcript) => {
                vec![Route::Notify(SessionNotification::Transcription(transcript))]
            }
            BotEvent::TextResponse(response) => {
                let spoken = if self.use_tts {
                    first_spoken_message(&response)
                } else {
                    None
                };

                let mut routes = vec![Route::Notify(SessionNotification::Text(response))];
                if let Some(message) = spoken {
                    routes.push(Route::Speak(message));
                }
                routes
            }
            BotEvent::AudioProvided(audio) => {
                // in TTS mode the module's audio is never played
                if self.use_tts {
                    debug!("Ignoring bot audio, TTS mode");
                    return Vec::new();
                }

                match audio_path(&audio) {
                    Some(path) => vec![Route::Play(path.to_string())],
                    None => {
                        warn!(event = %audio, "Audio event without a path");
                        Vec::new()
                    }
                }
            }
            BotEvent::PlaybackInterruption(evt) => vec![
                Route::Notify(SessionNotification::PlaybackInterrupted(evt)),
                Route::Interrupt,
            ],
            BotEvent::EngineError(err) => vec![Route::Notify(SessionNotification::Error(err))],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bot::event::MessageKind;
    use serde_json::json;

    #[test]
    fn test_close_intent_ends_after_intent() {
        let router = BotEventRouter::new(false);
        let intent = json!({"sessionState": {"dialogAction": {"type": "Close"}}});

        let routes = router.route(BotEvent::Intent(intent.clone()));
        assert_eq!(
            routes,
            vec![
                Route::Notify(SessionNotification::Intent(intent)),
                Route::EndConversation
            ]
        );
    }

    #[test]
    fn test_open_intent_only_notifies() {
        let router = BotEventRouter::new(false);
        let intent = json!({"sessionState": {"dialogAction": {"type": "ElicitSlot"}}});
        assert_eq!(router.route(BotEvent::Intent(intent)).len(), 1);
    }

    #[test]
    fn test_text_response_speaks_only_in_tts_mode() {
        let response = json!({"messages": [{"type": "PlainText", "msg": "Hello"}]});

        let routes = BotEventRouter::new(true).route(BotEvent::TextResponse(response.clone()));
        assert_eq!(routes.len(), 2);
        assert_eq!(
            routes[1],
            Route::Speak(SpokenMessage {
                kind: MessageKind::PlainText,
                text: "Hello".to_string()
            })
        );

        let routes = BotEventRouter::new(false).route(BotEvent::TextResponse(response.clone()));
        assert_eq!(routes, vec![Route::Notify(SessionNotification::Text(response))]);
    }

    #[test]
    fn test_audio_played_only_without_tts() {
        let audio = json!({"path": "/tmp/b.wav"});

        assert_eq!(
            BotEventRouter::new(false).route(BotEvent::AudioProvided(audio.clone())),
            vec![Route::Play("/tmp/b.wav".to_string())]
        );
        assert!(BotEventRouter::new(true).route(BotEvent::AudioProvided(audio)).is_empty());
        assert!(BotEventRouter::new(false).route(BotEvent::AudioProvided(json!({}))).is_empty());
    }

    #[test]
    fn test_interruption_notifies_then_interrupts() {
        let routes = BotEventRouter::new(false).route(BotEvent::PlaybackInterruption(json!({})));
        assert_eq!(
            routes,
            vec![
                Route::Notify(SessionNotification::PlaybackInterrupted(json!({}))),
                Route::Interrupt
            ]
        );
    }

    #[test]
    fn test_pass_through_events() {
        let router = BotEventRouter::new(true);
        let payload = json!({"transcript": "book a room", "confidence": 0.93});

        assert_eq!(
            router.route(BotEvent::Transcription(payload.clone())),
            vec![Route::Notify(SessionNotification::Transcription(payload.clone()))]
        );
        assert_eq!(
            router.route(BotEvent::EngineError(payload.clone())),
            vec![Route::Notify(SessionNotification::Error(payload))]
        );
    }
}
