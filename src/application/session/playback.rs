//! Playback controller
//!
//! Plays prompts on the endpoint, either synthesized locally from bot text
//! or handed over by the bot module as audio files. Synthesis and playback
//! run as detached tasks and report back through the session queue, so an
//! interruption can be handled while audio is still playing.

use crate::application::session::commands::{spawn_detached, CommandQueue};
use crate::application::session::event::SessionEvent;
use crate::application::session::temp_files::{remove_file, TempResourceRegistry};
use crate::domain::bot::command::EngineCommand;
use crate::domain::bot::event::SpokenMessage;
use crate::domain::bot::settings::TtsVoice;
use crate::domain::call::notification::{NotificationBroadcaster, SessionNotification};
use crate::domain::media::MediaEndpoint;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::CallId;
use crate::domain::speech::{SpeechSynthesizer, SynthesisRequest};
use metrics::{counter, histogram};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Identifies one playback attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PlaybackToken(u64);

/// How a playback ended, as far as the session is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Ran to its end, or was replaced by a newer prompt
    Played,
    /// Cut short by a `uuid_break`
    Interrupted,
}

/// Outstanding playbacks by token. Each token completes once, so play-done
/// goes out once per playback however many times its end is reported.
#[derive(Debug, Default)]
pub struct PlaybackTracker {
    last: u64,
    outstanding: BTreeMap<PlaybackToken, Completion>,
}

impl PlaybackTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) -> PlaybackToken {
        self.last += 1;
        let token = PlaybackToken(self.last);
        self.outstanding.insert(token, Completion::Played);
        token
    }

    /// Mark everything in flight as interrupted; returns how many
    pub fn interrupt(&mut self) -> usize {
        for completion in self.outstanding.values_mut() {
            *completion = Completion::Interrupted;
        }
        self.outstanding.len()
    }

    /// `Some` exactly once per token
    pub fn finish(&mut self, token: PlaybackToken) -> Option<Completion> {
        self.outstanding.remove(&token)
    }

    pub fn is_playing(&self) -> bool {
        !self.outstanding.is_empty()
    }
}

/// Where a prompt came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptSource {
    /// Written by the bot module; the file is not ours
    Engine,
    /// Synthesized for this session; tracked for deletion
    Synthesized,
}

impl PromptSource {
    fn as_str(&self) -> &'static str {
        match self {
            PromptSource::Engine => "engine",
            PromptSource::Synthesized => "tts",
        }
    }
}

pub struct PlaybackController {
    call_id: CallId,
    endpoint: Arc<dyn MediaEndpoint>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    voice: Option<TtsVoice>,
    tracker: PlaybackTracker,
    commands: CommandQueue,
    notifier: NotificationBroadcaster,
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl PlaybackController {
    pub(crate) fn new(
        call_id: CallId,
        endpoint: Arc<dyn MediaEndpoint>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        voice: Option<TtsVoice>,
        commands: CommandQueue,
        notifier: NotificationBroadcaster,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        Self {
            call_id,
            endpoint,
            synthesizer,
            voice,
            tracker: PlaybackTracker::new(),
            commands,
            notifier,
            events,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.tracker.is_playing()
    }

    /// Request synthesis of a bot message. The result re-enters the
    /// session queue as `SpeechReady`; if the session is gone by then the
    /// file is deleted here instead.
    pub fn speak(&self, message: SpokenMessage) {
        let Some(voice) = self.voice.as_ref() else {
            debug!(call_id = %self.call_id, "No TTS voice configured, ignoring text");
            return;
        };

        let request = SynthesisRequest::new(message.text, voice, self.call_id.as_str());
        let synthesizer = self.synthesizer.clone();
        let events = self.events.clone();
        let call_id = self.call_id.clone();

        debug!(call_id = %call_id, vendor = %request.vendor, voice = %request.voice, "tts");
        tokio::spawn(async move {
            let started = Instant::now();
            let synthesized = synthesizer.synthesize(&request).await;
            histogram!("lexgate_synthesis_duration_seconds").record(started.elapsed().as_secs_f64());

            match synthesized {
                Ok(path) if path.trim().is_empty() => {
                    counter!("lexgate_synthesis_failures_total").increment(1);
                    error!(call_id = %call_id, "Synthesizer returned no file, skipping playback");
                }
                Ok(path) => {
                    if let Err(returned) = events.send(SessionEvent::SpeechReady { path }) {
                        if let SessionEvent::SpeechReady { path } = returned.0 {
                            info!(call_id = %call_id, path = %path, "Session ended during synthesis, discarding audio");
                            remove_file(Path::new(&path)).await;
                        }
                    }
                }
                Err(e) => {
                    counter!("lexgate_synthesis_failures_total").increment(1);
                    error!(call_id = %call_id, error = %e, "Error synthesizing tts");
                }
            }
        });
    }

    /// Take ownership of a synthesized file and play it
    pub fn on_speech_ready(&mut self, path: String, registry: &mut TempResourceRegistry) {
        registry.track(&path);
        self.play(path, PromptSource::Synthesized);
    }

    /// Start playing a file
    pub fn play(&mut self, path: String, source: PromptSource) {
        let token = self.tracker.begin();
        counter!("lexgate_playbacks_total", "source" => source.as_str()).increment(1);
        debug!(call_id = %self.call_id, path = %path, ?token, "Starting playback");

        self.notifier.emit(SessionNotification::StartPlay { path: path.clone() });

        let endpoint = self.endpoint.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let outcome = endpoint.play(&path).await;
            // session may be gone; nothing left to report to
            let _ = events.send(SessionEvent::PlaybackFinished {
                token,
                path,
                outcome,
            });
        });
    }

    /// Bookkeeping once a playback resolves. Play-done follows every
    /// playback that ended normally or was broken off, once per token.
    pub fn on_finished(&mut self, token: PlaybackToken, path: String, outcome: Result<()>) {
        let Some(completion) = self.tracker.finish(token) else {
            debug!(call_id = %self.call_id, ?token, "Playback already finished, skipping play_done");
            return;
        };

        match (outcome, completion) {
            (Ok(()), _) => {}
            (Err(e), Completion::Interrupted) => {
                debug!(call_id = %self.call_id, path = %path, error = %e, "Interrupted playback ended");
            }
            (Err(e), Completion::Played) => {
                error!(call_id = %self.call_id, path = %path, error = %e, "Error playing file");
                return;
            }
        }

        self.notifier.emit(SessionNotification::StopPlay { path });
        debug!(call_id = %self.call_id, ?token, ?completion, "Finished playback, sending play_done");
        self.commands.submit(EngineCommand::play_done(&self.endpoint.uuid()));
    }

    /// Kill whatever is playing. Harmless when nothing is.
    pub fn interrupt(&mut self) {
        let playing = self.tracker.interrupt();
        if playing > 0 {
            debug!(call_id = %self.call_id, playing, "Interrupting playback");
        }

        spawn_detached(
            self.endpoint.clone(),
            EngineCommand::break_audio(&self.endpoint.uuid()),
            self.call_id.clone(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bot::command::{BREAK_COMMAND, PLAY_DONE_COMMAND};
    use crate::domain::bot::event::MessageKind;
    use crate::domain::speech::MockSpeechSynthesizer;
    use crate::infrastructure::loopback::LoopbackEndpoint;

    fn voice() -> TtsVoice {
        TtsVoice {
            vendor: "aws".to_string(),
            language: "en-US".to_string(),
            voice: "Joanna".to_string(),
        }
    }

    fn controller(
        endpoint: Arc<LoopbackEndpoint>,
        synthesizer: MockSpeechSynthesizer,
    ) -> (
        PlaybackController,
        tokio::task::JoinHandle<()>,
        mpsc::UnboundedReceiver<SessionEvent>,
        NotificationBroadcaster,
    ) {
        let call_id = CallId::new("c-1");
        let (commands, worker) = CommandQueue::spawn(endpoint.clone(), call_id.clone());
        let (tx, rx) = mpsc::unbounded_channel();
        let notifier = NotificationBroadcaster::new(16);
        let controller = PlaybackController::new(
            call_id,
            endpoint,
            Arc::new(synthesizer),
            Some(voice()),
            commands,
            notifier.clone(),
            tx,
        );
        (controller, worker, rx, notifier)
    }

    #[tokio::test]
    async fn test_speak_reports_synthesized_file() {
        let mut synthesizer = MockSpeechSynthesizer::new();
        synthesizer
            .expect_synthesize()
            .withf(|request| request.text == "Hello" && request.salt == "c-1" && request.voice == "Joanna")
            .times(1)
            .returning(|_| Ok("/tmp/hello.wav".to_string()));

        let endpoint = Arc::new(LoopbackEndpoint::new("ep-1"));
        let (controller, _worker, mut rx, _notifier) = controller(endpoint, synthesizer);
        controller.speak(SpokenMessage {
            kind: MessageKind::PlainText,
            text: "Hello".to_string(),
        });

        match rx.recv().await {
            Some(SessionEvent::SpeechReady { path }) => assert_eq!(path, "/tmp/hello.wav"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failed_synthesis_reports_nothing() {
        let mut synthesizer = MockSpeechSynthesizer::new();
        synthesizer
            .expect_synthesize()
            .times(1)
            .returning(|_| Err(crate::domain::shared::error::BridgeError::Synthesis("no voice".to_string())));

        let endpoint = Arc::new(LoopbackEndpoint::new("ep-1"));
        let (controller, _worker, mut rx, _notifier) = controller(endpoint, synthesizer);
        controller.speak(SpokenMessage {
            kind: MessageKind::PlainText,
            text: "Hello".to_string(),
        });
        drop(controller);

        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_finished_playback_sends_play_done() {
        let endpoint = Arc::new(LoopbackEndpoint::new("ep-1"));
        let (mut controller, worker, mut rx, notifier) =
            controller(endpoint.clone(), MockSpeechSynthesizer::new());
        let mut notifications = notifier.subscribe();

        controller.play("/tmp/prompt.wav".to_string(), PromptSource::Engine);
        let Some(SessionEvent::PlaybackFinished { token, path, outcome }) = rx.recv().await else {
            panic!("expected playback to finish");
        };
        controller.on_finished(token, path, outcome);
        assert!(!controller.is_playing());
        drop(controller);
        worker.await.unwrap();

        assert_eq!(notifications.recv().await.unwrap().name(), "start-play");
        assert_eq!(notifications.recv().await.unwrap().name(), "stop-play");
        assert_eq!(endpoint.commands_named(PLAY_DONE_COMMAND), vec!["ep-1"]);
    }

    #[tokio::test]
    async fn test_interrupted_playback_sends_play_done_once() {
        let endpoint = Arc::new(LoopbackEndpoint::new("ep-1"));
        let (mut controller, worker, mut rx, notifier) =
            controller(endpoint.clone(), MockSpeechSynthesizer::new());
        let mut notifications = notifier.subscribe();

        controller.play("/tmp/prompt.wav".to_string(), PromptSource::Engine);
        controller.interrupt();
        let Some(SessionEvent::PlaybackFinished { token, path, outcome }) = rx.recv().await else {
            panic!("expected playback to finish");
        };
        controller.on_finished(token, path.clone(), outcome);
        // a second report for the same playback is ignored
        controller.on_finished(token, path, Ok(()));
        drop(controller);
        worker.await.unwrap();

        while endpoint.commands_named(BREAK_COMMAND).is_empty() {
            tokio::task::yield_now().await;
        }
        assert_eq!(notifications.recv().await.unwrap().name(), "start-play");
        assert_eq!(notifications.recv().await.unwrap().name(), "stop-play");
        assert!(notifications.try_recv().is_err());
        assert_eq!(endpoint.commands_named(PLAY_DONE_COMMAND).len(), 1);
    }

    #[tokio::test]
    async fn test_empty_synthesis_result_is_not_played() {
        let mut synthesizer = MockSpeechSynthesizer::new();
        synthesizer
            .expect_synthesize()
            .times(1)
            .returning(|_| Ok(String::new()));

        let endpoint = Arc::new(LoopbackEndpoint::new("ep-1"));
        let (controller, _worker, mut rx, _notifier) = controller(endpoint.clone(), synthesizer);
        controller.speak(SpokenMessage {
            kind: MessageKind::PlainText,
            text: "Hello".to_string(),
        });
        drop(controller);

        assert!(rx.recv().await.is_none());
        assert!(endpoint.plays().is_empty());
    }

    #[test]
    fn test_tracker_finishes_once() {
        let mut tracker = PlaybackTracker::new();
        let token = tracker.begin();
        assert!(tracker.is_playing());
        assert_eq!(tracker.finish(token), Some(Completion::Played));
        assert_eq!(tracker.finish(token), None);
        assert!(!tracker.is_playing());
    }

    #[test]
    fn test_interrupted_playback_finishes_as_interrupted() {
        let mut tracker = PlaybackTracker::new();
        let token = tracker.begin();
        assert_eq!(tracker.interrupt(), 1);
        assert_eq!(tracker.finish(token), Some(Completion::Interrupted));
        assert_eq!(tracker.finish(token), None);
    }

    #[test]
    fn test_interrupt_when_idle() {
        let mut tracker = PlaybackTracker::new();
        assert_eq!(tracker.interrupt(), 0);

        let token = tracker.begin();
        assert_eq!(tracker.finish(token), Some(Completion::Played));
    }

    #[test]
    fn test_back_to_back_playbacks_each_finish() {
        let mut tracker = PlaybackTracker::new();
        let first = tracker.begin();
        let second = tracker.begin();
        assert!(second > first);

        assert_eq!(tracker.finish(first), Some(Completion::Played));
        assert!(tracker.is_playing());
        assert_eq!(tracker.finish(second), Some(Completion::Played));
        assert!(!tracker.is_playing());
    }
}
