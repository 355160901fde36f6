//! Loopback synthesizer
//!
//! Writes a silent telephony WAV per prompt, sized from the word count, so
//! the loopback endpoint has something real to play and the session has a
//! real file to clean up.

use crate::domain::shared::error::BridgeError;
use crate::domain::shared::result::Result;
use crate::domain::speech::{SpeechSynthesizer, SynthesisRequest};
use crate::infrastructure::loopback::wav;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::watch;
use tracing::debug;
use uuid::Uuid;

const SECONDS_PER_WORD: f64 = 0.35;

pub struct LoopbackSynthesizer {
    dir: PathBuf,
    fail: AtomicBool,
    held: watch::Sender<bool>,
    requests: Mutex<Vec<SynthesisRequest>>,
    produced: Mutex<Vec<PathBuf>>,
}

impl LoopbackSynthesizer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let (held, _) = watch::channel(false);
        Self {
            dir: dir.into(),
            fail: AtomicBool::new(false),
            held,
            requests: Mutex::new(Vec::new()),
            produced: Mutex::new(Vec::new()),
        }
    }

    /// Synthesize into the system temp directory
    pub fn in_temp_dir() -> Self {
        Self::new(std::env::temp_dir())
    }

    pub fn fail_requests(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    /// Park every synthesis until `release`
    pub fn hold(&self) {
        self.held.send_replace(true);
    }

    pub fn release(&self) {
        self.held.send_replace(false);
    }

    pub fn requests(&self) -> Vec<SynthesisRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    /// Every file written so far
    pub fn produced(&self) -> Vec<PathBuf> {
        self.produced
            .lock()
            .map(|produced| produced.clone())
            .unwrap_or_default()
    }

    fn file_name(request: &SynthesisRequest) -> String {
        let salt: String = request
            .salt
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
            .take(32)
            .collect();
        format!("tts-{}-{}.wav", salt, Uuid::new_v4().simple())
    }
}

#[async_trait]
impl SpeechSynthesizer for LoopbackSynthesizer {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<String> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        let mut held = self.held.subscribe();
        held.wait_for(|held| !*held)
            .await
            .map_err(|e| BridgeError::Internal(e.to_string()))?;

        if self.fail.load(Ordering::SeqCst) {
            return Err(BridgeError::Synthesis(format!(
                "{} voice {} unavailable",
                request.vendor, request.voice
            )));
        }

        let words = request.text.split_whitespace().count().max(1);
        let image = wav::silence(words as f64 * SECONDS_PER_WORD);
        let path = self.dir.join(Self::file_name(request));
        tokio::fs::write(&path, image).await?;

        debug!(path = %path.display(), words, "Synthesized prompt");
        if let Ok(mut produced) = self.produced.lock() {
            produced.push(path.clone());
        }
        Ok(path.to_string_lossy().into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bot::settings::TtsVoice;

    fn voice() -> TtsVoice {
        TtsVoice {
            vendor: "loopback".to_string(),
            language: "en-US".to_string(),
            voice: "Joanna".to_string(),
        }
    }

    #[tokio::test]
    async fn test_writes_playable_wav() {
        let synth = LoopbackSynthesizer::in_temp_dir();
        let request = SynthesisRequest::new("hello there caller", &voice(), "call-1");

        let path = synth.synthesize(&request).await.unwrap();
        let bytes = tokio::fs::read(&path).await.unwrap();
        let length = wav::duration(&bytes).unwrap();

        assert!(length > std::time::Duration::from_secs(1));
        assert!(path.contains("tts-call-1-"));
        assert_eq!(synth.requests(), vec![request]);

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_failure_writes_nothing() {
        let synth = LoopbackSynthesizer::in_temp_dir();
        synth.fail_requests();

        let request = SynthesisRequest::new("hi", &voice(), "call-2");
        assert!(matches!(
            synth.synthesize(&request).await,
            Err(BridgeError::Synthesis(_))
        ));
        assert!(synth.produced().is_empty());
    }
}
