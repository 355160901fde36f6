//! Speech synthesis port

use crate::domain::bot::settings::TtsVoice;
use crate::domain::shared::result::Result;
use serde::{Deserialize, Serialize};

/// Request to synthesize one prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisRequest {
    pub text: String,
    pub vendor: String,
    pub language: String,
    pub voice: String,
    /// Per-call salt so cached audio is never shared across calls
    pub salt: String,
}

impl SynthesisRequest {
    pub fn new(text: impl Into<String>, voice: &TtsVoice, salt: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            vendor: voice.vendor.clone(),
            language: voice.language.clone(),
            voice: voice.voice.clone(),
            salt: salt.into(),
        }
    }
}

/// Text-to-speech backend producing a playable file
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize and return the path of the audio file
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<String>;
}
