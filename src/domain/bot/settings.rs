//! Per-process bot session settings, shared read-only by every call

use crate::domain::media::MediaServerAddress;
use crate::domain::shared::value_objects::BotName;

/// Default bot locale
pub const DEFAULT_LOCALE: &str = "en_US";

/// Voice used when responses are synthesized locally
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TtsVoice {
    pub vendor: String,
    pub language: String,
    pub voice: String,
}

impl TtsVoice {
    /// All three settings are required; any missing one keeps engine audio.
    pub fn resolve(
        vendor: Option<String>,
        language: Option<String>,
        voice: Option<String>,
    ) -> Option<Self> {
        let present = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        Some(Self {
            vendor: present(vendor)?,
            language: present(language)?,
            voice: present(voice)?,
        })
    }
}

/// AWS credentials handed to the bot module through channel variables
#[derive(Clone, PartialEq, Eq)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl std::fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .finish()
    }
}

/// Resolved session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub media_server: MediaServerAddress,
    pub bot: BotName,
    pub locale: String,
    pub credentials: AwsCredentials,
    /// Present iff responses are synthesized locally
    pub tts: Option<TtsVoice>,
    pub start_timeout_ms: Option<u64>,
    /// Event sent to the bot right at start
    pub welcome_intent: Option<String>,
    pub welcome_message: Option<String>,
    pub platform: Option<String>,
    /// Hang up the call when the bot closes the conversation
    pub hang_up_on_close: bool,
}

impl SessionConfig {
    pub fn new(bot: BotName, credentials: AwsCredentials) -> Self {
        Self {
            media_server: MediaServerAddress::default(),
            bot,
            locale: DEFAULT_LOCALE.to_string(),
            credentials,
            tts: None,
            start_timeout_ms: None,
            welcome_intent: None,
            welcome_message: None,
            platform: None,
            hang_up_on_close: true,
        }
    }

    pub fn with_tts(mut self, tts: Option<TtsVoice>) -> Self {
        self.tts = tts;
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn use_tts(&self) -> bool {
        self.tts.is_some()
    }
}
