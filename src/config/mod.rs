//! Configuration management
//!
//! Sources, lowest precedence first: built-in defaults, an optional TOML
//! file (`LEXGATE_CONFIG` or `config/lexgate.toml`), then environment
//! variables prefixed `LEXGATE_` with `__` between sections, e.g.
//! `LEXGATE_BOT__ALIAS_ID`.

use crate::domain::bot::settings::{AwsCredentials, SessionConfig, TtsVoice, DEFAULT_LOCALE};
use crate::domain::media::MediaServerAddress;
use crate::domain::shared::error::BridgeError;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::BotName;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

const CONFIG_PATH_VAR: &str = "LEXGATE_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/lexgate.toml";
const ENV_PREFIX: &str = "LEXGATE";
const REDACTED: &str = "<redacted>";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub media_server: MediaServerAddress,
    pub bot: BotConfig,
    pub aws: AwsConfig,
    pub tts: TtsConfig,
    pub session: SessionSettings,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub id: String,
    pub alias_id: String,
    pub region: String,
    pub locale: String,
    pub welcome_intent: Option<String>,
    pub welcome_message: Option<String>,
    pub start_timeout_ms: Option<u64>,
    pub platform: Option<String>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            id: String::new(),
            alias_id: String::new(),
            region: String::new(),
            locale: DEFAULT_LOCALE.to_string(),
            welcome_intent: None,
            welcome_message: None,
            start_timeout_ms: None,
            platform: None,
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AwsConfig {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl std::fmt::Debug for AwsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsConfig")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &REDACTED)
            .finish()
    }
}

/// Local synthesis; enabled only when all three are set
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsConfig {
    pub vendor: Option<String>,
    pub language: Option<String>,
    pub voice: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub hang_up_on_close: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            hang_up_on_close: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Prometheus scrape address; no exporter when unset
    pub listen: Option<SocketAddr>,
}

impl Config {
    /// Load from file and environment
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let path = Path::new(&path);

        let builder = config::Config::builder();
        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else {
            builder
        };

        let built = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        Ok(built.try_deserialize()?)
    }

    /// Parse a TOML document on top of the defaults
    pub fn from_toml(source: &str) -> Result<Self> {
        let built = config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?;

        Ok(built.try_deserialize()?)
    }

    /// The bot and its credentials are mandatory
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("bot.id", &self.bot.id),
            ("bot.alias_id", &self.bot.alias_id),
            ("bot.region", &self.bot.region),
            ("aws.access_key_id", &self.aws.access_key_id),
            ("aws.secret_access_key", &self.aws.secret_access_key),
        ];

        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(key, _)| *key)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(BridgeError::Config(format!("missing {}", missing.join(", "))))
        }
    }

    /// Resolve the immutable per-process session configuration
    pub fn session_config(&self) -> Result<SessionConfig> {
        self.validate()?;

        let bot = BotName::new(
            self.bot.id.clone(),
            self.bot.alias_id.clone(),
            self.bot.region.clone(),
        );
        let credentials = AwsCredentials {
            access_key_id: self.aws.access_key_id.clone(),
            secret_access_key: self.aws.secret_access_key.clone(),
        };
        let tts = TtsVoice::resolve(
            self.tts.vendor.clone(),
            self.tts.language.clone(),
            self.tts.voice.clone(),
        );

        let mut config = SessionConfig::new(bot, credentials)
            .with_locale(self.bot.locale.clone())
            .with_tts(tts);
        config.media_server = self.media_server.clone();
        config.start_timeout_ms = self.bot.start_timeout_ms;
        config.welcome_intent = non_blank(&self.bot.welcome_intent);
        config.welcome_message = non_blank(&self.bot.welcome_message);
        config.platform = non_blank(&self.bot.platform);
        config.hang_up_on_close = self.session.hang_up_on_close;

        Ok(config)
    }

    /// Effective configuration as TOML, secrets masked
    pub fn render(&self) -> Result<String> {
        let mut shown = self.clone();
        shown.media_server.secret = REDACTED.to_string();
        if !shown.aws.secret_access_key.is_empty() {
            shown.aws.secret_access_key = REDACTED.to_string();
        }

        toml::to_string_pretty(&shown).map_err(|e| BridgeError::Config(e.to_string()))
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.trim().is_empty()).cloned()
}
