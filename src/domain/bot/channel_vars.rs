//! Channel variables read by the bot module when it starts

use crate::domain::bot::settings::SessionConfig;
use std::collections::BTreeMap;

pub const START_TIMEOUT_VAR: &str = "x-amz-lex:audio:start-timeout-ms";
pub const ACCESS_KEY_VAR: &str = "AWS_ACCESS_KEY_ID";
pub const SECRET_KEY_VAR: &str = "AWS_SECRET_ACCESS_KEY";
pub const USE_TTS_VAR: &str = "LEX_USE_TTS";
pub const WELCOME_MESSAGE_VAR: &str = "LEX_WELCOME_MESSAGE";

/// Variables pushed to the endpoint once, before the bot is started
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelVariables {
    vars: BTreeMap<String, String>,
}

impl ChannelVariables {
    pub fn for_session(config: &SessionConfig) -> Self {
        let mut vars = BTreeMap::new();

        if let Some(timeout) = config.start_timeout_ms {
            vars.insert(START_TIMEOUT_VAR.to_string(), timeout.to_string());
        }

        vars.insert(
            ACCESS_KEY_VAR.to_string(),
            config.credentials.access_key_id.clone(),
        );
        vars.insert(
            SECRET_KEY_VAR.to_string(),
            config.credentials.secret_access_key.clone(),
        );

        // tells the module to hand back text rather than audio
        if config.use_tts() {
            vars.insert(USE_TTS_VAR.to_string(), "1".to_string());
        }

        if let Some(message) = config.welcome_message.as_deref().filter(|m| !m.is_empty()) {
            vars.insert(WELCOME_MESSAGE_VAR.to_string(), message.to_string());
        }

        Self { vars }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bot::settings::{AwsCredentials, TtsVoice};
    use crate::domain::shared::value_objects::BotName;

    fn base_config() -> SessionConfig {
        SessionConfig::new(
            BotName::new("B".to_string(), "A".to_string(), "us-east-1".to_string()),
            AwsCredentials {
                access_key_id: "AKID".to_string(),
                secret_access_key: "secret".to_string(),
            },
        )
    }

    #[test]
    fn test_minimal_variables() {
        let vars = ChannelVariables::for_session(&base_config());
        assert_eq!(vars.len(), 2);
        assert_eq!(vars.get(ACCESS_KEY_VAR), Some("AKID"));
        assert_eq!(vars.get(SECRET_KEY_VAR), Some("secret"));
        assert_eq!(vars.get(USE_TTS_VAR), None);
    }

    #[test]
    fn test_optional_variables() {
        let mut config = base_config().with_tts(Some(TtsVoice {
            vendor: "V".to_string(),
            language: "L".to_string(),
            voice: "Voice1".to_string(),
        }));
        config.start_timeout_ms = Some(8000);
        config.welcome_message = Some("Welcome!".to_string());

        let vars = ChannelVariables::for_session(&config);
        assert_eq!(vars.get(START_TIMEOUT_VAR), Some("8000"));
        assert_eq!(vars.get(USE_TTS_VAR), Some("1"));
        assert_eq!(vars.get(WELCOME_MESSAGE_VAR), Some("Welcome!"));
    }

    #[test]
    fn test_empty_welcome_message_skipped() {
        let mut config = base_config();
        config.welcome_message = Some(String::new());
        assert_eq!(ChannelVariables::for_session(&config).get(WELCOME_MESSAGE_VAR), None);
    }
}
