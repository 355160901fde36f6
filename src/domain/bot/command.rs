//! Endpoint API commands understood by the bot module

use crate::domain::bot::settings::SessionConfig;
use crate::domain::call::context::CallContext;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::EndpointUuid;

pub const START_COMMAND: &str = "aws_lex_start";
pub const PLAY_DONE_COMMAND: &str = "aws_lex_play_done";
pub const DTMF_COMMAND: &str = "aws_lex_dtmf";
/// Kills whatever audio is playing on a channel
pub const BREAK_COMMAND: &str = "uuid_break";

/// A command addressed to the media endpoint's API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCommand {
    pub name: &'static str,
    pub args: String,
}

impl EngineCommand {
    /// `aws_lex_start <uuid> <bot> <alias> <region> <locale> <welcome-intent> '<metadata>'`
    ///
    /// The welcome-intent slot stays empty when no initial event is configured.
    pub fn start(uuid: &EndpointUuid, config: &SessionConfig, context: &CallContext) -> Result<Self> {
        let mut args = format!(
            "{} {} {} {} {} ",
            uuid,
            config.bot.bot_id(),
            config.bot.alias_id(),
            config.bot.region(),
            config.locale
        );

        if let Some(intent) = config.welcome_intent.as_deref() {
            args.push_str(intent);
        }

        let metadata = serde_json::to_string(&context.metadata())?;
        args.push_str(&format!(" '{}'", metadata));

        Ok(Self {
            name: START_COMMAND,
            args,
        })
    }

    pub fn play_done(uuid: &EndpointUuid) -> Self {
        Self {
            name: PLAY_DONE_COMMAND,
            args: uuid.to_string(),
        }
    }

    pub fn dtmf(uuid: &EndpointUuid, digit: &str) -> Self {
        Self {
            name: DTMF_COMMAND,
            args: format!("{} {}", uuid, digit),
        }
    }

    pub fn break_audio(uuid: &EndpointUuid) -> Self {
        Self {
            name: BREAK_COMMAND,
            args: uuid.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bot::settings::AwsCredentials;
    use crate::domain::call::context::InboundCall;
    use crate::domain::shared::value_objects::BotName;

    fn config() -> SessionConfig {
        SessionConfig::new(
            BotName::new("BOT".to_string(), "ALIAS".to_string(), "us-east-1".to_string()),
            AwsCredentials {
                access_key_id: "AKID".to_string(),
                secret_access_key: "secret".to_string(),
            },
        )
    }

    fn context() -> CallContext {
        CallContext::new(&InboundCall::new(None, "1555", "1800", "abc@host"), None)
    }

    #[test]
    fn test_start_command_without_welcome_intent() {
        let uuid = EndpointUuid::new("ep-1");
        let cmd = EngineCommand::start(&uuid, &config(), &context()).unwrap();

        assert_eq!(cmd.name, START_COMMAND);
        assert_eq!(
            cmd.args,
            "ep-1 BOT ALIAS us-east-1 en_US  '{\"context\":{\"callerId\":\"anonymous\",\"from\":\"1555\",\"to\":\"1800\",\"callId\":\"abc@host\"}}'"
        );
    }

    #[test]
    fn test_start_command_with_welcome_intent() {
        let uuid = EndpointUuid::new("ep-1");
        let mut config = config().with_locale("de_DE");
        config.welcome_intent = Some("Welcome".to_string());

        let cmd = EngineCommand::start(&uuid, &config, &context()).unwrap();
        assert!(cmd.args.starts_with("ep-1 BOT ALIAS us-east-1 de_DE Welcome '"));
        assert!(cmd.args.ends_with("}'"));
    }

    #[test]
    fn test_simple_commands() {
        let uuid = EndpointUuid::new("ep-1");
        assert_eq!(EngineCommand::play_done(&uuid).args, "ep-1");
        assert_eq!(EngineCommand::dtmf(&uuid, "7").args, "ep-1 7");
        assert_eq!(EngineCommand::break_audio(&uuid).name, BREAK_COMMAND);
    }
}
