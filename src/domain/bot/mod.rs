//! Bot engine vocabulary: events it raises, commands it accepts, and the
//! settings a session starts it with

pub mod channel_vars;
pub mod command;
pub mod event;
pub mod settings;

pub use channel_vars::ChannelVariables;
pub use command::EngineCommand;
pub use event::{BotEvent, MessageKind, SpokenMessage};
pub use settings::{AwsCredentials, SessionConfig, TtsVoice};
