//! Bridge errors

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum BridgeError {
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Media server connection failed: {0}")]
    MediaConnect(String),

    #[error("Failed to connect caller: {0}")]
    ConnectCaller(String),

    #[error("Endpoint command {command} failed: {reason}")]
    Command { command: String, reason: String },

    #[error("Playback failed for {path}: {reason}")]
    Playback { path: String, reason: String },

    #[error("Speech synthesis failed: {0}")]
    Synthesis(String),

    #[error("Endpoint released: {0}")]
    EndpointGone(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BridgeError {
    pub fn command(command: &str, reason: impl ToString) -> Self {
        BridgeError::Command {
            command: command.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<std::io::Error> for BridgeError {
    fn from(err: std::io::Error) -> Self {
        BridgeError::Io(err.to_string())
    }
}

impl From<config::ConfigError> for BridgeError {
    fn from(err: config::ConfigError) -> Self {
        BridgeError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_error_display() {
        let err = BridgeError::command("aws_lex_start", "timeout");
        assert_eq!(err.to_string(), "Endpoint command aws_lex_start failed: timeout");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: BridgeError = io.into();
        assert!(matches!(err, BridgeError::Io(_)));
    }
}
