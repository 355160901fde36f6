//! Call session lifecycle

use crate::domain::shared::error::BridgeError;
use crate::domain::shared::result::Result;
use serde::{Deserialize, Serialize};

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Acquiring the media endpoint and starting the bot
    Connecting,
    /// Endpoint wired, bot events flowing
    Active,
    /// Torn down; nothing else may happen
    Terminated,
}

impl SessionState {
    /// Check if state transition is valid
    pub fn can_transition_to(&self, new_state: SessionState) -> bool {
        use SessionState::*;

        match (self, new_state) {
            (Connecting, Active) => true,
            (Connecting, Terminated) => true,
            (Active, Terminated) => true,
            (Terminated, _) => false,
            _ => false,
        }
    }

    /// Move to `new_state`, rejecting invalid transitions
    pub fn transition(&mut self, new_state: SessionState) -> Result<()> {
        if !self.can_transition_to(new_state) {
            return Err(BridgeError::InvalidStateTransition(format!(
                "Cannot transition from {:?} to {:?}",
                self, new_state
            )));
        }

        *self = new_state;
        Ok(())
    }

    pub fn as_str(&self) -> &str {
        match self {
            SessionState::Connecting => "connecting",
            SessionState::Active => "active",
            SessionState::Terminated => "terminated",
        }
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self, SessionState::Terminated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_state_transitions() {
        assert!(SessionState::Connecting.can_transition_to(SessionState::Active));
        assert!(SessionState::Connecting.can_transition_to(SessionState::Terminated));
        assert!(SessionState::Active.can_transition_to(SessionState::Terminated));
    }

    #[test]
    fn test_invalid_state_transitions() {
        assert!(!SessionState::Active.can_transition_to(SessionState::Connecting));
        assert!(!SessionState::Terminated.can_transition_to(SessionState::Active));
        assert!(!SessionState::Terminated.can_transition_to(SessionState::Terminated));
    }

    #[test]
    fn test_transition_is_final_once_terminated() {
        let mut state = SessionState::Connecting;
        state.transition(SessionState::Active).unwrap();
        state.transition(SessionState::Terminated).unwrap();
        assert!(state.is_terminated());
        assert!(state.transition(SessionState::Terminated).is_err());
    }
}
