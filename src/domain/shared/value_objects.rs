//! Shared value objects used across multiple components

use serde::{Deserialize, Serialize};
use std::fmt;

/// Call identifier, taken from the signaling layer (SIP Call-ID)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallId(String);

impl CallId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Media endpoint identifier (channel uuid on the media server)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EndpointUuid(String);

impl EndpointUuid {
    pub fn new(uuid: impl Into<String>) -> Self {
        Self(uuid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EndpointUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Composite bot address: bot id, alias id and region
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BotName {
    bot_id: String,
    alias_id: String,
    region: String,
}

impl BotName {
    pub fn new(bot_id: String, alias_id: String, region: String) -> Self {
        Self {
            bot_id,
            alias_id,
            region,
        }
    }

    pub fn bot_id(&self) -> &str {
        &self.bot_id
    }

    pub fn alias_id(&self) -> &str {
        &self.alias_id
    }

    pub fn region(&self) -> &str {
        &self.region
    }
}

impl fmt::Display for BotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.bot_id, self.alias_id, self.region)
    }
}
