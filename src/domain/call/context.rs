//! Per-call identity and the metadata handed to the bot engine

use crate::domain::shared::value_objects::CallId;
use serde::{Deserialize, Serialize};

/// Metadata key carrying the channel platform tag
pub const PLATFORM_METADATA_KEY: &str = "x-amz-lex:channels:platform";

/// Inbound call notification as delivered by the signaling layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundCall {
    /// Caller display name, if the INVITE carried one
    pub calling_name: Option<String>,
    /// Caller number (user part of the From URI)
    pub calling_number: String,
    /// Called number (user part of the Request-URI)
    pub called_number: String,
    /// SIP Call-ID
    pub call_id: CallId,
}

impl InboundCall {
    pub fn new(
        calling_name: Option<String>,
        calling_number: impl Into<String>,
        called_number: impl Into<String>,
        call_id: impl Into<String>,
    ) -> Self {
        Self {
            calling_name,
            calling_number: calling_number.into(),
            called_number: called_number.into(),
            call_id: CallId::new(call_id),
        }
    }
}

/// Immutable call identity, created once per session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallContext {
    caller_id: String,
    from: String,
    to: String,
    call_id: CallId,
    platform: Option<String>,
}

impl CallContext {
    pub fn new(call: &InboundCall, platform: Option<String>) -> Self {
        let caller_id = call
            .calling_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or("anonymous")
            .to_string();

        Self {
            caller_id,
            from: call.calling_number.clone(),
            to: call.called_number.clone(),
            call_id: call.call_id.clone(),
            platform,
        }
    }

    pub fn caller_id(&self) -> &str {
        &self.caller_id
    }

    pub fn from(&self) -> &str {
        &self.from
    }

    pub fn to(&self) -> &str {
        &self.to
    }

    pub fn call_id(&self) -> &CallId {
        &self.call_id
    }

    pub fn platform(&self) -> Option<&str> {
        self.platform.as_deref()
    }

    /// Metadata payload embedded in the bot start command
    pub fn metadata(&self) -> CallMetadata {
        CallMetadata {
            context: ContextPayload {
                caller_id: self.caller_id.clone(),
                from: self.from.clone(),
                to: self.to.clone(),
                call_id: self.call_id.to_string(),
            },
            platform: self.platform.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextPayload {
    #[serde(rename = "callerId")]
    pub caller_id: String,
    pub from: String,
    pub to: String,
    #[serde(rename = "callId")]
    pub call_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallMetadata {
    pub context: ContextPayload,
    #[serde(
        rename = "x-amz-lex:channels:platform",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub platform: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_anonymous_caller() {
        let call = InboundCall::new(None, "15551230000", "18005550100", "abc@host");
        let context = CallContext::new(&call, None);
        assert_eq!(context.caller_id(), "anonymous");

        let call = InboundCall::new(Some(String::new()), "1555", "1800", "abc@host");
        assert_eq!(CallContext::new(&call, None).caller_id(), "anonymous");
    }

    #[test]
    fn test_metadata_serialization() {
        let call = InboundCall::new(Some("Alice".to_string()), "1555", "1800", "abc@host");
        let context = CallContext::new(&call, None);

        let value = serde_json::to_value(context.metadata()).unwrap();
        assert_eq!(
            value,
            json!({
                "context": {
                    "callerId": "Alice",
                    "from": "1555",
                    "to": "1800",
                    "callId": "abc@host"
                }
            })
        );
    }

    #[test]
    fn test_metadata_with_platform() {
        let call = InboundCall::new(None, "1555", "1800", "abc@host");
        let context = CallContext::new(&call, Some("Genesys".to_string()));

        let value = serde_json::to_value(context.metadata()).unwrap();
        assert_eq!(value[PLATFORM_METADATA_KEY], "Genesys");
    }
}
