//! Media server ports
//!
//! These traits are implemented by adapters in the infrastructure layer.
//! The session only ever talks to the media server and the signaling
//! dialog through them.

use crate::domain::bot::channel_vars::ChannelVariables;
use crate::domain::call::context::InboundCall;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::{CallId, EndpointUuid};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Callback for a named endpoint event; receives the event body
pub type EventListener = Box<dyn Fn(Value) + Send + Sync>;

/// Callback run once when the dialog is torn down
pub type DestroyListener = Box<dyn FnOnce() + Send>;

/// Address of the media server's control socket
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaServerAddress {
    pub host: String,
    pub port: u16,
    pub secret: String,
}

impl fmt::Debug for MediaServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaServerAddress")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl Default for MediaServerAddress {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8021,
            secret: "ClueCon".to_string(),
        }
    }
}

/// Entry point to the media server
#[async_trait]
pub trait MediaResourceProvider: Send + Sync {
    /// Open a control connection to a media server
    async fn connect(&self, address: &MediaServerAddress) -> Result<Arc<dyn MediaService>>;
}

/// A connected media server
#[async_trait]
pub trait MediaService: Send + Sync {
    /// Answer the inbound call onto a new endpoint
    async fn connect_caller(&self, call: &InboundCall) -> Result<BridgedCall>;
}

/// Endpoint and dialog produced by bridging one caller
pub struct BridgedCall {
    pub endpoint: Arc<dyn MediaEndpoint>,
    pub dialog: Arc<dyn Dialog>,
}

/// A media endpoint (one channel on the media server)
#[async_trait]
pub trait MediaEndpoint: Send + Sync {
    fn uuid(&self) -> EndpointUuid;

    async fn set_variables(&self, vars: &ChannelVariables) -> Result<()>;

    /// Play a file; resolves when playback stops
    async fn play(&self, path: &str) -> Result<()>;

    /// Run an API command against this endpoint
    async fn api(&self, command: &str, args: &str) -> Result<String>;

    fn add_custom_event_listener(&self, event_name: &str, listener: EventListener);

    fn on_dtmf(&self, listener: EventListener);

    /// Release the endpoint on the media server
    async fn destroy(&self) -> Result<()>;
}

/// The signaling dialog of the bridged call
#[async_trait]
pub trait Dialog: Send + Sync {
    fn call_id(&self) -> CallId;

    /// Register the teardown callback for a hangup from the far end
    fn on_destroy(&self, listener: DestroyListener);

    /// Hang up from our side
    async fn destroy(&self) -> Result<()>;
}
