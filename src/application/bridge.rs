//! Entry point for inbound calls
//!
//! Holds what every call shares: the resolved session configuration, the
//! media resource provider and the speech backend.

use crate::application::notification_log::spawn_notification_logger;
use crate::application::session::{CallSession, SessionHandle};
use crate::domain::bot::settings::SessionConfig;
use crate::domain::call::context::InboundCall;
use crate::domain::media::MediaResourceProvider;
use crate::domain::shared::result::Result;
use crate::domain::speech::SpeechSynthesizer;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct LexBridge {
    config: Arc<SessionConfig>,
    media: Arc<dyn MediaResourceProvider>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
}

impl LexBridge {
    pub fn new(
        config: SessionConfig,
        media: Arc<dyn MediaResourceProvider>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            media,
            synthesizer,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Bridge one inbound call to the bot, with its notifications logged.
    pub async fn handle_inbound_call(&self, call: InboundCall) -> Result<SessionHandle> {
        info!(
            call_id = %call.call_id,
            from = %call.calling_number,
            to = %call.called_number,
            "Inbound call"
        );

        let session = CallSession::new(
            call,
            self.config.clone(),
            self.media.clone(),
            self.synthesizer.clone(),
        );
        spawn_notification_logger(session.call_id().clone(), session.subscribe());

        session.start().await
    }
}
