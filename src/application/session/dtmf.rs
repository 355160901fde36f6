//! DTMF bridge: caller keypresses go straight to the bot, one command per digit

use crate::application::session::commands::CommandQueue;
use crate::domain::bot::command::EngineCommand;
use crate::domain::bot::event::dtmf_digit;
use crate::domain::call::notification::{NotificationBroadcaster, SessionNotification};
use crate::domain::shared::value_objects::{CallId, EndpointUuid};
use metrics::counter;
use serde_json::Value;
use tracing::{debug, warn};

pub struct DtmfBridge {
    call_id: CallId,
    uuid: EndpointUuid,
    commands: CommandQueue,
    notifier: NotificationBroadcaster,
}

impl DtmfBridge {
    pub fn new(
        call_id: CallId,
        uuid: EndpointUuid,
        commands: CommandQueue,
        notifier: NotificationBroadcaster,
    ) -> Self {
        Self {
            call_id,
            uuid,
            commands,
            notifier,
        }
    }

    /// Notify and forward one keypress. No buffering; order follows arrival.
    pub fn forward(&self, event: Value) {
        let digit = dtmf_digit(&event).map(str::to_string);
        self.notifier.emit(SessionNotification::Dtmf(event));

        match digit {
            Some(digit) => {
                debug!(call_id = %self.call_id, digit = %digit, "Forwarding dtmf");
                counter!("lexgate_dtmf_forwarded_total").increment(1);
                self.commands.submit(EngineCommand::dtmf(&self.uuid, &digit));
            }
            None => warn!(call_id = %self.call_id, "DTMF event without a digit"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::loopback::LoopbackEndpoint;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_forward_notifies_and_queues_digit() {
        let endpoint = Arc::new(LoopbackEndpoint::new("ep-7"));
        let (commands, worker) = CommandQueue::spawn(endpoint.clone(), CallId::new("c-7"));
        let notifier = NotificationBroadcaster::new(8);
        let mut rx = notifier.subscribe();

        let bridge = DtmfBridge::new(CallId::new("c-7"), EndpointUuid::new("ep-7"), commands, notifier);
        bridge.forward(json!({"dtmf": "5", "duration": "1600"}));
        bridge.forward(json!({"duration": "1600"}));
        drop(bridge);
        worker.await.unwrap();

        assert_eq!(rx.recv().await.unwrap().name(), "dtmf");
        assert_eq!(rx.recv().await.unwrap().name(), "dtmf");
        assert_eq!(
            endpoint.api_calls(),
            vec![("aws_lex_dtmf".to_string(), "ep-7 5".to_string())]
        );
    }
}
