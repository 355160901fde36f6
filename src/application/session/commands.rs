//! Fire-and-forget endpoint commands
//!
//! Bot engine commands go through a per-session FIFO worker so they reach
//! the engine in the order the session issued them (DTMF digits in
//! particular). Nothing on the session's critical path awaits them;
//! failures end in the log.

use crate::domain::bot::command::EngineCommand;
use crate::domain::media::MediaEndpoint;
use crate::domain::shared::value_objects::CallId;
use metrics::counter;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// Ordered queue of engine commands for one endpoint
#[derive(Clone)]
pub struct CommandQueue {
    tx: mpsc::UnboundedSender<EngineCommand>,
}

impl CommandQueue {
    /// Start the worker. It exits once the queue is dropped and drained.
    pub fn spawn(endpoint: Arc<dyn MediaEndpoint>, call_id: CallId) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<EngineCommand>();

        let handle = tokio::spawn(async move {
            while let Some(command) = rx.recv().await {
                execute(endpoint.as_ref(), &command, &call_id).await;
            }
        });

        (Self { tx }, handle)
    }

    pub fn submit(&self, command: EngineCommand) {
        if let Err(e) = self.tx.send(command) {
            debug!(command = e.0.name, "Command queue closed, dropping command");
        }
    }
}

/// Issue one command outside the queue, without waiting for it
pub fn spawn_detached(endpoint: Arc<dyn MediaEndpoint>, command: EngineCommand, call_id: CallId) {
    tokio::spawn(async move {
        execute(endpoint.as_ref(), &command, &call_id).await;
    });
}

async fn execute(endpoint: &dyn MediaEndpoint, command: &EngineCommand, call_id: &CallId) {
    match endpoint.api(command.name, &command.args).await {
        Ok(_) => debug!(call_id = %call_id, command = command.name, "Command sent"),
        Err(e) => {
            counter!("lexgate_engine_command_failures_total", "command" => command.name).increment(1);
            error!(call_id = %call_id, command = command.name, error = %e, "Error sending command");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::shared::value_objects::EndpointUuid;
    use crate::infrastructure::loopback::LoopbackEndpoint;

    #[tokio::test]
    async fn test_commands_keep_submission_order() {
        let endpoint = Arc::new(LoopbackEndpoint::new("ep-1"));
        let (queue, worker) = CommandQueue::spawn(endpoint.clone(), CallId::new("c-1"));
        let uuid = EndpointUuid::new("ep-1");

        for digit in ["1", "2", "3", "#"] {
            queue.submit(EngineCommand::dtmf(&uuid, digit));
        }
        drop(queue);
        worker.await.unwrap();

        let args: Vec<String> = endpoint.api_calls().into_iter().map(|(_, args)| args).collect();
        assert_eq!(args, vec!["ep-1 1", "ep-1 2", "ep-1 3", "ep-1 #"]);
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_the_queue() {
        let endpoint = Arc::new(LoopbackEndpoint::new("ep-1"));
        endpoint.fail_command(crate::domain::bot::command::PLAY_DONE_COMMAND);
        let (queue, worker) = CommandQueue::spawn(endpoint.clone(), CallId::new("c-1"));
        let uuid = EndpointUuid::new("ep-1");

        queue.submit(EngineCommand::play_done(&uuid));
        queue.submit(EngineCommand::dtmf(&uuid, "9"));
        drop(queue);
        worker.await.unwrap();

        assert_eq!(endpoint.api_calls().len(), 2);
    }
}
