use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use pipeline_domain::ports::MessageFeed;

use crate::commands::ingest_commands::{self, MessageOutcome};
use crate::AppState;

const FEED_ERROR_BACKOFF: Duration = Duration::from_millis(500);

/// Pulls messages until the feed closes or `shutdown` resolves.
///
/// Each message is handled on its own task, at most `max_in_flight` at a
/// time, with no ordering between messages. Handlers already started are
/// awaited before returning.
pub async fn run_ingestion_loop<F, S>(
    state: AppState,
    mut feed: F,
    shutdown: S,
) -> anyhow::Result<()>
where
    F: MessageFeed,
    S: Future<Output = ()>,
{
    let permits = Arc::new(Semaphore::new(state.config.max_in_flight.max(1)));
    let mut handlers = JoinSet::new();
    tokio::pin!(shutdown);

    loop {
        let permit = tokio::select! {
            biased;
            _ = &mut shutdown => break,
            permit = permits.clone().acquire_owned() => permit?,
        };
        let next = tokio::select! {
            biased;
            _ = &mut shutdown => break,
            next = feed.next_message() => next,
        };

        let message = match next {
            Some(Ok(message)) => message,
            Some(Err(err)) => {
                warn!(error = %err, "failed to receive from feed");
                tokio::select! {
                    biased;
                    _ = &mut shutdown => break,
                    _ = tokio::time::sleep(FEED_ERROR_BACKOFF) => continue,
                }
            }
            None => {
                info!("feed closed");
                break;
            }
        };

        let task_state = state.clone();
        handlers.spawn(async move {
            let _permit = permit;
            let message_id = message.id.clone();
            match ingest_commands::handle_message(&task_state, message).await {
                Ok(MessageOutcome::Acknowledged) => {}
                Ok(MessageOutcome::SubmissionFailed) => {
                    debug!(message_id = %message_id, "message acknowledged after sink failure");
                }
                Err(err) => {
                    error!(message_id = %message_id, error = %err, "message left unacknowledged");
                }
            }
        });

        while let Some(finished) = handlers.try_join_next() {
            if let Err(err) = finished {
                error!(error = %err, "message handler panicked");
            }
        }
    }

    if !handlers.is_empty() {
        info!(in_flight = handlers.len(), "waiting for in-flight messages");
    }
    while let Some(finished) = handlers.join_next().await {
        if let Err(err) = finished {
            error!(error = %err, "message handler panicked");
        }
    }
    Ok(())
}
