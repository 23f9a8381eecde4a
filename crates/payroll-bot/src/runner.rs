//! Event loop that feeds inbound events through the worker pool.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::{Stream, StreamExt};
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use tracing::{error, info};
use worker_pool::{PoolError, WorkerPool};

use crate::bot::PayrollBot;
use crate::event::InboundEvent;

/// Tracked conversation tails before finished ones are pruned.
const PRUNE_THRESHOLD: usize = 1024;

/// Errors that stop the event loop.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("worker pool error: {0}")]
    Pool(#[from] PoolError),
}

/// Drives a [`PayrollBot`] from a stream of events.
///
/// Each event is handled on the worker pool. Events of one conversation are
/// handled in arrival order; different conversations run in parallel.
pub struct EventRunner {
    bot: Arc<PayrollBot>,
    pool: Arc<WorkerPool>,
}

impl EventRunner {
    pub fn new(bot: Arc<PayrollBot>, pool: Arc<WorkerPool>) -> Self {
        Self { bot, pool }
    }

    /// Handle events until the stream ends.
    ///
    /// Returns the number of events dispatched.
    pub async fn run<S>(&self, events: S) -> Result<usize, RunnerError>
    where
        S: Stream<Item = InboundEvent>,
    {
        self.run_with_shutdown(events, std::future::pending()).await
    }

    /// Handle events until the stream ends or `shutdown` completes.
    ///
    /// At the end of the stream, queued events are finished before
    /// returning. On shutdown, running events finish and queued ones are
    /// dropped.
    pub async fn run_with_shutdown<S, F>(&self, events: S, shutdown: F) -> Result<usize, RunnerError>
    where
        S: Stream<Item = InboundEvent>,
        F: Future<Output = ()>,
    {
        let mut events = std::pin::pin!(events);
        let mut shutdown = std::pin::pin!(shutdown);
        let mut tails: HashMap<i64, oneshot::Receiver<()>> = HashMap::new();
        let mut dispatched = 0usize;

        info!("Event runner started");
        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!("Shutdown requested after {} events", dispatched);
                    self.pool.shutdown().await;
                    return Ok(dispatched);
                }

                event = events.next() => {
                    let Some(event) = event else {
                        info!("Event stream ended after {} events", dispatched);
                        self.pool.drain().await;
                        return Ok(dispatched);
                    };
                    self.dispatch(event, &mut tails).await?;
                    dispatched += 1;
                }
            }
        }
    }

    async fn dispatch(
        &self,
        event: InboundEvent,
        tails: &mut HashMap<i64, oneshot::Receiver<()>>,
    ) -> Result<(), PoolError> {
        let conversation_id = event.conversation_id;
        let (done_tx, done_rx) = oneshot::channel();
        let previous = tails.insert(conversation_id, done_rx);

        if tails.len() > PRUNE_THRESHOLD {
            tails.retain(|_, rx| matches!(rx.try_recv(), Err(TryRecvError::Empty)));
        }

        let bot = self.bot.clone();
        self.pool
            .submit(async move {
                // The previous event was queued first, so it is running or done.
                if let Some(previous) = previous {
                    let _ = previous.await;
                }
                if let Err(e) = bot.handle_event(event).await {
                    error!(
                        "Failed to handle event in conversation {}: {}",
                        conversation_id, e
                    );
                }
                let _ = done_tx.send(());
            })
            .await
    }
}
