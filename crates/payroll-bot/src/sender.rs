//! Message sender trait and implementations.

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::BotError;
use crate::reply::Reply;

/// Trait for delivering replies and acknowledging button presses.
///
/// Abstracted to support different transports (chat platforms, the console,
/// tests, etc.)
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Send a new message to the conversation.
    async fn send(&self, conversation_id: i64, reply: &Reply) -> Result<(), BotError>;

    /// Amend the most recent outbound message in place.
    ///
    /// Transports may fail here when the message is too old or unchanged;
    /// [`deliver`](Self::deliver) falls back to [`send`](Self::send).
    async fn edit(&self, conversation_id: i64, reply: &Reply) -> Result<(), BotError>;

    /// Acknowledge a button press so the transport can clear its pending
    /// indicator.
    async fn acknowledge(&self, callback_id: &str) -> Result<(), BotError>;

    /// Deliver a reply, amending in place when the reply asks for it.
    ///
    /// A failed amendment is logged and retried as a fresh send.
    async fn deliver(&self, conversation_id: i64, reply: &Reply) -> Result<(), BotError> {
        if !reply.amend {
            return self.send(conversation_id, reply).await;
        }
        match self.edit(conversation_id, reply).await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(
                    "Could not amend message in conversation {}, sending new one: {}",
                    conversation_id, e
                );
                self.send(conversation_id, reply).await
            }
        }
    }
}

/// A no-op message sender for testing that discards all messages.
#[derive(Debug, Clone, Default)]
pub struct NoOpSender;

#[async_trait]
impl MessageSender for NoOpSender {
    async fn send(&self, _conversation_id: i64, _reply: &Reply) -> Result<(), BotError> {
        Ok(())
    }

    async fn edit(&self, _conversation_id: i64, _reply: &Reply) -> Result<(), BotError> {
        Ok(())
    }

    async fn acknowledge(&self, _callback_id: &str) -> Result<(), BotError> {
        Ok(())
    }
}

/// A logging message sender for debugging that logs all operations.
#[derive(Debug, Clone, Default)]
pub struct LoggingSender;

#[async_trait]
impl MessageSender for LoggingSender {
    async fn send(&self, conversation_id: i64, reply: &Reply) -> Result<(), BotError> {
        info!("[send] {}: {}", conversation_id, reply.text);
        Ok(())
    }

    async fn edit(&self, conversation_id: i64, reply: &Reply) -> Result<(), BotError> {
        info!("[edit] {}: {}", conversation_id, reply.text);
        Ok(())
    }

    async fn acknowledge(&self, callback_id: &str) -> Result<(), BotError> {
        info!("[ack] {}", callback_id);
        Ok(())
    }
}

/// How a recorded reply reached the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    Edited,
}

/// A reply captured by [`RecordingSender`].
#[derive(Debug, Clone)]
pub struct Recorded {
    pub conversation_id: i64,
    pub reply: Reply,
    pub delivery: Delivery,
}

#[derive(Debug, Default)]
struct Recording {
    replies: Vec<Recorded>,
    acknowledged: Vec<String>,
}

/// A sender that keeps everything it is asked to deliver.
///
/// Edits and acknowledgements can be made to fail to exercise fallbacks.
#[derive(Debug, Default)]
pub struct RecordingSender {
    recording: Mutex<Recording>,
    fail_edits: bool,
    fail_acks: bool,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every [`edit`](MessageSender::edit).
    pub fn failing_edits(mut self) -> Self {
        self.fail_edits = true;
        self
    }

    /// Reject every [`acknowledge`](MessageSender::acknowledge).
    pub fn failing_acks(mut self) -> Self {
        self.fail_acks = true;
        self
    }

    /// Everything delivered so far, oldest first.
    pub async fn replies(&self) -> Vec<Recorded> {
        self.recording.lock().await.replies.clone()
    }

    /// The most recent reply, if any.
    pub async fn last(&self) -> Option<Recorded> {
        self.recording.lock().await.replies.last().cloned()
    }

    /// Callback ids acknowledged so far.
    pub async fn acknowledged(&self) -> Vec<String> {
        self.recording.lock().await.acknowledged.clone()
    }

    /// Forget everything recorded so far.
    pub async fn clear(&self) {
        let mut recording = self.recording.lock().await;
        recording.replies.clear();
        recording.acknowledged.clear();
    }

    async fn record(&self, conversation_id: i64, reply: &Reply, delivery: Delivery) {
        self.recording.lock().await.replies.push(Recorded {
            conversation_id,
            reply: reply.clone(),
            delivery,
        });
    }
}

#[async_trait]
impl MessageSender for RecordingSender {
    async fn send(&self, conversation_id: i64, reply: &Reply) -> Result<(), BotError> {
        self.record(conversation_id, reply, Delivery::Sent).await;
        Ok(())
    }

    async fn edit(&self, conversation_id: i64, reply: &Reply) -> Result<(), BotError> {
        if self.fail_edits {
            return Err(BotError::send("message can't be edited"));
        }
        self.record(conversation_id, reply, Delivery::Edited).await;
        Ok(())
    }

    async fn acknowledge(&self, callback_id: &str) -> Result<(), BotError> {
        if self.fail_acks {
            return Err(BotError::send("callback query is too old"));
        }
        self.recording
            .lock()
            .await
            .acknowledged
            .push(callback_id.to_string());
        Ok(())
    }
}
