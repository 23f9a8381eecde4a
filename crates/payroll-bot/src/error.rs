//! Error types for the bot.

use payroll_core::{StoreError, ValidationError};
use thiserror::Error;

/// Errors raised while handling an inbound event.
#[derive(Debug, Error)]
pub enum BotError {
    /// Shift or employee store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Transport failed to deliver or acknowledge.
    #[error("send error: {0}")]
    Send(String),

    /// User input was rejected.
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),
}

impl BotError {
    /// Build a transport error.
    pub fn send(message: impl Into<String>) -> Self {
        Self::Send(message.into())
    }
}
