//! Conversational shift and payout bot.
//!
//! This crate turns inbound transport events into state transitions and
//! store operations:
//!
//! - [`PayrollBot`] - Handles events; one per process
//! - [`Conversation`] / [`PendingInput`] - Per-conversation state machine
//! - [`CallbackRouter`] - Resolves pressed buttons to the calendar, a
//!   registered flow handler or a built-in action
//! - [`calendar`] - Stateless day picker
//! - [`MessageSender`] - Transport abstraction
//! - [`EventRunner`] - Feeds an event stream through a worker pool
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use payroll_bot::{EventSender, InboundEvent, PayrollBot, RecordingSender};
//! use payroll_core::InMemoryStore;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), payroll_bot::BotError> {
//!     let store = Arc::new(InMemoryStore::new());
//!     let sender = Arc::new(RecordingSender::new());
//!     let bot = PayrollBot::new(store.clone(), store, sender.clone());
//!
//!     let ann = EventSender::new(1, "Ann");
//!     bot.handle_event(InboundEvent::command(1, ann, "/start")).await?;
//!
//!     let reply = sender.last().await.unwrap().reply;
//!     assert!(reply.menu);
//!     Ok(())
//! }
//! ```

mod bot;
pub mod calendar;
mod commands;
mod config;
pub mod console;
mod error;
mod event;
pub mod flows;
mod locks;
mod reply;
pub mod router;
mod runner;
mod sender;
mod state;

pub use bot::{system_clock, validation_message, BotOptions, Clock, PayrollBot};
pub use calendar::{CalendarAction, DatePicker, DatePurpose, RangeStep};
pub use commands::{is_cancel_keyword, MenuCommand, SlashCommand, CANCEL_KEYWORDS};
pub use config::{sqlite_url_from_path, BotConfig, ConfigError};
pub use error::BotError;
pub use event::{EventKind, EventSender, InboundEvent};
pub use locks::KeyedMutex;
pub use reply::{Button, Keyboard, Reply};
pub use router::{BuiltinAction, CallbackContext, CallbackHandler, CallbackRouter, Route};
pub use runner::{EventRunner, RunnerError};
pub use sender::{Delivery, LoggingSender, MessageSender, NoOpSender, Recorded, RecordingSender};
pub use state::{Conversation, PendingInput, TextIntent};

// Re-export async_trait for handler and sender implementors
pub use async_trait::async_trait;
