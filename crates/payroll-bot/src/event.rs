//! Inbound events delivered by a transport.

use payroll_core::EmployeeId;
use serde::{Deserialize, Serialize};

/// The person who produced an event.
///
/// The sender identity doubles as the employee identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSender {
    pub id: EmployeeId,
    pub name: String,
}

impl EventSender {
    pub fn new(id: EmployeeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// What the user did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// A named command such as `/start`.
    Command(String),
    /// A pressed button, carrying the interaction token it was rendered with.
    Callback { id: String, token: String },
    /// Free text.
    Text(String),
}

/// An event scoped to one conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundEvent {
    pub conversation_id: i64,
    pub sender: EventSender,
    pub kind: EventKind,
}

impl InboundEvent {
    /// A command event, e.g. `start` or `/start`.
    pub fn command(conversation_id: i64, sender: EventSender, command: impl Into<String>) -> Self {
        Self {
            conversation_id,
            sender,
            kind: EventKind::Command(command.into()),
        }
    }

    /// A button press.
    pub fn callback(
        conversation_id: i64,
        sender: EventSender,
        id: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            conversation_id,
            sender,
            kind: EventKind::Callback {
                id: id.into(),
                token: token.into(),
            },
        }
    }

    /// A free-text message.
    pub fn text(conversation_id: i64, sender: EventSender, text: impl Into<String>) -> Self {
        Self {
            conversation_id,
            sender,
            kind: EventKind::Text(text.into()),
        }
    }
}
