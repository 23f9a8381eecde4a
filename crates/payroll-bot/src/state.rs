//! Per-conversation state machine.
//!
//! A conversation waits for at most one input at a time. Free text is read
//! in a fixed order: cancel keywords first, then menu commands (a menu press
//! always starts its own flow), then whatever the conversation is waiting
//! for. Anything else is unrecognized and leaves the state alone.

use chrono::NaiveDate;

use crate::calendar::{DatePicker, DatePurpose};
use crate::commands::{is_cancel_keyword, MenuCommand};

/// The single input a conversation expects next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PendingInput {
    #[default]
    Idle,
    /// Amount for a new shift on the given date.
    AwaitingShiftAmount(NaiveDate),
    /// Amount to pay out to the conversation's employee.
    AwaitingPayoutAmount,
}

/// How a free-text message is to be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextIntent {
    Cancel,
    Menu(MenuCommand),
    ShiftAmount(NaiveDate),
    PayoutAmount,
    Unrecognized,
}

/// Everything the bot remembers about one conversation.
///
/// Lives in memory only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    pub pending: PendingInput,
    pub picker: DatePicker,
}

impl Conversation {
    /// Decide how to read `text` in the current state.
    pub fn interpret(&self, text: &str) -> TextIntent {
        if is_cancel_keyword(text) {
            return TextIntent::Cancel;
        }
        if let Some(command) = MenuCommand::parse(text) {
            return TextIntent::Menu(command);
        }
        match self.pending {
            PendingInput::AwaitingShiftAmount(date) => TextIntent::ShiftAmount(date),
            PendingInput::AwaitingPayoutAmount => TextIntent::PayoutAmount,
            PendingInput::Idle => TextIntent::Unrecognized,
        }
    }

    /// Forget any pending input and disarm the date picker.
    pub fn reset(&mut self) {
        self.pending = PendingInput::Idle;
        self.picker.disarm();
    }

    pub fn await_shift_amount(&mut self, date: NaiveDate) {
        self.reset();
        self.pending = PendingInput::AwaitingShiftAmount(date);
    }

    pub fn await_payout_amount(&mut self) {
        self.reset();
        self.pending = PendingInput::AwaitingPayoutAmount;
    }

    /// Wait for a calendar pick instead of text.
    pub fn await_date(&mut self, purpose: DatePurpose) {
        self.pending = PendingInput::Idle;
        self.picker.arm(purpose);
    }

    pub fn is_idle(&self) -> bool {
        self.pending == PendingInput::Idle && self.picker.armed().is_none()
    }
}
