//! Outbound replies and their selectable actions.

use serde::{Deserialize, Serialize};

/// A selectable action rendered under a reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub label: String,
    /// Interaction token handed back when the button is pressed.
    pub token: String,
}

impl Button {
    pub fn new(label: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            token: token.into(),
        }
    }
}

/// Rows of buttons attached to a reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row of buttons. Empty rows are skipped.
    pub fn row(mut self, buttons: Vec<Button>) -> Self {
        if !buttons.is_empty() {
            self.rows.push(buttons);
        }
        self
    }

    /// All buttons, row by row.
    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.rows.iter().flatten()
    }

    /// Find a button by its label.
    pub fn find(&self, label: &str) -> Option<&Button> {
        self.buttons().find(|b| b.label == label)
    }

    /// Whether any button carries `token`.
    pub fn has_token(&self, token: &str) -> bool {
        self.buttons().any(|b| b.token == token)
    }
}

/// A message the bot wants delivered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub text: String,
    pub keyboard: Option<Keyboard>,
    /// Show the persistent menu alongside this reply.
    pub menu: bool,
    /// Prefer amending the most recent outbound message over sending a new one.
    pub amend: bool,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
            menu: false,
            amend: false,
        }
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }

    pub fn with_menu(mut self) -> Self {
        self.menu = true;
        self
    }

    pub fn amended(mut self) -> Self {
        self.amend = true;
        self
    }

    /// Whether any attached button carries `token`.
    pub fn has_token(&self, token: &str) -> bool {
        self.keyboard.as_ref().is_some_and(|k| k.has_token(token))
    }
}
