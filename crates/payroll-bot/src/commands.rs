//! Menu and slash commands.
//!
//! Menu entries have a stable identifier separate from their label, so
//! relabelling or translating the menu never changes how input is routed.

/// Free-text keywords that abort whatever the conversation is waiting for.
pub const CANCEL_KEYWORDS: &[&str] = &["cancel", "/cancel", "stop", "/stop", "отмена", "стоп"];

/// Whether `text` is a cancel keyword (case-insensitive, surrounding
/// whitespace ignored).
pub fn is_cancel_keyword(text: &str) -> bool {
    let text = text.trim().to_lowercase();
    CANCEL_KEYWORDS.iter().any(|k| *k == text)
}

/// Entries of the persistent menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuCommand {
    AddShift,
    ViewSalary,
    Payout,
}

impl MenuCommand {
    /// Menu order.
    pub const ALL: [MenuCommand; 3] = [Self::AddShift, Self::ViewSalary, Self::Payout];

    /// Stable identifier.
    pub fn id(self) -> &'static str {
        match self {
            Self::AddShift => "add_shift",
            Self::ViewSalary => "view_salary",
            Self::Payout => "payout",
        }
    }

    /// Label shown on the menu button.
    pub fn label(self) -> &'static str {
        match self {
            Self::AddShift => "📅 Add shift",
            Self::ViewSalary => "💰 View salary",
            Self::Payout => "💸 Payout",
        }
    }

    /// Recognize a menu selection by identifier or label.
    ///
    /// The label matches with or without its leading icon, ignoring ASCII
    /// case.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        Self::ALL.into_iter().find(|cmd| {
            let label = cmd.label();
            let bare = label
                .split_once(' ')
                .map(|(_, rest)| rest)
                .unwrap_or(label);
            text.eq_ignore_ascii_case(cmd.id())
                || text.eq_ignore_ascii_case(label)
                || text.eq_ignore_ascii_case(bare)
        })
    }
}

/// Named commands delivered by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlashCommand {
    Start,
    Employees,
    Reset,
    Help,
    Cancel,
}

impl SlashCommand {
    /// Parse `start`, `/start`, `/start@botname` and the like.
    pub fn parse(command: &str) -> Option<Self> {
        let name = command.trim().trim_start_matches('/');
        let name = name.split(['@', ' ']).next().unwrap_or(name).to_lowercase();
        match name.as_str() {
            "start" => Some(Self::Start),
            "employees" => Some(Self::Employees),
            "reset" => Some(Self::Reset),
            "help" => Some(Self::Help),
            "cancel" | "stop" => Some(Self::Cancel),
            _ => None,
        }
    }
}
