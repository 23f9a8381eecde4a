//! Callback routing for pressed buttons.
//!
//! A token is `<key>` or `<key>|<payload>`, optionally preceded by a `\f`
//! framing byte some transports add. Keys resolve in a fixed order:
//!
//! 1. keys with the calendar prefix always go to the calendar
//! 2. keys with a registered [`CallbackHandler`]
//! 3. the built-in actions
//! 4. anything else is ignored

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use payroll_core::EmployeeId;
use tracing::{debug, info, warn};

use crate::calendar::CALENDAR_PREFIX;
use crate::error::BotError;
use crate::reply::Reply;

/// Framing byte stripped from the start of tokens.
pub const FRAME_PREFIX: char = '\u{c}';

/// Separator between key and payload.
pub const KEY_DELIMITER: char = '|';

/// A token split into its routing key and payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedToken<'a> {
    pub key: &'a str,
    /// Empty when the token has no delimiter.
    pub payload: &'a str,
}

/// Split a token on its first delimiter.
pub fn decode(token: &str) -> DecodedToken<'_> {
    let raw = token.strip_prefix(FRAME_PREFIX).unwrap_or(token);
    match raw.split_once(KEY_DELIMITER) {
        Some((key, payload)) => DecodedToken { key, payload },
        None => DecodedToken {
            key: raw,
            payload: "",
        },
    }
}

/// Build a token from a key and optional payload.
pub fn encode(key: &str, payload: &str) -> String {
    if payload.is_empty() {
        key.to_string()
    } else {
        format!("{}{}{}", key, KEY_DELIMITER, payload)
    }
}

/// Actions every bot understands without registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinAction {
    AddShiftToday,
    AddShiftOtherDay,
    Cancel,
    PayAll,
    SalaryRange,
    ResetConfirm,
}

impl BuiltinAction {
    pub const ALL: [BuiltinAction; 6] = [
        Self::AddShiftToday,
        Self::AddShiftOtherDay,
        Self::Cancel,
        Self::PayAll,
        Self::SalaryRange,
        Self::ResetConfirm,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::AddShiftToday => "addshift_today",
            Self::AddShiftOtherDay => "addshift_other",
            Self::Cancel => "cancel_flow",
            Self::PayAll => "payout_all",
            Self::SalaryRange => "salary_range",
            Self::ResetConfirm => "reset_confirm",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.key() == key)
    }
}

/// Who pressed a button, and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallbackContext {
    pub conversation_id: i64,
    pub employee_id: EmployeeId,
    pub today: NaiveDate,
}

/// A flow-specific button handler.
#[async_trait]
pub trait CallbackHandler: Send + Sync {
    /// Key this handler answers to.
    fn key(&self) -> &str;

    /// Handle a press. `Ok(None)` means there is nothing to reply.
    async fn handle(&self, ctx: &CallbackContext, payload: &str) -> Result<Option<Reply>, BotError>;
}

/// Where a token goes.
pub enum Route {
    Calendar { key: String, payload: String },
    Handler { handler: Arc<dyn CallbackHandler>, payload: String },
    Builtin(BuiltinAction),
    Ignored,
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Calendar { key, payload } => f
                .debug_struct("Calendar")
                .field("key", key)
                .field("payload", payload)
                .finish(),
            Self::Handler { handler, payload } => f
                .debug_struct("Handler")
                .field("key", &handler.key())
                .field("payload", payload)
                .finish(),
            Self::Builtin(action) => f.debug_tuple("Builtin").field(action).finish(),
            Self::Ignored => f.write_str("Ignored"),
        }
    }
}

/// Registry of flow handlers plus the fixed routing order.
#[derive(Default)]
pub struct CallbackRouter {
    handlers: HashMap<String, Arc<dyn CallbackHandler>>,
}

impl CallbackRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler.
    ///
    /// If a handler with the same key already exists, it will be replaced.
    /// Handlers under the calendar prefix are never reached.
    pub fn register<H: CallbackHandler + 'static>(&mut self, handler: H) {
        self.register_arc(Arc::new(handler));
    }

    /// Register a shared handler.
    pub fn register_arc(&mut self, handler: Arc<dyn CallbackHandler>) {
        let key = handler.key().to_string();
        if key.starts_with(CALENDAR_PREFIX) {
            warn!("Handler '{}' is shadowed by the calendar", key);
        }
        info!("Registering callback handler: {}", key);
        self.handlers.insert(key, handler);
    }

    /// Get a list of registered keys.
    pub fn keys(&self) -> Vec<&str> {
        self.handlers.keys().map(|s| s.as_str()).collect()
    }

    pub fn has_handler(&self, key: &str) -> bool {
        self.handlers.contains_key(key)
    }

    /// Resolve a raw token.
    pub fn route(&self, token: &str) -> Route {
        let DecodedToken { key, payload } = decode(token);
        debug!("Routing callback key={:?} payload={:?}", key, payload);

        if key.starts_with(CALENDAR_PREFIX) {
            return Route::Calendar {
                key: key.to_string(),
                payload: payload.to_string(),
            };
        }
        if let Some(handler) = self.handlers.get(key) {
            return Route::Handler {
                handler: handler.clone(),
                payload: payload.to_string(),
            };
        }
        match BuiltinAction::from_key(key) {
            Some(action) => Route::Builtin(action),
            None => Route::Ignored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo(&'static str);

    #[async_trait]
    impl CallbackHandler for Echo {
        fn key(&self) -> &str {
            self.0
        }

        async fn handle(&self, _ctx: &CallbackContext, payload: &str) -> Result<Option<Reply>, BotError> {
            Ok(Some(Reply::text(payload)))
        }
    }

    #[test]
    fn test_decode() {
        assert_eq!(decode("pick_month|2024-03"), DecodedToken { key: "pick_month", payload: "2024-03" });
        assert_eq!(decode("\u{c}cal_day|1-2-2024"), DecodedToken { key: "cal_day", payload: "1-2-2024" });
        assert_eq!(decode("payout_all"), DecodedToken { key: "payout_all", payload: "" });
        assert_eq!(decode("a|b|c"), DecodedToken { key: "a", payload: "b|c" });
        assert_eq!(decode("a|"), DecodedToken { key: "a", payload: "" });
        assert_eq!(decode(""), DecodedToken { key: "", payload: "" });
    }

    #[test]
    fn test_encode() {
        assert_eq!(encode("payout_all", ""), "payout_all");
        assert_eq!(encode("month_prev", "2024"), "month_prev|2024");
    }

    #[test]
    fn test_builtin_keys_round_trip() {
        for action in BuiltinAction::ALL {
            assert_eq!(BuiltinAction::from_key(action.key()), Some(action));
        }
        assert_eq!(BuiltinAction::from_key("nope"), None);
    }

    #[test]
    fn test_calendar_prefix_beats_registration() {
        let mut router = CallbackRouter::new();
        router.register(Echo("cal_day"));
        assert!(router.has_handler("cal_day"));
        assert!(matches!(router.route("cal_day|1-1-2024"), Route::Calendar { .. }));
    }

    #[test]
    fn test_registered_beats_builtin() {
        let mut router = CallbackRouter::new();
        assert!(matches!(router.route("payout_all"), Route::Builtin(BuiltinAction::PayAll)));

        router.register(Echo("payout_all"));
        assert!(matches!(router.route("payout_all"), Route::Handler { .. }));
    }

    #[test]
    fn test_unknown_is_ignored() {
        let router = CallbackRouter::new();
        assert!(matches!(router.route("no_such_key|1"), Route::Ignored));
        assert!(matches!(router.route(""), Route::Ignored));
    }

    #[tokio::test]
    async fn test_handler_receives_payload() {
        let mut router = CallbackRouter::new();
        router.register(Echo("echo"));

        let Route::Handler { handler, payload } = router.route("\u{c}echo|hello|world") else {
            panic!("expected handler route");
        };
        let ctx = CallbackContext {
            conversation_id: 1,
            employee_id: 1,
            today: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        };
        let reply = handler.handle(&ctx, &payload).await.unwrap().unwrap();
        assert_eq!(reply.text, "hello|world");
    }
}
