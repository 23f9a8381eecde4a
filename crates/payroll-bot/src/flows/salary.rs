//! Month picker for salary lookups.
//!
//! `salary_other_month` opens a grid of the current year's months;
//! `month_prev`/`month_next` (payload: the shown year) flip the year;
//! `pick_month` (payload `YYYY-MM`) answers with that month's earnings.
//! Malformed payloads are ignored.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Datelike;
use payroll_core::{DateRange, PayoutEngine};
use tracing::debug;

use crate::error::BotError;
use crate::reply::{Button, Keyboard, Reply};
use crate::router::{encode, CallbackContext, CallbackHandler, CallbackRouter};

pub const OTHER_MONTH_KEY: &str = "salary_other_month";
pub const MONTH_PREV_KEY: &str = "month_prev";
pub const MONTH_NEXT_KEY: &str = "month_next";
pub const PICK_MONTH_KEY: &str = "pick_month";

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Register every month picker handler.
pub fn register(router: &mut CallbackRouter, payouts: Arc<PayoutEngine>) {
    router.register(OtherMonth);
    router.register(FlipYear::prev());
    router.register(FlipYear::next());
    router.register(PickMonth { payouts });
}

/// The twelve months of `year`, three to a row, with year navigation.
pub fn month_keyboard(year: i32) -> Reply {
    let mut keyboard = Keyboard::new();
    for (q, names) in MONTH_NAMES.chunks(3).enumerate() {
        let row = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let month = q * 3 + i + 1;
                Button::new(*name, encode(PICK_MONTH_KEY, &format!("{:04}-{:02}", year, month)))
            })
            .collect();
        keyboard = keyboard.row(row);
    }
    let prev = year
        .checked_sub(1)
        .map(|prev| Button::new(format!("← {}", prev), encode(MONTH_PREV_KEY, &year.to_string())));
    let next = year
        .checked_add(1)
        .map(|next| Button::new(format!("{} →", next), encode(MONTH_NEXT_KEY, &year.to_string())));
    keyboard = keyboard.row(prev.into_iter().chain(next).collect());

    Reply::text(format!("Pick a month: {}", year))
        .with_keyboard(keyboard)
        .amended()
}

struct OtherMonth;

#[async_trait]
impl CallbackHandler for OtherMonth {
    fn key(&self) -> &str {
        OTHER_MONTH_KEY
    }

    async fn handle(&self, ctx: &CallbackContext, _payload: &str) -> Result<Option<Reply>, BotError> {
        Ok(Some(month_keyboard(ctx.today.year())))
    }
}

struct FlipYear {
    key: &'static str,
    delta: i32,
}

impl FlipYear {
    fn prev() -> Self {
        Self {
            key: MONTH_PREV_KEY,
            delta: -1,
        }
    }

    fn next() -> Self {
        Self {
            key: MONTH_NEXT_KEY,
            delta: 1,
        }
    }
}

#[async_trait]
impl CallbackHandler for FlipYear {
    fn key(&self) -> &str {
        self.key
    }

    async fn handle(&self, _ctx: &CallbackContext, payload: &str) -> Result<Option<Reply>, BotError> {
        let year = payload
            .trim()
            .parse::<i32>()
            .ok()
            .and_then(|year| year.checked_add(self.delta))
            .filter(|year| year.checked_sub(1).is_some() && year.checked_add(1).is_some());
        match year {
            Some(year) => Ok(Some(month_keyboard(year))),
            None => {
                debug!("Ignoring {} with payload {:?}", self.key, payload);
                Ok(None)
            }
        }
    }
}

struct PickMonth {
    payouts: Arc<PayoutEngine>,
}

fn parse_year_month(payload: &str) -> Option<(i32, u32)> {
    let (year, month) = payload.trim().split_once('-')?;
    Some((year.parse().ok()?, month.parse().ok()?))
}

#[async_trait]
impl CallbackHandler for PickMonth {
    fn key(&self) -> &str {
        PICK_MONTH_KEY
    }

    async fn handle(&self, ctx: &CallbackContext, payload: &str) -> Result<Option<Reply>, BotError> {
        let Some((year, month, range)) = parse_year_month(payload)
            .and_then(|(y, m)| DateRange::month(y, m).map(|range| (y, m, range)))
        else {
            debug!("Ignoring {} with payload {:?}", PICK_MONTH_KEY, payload);
            return Ok(None);
        };

        let total = self.payouts.total_earned(ctx.employee_id, range).await?;
        Ok(Some(
            Reply::text(format!("Salary for {:02}.{:04}: {:.2}", month, year, total)).amended(),
        ))
    }
}
