//! Inline calendar for picking a day.
//!
//! Rendering is stateless: every button carries the full date (or the month
//! to navigate to) in its token, as `cal_day|<d>-<m>-<y>`, `cal_prev|<m>-<y>`
//! and `cal_next|<m>-<y>`. Navigation tokens may carry month `0` or `13`;
//! decoding rolls those over into the neighbouring year.
//!
//! What a picked day means is decided by the [`DatePicker`] each
//! conversation owns.

use chrono::{Datelike, NaiveDate};
use payroll_core::{days_in_month, ValidationError};
use tracing::debug;

use crate::reply::{Button, Keyboard, Reply};

/// Prefix shared by every calendar key.
pub const CALENDAR_PREFIX: &str = "cal_";
pub const DAY_KEY: &str = "cal_day";
pub const PREV_KEY: &str = "cal_prev";
pub const NEXT_KEY: &str = "cal_next";

/// Separator between the fields of a date payload.
pub const FIELD_DELIMITER: char = '-';

const DAYS_PER_ROW: usize = 7;

/// A decoded calendar button press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarAction {
    /// A day was picked.
    Day(NaiveDate),
    /// Show the grid for another month.
    Show { year: i32, month: u32 },
}

impl CalendarAction {
    /// Decode a calendar key and its payload.
    ///
    /// Returns `Ok(None)` for calendar keys this picker does not know.
    pub fn parse(key: &str, payload: &str) -> Result<Option<Self>, ValidationError> {
        match key {
            DAY_KEY => {
                let [day, month, year] = fields::<3>(payload)?;
                let date = u32::try_from(month)
                    .ok()
                    .zip(u32::try_from(day).ok())
                    .zip(i32::try_from(year).ok())
                    .and_then(|((m, d), y)| NaiveDate::from_ymd_opt(y, m, d))
                    .ok_or_else(|| malformed(payload))?;
                Ok(Some(Self::Day(date)))
            }
            PREV_KEY | NEXT_KEY => {
                let [month, year] = fields::<2>(payload)?;
                let year = i32::try_from(year).map_err(|_| malformed(payload))?;
                let (year, month) = normalize_month(year, month).ok_or_else(|| malformed(payload))?;
                Ok(Some(Self::Show { year, month }))
            }
            _ => Ok(None),
        }
    }
}

fn malformed(payload: &str) -> ValidationError {
    ValidationError::MalformedToken(payload.to_string())
}

fn fields<const N: usize>(payload: &str) -> Result<[i64; N], ValidationError> {
    let parts: Vec<&str> = payload.split(FIELD_DELIMITER).collect();
    if parts.len() != N {
        return Err(malformed(payload));
    }
    let mut out = [0i64; N];
    for (slot, part) in out.iter_mut().zip(parts) {
        *slot = part.trim().parse().map_err(|_| malformed(payload))?;
    }
    Ok(out)
}

/// Roll month `0` back to December of the prior year and month `13`
/// forward to January of the next one.
///
/// Returns `None` for anything outside `0..=13`.
pub fn normalize_month(year: i32, month: i64) -> Option<(i32, u32)> {
    match month {
        0 => Some((year.checked_sub(1)?, 12)),
        13 => Some((year.checked_add(1)?, 1)),
        1..=12 => Some((year, month as u32)),
        _ => None,
    }
}

/// Token for the button that picks `date`.
pub fn day_token(date: NaiveDate) -> String {
    format!(
        "{}|{}-{}-{}",
        DAY_KEY,
        date.day(),
        date.month(),
        date.year()
    )
}

/// Render the grid for `year`/`month`.
///
/// Day buttons come seven to a row, followed by a navigation row.
pub fn render(year: i32, month: u32) -> (String, Keyboard) {
    let title = NaiveDate::from_ymd_opt(year, month, 1)
        .map(|first| format!("Pick a date: {}", first.format("%B %Y")))
        .unwrap_or_else(|| format!("Pick a date: {:02}.{}", month, year));

    let days: Vec<Button> = (1..=days_in_month(year, month))
        .map(|day| {
            Button::new(
                day.to_string(),
                format!("{}|{}-{}-{}", DAY_KEY, day, month, year),
            )
        })
        .collect();

    let mut keyboard = Keyboard::new();
    for week in days.chunks(DAYS_PER_ROW) {
        keyboard = keyboard.row(week.to_vec());
    }
    let navigation = vec![
        Button::new("<", format!("{}|{}-{}", PREV_KEY, i64::from(month) - 1, year)),
        Button::new(">", format!("{}|{}-{}", NEXT_KEY, month + 1, year)),
    ];
    (title, keyboard.row(navigation))
}

/// Render the grid as a reply that replaces the previous message.
pub fn render_reply(year: i32, month: u32) -> Reply {
    let (title, keyboard) = render(year, month);
    Reply::text(title).with_keyboard(keyboard).amended()
}

/// Which step of a two-date range selection the picker is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeStep {
    CollectingStart,
    CollectingEnd { start: NaiveDate },
}

/// What the next picked day is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePurpose {
    /// Date of a new shift; an amount prompt follows.
    ShiftDate,
    /// One boundary of a salary range query.
    Range(RangeStep),
}

/// The single pending "date chosen" target of a conversation.
///
/// Arming replaces whatever was armed before. Picking a day consumes it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatePicker {
    armed: Option<DatePurpose>,
}

impl DatePicker {
    pub fn arm(&mut self, purpose: DatePurpose) {
        if let Some(previous) = self.armed.replace(purpose) {
            debug!("Date picker re-armed: {:?} -> {:?}", previous, purpose);
        }
    }

    pub fn disarm(&mut self) {
        self.armed = None;
    }

    pub fn armed(&self) -> Option<DatePurpose> {
        self.armed
    }

    /// Consume the armed purpose for a picked day.
    pub fn take(&mut self) -> Option<DatePurpose> {
        self.armed.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_day() {
        let action = CalendarAction::parse(DAY_KEY, "9-3-2024").unwrap();
        assert_eq!(action, Some(CalendarAction::Day(date(2024, 3, 9))));
    }

    #[test]
    fn test_parse_day_rejects_bad_payloads() {
        for payload in ["", "9-3", "x-3-2024", "31-2-2024", "9-3-2024-1", "0-1-2024"] {
            assert!(
                CalendarAction::parse(DAY_KEY, payload).is_err(),
                "accepted {payload:?}"
            );
        }
    }

    #[test]
    fn test_navigation_rolls_over_year() {
        assert_eq!(
            CalendarAction::parse(PREV_KEY, "0-2024").unwrap(),
            Some(CalendarAction::Show { year: 2023, month: 12 })
        );
        assert_eq!(
            CalendarAction::parse(NEXT_KEY, "13-2024").unwrap(),
            Some(CalendarAction::Show { year: 2025, month: 1 })
        );
        assert_eq!(
            CalendarAction::parse(NEXT_KEY, "5-2024").unwrap(),
            Some(CalendarAction::Show { year: 2024, month: 5 })
        );
        assert!(CalendarAction::parse(NEXT_KEY, "14-2024").is_err());
        assert!(CalendarAction::parse(PREV_KEY, "2024").is_err());
    }

    #[test]
    fn test_unknown_calendar_key() {
        assert_eq!(CalendarAction::parse("cal_ignore", "whatever").unwrap(), None);
    }

    #[test]
    fn test_render_grid() {
        let (title, keyboard) = render(2024, 2);
        assert_eq!(title, "Pick a date: February 2024");

        // 29 days -> 5 rows of days plus navigation
        assert_eq!(keyboard.rows.len(), 6);
        assert_eq!(keyboard.rows[0].len(), 7);
        assert_eq!(keyboard.rows[4].len(), 1);
        assert_eq!(keyboard.rows[4][0].token, "cal_day|29-2-2024");

        let nav = keyboard.rows.last().unwrap();
        assert_eq!(nav[0].token, "cal_prev|1-2024");
        assert_eq!(nav[1].token, "cal_next|3-2024");
    }

    #[test]
    fn test_render_edges_emit_rollover_months() {
        let (_, january) = render(2024, 1);
        let nav = january.rows.last().unwrap();
        assert_eq!(nav[0].token, "cal_prev|0-2024");

        let (_, december) = render(2024, 12);
        let nav = december.rows.last().unwrap();
        assert_eq!(nav[1].token, "cal_next|13-2024");
    }

    #[test]
    fn test_day_buttons_decode_to_their_dates() {
        let (_, keyboard) = render(2023, 11);
        for button in keyboard.buttons().filter(|b| b.token.starts_with(DAY_KEY)) {
            let (key, payload) = button.token.split_once('|').unwrap();
            let Some(CalendarAction::Day(picked)) = CalendarAction::parse(key, payload).unwrap() else {
                panic!("not a day: {}", button.token);
            };
            assert_eq!(day_token(picked), button.token);
        }
    }

    #[test]
    fn test_picker_arm_overwrites() {
        let mut picker = DatePicker::default();
        picker.arm(DatePurpose::ShiftDate);
        picker.arm(DatePurpose::Range(RangeStep::CollectingStart));
        assert_eq!(picker.take(), Some(DatePurpose::Range(RangeStep::CollectingStart)));
        assert_eq!(picker.take(), None);
    }
}
