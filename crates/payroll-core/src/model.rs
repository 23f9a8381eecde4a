//! Domain records shared by stores, the payout engine and the bot.

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Externally assigned, stable employee identity.
pub type EmployeeId = i64;

/// Store-assigned shift identity.
pub type ShiftId = i64;

/// Role tag given to employees created on first interaction.
pub const DEFAULT_ROLE: &str = "employee";

/// An employee, keyed by the caller's numeric identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    /// Numeric identity from the conversation transport.
    pub id: EmployeeId,
    /// Display name.
    pub name: String,
    /// Conversation channel the employee talks to the bot through.
    pub chat_id: i64,
    /// Role tag (e.g., "employee").
    pub role: String,
}

impl Employee {
    /// Create an employee with the default role.
    pub fn new(id: EmployeeId, name: impl Into<String>, chat_id: i64) -> Self {
        Self {
            id,
            name: name.into(),
            chat_id,
            role: DEFAULT_ROLE.to_string(),
        }
    }
}

/// A recorded shift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shift {
    pub id: ShiftId,
    pub employee_id: EmployeeId,
    /// Day the shift was worked.
    pub date: NaiveDate,
    /// Amount still owed (or paid, once `paid` is set).
    pub amount: f64,
    pub paid: bool,
}

/// A shift that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewShift {
    employee_id: EmployeeId,
    date: NaiveDate,
    amount: f64,
}

impl NewShift {
    /// Create an unpaid shift. The amount must be finite and positive.
    pub fn new(employee_id: EmployeeId, date: NaiveDate, amount: f64) -> Result<Self, ValidationError> {
        if !amount.is_finite() {
            return Err(ValidationError::NotFinite);
        }
        if amount <= 0.0 {
            return Err(ValidationError::BelowMinimum { min: 0.0 });
        }
        Ok(Self {
            employee_id,
            date,
            amount,
        })
    }

    pub fn employee_id(&self) -> EmployeeId {
        self.employee_id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }
}

/// An inclusive range of days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    /// Create a range from `from` to `to` inclusive, as given.
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from, to }
    }

    /// Create a range from two boundaries in either order.
    pub fn ordered(a: NaiveDate, b: NaiveDate) -> Self {
        if b < a {
            Self::new(b, a)
        } else {
            Self::new(a, b)
        }
    }

    /// A single day.
    pub fn day(date: NaiveDate) -> Self {
        Self::new(date, date)
    }

    /// The window used for "all time" queries.
    ///
    /// Bounded on both ends so every query stays range-based; wide enough for
    /// any plausible shift date.
    pub fn all_time() -> Self {
        let from = NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN);
        let to = NaiveDate::from_ymd_opt(9999, 12, 31).unwrap_or(NaiveDate::MAX);
        Self::new(from, to)
    }

    /// The calendar month containing `year`/`month`, if it exists.
    pub fn month(year: i32, month: u32) -> Option<Self> {
        let from = NaiveDate::from_ymd_opt(year, month, 1)?;
        let to = from.checked_add_months(Months::new(1))?.pred_opt()?;
        Some(Self::new(from, to))
    }

    /// The calendar month containing `date`.
    pub fn month_of(date: NaiveDate) -> Option<Self> {
        Self::month(date.year(), date.month())
    }

    /// Whether `date` falls inside the range.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

/// Number of days in the given month, or 0 if the month is invalid.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    DateRange::month(year, month)
        .map(|range| range.to.day())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_new_shift_rejects_non_positive() {
        assert!(NewShift::new(1, date(2024, 1, 1), 10.0).is_ok());
        assert!(matches!(
            NewShift::new(1, date(2024, 1, 1), 0.0),
            Err(ValidationError::BelowMinimum { .. })
        ));
        assert!(matches!(
            NewShift::new(1, date(2024, 1, 1), -5.0),
            Err(ValidationError::BelowMinimum { .. })
        ));
        assert_eq!(
            NewShift::new(1, date(2024, 1, 1), f64::NAN),
            Err(ValidationError::NotFinite)
        );
    }

    #[test]
    fn test_ordered_range_swaps() {
        let range = DateRange::ordered(date(2024, 5, 10), date(2024, 5, 1));
        assert_eq!(range.from, date(2024, 5, 1));
        assert_eq!(range.to, date(2024, 5, 10));
        assert!(range.contains(date(2024, 5, 10)));
        assert!(!range.contains(date(2024, 5, 11)));
    }

    #[test]
    fn test_month_range() {
        let feb = DateRange::month(2024, 2).unwrap();
        assert_eq!(feb.from, date(2024, 2, 1));
        assert_eq!(feb.to, date(2024, 2, 29));

        let dec = DateRange::month(2023, 12).unwrap();
        assert_eq!(dec.to, date(2023, 12, 31));

        assert!(DateRange::month(2024, 13).is_none());
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2024, 4), 30);
        assert_eq!(days_in_month(2024, 0), 0);
    }

    #[test]
    fn test_all_time_contains_plausible_dates() {
        let all = DateRange::all_time();
        assert!(all.contains(date(2000, 1, 1)));
        assert!(all.contains(date(2099, 12, 31)));
    }
}
