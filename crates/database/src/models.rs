//! Database row types.

use chrono::NaiveDate;
use payroll_core::{Employee, Shift};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row of the `employees` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct EmployeeRow {
    /// Numeric identity from the conversation transport.
    pub id: i64,
    /// Display name
    pub name: String,
    /// Conversation channel identifier
    pub chat_id: i64,
    /// Role tag (e.g., "employee")
    pub role: String,
}

impl From<EmployeeRow> for Employee {
    fn from(row: EmployeeRow) -> Self {
        Employee {
            id: row.id,
            name: row.name,
            chat_id: row.chat_id,
            role: row.role,
        }
    }
}

/// A row of the `shifts` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ShiftRow {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Owning employee.
    pub employee_id: i64,
    /// Day worked, stored as `YYYY-MM-DD`.
    pub date: NaiveDate,
    /// Amount owed.
    pub amount: f64,
    /// Whether the shift has been paid.
    pub paid: bool,
}

impl From<ShiftRow> for Shift {
    fn from(row: ShiftRow) -> Self {
        Shift {
            id: row.id,
            employee_id: row.employee_id,
            date: row.date,
            amount: row.amount,
            paid: row.paid,
        }
    }
}
