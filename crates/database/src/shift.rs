//! Shift storage operations.

use chrono::NaiveDate;
use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::ShiftRow;

/// Insert an unpaid shift and return its ID.
pub async fn add_shift(pool: &SqlitePool, employee_id: i64, date: NaiveDate, amount: f64) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO shifts (employee_id, date, amount, paid)
        VALUES (?, ?, ?, 0)
        "#,
    )
    .bind(employee_id)
    .bind(date)
    .bind(amount)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Get an employee's shifts dated between `from` and `to` inclusive.
pub async fn get_shifts(
    pool: &SqlitePool,
    employee_id: i64,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<ShiftRow>> {
    let shifts = sqlx::query_as::<_, ShiftRow>(
        r#"
        SELECT id, employee_id, date, amount, paid
        FROM shifts
        WHERE employee_id = ? AND date BETWEEN ? AND ?
        "#,
    )
    .bind(employee_id)
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;

    Ok(shifts)
}

/// Get a shift by ID.
pub async fn get_shift(pool: &SqlitePool, id: i64) -> Result<ShiftRow> {
    sqlx::query_as::<_, ShiftRow>(
        r#"
        SELECT id, employee_id, date, amount, paid
        FROM shifts
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Shift",
        id: id.to_string(),
    })
}

/// Mark every shift of the employee in the range as paid.
pub async fn mark_shifts_paid(pool: &SqlitePool, employee_id: i64, from: NaiveDate, to: NaiveDate) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE shifts
        SET paid = 1
        WHERE employee_id = ? AND date BETWEEN ? AND ?
        "#,
    )
    .bind(employee_id)
    .bind(from)
    .bind(to)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Mark a single shift as paid.
pub async fn mark_shift_paid(pool: &SqlitePool, id: i64) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE shifts
        SET paid = 1
        WHERE id = ?
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Shift",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Overwrite the amount of an unpaid shift.
pub async fn update_shift_amount(pool: &SqlitePool, id: i64, amount: f64) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE shifts
        SET amount = ?
        WHERE id = ? AND paid = 0
        "#,
    )
    .bind(amount)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Unpaid shift",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Delete all shifts of an employee.
pub async fn delete_shifts(pool: &SqlitePool, employee_id: i64) -> Result<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM shifts
        WHERE employee_id = ?
        "#,
    )
    .bind(employee_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
