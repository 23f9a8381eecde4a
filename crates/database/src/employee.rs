//! Employee CRUD operations.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::EmployeeRow;

/// Insert an employee or update name, channel and role of an existing one.
pub async fn upsert_employee(pool: &SqlitePool, employee: &EmployeeRow) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO employees (id, name, chat_id, role)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            chat_id = excluded.chat_id,
            role = excluded.role
        "#,
    )
    .bind(employee.id)
    .bind(&employee.name)
    .bind(employee.chat_id)
    .bind(&employee.role)
    .execute(pool)
    .await?;

    Ok(())
}

/// Get an employee by ID.
pub async fn get_employee(pool: &SqlitePool, id: i64) -> Result<EmployeeRow> {
    sqlx::query_as::<_, EmployeeRow>(
        r#"
        SELECT id, name, chat_id, role
        FROM employees
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Employee",
        id: id.to_string(),
    })
}

/// List all employees.
pub async fn list_employees(pool: &SqlitePool) -> Result<Vec<EmployeeRow>> {
    let employees = sqlx::query_as::<_, EmployeeRow>(
        r#"
        SELECT id, name, chat_id, role
        FROM employees
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(employees)
}

/// Delete an employee by ID.
pub async fn delete_employee(pool: &SqlitePool, id: i64) -> Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM employees
        WHERE id = ?
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Employee",
            id: id.to_string(),
        });
    }

    Ok(())
}
