//! Storage contracts for employees and shifts.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::model::{DateRange, Employee, EmployeeId, NewShift, Shift, ShiftId};

/// Persistent shift records.
///
/// All range queries use inclusive bounds. Implementations must be safe to
/// share between tasks; callers serialize writes per employee.
#[async_trait]
pub trait ShiftStore: Send + Sync {
    /// Persist a new unpaid shift and return its identity.
    async fn add_shift(&self, shift: NewShift) -> Result<ShiftId, StoreError>;

    /// Get the employee's shifts dated within `range`, in no particular order.
    async fn get_shifts(&self, employee_id: EmployeeId, range: DateRange) -> Result<Vec<Shift>, StoreError>;

    /// Set `paid` on every shift of the employee within `range`.
    ///
    /// Returns the number of shifts touched.
    async fn mark_shifts_paid(&self, employee_id: EmployeeId, range: DateRange) -> Result<u64, StoreError>;

    /// Set `paid` on a single shift.
    async fn mark_shift_paid(&self, id: ShiftId) -> Result<(), StoreError>;

    /// Overwrite the amount of an unpaid shift.
    ///
    /// Fails with [`StoreError::NotFound`] if the shift is absent or already paid.
    async fn update_shift_amount(&self, id: ShiftId, amount: f64) -> Result<(), StoreError>;

    /// Delete every shift of the employee. Returns the number deleted.
    async fn delete_shifts(&self, employee_id: EmployeeId) -> Result<u64, StoreError>;
}

/// Persistent employee records.
#[async_trait]
pub trait EmployeeStore: Send + Sync {
    /// List all employees ordered by identity.
    async fn get_all_employees(&self) -> Result<Vec<Employee>, StoreError>;

    /// Get an employee, failing with [`StoreError::NotFound`] if absent.
    async fn get_employee(&self, id: EmployeeId) -> Result<Employee, StoreError>;

    /// Insert the employee or update name, channel and role of an existing one.
    async fn upsert_employee(&self, employee: &Employee) -> Result<(), StoreError>;

    /// Delete an employee record.
    async fn delete_employee(&self, id: EmployeeId) -> Result<(), StoreError>;
}
