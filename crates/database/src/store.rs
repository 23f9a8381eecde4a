//! Store contract implementations backed by SQLite.

use async_trait::async_trait;
use payroll_core::{
    DateRange, Employee, EmployeeId, EmployeeStore, NewShift, Shift, ShiftId, ShiftStore, StoreError,
};

use crate::models::EmployeeRow;
use crate::{employee, shift, Database};

#[async_trait]
impl ShiftStore for Database {
    async fn add_shift(&self, new_shift: NewShift) -> Result<ShiftId, StoreError> {
        let id = shift::add_shift(
            self.pool(),
            new_shift.employee_id(),
            new_shift.date(),
            new_shift.amount(),
        )
        .await?;
        Ok(id)
    }

    async fn get_shifts(&self, employee_id: EmployeeId, range: DateRange) -> Result<Vec<Shift>, StoreError> {
        let rows = shift::get_shifts(self.pool(), employee_id, range.from, range.to).await?;
        Ok(rows.into_iter().map(Shift::from).collect())
    }

    async fn mark_shifts_paid(&self, employee_id: EmployeeId, range: DateRange) -> Result<u64, StoreError> {
        Ok(shift::mark_shifts_paid(self.pool(), employee_id, range.from, range.to).await?)
    }

    async fn mark_shift_paid(&self, id: ShiftId) -> Result<(), StoreError> {
        Ok(shift::mark_shift_paid(self.pool(), id).await?)
    }

    async fn update_shift_amount(&self, id: ShiftId, amount: f64) -> Result<(), StoreError> {
        Ok(shift::update_shift_amount(self.pool(), id, amount).await?)
    }

    async fn delete_shifts(&self, employee_id: EmployeeId) -> Result<u64, StoreError> {
        Ok(shift::delete_shifts(self.pool(), employee_id).await?)
    }
}

#[async_trait]
impl EmployeeStore for Database {
    async fn get_all_employees(&self) -> Result<Vec<Employee>, StoreError> {
        let rows = employee::list_employees(self.pool()).await?;
        Ok(rows.into_iter().map(Employee::from).collect())
    }

    async fn get_employee(&self, id: EmployeeId) -> Result<Employee, StoreError> {
        Ok(employee::get_employee(self.pool(), id).await?.into())
    }

    async fn upsert_employee(&self, e: &Employee) -> Result<(), StoreError> {
        let row = EmployeeRow {
            id: e.id,
            name: e.name.clone(),
            chat_id: e.chat_id,
            role: e.role.clone(),
        };
        Ok(employee::upsert_employee(self.pool(), &row).await?)
    }

    async fn delete_employee(&self, id: EmployeeId) -> Result<(), StoreError> {
        Ok(employee::delete_employee(self.pool(), id).await?)
    }
}
