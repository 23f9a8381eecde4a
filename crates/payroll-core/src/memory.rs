//! In-memory implementation of the store contracts.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::model::{DateRange, Employee, EmployeeId, NewShift, Shift, ShiftId};
use crate::store::{EmployeeStore, ShiftStore};

#[derive(Debug, Default)]
struct MemoryState {
    employees: BTreeMap<EmployeeId, Employee>,
    shifts: BTreeMap<ShiftId, Shift>,
    next_shift_id: ShiftId,
}

/// A process-local store backed by ordered maps.
///
/// Useful for tests and for running the bot without a database file.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<MemoryState>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a shift by identity.
    pub async fn shift(&self, id: ShiftId) -> Option<Shift> {
        self.state.read().await.shifts.get(&id).cloned()
    }

    /// Count all shifts across all employees.
    pub async fn shift_count(&self) -> usize {
        self.state.read().await.shifts.len()
    }
}

#[async_trait]
impl ShiftStore for InMemoryStore {
    async fn add_shift(&self, shift: NewShift) -> Result<ShiftId, StoreError> {
        let mut state = self.state.write().await;
        state.next_shift_id += 1;
        let id = state.next_shift_id;
        state.shifts.insert(
            id,
            Shift {
                id,
                employee_id: shift.employee_id(),
                date: shift.date(),
                amount: shift.amount(),
                paid: false,
            },
        );
        Ok(id)
    }

    async fn get_shifts(&self, employee_id: EmployeeId, range: DateRange) -> Result<Vec<Shift>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .shifts
            .values()
            .filter(|s| s.employee_id == employee_id && range.contains(s.date))
            .cloned()
            .collect())
    }

    async fn mark_shifts_paid(&self, employee_id: EmployeeId, range: DateRange) -> Result<u64, StoreError> {
        let mut state = self.state.write().await;
        let mut touched = 0;
        for shift in state
            .shifts
            .values_mut()
            .filter(|s| s.employee_id == employee_id && range.contains(s.date))
        {
            shift.paid = true;
            touched += 1;
        }
        Ok(touched)
    }

    async fn mark_shift_paid(&self, id: ShiftId) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let shift = state
            .shifts
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("Shift", id))?;
        shift.paid = true;
        Ok(())
    }

    async fn update_shift_amount(&self, id: ShiftId, amount: f64) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        match state.shifts.get_mut(&id) {
            Some(shift) if !shift.paid => {
                shift.amount = amount;
                Ok(())
            }
            _ => Err(StoreError::not_found("Unpaid shift", id)),
        }
    }

    async fn delete_shifts(&self, employee_id: EmployeeId) -> Result<u64, StoreError> {
        let mut state = self.state.write().await;
        let before = state.shifts.len();
        state.shifts.retain(|_, s| s.employee_id != employee_id);
        Ok((before - state.shifts.len()) as u64)
    }
}

#[async_trait]
impl EmployeeStore for InMemoryStore {
    async fn get_all_employees(&self) -> Result<Vec<Employee>, StoreError> {
        Ok(self.state.read().await.employees.values().cloned().collect())
    }

    async fn get_employee(&self, id: EmployeeId) -> Result<Employee, StoreError> {
        self.state
            .read()
            .await
            .employees
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Employee", id))
    }

    async fn upsert_employee(&self, employee: &Employee) -> Result<(), StoreError> {
        self.state
            .write()
            .await
            .employees
            .insert(employee.id, employee.clone());
        Ok(())
    }

    async fn delete_employee(&self, id: EmployeeId) -> Result<(), StoreError> {
        self.state
            .write()
            .await
            .employees
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found("Employee", id))
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    #[tokio::test]
    async fn test_shift_range_query_is_inclusive() {
        let store = InMemoryStore::new();
        store.add_shift(NewShift::new(1, date(1), 10.0).unwrap()).await.unwrap();
        store.add_shift(NewShift::new(1, date(15), 20.0).unwrap()).await.unwrap();
        store.add_shift(NewShift::new(1, date(30), 30.0).unwrap()).await.unwrap();
        store.add_shift(NewShift::new(2, date(15), 40.0).unwrap()).await.unwrap();

        let shifts = store
            .get_shifts(1, DateRange::new(date(1), date(15)))
            .await
            .unwrap();
        assert_eq!(shifts.len(), 2);
        assert!(shifts.iter().all(|s| s.employee_id == 1 && !s.paid));
    }

    #[tokio::test]
    async fn test_update_amount_rejects_paid_shift() {
        let store = InMemoryStore::new();
        let id = store.add_shift(NewShift::new(1, date(1), 10.0).unwrap()).await.unwrap();

        store.update_shift_amount(id, 4.0).await.unwrap();
        assert_eq!(store.shift(id).await.unwrap().amount, 4.0);

        store.mark_shift_paid(id).await.unwrap();
        let result = store.update_shift_amount(id, 1.0).await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
        assert_eq!(store.shift(id).await.unwrap().amount, 4.0);
    }

    #[tokio::test]
    async fn test_employee_upsert() {
        let store = InMemoryStore::new();
        assert!(store.get_employee(5).await.unwrap_err().is_not_found());

        store.upsert_employee(&Employee::new(5, "Ann", 5)).await.unwrap();
        let renamed = Employee {
            name: "Anna".to_string(),
            ..Employee::new(5, "Ann", 5)
        };
        store.upsert_employee(&renamed).await.unwrap();

        let fetched = store.get_employee(5).await.unwrap();
        assert_eq!(fetched.name, "Anna");
        assert_eq!(store.get_all_employees().await.unwrap().len(), 1);
    }
}
