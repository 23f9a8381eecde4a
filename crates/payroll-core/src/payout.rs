//! Salary totals and payment allocation.
//!
//! A payment that covers less than the unpaid balance is allocated greedily:
//! unpaid shifts are sorted by amount (oldest first among equal amounts) and
//! paid in full while the money lasts. Whatever is left over is then taken
//! off the oldest shift that is still unpaid, which keeps owing the rest.

use std::cmp::Ordering;
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::StoreError;
use crate::model::{DateRange, EmployeeId, Shift, ShiftId};
use crate::store::ShiftStore;

/// Amounts closer than this are treated as equal during allocation.
pub const AMOUNT_EPSILON: f64 = 1e-9;

/// What happens to the leftover money after full payments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Residual {
    /// The leftover covers the oldest unpaid shift entirely.
    PayInFull(ShiftId),
    /// The oldest unpaid shift keeps owing `amount`.
    Reduce { id: ShiftId, amount: f64 },
}

/// The set of store updates a payment resolves to.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PaymentPlan {
    /// Shifts paid in full, in allocation order.
    pub paid_in_full: Vec<ShiftId>,
    /// Leftover applied to the oldest remaining unpaid shift.
    pub residual: Option<Residual>,
}

impl PaymentPlan {
    /// Whether the plan changes nothing.
    pub fn is_empty(&self) -> bool {
        self.paid_in_full.is_empty() && self.residual.is_none()
    }
}

/// Decide which of `shifts` a payment of `amount` settles.
///
/// Paid shifts in the input are ignored. A non-positive or non-finite amount
/// yields an empty plan.
pub fn plan_payment(shifts: &[Shift], amount: f64) -> PaymentPlan {
    if !amount.is_finite() || amount <= 0.0 {
        return PaymentPlan::default();
    }

    let mut unpaid: Vec<&Shift> = shifts.iter().filter(|s| !s.paid).collect();
    if unpaid.is_empty() {
        return PaymentPlan::default();
    }

    unpaid.sort_by(|a, b| {
        a.amount
            .total_cmp(&b.amount)
            .then_with(|| a.date.cmp(&b.date))
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut remaining = amount;
    let mut paid_in_full = Vec::new();

    // Ascending order: once a shift is unaffordable, so is every later one.
    for shift in &unpaid {
        if shift.amount > remaining + AMOUNT_EPSILON {
            break;
        }
        paid_in_full.push(shift.id);
        remaining -= shift.amount;
        if remaining <= AMOUNT_EPSILON {
            break;
        }
    }

    let residual = if remaining > AMOUNT_EPSILON {
        unpaid
            .iter()
            .filter(|s| !paid_in_full.contains(&s.id))
            .min_by(|a, b| oldest_first(a, b))
            .map(|oldest| {
                let owed = oldest.amount - remaining;
                if owed <= AMOUNT_EPSILON {
                    Residual::PayInFull(oldest.id)
                } else {
                    Residual::Reduce {
                        id: oldest.id,
                        amount: owed,
                    }
                }
            })
    } else {
        None
    };

    PaymentPlan {
        paid_in_full,
        residual,
    }
}

/// Earliest date first, smallest identity among equal dates.
fn oldest_first(a: &Shift, b: &Shift) -> Ordering {
    a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id))
}

/// Totals and payment operations over an employee's shifts.
///
/// The engine holds no locks. Callers must not run two payments for the
/// same employee concurrently, since a payment reads unpaid shifts and then
/// writes against that snapshot.
#[derive(Clone)]
pub struct PayoutEngine {
    shifts: Arc<dyn ShiftStore>,
}

impl PayoutEngine {
    /// Create an engine over the given shift store.
    pub fn new(shifts: Arc<dyn ShiftStore>) -> Self {
        Self { shifts }
    }

    /// Get the underlying shift store.
    pub fn store(&self) -> &Arc<dyn ShiftStore> {
        &self.shifts
    }

    /// Sum of all shift amounts in `range`, paid or not.
    pub async fn total_earned(&self, employee_id: EmployeeId, range: DateRange) -> Result<f64, StoreError> {
        let shifts = self.shifts.get_shifts(employee_id, range).await?;
        Ok(shifts.iter().map(|s| s.amount).sum())
    }

    /// Sum of all unpaid shift amounts across all time.
    pub async fn total_unpaid(&self, employee_id: EmployeeId) -> Result<f64, StoreError> {
        let shifts = self.shifts.get_shifts(employee_id, DateRange::all_time()).await?;
        Ok(shifts.iter().filter(|s| !s.paid).map(|s| s.amount).sum())
    }

    /// Mark every shift in `range` as paid. Idempotent.
    pub async fn mark_all_paid(&self, employee_id: EmployeeId, range: DateRange) -> Result<u64, StoreError> {
        let touched = self.shifts.mark_shifts_paid(employee_id, range).await?;
        info!("Marked {} shifts paid for employee {}", touched, employee_id);
        Ok(touched)
    }

    /// Allocate a payment of `amount` against the employee's unpaid shifts.
    ///
    /// Updates are applied one shift at a time. If one fails, the error is
    /// returned and updates already applied stay in place.
    pub async fn apply_payment(&self, employee_id: EmployeeId, amount: f64) -> Result<PaymentPlan, StoreError> {
        if !amount.is_finite() || amount <= 0.0 {
            debug!("Ignoring payment of {} for employee {}", amount, employee_id);
            return Ok(PaymentPlan::default());
        }

        let shifts = self.shifts.get_shifts(employee_id, DateRange::all_time()).await?;
        let plan = plan_payment(&shifts, amount);
        if plan.is_empty() {
            debug!("Nothing to allocate for employee {}", employee_id);
            return Ok(plan);
        }

        for id in &plan.paid_in_full {
            self.shifts.mark_shift_paid(*id).await?;
        }

        match plan.residual {
            Some(Residual::PayInFull(id)) => self.shifts.mark_shift_paid(id).await?,
            Some(Residual::Reduce { id, amount }) => self.shifts.update_shift_amount(id, amount).await?,
            None => {}
        }

        info!(
            "Applied payment of {:.2} for employee {}: {} paid in full, residual {:?}",
            amount,
            employee_id,
            plan.paid_in_full.len(),
            plan.residual
        );
        Ok(plan)
    }
}
