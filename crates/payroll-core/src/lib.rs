//! Core types and payout logic for the payroll bot.
//!
//! This crate provides the shared vocabulary used by every other crate in
//! the workspace:
//!
//! - [`Employee`] / [`Shift`] / [`NewShift`] - Persistent records
//! - [`DateRange`] - Inclusive day-granularity windows used by every query
//! - [`ShiftStore`] / [`EmployeeStore`] - Storage contracts implemented by
//!   the `database` crate and by [`InMemoryStore`]
//! - [`PayoutEngine`] - Totals and the greedy payment allocation
//! - [`StoreError`] / [`ValidationError`] - Error types
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use chrono::NaiveDate;
//! use payroll_core::{InMemoryStore, NewShift, PayoutEngine, ShiftStore};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(InMemoryStore::new());
//!     let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
//!     store.add_shift(NewShift::new(7, date, 120.0)?).await?;
//!
//!     let engine = PayoutEngine::new(store);
//!     engine.apply_payment(7, 50.0).await?;
//!     assert_eq!(engine.total_unpaid(7).await?, 70.0);
//!     Ok(())
//! }
//! ```

mod error;
mod memory;
mod model;
mod payout;
mod store;
mod validation;

pub use error::{StoreError, ValidationError};
pub use memory::InMemoryStore;
pub use model::{days_in_month, DateRange, Employee, EmployeeId, NewShift, Shift, ShiftId, DEFAULT_ROLE};
pub use payout::{plan_payment, PaymentPlan, PayoutEngine, Residual, AMOUNT_EPSILON};
pub use store::{EmployeeStore, ShiftStore};
pub use validation::{parse_amount, MIN_AMOUNT};

// Re-export async_trait for store implementors
pub use async_trait::async_trait;
