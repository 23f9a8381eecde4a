//! Error types for store and input validation.

use thiserror::Error;

/// Errors reported by [`ShiftStore`](crate::ShiftStore) and
/// [`EmployeeStore`](crate::EmployeeStore) implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Persistence backend failed (connection, query, etc.)
    #[error("store backend error: {0}")]
    Backend(String),

    /// Looked-up record is absent.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
}

impl StoreError {
    /// Build a not-found error for the given entity and identity.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Whether this error means the record does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Malformed user input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Text could not be parsed as a number.
    #[error("not a number: {0:?}")]
    NotANumber(String),

    /// Parsed value is NaN or infinite.
    #[error("amount must be a finite number")]
    NotFinite,

    /// Amount is below the accepted minimum.
    #[error("amount must be at least {min}")]
    BelowMinimum { min: f64 },

    /// Interaction payload could not be decoded.
    #[error("malformed token payload: {0:?}")]
    MalformedToken(String),
}
