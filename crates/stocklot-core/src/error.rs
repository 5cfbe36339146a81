//! # Error Types
//!
//! Domain-specific error types for stocklot-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stocklot-core errors (this file)                                      │
//! │  ├── CoreError        - Domain rule violations (stock, transfers)      │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  stocklot-db errors (separate crate)                                   │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── LedgerError      - Engine failures (adds conflict/rollback cases) │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → LedgerError → Caller              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product, batch, quantities)
//! 3. Errors are enum variants, never String
//! 4. Every core error aborts the whole logical operation

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Domain rule violations.
///
/// These errors represent a request the ledger cannot honor. They abort the
/// entire logical operation (one consume, one transfer) with no partial trace.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Requested quantity exceeds the total available across all batches at
    /// a location.
    ///
    /// ## When This Occurs
    /// - A sale asks for more units than the location holds
    /// - A transfer line exceeds source stock
    ///
    /// No mutation has occurred when this surfaces; the availability check
    /// runs before any debit.
    #[error(
        "Insufficient stock for product {product_id} at location {location_id}: \
         available {available}, requested {requested}"
    )]
    InsufficientStock {
        product_id: i64,
        location_id: i64,
        available: i64,
        requested: i64,
    },

    /// A single batch debit would drive the batch negative.
    ///
    /// Internal signal: always converted to [`CoreError::InsufficientStock`]
    /// or a rollback before reaching a caller.
    #[error(
        "Insufficient stock in batch {batch_id}: available {available}, requested {requested}"
    )]
    InsufficientBatchStock {
        batch_id: i64,
        available: i64,
        requested: i64,
    },

    /// Malformed transfer request, rejected before any batch is touched.
    ///
    /// ## When This Occurs
    /// - Source and destination location are the same
    /// - The transfer has no lines
    /// - A line requests a non-positive quantity
    #[error("Invalid transfer: {reason}")]
    InvalidTransfer { reason: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates an InvalidTransfer error.
    pub fn invalid_transfer(reason: impl Into<String>) -> Self {
        CoreError::InvalidTransfer {
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when caller input doesn't meet requirements. Used for early
/// validation before the engines touch any state.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., bad characters in a reference).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product_id: 10,
            location_id: 1,
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for product 10 at location 1: available 3, requested 5"
        );
    }

    #[test]
    fn test_batch_error_message() {
        let err = CoreError::InsufficientBatchStock {
            batch_id: 7,
            available: 2,
            requested: 9,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock in batch 7: available 2, requested 9"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "reference_no".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
