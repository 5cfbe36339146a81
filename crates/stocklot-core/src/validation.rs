//! # Validation Module
//!
//! Input validation for ledger operations.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (POS terminal, transfer UI)                           │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (before the engines touch state)                 │
//! │  ├── Positive quantities, bounded references                           │
//! │  └── Transfer request shape (source ≠ destination, non-empty lines)    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints (quantity > 0, available >= 0)                  │
//! │  └── Foreign key constraints                                           │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{CoreError, ValidationError};
use crate::types::{NewBatch, TransferRequest};
use crate::{MAX_MOVEMENT_QUANTITY, MAX_NOTES_LEN, MAX_REFERENCE_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a movement/batch quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_MOVEMENT_QUANTITY
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_MOVEMENT_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_MOVEMENT_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a monetary amount in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (free samples, written-off lots)
pub fn validate_cents(cents: i64, field: &str) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a batch reference (human-readable lot label).
///
/// ## Rules
/// - Must not be empty
/// - Maximum MAX_REFERENCE_LEN characters
/// - Only alphanumeric characters, hyphens, underscores
pub fn validate_batch_reference(reference: &str) -> ValidationResult<()> {
    let reference = reference.trim();

    if reference.is_empty() {
        return Err(ValidationError::Required {
            field: "batch_reference".to_string(),
        });
    }

    if reference.len() > MAX_REFERENCE_LEN {
        return Err(ValidationError::TooLong {
            field: "batch_reference".to_string(),
            max: MAX_REFERENCE_LEN,
        });
    }

    if !reference
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "batch_reference".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a movement reference number (sale id, transfer id, slip number).
pub fn validate_reference_no(reference_no: &str) -> ValidationResult<()> {
    let reference_no = reference_no.trim();

    if reference_no.is_empty() {
        return Err(ValidationError::Required {
            field: "reference_no".to_string(),
        });
    }

    if reference_no.len() > MAX_REFERENCE_LEN {
        return Err(ValidationError::TooLong {
            field: "reference_no".to_string(),
            max: MAX_REFERENCE_LEN,
        });
    }

    Ok(())
}

/// Validates an actor identifier.
///
/// The core stores whatever identity the session collaborator supplies; it
/// only rejects the degenerate cases.
pub fn validate_actor(actor: &str) -> ValidationResult<()> {
    let actor = actor.trim();

    if actor.is_empty() {
        return Err(ValidationError::Required {
            field: "actor".to_string(),
        });
    }

    if actor.len() > MAX_REFERENCE_LEN {
        return Err(ValidationError::TooLong {
            field: "actor".to_string(),
            max: MAX_REFERENCE_LEN,
        });
    }

    Ok(())
}

/// Validates optional free-form notes.
pub fn validate_notes(notes: Option<&str>) -> ValidationResult<()> {
    if let Some(notes) = notes {
        if notes.len() > MAX_NOTES_LEN {
            return Err(ValidationError::TooLong {
                field: "notes".to_string(),
                max: MAX_NOTES_LEN,
            });
        }
    }

    Ok(())
}

// =============================================================================
// Request Validators
// =============================================================================

/// Validates a new batch before it is created.
pub fn validate_new_batch(batch: &NewBatch) -> ValidationResult<()> {
    validate_quantity(batch.quantity)?;
    validate_cents(batch.unit_cost_cents, "unit_cost")?;
    validate_cents(batch.srp_cents, "srp")?;
    validate_batch_reference(&batch.batch_reference)?;
    Ok(())
}

/// Validates the shape of a transfer request before any batch is touched.
///
/// ## Rules
/// - At least one line
/// - Source and destination locations must differ
/// - Every line quantity must be positive
pub fn validate_transfer_request(request: &TransferRequest) -> Result<(), CoreError> {
    validate_actor(&request.transferred_by)?;

    if request.lines.is_empty() {
        return Err(CoreError::invalid_transfer("transfer has no lines"));
    }

    if request.source_location_id == request.destination_location_id {
        return Err(CoreError::invalid_transfer(format!(
            "source and destination are the same location ({})",
            request.source_location_id
        )));
    }

    for line in &request.lines {
        if line.quantity <= 0 {
            return Err(CoreError::invalid_transfer(format!(
                "line for product {} requests non-positive quantity {}",
                line.product_id, line.quantity
            )));
        }
        validate_quantity(line.quantity)?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransferLineRequest;
    use chrono::NaiveDate;

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(100).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(MAX_MOVEMENT_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_cents() {
        assert!(validate_cents(0, "unit_cost").is_ok());
        assert!(validate_cents(1099, "unit_cost").is_ok());
        assert!(validate_cents(-100, "unit_cost").is_err());
    }

    #[test]
    fn test_validate_batch_reference() {
        assert!(validate_batch_reference("PO-2024-0013").is_ok());
        assert!(validate_batch_reference("DELIVERY_7").is_ok());

        assert!(validate_batch_reference("").is_err());
        assert!(validate_batch_reference("   ").is_err());
        assert!(validate_batch_reference("has space").is_err());
        assert!(validate_batch_reference(&"A".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_actor() {
        assert!(validate_actor("emp-204").is_ok());
        assert!(validate_actor("").is_err());
    }

    fn transfer_request(source: i64, destination: i64, lines: Vec<(i64, i64)>) -> TransferRequest {
        TransferRequest {
            source_location_id: source,
            destination_location_id: destination,
            transfer_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            transferred_by: "emp-204".to_string(),
            lines: lines
                .into_iter()
                .map(|(product_id, quantity)| TransferLineRequest {
                    product_id,
                    quantity,
                })
                .collect(),
        }
    }

    #[test]
    fn test_validate_transfer_request() {
        assert!(validate_transfer_request(&transfer_request(1, 2, vec![(10, 5)])).is_ok());
    }

    #[test]
    fn test_transfer_same_location_rejected() {
        let err = validate_transfer_request(&transfer_request(1, 1, vec![(10, 5)])).unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransfer { .. }));
    }

    #[test]
    fn test_transfer_empty_lines_rejected() {
        let err = validate_transfer_request(&transfer_request(1, 2, vec![])).unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransfer { .. }));
    }

    #[test]
    fn test_transfer_non_positive_line_rejected() {
        let err = validate_transfer_request(&transfer_request(1, 2, vec![(10, 0)])).unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransfer { .. }));
    }
}
