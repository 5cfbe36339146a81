//! # Domain Types
//!
//! Core domain types for the StockLot batch inventory ledger.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   StockBatch    │   │ MovementRecord  │   │ TransferHeader  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (rowid)     │   │  id (rowid)     │   │  id (rowid)     │       │
//! │  │  product_id     │   │  batch_id (FK)  │   │  source/dest    │       │
//! │  │  available_qty  │   │  movement_type  │   │  status         │       │
//! │  │  expiration     │   │  remaining_qty  │   │  transferred_by │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  MovementType   │   │ TransferStatus  │   │   BatchDebit    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  In             │   │  Pending        │   │  batch_id       │       │
//! │  │  Out            │   │  Completed      │   │  quantity       │       │
//! │  │  Transfer       │   │  Failed         │   └─────────────────┘       │
//! │  │  Adjustment     │   └─────────────────┘                             │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Batch and movement ids are `INTEGER PRIMARY KEY AUTOINCREMENT` rowids, so
//! ascending id equals insertion order. The FIFO tie-break relies on this.
//!
//! ## Money
//! All monetary values are integer cents (i64). Never floats.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

// =============================================================================
// Movement Type
// =============================================================================

/// The kind of quantity change applied to a batch.
///
/// Quantity on a [`MovementRecord`] is always positive; the direction is
/// implied by the type and the batch the record points at:
/// - `In` — stock received, credits a newly created batch
/// - `Out` — sale or other outbound consumption, debits a batch
/// - `Transfer` — debit at the source batch, credit at the destination batch
/// - `Adjustment` — manual correction, either direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum MovementType {
    In,
    Out,
    Transfer,
    Adjustment,
}

// =============================================================================
// Transfer Status
// =============================================================================

/// The status of a stock transfer between locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    /// Transfer recorded, stock not yet moved.
    Pending,
    /// Every line moved; stock and ledger updated.
    Completed,
    /// A line failed; no stock or ledger change was kept.
    Failed,
}

impl Default for TransferStatus {
    fn default() -> Self {
        TransferStatus::Pending
    }
}

// =============================================================================
// Stock Batch
// =============================================================================

/// One procurement or transfer lot of one product at one location.
///
/// ## Invariant
/// `0 <= available_quantity <= quantity` at all times. Batches are never
/// deleted and never topped up; stock only leaves through debits and only
/// arrives as a brand-new batch, which keeps per-lot FIFO ordering intact.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockBatch {
    /// Unique identifier (rowid, insertion-ordered).
    pub id: i64,

    /// Product this lot belongs to (opaque foreign key).
    pub product_id: i64,

    /// Location holding this lot (opaque foreign key).
    pub location_id: i64,

    /// Human-readable lot label, e.g. supplier delivery note number.
    pub batch_reference: String,

    /// Original quantity received into this lot.
    pub quantity: i64,

    /// Remaining quantity. Debits drain this towards zero.
    pub available_quantity: i64,

    /// Acquisition cost per unit, in cents.
    pub unit_cost_cents: i64,

    /// Suggested retail price per unit, in cents. Stored per batch so price
    /// changes across lots of the same product are possible.
    pub srp_cents: i64,

    /// Expiration date. `None` means the lot does not expire.
    #[ts(as = "Option<String>")]
    pub expiration_date: Option<NaiveDate>,

    /// Date the batch became available for consumption.
    #[ts(as = "String")]
    pub entry_date: NaiveDate,

    /// When the row was created.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl StockBatch {
    /// Checks whether the lot has been fully consumed.
    #[inline]
    pub fn is_drained(&self) -> bool {
        self.available_quantity == 0
    }

    /// Quantity already taken out of this lot.
    #[inline]
    pub fn consumed_quantity(&self) -> i64 {
        self.quantity - self.available_quantity
    }
}

/// Input for creating a new stock batch.
///
/// `available_quantity` is not a field here: a new batch always starts with
/// `available_quantity == quantity`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewBatch {
    pub product_id: i64,
    pub location_id: i64,
    pub batch_reference: String,
    pub quantity: i64,
    pub unit_cost_cents: i64,
    pub srp_cents: i64,
    #[ts(as = "Option<String>")]
    pub expiration_date: Option<NaiveDate>,
    #[ts(as = "String")]
    pub entry_date: NaiveDate,
}

// =============================================================================
// Movement Record
// =============================================================================

/// One immutable fact about a quantity change on a batch.
///
/// ## Append-Only
/// Movement records are never updated or deleted. Replaying all records for a
/// batch in id order must reproduce the batch's current `available_quantity`;
/// `remaining_quantity` snapshots the batch after each change so the replay
/// can be verified step by step.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct MovementRecord {
    /// Unique identifier (rowid, insertion-ordered).
    pub id: i64,

    pub product_id: i64,

    /// Batch whose quantity changed.
    pub batch_id: i64,

    pub movement_type: MovementType,

    /// Magnitude of the change. Always positive; direction implied by type.
    pub quantity: i64,

    /// The batch's `available_quantity` immediately after this change.
    pub remaining_quantity: i64,

    /// Unit price in effect for this movement, in cents.
    pub unit_price_cents: i64,

    /// Expiration of the batch at the time of the movement (for reports).
    #[ts(as = "Option<String>")]
    pub expiration_date: Option<NaiveDate>,

    /// Correlates the movement to a sale, transfer, or adjustment.
    pub reference_no: String,

    pub notes: Option<String>,

    /// Actor identifier supplied by the session collaborator. Stored, never
    /// validated here.
    pub created_by: String,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Consumption
// =============================================================================

/// One debit taken from one batch while satisfying a consumption request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BatchDebit {
    pub batch_id: i64,
    /// Amount taken from this batch. Always positive.
    pub quantity: i64,
}

/// A request to consume stock at one location.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ConsumeRequest {
    pub product_id: i64,
    pub location_id: i64,
    /// Total quantity requested across however many batches it takes.
    pub quantity: i64,
    /// Caller-supplied correlation id (sale transaction, adjustment slip).
    pub reference_no: String,
    pub notes: Option<String>,
    /// Acting employee/session identity.
    pub actor: String,
}

// =============================================================================
// Transfers
// =============================================================================

/// A transfer request grouping product quantities moved between two locations.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct TransferHeader {
    pub id: i64,
    pub source_location_id: i64,
    pub destination_location_id: i64,
    #[ts(as = "String")]
    pub transfer_date: NaiveDate,
    pub status: TransferStatus,
    pub transferred_by: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// One product quantity within a transfer.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct TransferLine {
    pub id: i64,
    pub transfer_id: i64,
    pub product_id: i64,
    pub quantity: i64,
}

/// Which source batch funded which destination batch, and by how much.
///
/// Per transfer line, the detail quantities sum to exactly the line quantity;
/// a transfer that cannot satisfy that fails outright.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct TransferBatchDetail {
    pub id: i64,
    pub transfer_id: i64,
    pub transfer_line_id: i64,
    pub source_batch_id: i64,
    pub destination_batch_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    /// Reference of the destination batch (provenance-preserving label).
    pub batch_reference: String,
    #[ts(as = "Option<String>")]
    pub expiration_date: Option<NaiveDate>,
}

/// Input for requesting a transfer.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransferRequest {
    pub source_location_id: i64,
    pub destination_location_id: i64,
    #[ts(as = "String")]
    pub transfer_date: NaiveDate,
    pub transferred_by: String,
    pub lines: Vec<TransferLineRequest>,
}

/// One requested product quantity within a [`TransferRequest`].
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransferLineRequest {
    pub product_id: i64,
    pub quantity: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(quantity: i64, available: i64) -> StockBatch {
        StockBatch {
            id: 1,
            product_id: 10,
            location_id: 1,
            batch_reference: "PO-1001".to_string(),
            quantity,
            available_quantity: available,
            unit_cost_cents: 500,
            srp_cents: 750,
            expiration_date: None,
            entry_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_batch_drained() {
        assert!(batch(20, 0).is_drained());
        assert!(!batch(20, 1).is_drained());
    }

    #[test]
    fn test_consumed_quantity() {
        assert_eq!(batch(20, 15).consumed_quantity(), 5);
        assert_eq!(batch(20, 20).consumed_quantity(), 0);
    }

    #[test]
    fn test_transfer_status_default() {
        assert_eq!(TransferStatus::default(), TransferStatus::Pending);
    }

    #[test]
    fn test_movement_type_serde_uppercase() {
        let json = serde_json::to_string(&MovementType::Out).unwrap();
        assert_eq!(json, "\"OUT\"");
        let back: MovementType = serde_json::from_str("\"ADJUSTMENT\"").unwrap();
        assert_eq!(back, MovementType::Adjustment);
    }
}
