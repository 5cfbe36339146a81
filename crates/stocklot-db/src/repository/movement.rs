//! # Movement Ledger Repository
//!
//! Append-only audit trail of every quantity change applied to a batch.
//!
//! ## Append-Only Contract
//! This module exposes exactly one write: an INSERT. There is no update and
//! no delete, and none may ever be added. For a given batch, replaying its
//! movements in id order reproduces the batch's current available quantity;
//! `remaining_quantity` snapshots the batch after each change so the replay
//! can be checked record by record.

use chrono::{NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use stocklot_core::{MovementRecord, MovementType};

const MOVEMENT_COLUMNS: &str = "id, product_id, batch_id, movement_type, quantity, \
     remaining_quantity, unit_price_cents, expiration_date, reference_no, notes, \
     created_by, created_at";

// =============================================================================
// New Movement
// =============================================================================

/// Input for appending one ledger record.
#[derive(Debug, Clone)]
pub struct NewMovement {
    pub product_id: i64,
    pub batch_id: i64,
    pub movement_type: MovementType,
    /// Magnitude of the change. Always positive.
    pub quantity: i64,
    /// The batch's available quantity immediately after the change.
    pub remaining_quantity: i64,
    pub unit_price_cents: i64,
    pub expiration_date: Option<NaiveDate>,
    pub reference_no: String,
    pub notes: Option<String>,
    pub created_by: String,
}

// =============================================================================
// Repository (pool-based reads)
// =============================================================================

/// Repository for movement ledger queries.
#[derive(Debug, Clone)]
pub struct MovementRepository {
    pool: SqlitePool,
}

impl MovementRepository {
    /// Creates a new MovementRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MovementRepository { pool }
    }

    /// Ordered movement history for a product, oldest first.
    ///
    /// This is the audit/report query exposed to external collaborators.
    pub async fn history_for_product(&self, product_id: i64) -> DbResult<Vec<MovementRecord>> {
        let records = sqlx::query_as::<_, MovementRecord>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM stock_movements \
             WHERE product_id = ?1 ORDER BY id"
        ))
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Ordered movement history for a single batch, oldest first.
    pub async fn history_for_batch(&self, batch_id: i64) -> DbResult<Vec<MovementRecord>> {
        let records = sqlx::query_as::<_, MovementRecord>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM stock_movements \
             WHERE batch_id = ?1 ORDER BY id"
        ))
        .bind(batch_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Movements correlated to one reference (a sale, a transfer).
    pub async fn by_reference(&self, reference_no: &str) -> DbResult<Vec<MovementRecord>> {
        let records = sqlx::query_as::<_, MovementRecord>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM stock_movements \
             WHERE reference_no = ?1 ORDER BY id"
        ))
        .bind(reference_no)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// The `remaining_quantity` snapshot of a batch's most recent movement.
    ///
    /// Cross-invariant check: this must always equal the batch's current
    /// `available_quantity` - ledger and state are never allowed to diverge.
    pub async fn latest_remaining(&self, batch_id: i64) -> DbResult<Option<i64>> {
        let remaining: Option<i64> = sqlx::query_scalar(
            "SELECT remaining_quantity FROM stock_movements \
             WHERE batch_id = ?1 ORDER BY id DESC LIMIT 1",
        )
        .bind(batch_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(remaining)
    }

    /// Total movement count (diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stock_movements")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Transaction-scoped operations (engine use only)
// =============================================================================

/// Appends one movement record.
///
/// Called once per batch touched by an engine operation - a multi-batch
/// consumption produces one record per batch involved.
pub(crate) async fn insert_movement(
    conn: &mut SqliteConnection,
    new: &NewMovement,
) -> DbResult<MovementRecord> {
    debug!(
        batch_id = new.batch_id,
        movement_type = ?new.movement_type,
        quantity = new.quantity,
        remaining = new.remaining_quantity,
        reference = %new.reference_no,
        "Appending movement record"
    );

    let now = Utc::now();

    let record = sqlx::query_as::<_, MovementRecord>(&format!(
        "INSERT INTO stock_movements ( \
             product_id, batch_id, movement_type, quantity, remaining_quantity, \
             unit_price_cents, expiration_date, reference_no, notes, created_by, created_at \
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11) \
         RETURNING {MOVEMENT_COLUMNS}"
    ))
    .bind(new.product_id)
    .bind(new.batch_id)
    .bind(new.movement_type)
    .bind(new.quantity)
    .bind(new.remaining_quantity)
    .bind(new.unit_price_cents)
    .bind(new.expiration_date)
    .bind(&new.reference_no)
    .bind(&new.notes)
    .bind(&new.created_by)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    Ok(record)
}

// =============================================================================
// Unit Tests
// =============================================================================
