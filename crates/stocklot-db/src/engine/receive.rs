//! # Receiving Engine
//!
//! Credits stock into the ledger. A credit is always a brand-new batch plus
//! one movement record, created in a single transaction - existing batches
//! are never topped up, which keeps per-lot FIFO ordering intact.
//!
//! Two entry points:
//! - [`ReceivingEngine::receive`] - goods received (movement type IN)
//! - [`ReceivingEngine::adjust_in`] - manual upward correction (ADJUSTMENT)

use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::error::{DbError, LedgerError, LedgerResult};
use crate::repository::{batch, movement};
use stocklot_core::{validation, MovementType, NewBatch, StockBatch};

/// Engine for stock credits (IN and inbound ADJUSTMENT).
#[derive(Debug, Clone)]
pub struct ReceivingEngine {
    pool: SqlitePool,
}

impl ReceivingEngine {
    /// Creates a new ReceivingEngine.
    pub fn new(pool: SqlitePool) -> Self {
        ReceivingEngine { pool }
    }

    /// Receives a new lot of stock.
    ///
    /// Creates the batch (available = quantity) and appends an IN movement,
    /// atomically. If `reference_no` is `None`, a receiving reference is
    /// generated.
    pub async fn receive(
        &self,
        new: &NewBatch,
        reference_no: Option<&str>,
        actor: &str,
    ) -> LedgerResult<StockBatch> {
        let reference = reference_no
            .map(str::to_string)
            .unwrap_or_else(|| format!("RCV-{}", Uuid::new_v4()));

        self.credit(new, MovementType::In, &reference, None, actor)
            .await
    }

    /// Manually credits stock (found stock, correction of a miscount).
    ///
    /// Same mechanics as [`receive`](Self::receive), but the ledger records
    /// an ADJUSTMENT so reports can separate corrections from deliveries.
    pub async fn adjust_in(
        &self,
        new: &NewBatch,
        reference_no: Option<&str>,
        notes: Option<&str>,
        actor: &str,
    ) -> LedgerResult<StockBatch> {
        let reference = reference_no
            .map(str::to_string)
            .unwrap_or_else(|| format!("ADJ-{}", Uuid::new_v4()));

        self.credit(new, MovementType::Adjustment, &reference, notes, actor)
            .await
    }

    async fn credit(
        &self,
        new: &NewBatch,
        movement_type: MovementType,
        reference_no: &str,
        notes: Option<&str>,
        actor: &str,
    ) -> LedgerResult<StockBatch> {
        validation::validate_new_batch(new).map_err(stocklot_core::CoreError::from)?;
        validation::validate_reference_no(reference_no).map_err(stocklot_core::CoreError::from)?;
        validation::validate_notes(notes).map_err(stocklot_core::CoreError::from)?;
        validation::validate_actor(actor).map_err(stocklot_core::CoreError::from)?;

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let created = batch::insert_batch(&mut tx, new).await?;

        // A credit's snapshot is the full lot quantity; goods are valued at
        // cost on the way in.
        movement::insert_movement(
            &mut tx,
            &movement::NewMovement {
                product_id: created.product_id,
                batch_id: created.id,
                movement_type,
                quantity: created.quantity,
                remaining_quantity: created.available_quantity,
                unit_price_cents: created.unit_cost_cents,
                expiration_date: created.expiration_date,
                reference_no: reference_no.to_string(),
                notes: notes.map(str::to_string),
                created_by: actor.to_string(),
            },
        )
        .await
        .map_err(LedgerError::LedgerWriteFailure)?;

        tx.commit().await.map_err(DbError::from)?;

        info!(
            batch_id = created.id,
            product_id = created.product_id,
            location_id = created.location_id,
            quantity = created.quantity,
            movement_type = ?movement_type,
            "Stock credited"
        );

        Ok(created)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::NaiveDate;
    use stocklot_core::CoreError;

    fn new_batch(quantity: i64) -> NewBatch {
        NewBatch {
            product_id: 10,
            location_id: 1,
            batch_reference: "PO-2024-0013".to_string(),
            quantity,
            unit_cost_cents: 500,
            srp_cents: 750,
            expiration_date: None,
            entry_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_receive_creates_batch_and_in_movement() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let batch = db
            .receiving()
            .receive(&new_batch(20), Some("GRN-1001"), "emp-204")
            .await
            .unwrap();

        assert_eq!(batch.available_quantity, 20);

        let history = db.movements().history_for_batch(batch.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].movement_type, MovementType::In);
        assert_eq!(history[0].quantity, 20);
        assert_eq!(history[0].remaining_quantity, 20);
        assert_eq!(history[0].reference_no, "GRN-1001");
        assert_eq!(history[0].unit_price_cents, 500);
    }

    #[tokio::test]
    async fn test_receive_generates_reference_when_missing() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let batch = db
            .receiving()
            .receive(&new_batch(5), None, "emp-204")
            .await
            .unwrap();

        let history = db.movements().history_for_batch(batch.id).await.unwrap();
        assert!(history[0].reference_no.starts_with("RCV-"));
    }

    #[tokio::test]
    async fn test_adjust_in_records_adjustment() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let batch = db
            .receiving()
            .adjust_in(&new_batch(3), Some("COUNT-7"), Some("cycle count"), "emp-204")
            .await
            .unwrap();

        let history = db.movements().history_for_batch(batch.id).await.unwrap();
        assert_eq!(history[0].movement_type, MovementType::Adjustment);
        assert_eq!(history[0].notes.as_deref(), Some("cycle count"));
    }

    #[tokio::test]
    async fn test_rejects_non_positive_quantity() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let err = db
            .receiving()
            .receive(&new_batch(0), None, "emp-204")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            LedgerError::Core(CoreError::Validation(_))
        ));

        // Nothing was written
        assert_eq!(db.batches().count().await.unwrap(), 0);
        assert_eq!(db.movements().count().await.unwrap(), 0);
    }
}
