//! # FIFO Consumption Engine
//!
//! Satisfies a quantity request against available batches in the canonical
//! FIFO order, or fails entirely. This is the single most important operation
//! in the system: it is what gives "FIFO" its meaning, and sales, transfers,
//! and reports all depend on its ordering and atomicity guarantees.
//!
//! ## Algorithm
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  consume(product, location, quantity)          ONE TRANSACTION         │
//! │                                                                         │
//! │  1. Read available batches (FIFO order)                                │
//! │  2. Plan debits via stocklot_core::fifo::plan                          │
//! │     └── total short? → InsufficientStock, NOTHING mutated              │
//! │  3. For each planned debit:                                            │
//! │     ├── guarded UPDATE (available_quantity >= amount in WHERE)         │
//! │     │   └── guard failed? → ConcurrencyConflict → ROLLBACK ALL         │
//! │     └── append OUT/ADJUSTMENT/TRANSFER movement                        │
//! │         └── insert failed? → LedgerWriteFailure → ROLLBACK ALL         │
//! │  4. Commit                                                             │
//! │                                                                         │
//! │  Partial consumption is never observable.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

use crate::error::{DbError, LedgerError, LedgerResult};
use crate::repository::{batch, movement};
use stocklot_core::{fifo, validation, BatchDebit, ConsumeRequest, CoreError, MovementType};

/// Engine for stock debits (OUT and outbound ADJUSTMENT).
#[derive(Debug, Clone)]
pub struct ConsumptionEngine {
    pool: SqlitePool,
}

impl ConsumptionEngine {
    /// Creates a new ConsumptionEngine.
    pub fn new(pool: SqlitePool) -> Self {
        ConsumptionEngine { pool }
    }

    /// Consumes stock for a sale or other outbound movement.
    ///
    /// ## Returns
    /// The debits actually taken, in consumption order - one entry per batch
    /// touched. A multi-batch consumption produces one movement record per
    /// batch involved.
    ///
    /// ## Errors
    /// * [`CoreError::InsufficientStock`] - total available is short; no
    ///   mutation occurred
    /// * [`LedgerError::ConcurrencyConflict`] - a concurrent writer drained
    ///   an assumed batch; everything was rolled back
    pub async fn consume(&self, request: &ConsumeRequest) -> LedgerResult<Vec<BatchDebit>> {
        self.run(request, MovementType::Out).await
    }

    /// Manually reduces stock (damage, expiry write-off, recount).
    ///
    /// Identical mechanics to [`consume`](Self::consume), recorded as
    /// ADJUSTMENT so reports can separate corrections from sales.
    pub async fn adjust_out(&self, request: &ConsumeRequest) -> LedgerResult<Vec<BatchDebit>> {
        self.run(request, MovementType::Adjustment).await
    }

    async fn run(
        &self,
        request: &ConsumeRequest,
        movement_type: MovementType,
    ) -> LedgerResult<Vec<BatchDebit>> {
        validation::validate_quantity(request.quantity).map_err(CoreError::from)?;
        validation::validate_reference_no(&request.reference_no).map_err(CoreError::from)?;
        validation::validate_notes(request.notes.as_deref()).map_err(CoreError::from)?;
        validation::validate_actor(&request.actor).map_err(CoreError::from)?;

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let debits = consume_in_tx(&mut tx, request, movement_type).await?;

        tx.commit().await.map_err(DbError::from)?;

        info!(
            product_id = request.product_id,
            location_id = request.location_id,
            quantity = request.quantity,
            batches = debits.len(),
            movement_type = ?movement_type,
            reference = %request.reference_no,
            "Stock consumed"
        );

        Ok(debits)
    }
}

/// The consumption sequence, on an already-open transaction.
///
/// Shared with the transfer engine, which runs one of these per transfer
/// line inside its own transaction so a late line failure rolls back the
/// earlier lines too.
pub(crate) async fn consume_in_tx(
    conn: &mut SqliteConnection,
    request: &ConsumeRequest,
    movement_type: MovementType,
) -> LedgerResult<Vec<BatchDebit>> {
    let batches = batch::fetch_available(&mut *conn, request.product_id, request.location_id).await?;

    // All-or-nothing: a short total fails here, before any debit.
    let debits = fifo::plan(&batches, request.quantity)?;

    for debit in &debits {
        let new_available = batch::debit_batch(&mut *conn, debit.batch_id, debit.quantity)
            .await?
            .ok_or(LedgerError::ConcurrencyConflict {
                batch_id: debit.batch_id,
            })?;

        let source = batches
            .iter()
            .find(|b| b.id == debit.batch_id)
            .ok_or_else(|| DbError::not_found("StockBatch", debit.batch_id.to_string()))?;

        // Outbound stock is valued at sale price; inter-location moves at cost.
        let unit_price_cents = match movement_type {
            MovementType::Transfer => source.unit_cost_cents,
            _ => source.srp_cents,
        };

        movement::insert_movement(
            conn,
            &movement::NewMovement {
                product_id: request.product_id,
                batch_id: debit.batch_id,
                movement_type,
                quantity: debit.quantity,
                remaining_quantity: new_available,
                unit_price_cents,
                expiration_date: source.expiration_date,
                reference_no: request.reference_no.clone(),
                notes: request.notes.clone(),
                created_by: request.actor.clone(),
            },
        )
        .await
        .map_err(LedgerError::LedgerWriteFailure)?;
    }

    Ok(debits)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::NaiveDate;
    use stocklot_core::{NewBatch, TransferLineRequest, TransferRequest};

    fn lot(
        quantity: i64,
        expiration: Option<(i32, u32, u32)>,
        entry: (i32, u32, u32),
    ) -> NewBatch {
        NewBatch {
            product_id: 10,
            location_id: 1,
            batch_reference: format!("PO-{quantity}"),
            quantity,
            unit_cost_cents: 500,
            srp_cents: 750,
            expiration_date: expiration
                .map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap()),
            entry_date: NaiveDate::from_ymd_opt(entry.0, entry.1, entry.2).unwrap(),
        }
    }

    fn request(quantity: i64, reference: &str) -> ConsumeRequest {
        ConsumeRequest {
            product_id: 10,
            location_id: 1,
            quantity,
            reference_no: reference.to_string(),
            notes: None,
            actor: "emp-204".to_string(),
        }
    }

    /// Batch A1 (qty 20, no expiration, entry 2024-01-01) and A2 (qty 10,
    /// expires 2024-03-01, entry 2024-01-05). Consuming 12 drains A2 fully
    /// first - real expirations beat the unexpiring lot - then takes 2 from
    /// A1, leaving A1 at 18 and A2 at 0, with two OUT movements.
    #[tokio::test]
    async fn test_expiring_lot_consumed_before_older_unexpiring_lot() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let receiving = db.receiving();

        let a1 = receiving
            .receive(&lot(20, None, (2024, 1, 1)), Some("GRN-1"), "emp-204")
            .await
            .unwrap();
        let a2 = receiving
            .receive(&lot(10, Some((2024, 3, 1)), (2024, 1, 5)), Some("GRN-2"), "emp-204")
            .await
            .unwrap();

        let debits = db.consumption().consume(&request(12, "SALE-1")).await.unwrap();

        assert_eq!(
            debits,
            vec![
                BatchDebit { batch_id: a2.id, quantity: 10 },
                BatchDebit { batch_id: a1.id, quantity: 2 },
            ]
        );

        let a1 = db.batches().get_by_id(a1.id).await.unwrap().unwrap();
        let a2 = db.batches().get_by_id(a2.id).await.unwrap().unwrap();
        assert_eq!(a1.available_quantity, 18);
        assert_eq!(a2.available_quantity, 0);

        let out: Vec<_> = db
            .movements()
            .by_reference("SALE-1")
            .await
            .unwrap()
            .into_iter()
            .filter(|m| m.movement_type == MovementType::Out)
            .collect();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].batch_id, a2.id);
        assert_eq!(out[0].remaining_quantity, 0);
        assert_eq!(out[1].batch_id, a1.id);
        assert_eq!(out[1].remaining_quantity, 18);
    }

    #[tokio::test]
    async fn test_insufficient_stock_mutates_nothing() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let batch = db
            .receiving()
            .receive(&lot(5, None, (2024, 1, 1)), Some("GRN-1"), "emp-204")
            .await
            .unwrap();

        let movements_before = db.movements().count().await.unwrap();

        let err = db.consumption().consume(&request(6, "SALE-2")).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Core(CoreError::InsufficientStock {
                available: 5,
                requested: 6,
                ..
            })
        ));

        // All-or-nothing: batch and ledger untouched
        let batch = db.batches().get_by_id(batch.id).await.unwrap().unwrap();
        assert_eq!(batch.available_quantity, 5);
        assert_eq!(db.movements().count().await.unwrap(), movements_before);
    }

    #[tokio::test]
    async fn test_consume_never_drives_negative() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        db.receiving()
            .receive(&lot(7, None, (2024, 1, 1)), Some("GRN-1"), "emp-204")
            .await
            .unwrap();

        db.consumption().consume(&request(7, "SALE-3")).await.unwrap();
        let err = db.consumption().consume(&request(1, "SALE-4")).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Core(CoreError::InsufficientStock { available: 0, .. })
        ));

        assert_eq!(db.stock().available_quantity(10, 1).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_adjust_out_records_adjustment() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        db.receiving()
            .receive(&lot(10, None, (2024, 1, 1)), Some("GRN-1"), "emp-204")
            .await
            .unwrap();

        let mut req = request(4, "DMG-55");
        req.notes = Some("water damage".to_string());
        db.consumption().adjust_out(&req).await.unwrap();

        let records = db.movements().by_reference("DMG-55").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].movement_type, MovementType::Adjustment);
        assert_eq!(records[0].notes.as_deref(), Some("water damage"));
    }

    /// The ledger's running snapshots must agree with batch state after any
    /// sequence of operations.
    #[tokio::test]
    async fn test_ledger_and_state_never_diverge() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let b1 = db
            .receiving()
            .receive(&lot(20, None, (2024, 1, 1)), Some("GRN-1"), "emp-204")
            .await
            .unwrap();
        let b2 = db
            .receiving()
            .receive(&lot(10, Some((2024, 3, 1)), (2024, 1, 5)), Some("GRN-2"), "emp-204")
            .await
            .unwrap();

        db.consumption().consume(&request(12, "SALE-1")).await.unwrap();
        db.consumption().consume(&request(6, "SALE-2")).await.unwrap();
        db.consumption()
            .adjust_out(&request(2, "DMG-1"))
            .await
            .unwrap();

        for id in [b1.id, b2.id] {
            let batch = db.batches().get_by_id(id).await.unwrap().unwrap();
            let ledger = db.movements().latest_remaining(id).await.unwrap();
            assert_eq!(ledger, Some(batch.available_quantity));

            // Replay: every record's snapshot follows from the previous one
            let history = db.movements().history_for_batch(id).await.unwrap();
            let mut replayed = 0i64;
            for record in &history {
                match record.movement_type {
                    MovementType::In => replayed += record.quantity,
                    _ => replayed -= record.quantity,
                }
                assert_eq!(record.remaining_quantity, replayed);
            }
            assert_eq!(replayed, batch.available_quantity);
        }

        // Aggregator equals the ledger-implied total: 30 in, 20 out
        assert_eq!(db.stock().available_quantity(10, 1).await.unwrap(), 10);
    }

    /// Lots whose first record is not IN replay the same way: lots are never
    /// topped up, so the first record of any batch is its creating credit
    /// (IN, the TRANSFER credit at a destination, or an inbound ADJUSTMENT)
    /// and every later record debits.
    #[tokio::test]
    async fn test_replay_of_credit_initiated_batches() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        db.receiving()
            .receive(&lot(20, Some((2025, 1, 1)), (2024, 1, 1)), Some("GRN-1"), "emp-204")
            .await
            .unwrap();

        // A destination batch: first record is a TRANSFER credit
        let outcome = db
            .transfer_engine()
            .transfer(&TransferRequest {
                source_location_id: 1,
                destination_location_id: 2,
                transfer_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                transferred_by: "emp-204".to_string(),
                lines: vec![TransferLineRequest {
                    product_id: 10,
                    quantity: 8,
                }],
            })
            .await
            .unwrap();
        let destination_id = outcome.details[0].destination_batch_id;

        db.consumption()
            .consume(&ConsumeRequest {
                product_id: 10,
                location_id: 2,
                quantity: 3,
                reference_no: "SALE-9".to_string(),
                notes: None,
                actor: "emp-204".to_string(),
            })
            .await
            .unwrap();

        // A found-stock batch: first record is an ADJUSTMENT credit, and a
        // later ADJUSTMENT on the same lot is a debit
        let found = db
            .receiving()
            .adjust_in(
                &NewBatch {
                    product_id: 10,
                    location_id: 3,
                    batch_reference: "COUNT-LOT-1".to_string(),
                    quantity: 6,
                    unit_cost_cents: 500,
                    srp_cents: 750,
                    expiration_date: None,
                    entry_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                },
                Some("COUNT-9"),
                Some("found during cycle count"),
                "emp-204",
            )
            .await
            .unwrap();

        db.consumption()
            .adjust_out(&ConsumeRequest {
                product_id: 10,
                location_id: 3,
                quantity: 2,
                reference_no: "DMG-9".to_string(),
                notes: None,
                actor: "emp-204".to_string(),
            })
            .await
            .unwrap();

        for id in [destination_id, found.id] {
            let batch = db.batches().get_by_id(id).await.unwrap().unwrap();
            let history = db.movements().history_for_batch(id).await.unwrap();
            assert!(history.len() >= 2);

            let mut replayed = 0i64;
            for (i, record) in history.iter().enumerate() {
                if i == 0 {
                    replayed += record.quantity;
                } else {
                    replayed -= record.quantity;
                }
                assert_eq!(record.remaining_quantity, replayed);
            }
            assert_eq!(replayed, batch.available_quantity);
        }

        let dest_history = db.movements().history_for_batch(destination_id).await.unwrap();
        assert_eq!(dest_history[0].movement_type, MovementType::Transfer);

        let found_history = db.movements().history_for_batch(found.id).await.unwrap();
        assert_eq!(found_history[0].movement_type, MovementType::Adjustment);
    }
}
