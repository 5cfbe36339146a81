//! # Batch Repository
//!
//! Database operations for stock batches (the Batch Store).
//!
//! ## Batch Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Batch Lifecycle                                   │
//! │                                                                         │
//! │  1. CREATE                                                             │
//! │     └── insert_batch() → StockBatch { available_quantity = quantity }  │
//! │         (stock received, or a transfer deposits at the destination)   │
//! │                                                                         │
//! │  2. DEBIT (repeatedly)                                                 │
//! │     └── debit_batch() → guarded decrement, never below zero            │
//! │                                                                         │
//! │  3. DRAINED                                                            │
//! │     └── available_quantity == 0; the row is soft-retained forever      │
//! │         for audit/history. Batches are NEVER deleted or topped up.    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Write operations take a `&mut SqliteConnection` so they can only run
//! inside an engine transaction; nothing outside the engines mutates
//! `available_quantity`.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use stocklot_core::{NewBatch, StockBatch};

/// Column list shared by every batch SELECT.
const BATCH_COLUMNS: &str = "id, product_id, location_id, batch_reference, quantity, \
     available_quantity, unit_cost_cents, srp_cents, expiration_date, entry_date, created_at";

/// The canonical FIFO ordering, as SQL.
///
/// Must agree with `stocklot_core::fifo::consumption_order`: expiring stock
/// before unexpiring (earliest expiration first), then earliest entry date,
/// then ascending id.
pub(crate) const FIFO_ORDER: &str =
    "(expiration_date IS NULL) ASC, expiration_date ASC, entry_date ASC, id ASC";

// =============================================================================
// Repository (pool-based reads)
// =============================================================================

/// Repository for stock batch lookups.
#[derive(Debug, Clone)]
pub struct BatchRepository {
    pool: SqlitePool,
}

impl BatchRepository {
    /// Creates a new BatchRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BatchRepository { pool }
    }

    /// Gets a batch by ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<StockBatch>> {
        let batch = sqlx::query_as::<_, StockBatch>(&format!(
            "SELECT {BATCH_COLUMNS} FROM stock_batches WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(batch)
    }

    /// Lists batches with remaining stock for a product at a location, in
    /// consumption order.
    pub async fn list_available(
        &self,
        product_id: i64,
        location_id: i64,
    ) -> DbResult<Vec<StockBatch>> {
        fetch_available(&self.pool, product_id, location_id).await
    }

    /// Lists every batch (drained included) for a product at a location,
    /// newest entry first. Used by lot-history screens.
    pub async fn list_all(&self, product_id: i64, location_id: i64) -> DbResult<Vec<StockBatch>> {
        let batches = sqlx::query_as::<_, StockBatch>(&format!(
            "SELECT {BATCH_COLUMNS} FROM stock_batches \
             WHERE product_id = ?1 AND location_id = ?2 \
             ORDER BY entry_date DESC, id DESC"
        ))
        .bind(product_id)
        .bind(location_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(batches)
    }

    /// Counts batches in the store (drained included).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stock_batches")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Transaction-scoped operations (engine use only)
// =============================================================================

/// Fetches available batches in consumption order, on any executor.
///
/// Shared by the pool-based repository read and the in-transaction read the
/// consumption engine performs.
pub(crate) async fn fetch_available<'e, E>(
    executor: E,
    product_id: i64,
    location_id: i64,
) -> DbResult<Vec<StockBatch>>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let batches = sqlx::query_as::<_, StockBatch>(&format!(
        "SELECT {BATCH_COLUMNS} FROM stock_batches \
         WHERE product_id = ?1 AND location_id = ?2 AND available_quantity > 0 \
         ORDER BY {FIFO_ORDER}"
    ))
    .bind(product_id)
    .bind(location_id)
    .fetch_all(executor)
    .await?;

    Ok(batches)
}

/// Inserts a new batch with `available_quantity = quantity`.
///
/// This is the ONLY way stock is credited: existing batches are never topped
/// up, so each lot keeps its own place in the consumption order.
pub(crate) async fn insert_batch(
    conn: &mut SqliteConnection,
    new: &NewBatch,
) -> DbResult<StockBatch> {
    debug!(
        product_id = new.product_id,
        location_id = new.location_id,
        quantity = new.quantity,
        reference = %new.batch_reference,
        "Inserting stock batch"
    );

    let now = Utc::now();

    let batch = sqlx::query_as::<_, StockBatch>(&format!(
        "INSERT INTO stock_batches ( \
             product_id, location_id, batch_reference, quantity, available_quantity, \
             unit_cost_cents, srp_cents, expiration_date, entry_date, created_at \
         ) VALUES (?1, ?2, ?3, ?4, ?4, ?5, ?6, ?7, ?8, ?9) \
         RETURNING {BATCH_COLUMNS}"
    ))
    .bind(new.product_id)
    .bind(new.location_id)
    .bind(&new.batch_reference)
    .bind(new.quantity)
    .bind(new.unit_cost_cents)
    .bind(new.srp_cents)
    .bind(new.expiration_date)
    .bind(new.entry_date)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    Ok(batch)
}

/// Atomically debits a batch, guarded against going negative.
///
/// ## Compare-and-Swap Semantics
/// The availability check lives in the WHERE clause of the same UPDATE
/// statement, so a concurrent writer can never split the check from the
/// decrement - the second writer's guard simply fails.
///
/// ## Returns
/// * `Some(new_available)` - the debit applied
/// * `None` - the guard failed: the batch no longer holds `amount` units
pub(crate) async fn debit_batch(
    conn: &mut SqliteConnection,
    batch_id: i64,
    amount: i64,
) -> DbResult<Option<i64>> {
    debug!(batch_id, amount, "Debiting batch");

    let new_available: Option<i64> = sqlx::query_scalar(
        "UPDATE stock_batches \
         SET available_quantity = available_quantity - ?2 \
         WHERE id = ?1 AND available_quantity >= ?2 \
         RETURNING available_quantity",
    )
    .bind(batch_id)
    .bind(amount)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(new_available)
}

/// Fetches a single batch inside a transaction.
pub(crate) async fn fetch_batch(
    conn: &mut SqliteConnection,
    batch_id: i64,
) -> DbResult<Option<StockBatch>> {
    let batch = sqlx::query_as::<_, StockBatch>(&format!(
        "SELECT {BATCH_COLUMNS} FROM stock_batches WHERE id = ?1"
    ))
    .bind(batch_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(batch)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::NaiveDate;

    fn new_batch(product_id: i64, location_id: i64, quantity: i64) -> NewBatch {
        NewBatch {
            product_id,
            location_id,
            batch_reference: format!("PO-{product_id}-{quantity}"),
            quantity,
            unit_cost_cents: 500,
            srp_cents: 750,
            expiration_date: None,
            entry_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_insert_starts_full() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        let batch = insert_batch(&mut conn, &new_batch(10, 1, 20)).await.unwrap();

        assert_eq!(batch.quantity, 20);
        assert_eq!(batch.available_quantity, 20);
        drop(conn);

        let found = db.batches().get_by_id(batch.id).await.unwrap().unwrap();
        assert_eq!(found.batch_reference, batch.batch_reference);
    }

    #[tokio::test]
    async fn test_debit_guard_refuses_overdraw() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        let batch = insert_batch(&mut conn, &new_batch(10, 1, 5)).await.unwrap();

        // Within bounds
        let remaining = debit_batch(&mut conn, batch.id, 3).await.unwrap();
        assert_eq!(remaining, Some(2));

        // Overdraw: guard fails, nothing changes
        let refused = debit_batch(&mut conn, batch.id, 3).await.unwrap();
        assert_eq!(refused, None);

        let remaining = debit_batch(&mut conn, batch.id, 2).await.unwrap();
        assert_eq!(remaining, Some(0));
    }

    #[tokio::test]
    async fn test_list_available_excludes_drained() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        let drained = insert_batch(&mut conn, &new_batch(10, 1, 5)).await.unwrap();
        debit_batch(&mut conn, drained.id, 5).await.unwrap();
        let live = insert_batch(&mut conn, &new_batch(10, 1, 7)).await.unwrap();
        drop(conn);

        let available = db.batches().list_available(10, 1).await.unwrap();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].id, live.id);

        // Drained batch is soft-retained, not deleted
        let all = db.batches().list_all(10, 1).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_fifo_order_in_sql_matches_core() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        // Unexpiring lot entered first, expiring lot entered later
        let mut unexpiring = new_batch(10, 1, 20);
        unexpiring.entry_date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut expiring = new_batch(10, 1, 10);
        expiring.entry_date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        expiring.expiration_date = NaiveDate::from_ymd_opt(2024, 3, 1);

        let unexpiring = insert_batch(&mut conn, &unexpiring).await.unwrap();
        let expiring = insert_batch(&mut conn, &expiring).await.unwrap();
        drop(conn);

        let listed = db.batches().list_available(10, 1).await.unwrap();
        assert_eq!(listed[0].id, expiring.id, "expiring stock is consumed first");
        assert_eq!(listed[1].id, unexpiring.id);

        // The SQL ORDER BY and the core comparator must agree
        let mut sorted = listed.clone();
        stocklot_core::fifo::sort_for_consumption(&mut sorted);
        assert_eq!(
            sorted.iter().map(|b| b.id).collect::<Vec<_>>(),
            listed.iter().map(|b| b.id).collect::<Vec<_>>(),
        );
    }
}
