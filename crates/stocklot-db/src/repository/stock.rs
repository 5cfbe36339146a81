//! # Stock Aggregator
//!
//! Read-only derived views over the batch store.
//!
//! ## One Source of Truth
//! Every caller that needs "how much is available" or "which lot goes first"
//! uses these two queries, so every endpoint gets identical FIFO semantics.
//! (The system this replaces computed "oldest batch" three different ways
//! across modules - by entry date, by expiration date, by row order - and
//! they disagreed.)
//!
//! Both queries are pure functions of the batch store: calling them
//! repeatedly without intervening mutation returns identical results.

use sqlx::SqlitePool;

use crate::error::DbResult;
use crate::repository::batch::FIFO_ORDER;
use stocklot_core::StockBatch;

/// Per-location availability row for KPI dashboards.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LocationStock {
    pub location_id: i64,
    pub available_quantity: i64,
}

/// Read-only aggregated views for availability checks and reports.
#[derive(Debug, Clone)]
pub struct StockAggregator {
    pool: SqlitePool,
}

impl StockAggregator {
    /// Creates a new StockAggregator.
    pub fn new(pool: SqlitePool) -> Self {
        StockAggregator { pool }
    }

    /// Total available quantity for a product at a location.
    ///
    /// Used by sale/transfer pre-checks and KPI dashboards. Always equals
    /// the sum implied by replaying the movement ledger for that
    /// product/location - the core's primary testable cross-invariant.
    pub async fn available_quantity(&self, product_id: i64, location_id: i64) -> DbResult<i64> {
        let total: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(available_quantity) FROM stock_batches \
             WHERE product_id = ?1 AND location_id = ?2",
        )
        .bind(product_id)
        .bind(location_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total.unwrap_or(0))
    }

    /// The batch the consumption engine would debit first.
    ///
    /// Used by UI previews and transfer-planning screens. Returns `None`
    /// when the location holds no available stock for the product.
    pub async fn oldest_batch(
        &self,
        product_id: i64,
        location_id: i64,
    ) -> DbResult<Option<StockBatch>> {
        let batch = sqlx::query_as::<_, StockBatch>(&format!(
            "SELECT id, product_id, location_id, batch_reference, quantity, \
                    available_quantity, unit_cost_cents, srp_cents, expiration_date, \
                    entry_date, created_at \
             FROM stock_batches \
             WHERE product_id = ?1 AND location_id = ?2 AND available_quantity > 0 \
             ORDER BY {FIFO_ORDER} \
             LIMIT 1"
        ))
        .bind(product_id)
        .bind(location_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(batch)
    }

    /// Available quantity of a product broken down by location.
    pub async fn available_by_location(&self, product_id: i64) -> DbResult<Vec<LocationStock>> {
        let rows = sqlx::query_as::<_, LocationStock>(
            "SELECT location_id, SUM(available_quantity) AS available_quantity \
             FROM stock_batches \
             WHERE product_id = ?1 \
             GROUP BY location_id \
             ORDER BY location_id",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::batch::{debit_batch, insert_batch};
    use chrono::NaiveDate;
    use stocklot_core::NewBatch;

    fn new_batch(location_id: i64, quantity: i64, expiration: Option<(i32, u32, u32)>) -> NewBatch {
        NewBatch {
            product_id: 10,
            location_id,
            batch_reference: format!("PO-{location_id}-{quantity}"),
            quantity,
            unit_cost_cents: 500,
            srp_cents: 750,
            expiration_date: expiration
                .map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap()),
            entry_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_available_quantity_sums_batches() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        insert_batch(&mut conn, &new_batch(1, 20, None)).await.unwrap();
        let second = insert_batch(&mut conn, &new_batch(1, 10, None)).await.unwrap();
        debit_batch(&mut conn, second.id, 4).await.unwrap();
        drop(conn);

        assert_eq!(db.stock().available_quantity(10, 1).await.unwrap(), 26);
        // Unknown product/location sums to zero, not an error
        assert_eq!(db.stock().available_quantity(99, 1).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_oldest_batch_matches_fifo_policy() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        insert_batch(&mut conn, &new_batch(1, 20, None)).await.unwrap();
        let expiring = insert_batch(&mut conn, &new_batch(1, 10, Some((2024, 3, 1))))
            .await
            .unwrap();
        drop(conn);

        let oldest = db.stock().oldest_batch(10, 1).await.unwrap().unwrap();
        assert_eq!(oldest.id, expiring.id);
    }

    #[tokio::test]
    async fn test_reads_are_idempotent() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        insert_batch(&mut conn, &new_batch(1, 20, None)).await.unwrap();
        drop(conn);

        let first = db.stock().available_quantity(10, 1).await.unwrap();
        let second = db.stock().available_quantity(10, 1).await.unwrap();
        assert_eq!(first, second);

        let a = db.stock().oldest_batch(10, 1).await.unwrap().unwrap();
        let b = db.stock().oldest_batch(10, 1).await.unwrap().unwrap();
        assert_eq!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_available_by_location() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        insert_batch(&mut conn, &new_batch(1, 20, None)).await.unwrap();
        insert_batch(&mut conn, &new_batch(2, 5, None)).await.unwrap();
        drop(conn);

        let rows = db.stock().available_by_location(10).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].location_id, 1);
        assert_eq!(rows[0].available_quantity, 20);
        assert_eq!(rows[1].available_quantity, 5);
    }
}
