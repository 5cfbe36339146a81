//! # Transfer Repository
//!
//! Persistence for transfer headers, lines, and batch details.
//!
//! Status transitions are the transfer engine's responsibility; this module
//! only stores rows. A header is created `pending`, and ends `completed`
//! (every line moved) or `failed` (no stock or ledger change was kept - the
//! header survives for audit, the stock work was rolled back).

use chrono::{NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use stocklot_core::{TransferBatchDetail, TransferHeader, TransferLine, TransferStatus};

const HEADER_COLUMNS: &str = "id, source_location_id, destination_location_id, transfer_date, \
     status, transferred_by, created_at, updated_at";

const DETAIL_COLUMNS: &str = "id, transfer_id, transfer_line_id, source_batch_id, \
     destination_batch_id, product_id, quantity, batch_reference, expiration_date";

// =============================================================================
// Repository
// =============================================================================

/// Repository for transfer persistence.
#[derive(Debug, Clone)]
pub struct TransferRepository {
    pool: SqlitePool,
}

impl TransferRepository {
    /// Creates a new TransferRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TransferRepository { pool }
    }

    /// Creates a pending transfer header.
    pub async fn insert_header(
        &self,
        source_location_id: i64,
        destination_location_id: i64,
        transfer_date: NaiveDate,
        transferred_by: &str,
    ) -> DbResult<TransferHeader> {
        debug!(
            source_location_id,
            destination_location_id, "Creating transfer header"
        );

        let now = Utc::now();

        let header = sqlx::query_as::<_, TransferHeader>(&format!(
            "INSERT INTO transfer_headers ( \
                 source_location_id, destination_location_id, transfer_date, \
                 status, transferred_by, created_at, updated_at \
             ) VALUES (?1, ?2, ?3, 'pending', ?4, ?5, ?5) \
             RETURNING {HEADER_COLUMNS}"
        ))
        .bind(source_location_id)
        .bind(destination_location_id)
        .bind(transfer_date)
        .bind(transferred_by)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(header)
    }

    /// Adds a line to a pending transfer.
    pub async fn insert_line(
        &self,
        transfer_id: i64,
        product_id: i64,
        quantity: i64,
    ) -> DbResult<TransferLine> {
        let line = sqlx::query_as::<_, TransferLine>(
            "INSERT INTO transfer_lines (transfer_id, product_id, quantity) \
             VALUES (?1, ?2, ?3) \
             RETURNING id, transfer_id, product_id, quantity",
        )
        .bind(transfer_id)
        .bind(product_id)
        .bind(quantity)
        .fetch_one(&self.pool)
        .await?;

        Ok(line)
    }

    /// Updates a header's status.
    pub async fn set_status(&self, transfer_id: i64, status: TransferStatus) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE transfer_headers SET status = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(transfer_id)
        .bind(status)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("TransferHeader", transfer_id.to_string()));
        }

        Ok(())
    }

    /// Gets a transfer header by ID.
    pub async fn get_header(&self, transfer_id: i64) -> DbResult<Option<TransferHeader>> {
        let header = sqlx::query_as::<_, TransferHeader>(&format!(
            "SELECT {HEADER_COLUMNS} FROM transfer_headers WHERE id = ?1"
        ))
        .bind(transfer_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(header)
    }

    /// Gets all lines of a transfer.
    pub async fn lines_for_transfer(&self, transfer_id: i64) -> DbResult<Vec<TransferLine>> {
        let lines = sqlx::query_as::<_, TransferLine>(
            "SELECT id, transfer_id, product_id, quantity \
             FROM transfer_lines WHERE transfer_id = ?1 ORDER BY id",
        )
        .bind(transfer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Gets the batch details of a transfer (which source batch funded which
    /// destination batch).
    pub async fn details_for_transfer(
        &self,
        transfer_id: i64,
    ) -> DbResult<Vec<TransferBatchDetail>> {
        let details = sqlx::query_as::<_, TransferBatchDetail>(&format!(
            "SELECT {DETAIL_COLUMNS} FROM transfer_batch_details \
             WHERE transfer_id = ?1 ORDER BY id"
        ))
        .bind(transfer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(details)
    }

    /// Gets the batch details of one transfer line.
    pub async fn details_for_line(&self, line_id: i64) -> DbResult<Vec<TransferBatchDetail>> {
        let details = sqlx::query_as::<_, TransferBatchDetail>(&format!(
            "SELECT {DETAIL_COLUMNS} FROM transfer_batch_details \
             WHERE transfer_line_id = ?1 ORDER BY id"
        ))
        .bind(line_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(details)
    }
}

// =============================================================================
// Transaction-scoped operations (engine use only)
// =============================================================================

/// Records which source batch funded which destination batch.
pub(crate) async fn insert_detail(
    conn: &mut SqliteConnection,
    transfer_id: i64,
    transfer_line_id: i64,
    source_batch_id: i64,
    destination_batch_id: i64,
    product_id: i64,
    quantity: i64,
    batch_reference: &str,
    expiration_date: Option<NaiveDate>,
) -> DbResult<TransferBatchDetail> {
    let detail = sqlx::query_as::<_, TransferBatchDetail>(&format!(
        "INSERT INTO transfer_batch_details ( \
             transfer_id, transfer_line_id, source_batch_id, destination_batch_id, \
             product_id, quantity, batch_reference, expiration_date \
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) \
         RETURNING {DETAIL_COLUMNS}"
    ))
    .bind(transfer_id)
    .bind(transfer_line_id)
    .bind(source_batch_id)
    .bind(destination_batch_id)
    .bind(product_id)
    .bind(quantity)
    .bind(batch_reference)
    .bind(expiration_date)
    .fetch_one(&mut *conn)
    .await?;

    Ok(detail)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_header_lifecycle() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.transfers();

        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let header = repo.insert_header(1, 2, date, "emp-204").await.unwrap();
        assert_eq!(header.status, TransferStatus::Pending);

        repo.insert_line(header.id, 10, 5).await.unwrap();
        repo.insert_line(header.id, 11, 3).await.unwrap();

        let lines = repo.lines_for_transfer(header.id).await.unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].product_id, 10);

        repo.set_status(header.id, TransferStatus::Completed)
            .await
            .unwrap();
        let header = repo.get_header(header.id).await.unwrap().unwrap();
        assert_eq!(header.status, TransferStatus::Completed);
    }

    #[tokio::test]
    async fn test_set_status_unknown_header() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db
            .transfers()
            .set_status(999, TransferStatus::Failed)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
