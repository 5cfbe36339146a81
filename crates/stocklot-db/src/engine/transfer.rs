//! # Transfer Engine
//!
//! Moves stock between locations, preserving lot identity.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  transfer(request)                                                      │
//! │                                                                         │
//! │  1. Validate request (source != destination, lines non-empty, ...)     │
//! │  2. Insert header (pending) + lines                                    │
//! │  3. ONE TRANSACTION, per line:                                         │
//! │     ├── FIFO-consume at source (TRANSFER movements)                    │
//! │     └── per debit:                                                     │
//! │         ├── create destination batch (cost/srp/expiration copied,      │
//! │         │   provenance-preserving reference)                           │
//! │         ├── destination TRANSFER movement (credit)                     │
//! │         └── batch detail row (source batch → destination batch)        │
//! │  4. Commit → status 'completed'                                        │
//! │     Any error → rollback stock work → status 'failed'                  │
//! │                                                                         │
//! │  A failed header survives for audit; its stock never moved.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each debited source batch becomes its own destination batch, so expiring
//! lots stay distinct at the destination and FIFO keeps working there.

use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::engine::consume::consume_in_tx;
use crate::error::{DbError, LedgerError, LedgerResult};
use crate::repository::transfer::TransferRepository;
use crate::repository::{batch, movement, transfer};
use stocklot_core::{
    validation, ConsumeRequest, MovementType, NewBatch, TransferBatchDetail, TransferHeader,
    TransferLine, TransferRequest, TransferStatus,
};

/// The result of a completed transfer.
#[derive(Debug, Clone)]
pub struct TransferOutcome {
    pub header: TransferHeader,
    pub lines: Vec<TransferLine>,
    /// One entry per (line, source batch) pair, in consumption order.
    pub details: Vec<TransferBatchDetail>,
}

/// Engine for inter-location stock transfers.
#[derive(Debug, Clone)]
pub struct TransferEngine {
    pool: SqlitePool,
    transfers: TransferRepository,
}

impl TransferEngine {
    /// Creates a new TransferEngine.
    pub fn new(pool: SqlitePool) -> Self {
        let transfers = TransferRepository::new(pool.clone());
        TransferEngine { pool, transfers }
    }

    /// Executes a transfer.
    ///
    /// ## Errors
    /// * [`CoreError::InvalidTransfer`] - malformed request; nothing was
    ///   written
    /// * [`CoreError::InsufficientStock`] - a line could not be satisfied at
    ///   the source; the header is kept with status `failed`, but no stock or
    ///   ledger change survives
    pub async fn transfer(&self, request: &TransferRequest) -> LedgerResult<TransferOutcome> {
        validation::validate_transfer_request(request)?;

        let header = self
            .transfers
            .insert_header(
                request.source_location_id,
                request.destination_location_id,
                request.transfer_date,
                &request.transferred_by,
            )
            .await?;

        let mut lines = Vec::with_capacity(request.lines.len());
        for line in &request.lines {
            lines.push(
                self.transfers
                    .insert_line(header.id, line.product_id, line.quantity)
                    .await?,
            );
        }

        match self.move_stock(&header, &lines, request).await {
            Ok(details) => {
                self.transfers
                    .set_status(header.id, TransferStatus::Completed)
                    .await?;

                let header = self
                    .transfers
                    .get_header(header.id)
                    .await?
                    .ok_or_else(|| DbError::not_found("TransferHeader", header.id.to_string()))?;

                info!(
                    transfer_id = header.id,
                    source_location_id = header.source_location_id,
                    destination_location_id = header.destination_location_id,
                    lines = lines.len(),
                    details = details.len(),
                    "Transfer completed"
                );

                Ok(TransferOutcome {
                    header,
                    lines,
                    details,
                })
            }
            Err(err) => {
                // The stock transaction already rolled back; only the header
                // status remains to record.
                if let Err(status_err) = self
                    .transfers
                    .set_status(header.id, TransferStatus::Failed)
                    .await
                {
                    warn!(
                        transfer_id = header.id,
                        error = %status_err,
                        "Could not mark transfer as failed"
                    );
                }

                warn!(transfer_id = header.id, error = %err, "Transfer failed");
                Err(err)
            }
        }
    }

    /// The stock side of a transfer, in one transaction.
    ///
    /// Consumes the transaction's connection entirely so the caller can write
    /// the header status afterwards.
    async fn move_stock(
        &self,
        header: &TransferHeader,
        lines: &[TransferLine],
        request: &TransferRequest,
    ) -> LedgerResult<Vec<TransferBatchDetail>> {
        let reference = format!("TRANSFER-{}", header.id);
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let mut details = Vec::new();

        for line in lines {
            let debits = consume_in_tx(
                &mut tx,
                &ConsumeRequest {
                    product_id: line.product_id,
                    location_id: header.source_location_id,
                    quantity: line.quantity,
                    reference_no: reference.clone(),
                    notes: None,
                    actor: header.transferred_by.clone(),
                },
                MovementType::Transfer,
            )
            .await?;

            for debit in &debits {
                let source = batch::fetch_batch(&mut tx, debit.batch_id)
                    .await?
                    .ok_or_else(|| DbError::not_found("StockBatch", debit.batch_id.to_string()))?;

                let destination = batch::insert_batch(
                    &mut tx,
                    &NewBatch {
                        product_id: line.product_id,
                        location_id: header.destination_location_id,
                        batch_reference: format!(
                            "{}-TRANSFER-{}",
                            source.batch_reference, header.id
                        ),
                        quantity: debit.quantity,
                        unit_cost_cents: source.unit_cost_cents,
                        srp_cents: source.srp_cents,
                        expiration_date: source.expiration_date,
                        entry_date: header.transfer_date,
                    },
                )
                .await?;

                movement::insert_movement(
                    &mut tx,
                    &movement::NewMovement {
                        product_id: line.product_id,
                        batch_id: destination.id,
                        movement_type: MovementType::Transfer,
                        quantity: debit.quantity,
                        remaining_quantity: destination.available_quantity,
                        unit_price_cents: destination.unit_cost_cents,
                        expiration_date: destination.expiration_date,
                        reference_no: reference.clone(),
                        notes: None,
                        created_by: header.transferred_by.clone(),
                    },
                )
                .await
                .map_err(LedgerError::LedgerWriteFailure)?;

                details.push(
                    transfer::insert_detail(
                        &mut tx,
                        header.id,
                        line.id,
                        source.id,
                        destination.id,
                        line.product_id,
                        debit.quantity,
                        &destination.batch_reference,
                        destination.expiration_date,
                    )
                    .await?,
                );
            }
        }

        tx.commit().await.map_err(DbError::from)?;

        Ok(details)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
