//! # FIFO Consumption Policy
//!
//! The single canonical definition of batch consumption order. Every caller
//! (the consumption engine, the transfer engine, the stock aggregator's
//! oldest-batch preview) must agree with this module, so "FIFO" means exactly
//! one thing everywhere.
//!
//! ## Ordering Policy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Batch Consumption Order                             │
//! │                                                                         │
//! │  1. Batches WITH an expiration date before batches without one.        │
//! │     Among them: earliest expiration first.                             │
//! │     (Pharmacy rule: perishable stock leaves the shelf first;           │
//! │      unexpiring stock is consumed last.)                               │
//! │                                                                         │
//! │  2. Among equals: earliest entry_date first.                           │
//! │                                                                         │
//! │  3. Remaining ties: ascending batch id (insertion order), so the       │
//! │     order is fully deterministic.                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Planning vs. Executing
//! This module only *plans*: given a snapshot of batches it returns which
//! batch funds how much of a request, or `InsufficientStock` without touching
//! anything. Executing the plan (guarded debits, ledger writes, transaction
//! boundaries) is the database crate's job.

use std::cmp::Ordering;

use crate::error::{CoreError, CoreResult};
use crate::types::{BatchDebit, StockBatch};

// =============================================================================
// Ordering
// =============================================================================

/// Compares two batches by consumption priority (`Less` = consumed first).
pub fn consumption_order(a: &StockBatch, b: &StockBatch) -> Ordering {
    // None expiration sorts last; Some dates compare earliest-first.
    (a.expiration_date.is_none(), a.expiration_date, a.entry_date, a.id).cmp(&(
        b.expiration_date.is_none(),
        b.expiration_date,
        b.entry_date,
        b.id,
    ))
}

/// Sorts batches in place into consumption order.
pub fn sort_for_consumption(batches: &mut [StockBatch]) {
    batches.sort_by(consumption_order);
}

/// Returns the batch the consumption engine would debit first, if any stock
/// is available.
pub fn oldest_available(batches: &[StockBatch]) -> Option<&StockBatch> {
    batches
        .iter()
        .filter(|b| b.available_quantity > 0)
        .min_by(|a, b| consumption_order(a, b))
}

// =============================================================================
// Planning
// =============================================================================

/// Plans how a requested quantity is satisfied against available batches.
///
/// ## Algorithm
/// 1. Sum `available_quantity` over all batches. If the total is short,
///    fail with [`CoreError::InsufficientStock`] and plan nothing
///    (all-or-nothing).
/// 2. Walk batches in consumption order, taking
///    `min(remaining_request, batch.available_quantity)` from each until the
///    request is satisfied.
///
/// All batches are expected to belong to one product/location; the caller
/// queries them that way. Drained batches are skipped.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use stocklot_core::fifo::plan;
/// # use stocklot_core::types::StockBatch;
/// # fn batch(id: i64, available: i64, exp: Option<NaiveDate>) -> StockBatch {
/// #     StockBatch {
/// #         id, product_id: 10, location_id: 1,
/// #         batch_reference: format!("PO-{id}"),
/// #         quantity: available, available_quantity: available,
/// #         unit_cost_cents: 100, srp_cents: 150,
/// #         expiration_date: exp,
/// #         entry_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
/// #         created_at: chrono::Utc::now(),
/// #     }
/// # }
/// let b1 = batch(1, 5, NaiveDate::from_ymd_opt(2024, 1, 1));
/// let b2 = batch(2, 5, NaiveDate::from_ymd_opt(2024, 2, 1));
///
/// // Consuming 7 drains the earlier-expiring batch fully, then takes 2.
/// let debits = plan(&[b2, b1], 7).unwrap();
/// assert_eq!(debits[0].batch_id, 1);
/// assert_eq!(debits[0].quantity, 5);
/// assert_eq!(debits[1].batch_id, 2);
/// assert_eq!(debits[1].quantity, 2);
/// ```
pub fn plan(batches: &[StockBatch], requested: i64) -> CoreResult<Vec<BatchDebit>> {
    debug_assert!(requested > 0, "callers validate quantity before planning");

    let total_available: i64 = batches.iter().map(|b| b.available_quantity).sum();
    if total_available < requested {
        let (product_id, location_id) = batches
            .first()
            .map(|b| (b.product_id, b.location_id))
            .unwrap_or((0, 0));
        return Err(CoreError::InsufficientStock {
            product_id,
            location_id,
            available: total_available,
            requested,
        });
    }

    let mut ordered: Vec<&StockBatch> =
        batches.iter().filter(|b| b.available_quantity > 0).collect();
    ordered.sort_by(|a, b| consumption_order(a, b));

    let mut debits = Vec::new();
    let mut remaining = requested;

    for batch in ordered {
        if remaining == 0 {
            break;
        }
        let take = remaining.min(batch.available_quantity);
        debits.push(BatchDebit {
            batch_id: batch.id,
            quantity: take,
        });
        remaining -= take;
    }

    // The pre-check guarantees the walk terminates with a full plan.
    debug_assert_eq!(remaining, 0);
    Ok(debits)
}

// =============================================================================
// Unit Tests
// =============================================================================
