//! # Repository Implementations
//!
//! One repository per aggregate:
//!
//! - [`batch`] - the batch store (point lookups + transaction-scoped writes)
//! - [`movement`] - the append-only movement ledger
//! - [`transfer`] - transfer headers, lines, and batch details
//! - [`stock`] - read-only aggregated views (availability, oldest batch)
//!
//! Pool-based methods are reads; anything that mutates stock takes a
//! `&mut SqliteConnection` and only the engines call it, inside a
//! transaction.

pub mod batch;
pub mod movement;
pub mod stock;
pub mod transfer;
