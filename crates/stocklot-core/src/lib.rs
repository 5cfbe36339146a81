//! # stocklot-core: Pure Domain Logic for the StockLot Inventory Ledger
//!
//! This crate is the **heart** of StockLot. It defines the domain types for
//! the FIFO batch inventory ledger and the one canonical consumption policy,
//! all as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       StockLot Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              External Callers (POS, transfer UI, reports)       │   │
//! │  │    complete_sale ──► adjust_stock ──► request_transfer          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              stocklot-db (engines + repositories)               │   │
//! │  │    ConsumptionEngine, TransferEngine, StockAggregator           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ stocklot-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   fifo    │  │   error   │  │ validation│  │   │
//! │  │   │StockBatch │  │  ordering │  │ CoreError │  │   rules   │  │   │
//! │  │   │ Movement  │  │  planning │  │Validation │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (StockBatch, MovementRecord, transfers)
//! - [`fifo`] - The canonical consumption ordering and planning
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation rules
//!
//! ## Design Principles
//!
//! 1. **One FIFO**: a single ordering definition shared by every caller -
//!    the repo this replaces computed "oldest batch" three different ways
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: all monetary values are in cents (i64)
//! 4. **Explicit Errors**: all errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod fifo;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use stocklot_core::StockBatch` instead of
// `use stocklot_core::types::StockBatch`

pub use error::{CoreError, CoreResult, ValidationError};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity a single movement or batch may carry.
///
/// ## Business Reason
/// Prevents fat-finger entries (e.g., scanning a quantity barcode into the
/// amount field). Far above any realistic pharmacy lot size.
pub const MAX_MOVEMENT_QUANTITY: i64 = 1_000_000;

/// Maximum length of reference strings (batch references, movement
/// references, actor identifiers).
pub const MAX_REFERENCE_LEN: usize = 64;

/// Maximum length of free-form movement notes.
pub const MAX_NOTES_LEN: usize = 500;
