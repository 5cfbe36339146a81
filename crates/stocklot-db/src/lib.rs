//! # stocklot-db: Persistence and Engines for the StockLot Ledger
//!
//! This crate provides database access and the write-side engines for the
//! StockLot batch inventory ledger. It uses SQLite for local storage with
//! sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       StockLot Data Flow                                │
//! │                                                                         │
//! │  POS backend call (sell, receive, transfer, report)                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   stocklot-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Engines     │    │  Repositories │    │   Database   │  │   │
//! │  │   │  (engine/)    │    │ (repository/) │    │  (pool.rs)   │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ Receiving     │───►│ BatchRepo     │───►│ SqlitePool   │  │   │
//! │  │   │ Consumption   │    │ MovementRepo  │    │ WAL mode     │  │   │
//! │  │   │ Transfer      │    │ TransferRepo  │    │ Migrations   │  │   │
//! │  │   └───────────────┘    │ StockAggr.    │    └──────────────┘  │   │
//! │  │                        └───────────────┘                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  SQLite: stock_batches, stock_movements, transfer_headers,     │   │
//! │  │          transfer_lines, transfer_batch_details                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! FIFO policy, debit planning, and validation live in `stocklot-core`; this
//! crate executes those plans transactionally and keeps the append-only
//! movement ledger in lock-step with batch state.
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and ledger error types
//! - [`repository`] - Repositories (batch, movement, transfer, stock views)
//! - [`engine`] - Transactional write engines (receive, consume, transfer)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stocklot_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/stocklot.db")).await?;
//!
//! // Credit a lot, sell against it FIFO
//! let batch = db.receiving().receive(&new_batch, Some("GRN-1001"), "emp-204").await?;
//! let debits = db.consumption().consume(&request).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod engine;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult, LedgerError, LedgerResult};
pub use pool::{Database, DbConfig};

// Repository and engine re-exports for convenience
pub use engine::{ConsumptionEngine, ReceivingEngine, TransferEngine, TransferOutcome};
pub use repository::batch::BatchRepository;
pub use repository::movement::{MovementRepository, NewMovement};
pub use repository::stock::{LocationStock, StockAggregator};
pub use repository::transfer::TransferRepository;
