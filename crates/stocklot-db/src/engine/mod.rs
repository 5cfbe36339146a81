//! # Ledger Engines
//!
//! The write-side of the ledger. Each engine owns its transactions and is the
//! only path that mutates stock:
//!
//! - [`receive`] - credits (IN, inbound ADJUSTMENT): new batch + movement
//! - [`consume`] - debits (OUT, outbound ADJUSTMENT): FIFO plan + guarded
//!   batch updates + movements
//! - [`transfer`] - inter-location moves composed from a consume at the
//!   source and fresh batches at the destination

pub mod consume;
pub mod receive;
pub mod transfer;

pub use consume::ConsumptionEngine;
pub use receive::ReceivingEngine;
pub use transfer::{TransferEngine, TransferOutcome};
