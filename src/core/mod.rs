//! Core ledger generation: price index, postings and the monthly simulation

pub mod config;
pub mod error;
pub mod ledger;
pub mod log;
pub mod posting;
pub mod price;
pub mod rules;
pub mod simulation;

// Re-export main types for cleaner imports
pub use error::LedgerError;
pub use ledger::{CommodityLedger, Sale};
pub use posting::{Posting, PostingAmount, PostingSink};
pub use price::{Price, PriceHistoryProvider, PriceIndex};
pub use simulation::{SimulationEngine, SimulationReport, SimulationState};
