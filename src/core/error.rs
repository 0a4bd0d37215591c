//! Errors raised while generating a journal

use chrono::NaiveDate;
use thiserror::Error;

/// Failures of the ledger core. Every variant is fatal for a generation run.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("No price series bound to commodity: {0}")]
    UnknownCommodity(String),
    #[error("No price for {commodity} at or before {date}")]
    PriceUnavailable {
        commodity: String,
        date: NaiveDate,
    },
    #[error("Failed to write posting: {0}")]
    Io(#[from] std::io::Error),
}
