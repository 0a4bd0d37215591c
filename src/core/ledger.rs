//! Currency to commodity unit conversion for investment postings

use super::error::LedgerError;
use super::posting::{INVESTMENT_PAYEE, Posting, PostingAmount, PostingSink};
use super::price::{Price, PriceIndex};
use chrono::NaiveDate;
use std::io::Write;
use tracing::debug;

/// Outcome of a capped disposal.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sale {
    /// Units disposed, never more than were available.
    pub units: f64,
    /// Currency realized for those units.
    pub amount: f64,
}

/// Converts currency amounts into commodity units at the price in effect on
/// the transaction date and records the resulting posting.
pub struct CommodityLedger<'a> {
    prices: &'a PriceIndex,
}

impl<'a> CommodityLedger<'a> {
    pub fn new(prices: &'a PriceIndex) -> Self {
        Self { prices }
    }

    /// Buys `amount` worth of `commodity` and returns the units acquired.
    ///
    /// A negative `amount` records a disposal and yields negative units.
    pub fn buy<W: Write>(
        &self,
        sink: &mut PostingSink<W>,
        date: NaiveDate,
        commodity: &str,
        from_account: &str,
        to_account: &str,
        amount: f64,
    ) -> Result<f64, LedgerError> {
        let price = self.prices.price_at_or_before(commodity, date)?;
        post_units(sink, date, commodity, price, from_account, to_account, amount)
    }

    /// Sells up to `requested_amount` worth of `commodity`, capped at
    /// `available_units`.
    ///
    /// Nothing is posted when no units are available.
    #[allow(clippy::too_many_arguments)]
    pub fn sell<W: Write>(
        &self,
        sink: &mut PostingSink<W>,
        date: NaiveDate,
        commodity: &str,
        from_account: &str,
        to_account: &str,
        requested_amount: f64,
        available_units: f64,
    ) -> Result<Sale, LedgerError> {
        if available_units <= 0.0 {
            debug!(%date, commodity, "No units held, skipping sell");
            return Ok(Sale::default());
        }

        let price = self.prices.price_at_or_before(commodity, date)?;
        let required_units = requested_amount / price.value;
        let units = available_units.min(required_units);
        let amount = units * price.value;

        // A disposal is a negative purchase at the same price
        let disposed = post_units(
            sink,
            date,
            commodity,
            price,
            from_account,
            to_account,
            -amount,
        )?;
        Ok(Sale {
            units: -disposed,
            amount,
        })
    }
}

/// Records `amount` worth of `commodity` at `price`; the sign of `amount`
/// carries through to the units.
fn post_units<W: Write>(
    sink: &mut PostingSink<W>,
    date: NaiveDate,
    commodity: &str,
    price: Price,
    from_account: &str,
    to_account: &str,
    amount: f64,
) -> Result<f64, LedgerError> {
    let units = amount / price.value;
    debug!(%date, commodity, amount, units, price = price.value, "Commodity posting");

    sink.emit(&Posting {
        date,
        payee: INVESTMENT_PAYEE,
        to_account,
        from_account,
        amount: PostingAmount::Units {
            units,
            commodity,
            price: price.value,
        },
    })?;
    Ok(units)
}
