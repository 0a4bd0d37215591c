//! Price history abstractions and the point-in-time price index

use super::error::LedgerError;
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A single dated price of a commodity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub date: NaiveDate,
    pub value: f64,
}

impl Price {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// Source of a commodity's price history, keyed by the provider specific code
/// (AMFI scheme code, NPS scheme id, ...).
#[async_trait]
pub trait PriceHistoryProvider: Send + Sync {
    /// Returns the known prices for `code`, ascending by date.
    async fn fetch_history(&self, code: &str) -> Result<Vec<Price>>;
}

/// Read-only index answering "latest price at or before a date" per commodity.
///
/// Series are independent per commodity. Loading a date twice keeps the last
/// value seen.
#[derive(Debug, Default, Clone)]
pub struct PriceIndex {
    series: HashMap<String, BTreeMap<NaiveDate, f64>>,
}

impl PriceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `prices` to the series of `commodity`, creating it if missing.
    pub fn insert_series<I>(&mut self, commodity: &str, prices: I)
    where
        I: IntoIterator<Item = Price>,
    {
        let series = self.series.entry(commodity.to_string()).or_default();
        for price in prices {
            series.insert(price.date, price.value);
        }
    }

    /// Returns the price with the greatest date not after `date`.
    pub fn price_at_or_before(
        &self,
        commodity: &str,
        date: NaiveDate,
    ) -> Result<Price, LedgerError> {
        let series = self
            .series
            .get(commodity)
            .ok_or_else(|| LedgerError::UnknownCommodity(commodity.to_string()))?;

        series
            .range(..=date)
            .next_back()
            .map(|(date, value)| Price::new(*date, *value))
            .ok_or_else(|| LedgerError::PriceUnavailable {
                commodity: commodity.to_string(),
                date,
            })
    }

    pub fn contains(&self, commodity: &str) -> bool {
        self.series.contains_key(commodity)
    }

    /// Earliest known price date for `commodity`.
    pub fn first_date(&self, commodity: &str) -> Option<NaiveDate> {
        self.series
            .get(commodity)
            .and_then(|s| s.keys().next().copied())
    }

    /// Number of prices stored for `commodity`.
    pub fn len(&self, commodity: &str) -> usize {
        self.series.get(commodity).map_or(0, BTreeMap::len)
    }
}

impl<S: Into<String>> FromIterator<(S, Vec<Price>)> for PriceIndex {
    fn from_iter<T: IntoIterator<Item = (S, Vec<Price>)>>(iter: T) -> Self {
        let mut index = PriceIndex::new();
        for (commodity, prices) in iter {
            index.insert_series(&commodity.into(), prices);
        }
        index
    }
}
