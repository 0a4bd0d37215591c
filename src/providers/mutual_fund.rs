use super::util::{RetryPolicy, fetch_json};
use crate::core::{Price, PriceHistoryProvider};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::debug;

/// NAV history of Indian mutual funds keyed by AMFI scheme code.
pub struct MutualFundProvider {
    base_url: String,
    retry: RetryPolicy,
}

impl MutualFundProvider {
    pub fn new(base_url: &str) -> Self {
        MutualFundProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[derive(Debug, Deserialize)]
struct NavHistoryResponse {
    data: Vec<NavEntry>,
}

#[derive(Debug, Deserialize)]
struct NavEntry {
    date: String,
    nav: String,
}

#[async_trait]
impl PriceHistoryProvider for MutualFundProvider {
    async fn fetch_history(&self, scheme_code: &str) -> Result<Vec<Price>> {
        let url = format!("{}/mf/{}", self.base_url, scheme_code);
        let response: NavHistoryResponse =
            fetch_json(&url, self.retry, &format!("scheme: {scheme_code}")).await?;

        let mut prices: Vec<Price> = response
            .data
            .iter()
            .filter_map(|entry| {
                let date = NaiveDate::parse_from_str(&entry.date, "%d-%m-%Y").ok()?;
                let value: f64 = entry.nav.trim().parse().ok()?;
                if value > 0.0 {
                    Some(Price::new(date, value))
                } else {
                    debug!(scheme_code, ?entry, "Skipping non positive NAV");
                    None
                }
            })
            .collect();

        if prices.is_empty() {
            return Err(anyhow!("No NAV history for scheme: {}", scheme_code));
        }

        // Newest first on the wire
        prices.sort_by_key(|p| p.date);
        debug!(
            scheme_code,
            count = prices.len(),
            "Fetched mutual fund NAV history"
        );
        Ok(prices)
    }
}
