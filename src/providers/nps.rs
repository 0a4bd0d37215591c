use super::util::{RetryPolicy, fetch_json};
use crate::core::{Price, PriceHistoryProvider};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::debug;

/// NAV history of National Pension System schemes (e.g. `SM008001`).
pub struct NpsProvider {
    base_url: String,
    retry: RetryPolicy,
}

impl NpsProvider {
    pub fn new(base_url: &str) -> Self {
        NpsProvider {
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
struct SchemeNavResponse {
    data: Vec<(String, f64)>,
}

#[async_trait]
impl PriceHistoryProvider for NpsProvider {
    async fn fetch_history(&self, scheme_id: &str) -> Result<Vec<Price>> {
        let url = format!("{}/api/schemes/{}/nav.json", self.base_url, scheme_id);
        let response: SchemeNavResponse =
            fetch_json(&url, self.retry, &format!("NPS scheme: {scheme_id}")).await?;

        let mut prices: Vec<Price> = response
            .data
            .into_iter()
            .filter(|(_, nav)| *nav > 0.0)
            .filter_map(|(date, nav)| {
                NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                    .ok()
                    .map(|date| Price::new(date, nav))
            })
            .collect();

        if prices.is_empty() {
            return Err(anyhow!("No NAV history for NPS scheme: {}", scheme_id));
        }

        prices.sort_by_key(|p| p.date);
        debug!(scheme_id, count = prices.len(), "Fetched NPS NAV history");
        Ok(prices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn create_mock_server(scheme_id: &str, mock_response: &str) -> MockServer {
        let mock_server = MockServer::start().await;
        let expected_path = format!("/api/schemes/{scheme_id}/nav.json");

        Mock::given(method("GET"))
            .and(path(&expected_path))
            .respond_with(ResponseTemplate::new(200).set_body_string(mock_response))
            .mount(&mock_server)
            .await;
        mock_server
    }

    fn provider(server: &MockServer) -> NpsProvider {
        NpsProvider::new(&server.uri()).with_retry_policy(RetryPolicy {
            retries: 0,
            delay: Duration::from_millis(1),
        })
    }

    #[tokio::test]
    async fn test_successful_nps_history_fetch() {
        let mock_response = r#"{"data": [["2014-01-02", 13.25], ["2014-01-01", 13.1], ["bad", 1.0], ["2014-01-03", 0.0]]}"#;
        let mock_server = create_mock_server("SM008001", mock_response).await;

        let prices = provider(&mock_server)
            .fetch_history("SM008001")
            .await
            .unwrap();

        assert_eq!(
            prices,
            vec![
                Price::new(NaiveDate::from_ymd_opt(2014, 1, 1).unwrap(), 13.1),
                Price::new(NaiveDate::from_ymd_opt(2014, 1, 2).unwrap(), 13.25),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_nps_history_is_an_error() {
        let mock_server = create_mock_server("SM008001", r#"{"data": []}"#).await;

        let result = provider(&mock_server).fetch_history("SM008001").await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "No NAV history for NPS scheme: SM008001"
        );
    }
}
