use anyhow::{Context, Result, anyhow};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// How often and how patiently a provider request is retried.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Attempts after the first one.
    pub retries: usize,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            delay: Duration::from_millis(500),
        }
    }
}

/// Runs `operation` until it succeeds or the policy's retries are used up,
/// returning the last error in that case.
pub async fn with_retry<F, Fut, T>(mut operation: F, policy: RetryPolicy) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, reqwest::Error>>,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(val) => return Ok(val),
            Err(err) if attempt > policy.retries => return Err(err.into()),
            Err(err) => {
                debug!(attempt, retries = policy.retries, %err, "Request failed, retrying");
                attempt += 1;
                tokio::time::sleep(policy.delay).await;
            }
        }
    }
}

/// GETs `url` and decodes the JSON body, retrying transport errors and
/// non-success statuses.
pub async fn fetch_json<T: DeserializeOwned>(
    url: &str,
    policy: RetryPolicy,
    what: &str,
) -> Result<T> {
    debug!("Requesting {} from {}", what, url);
    let client = reqwest::Client::builder()
        .user_agent(concat!("sampledger/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let response = with_retry(
        || async { client.get(url).send().await?.error_for_status() },
        policy,
    )
    .await
    .with_context(|| format!("Failed to fetch {what}"))?;

    let body = response
        .text()
        .await
        .with_context(|| format!("Failed to read response for {what}"))?;
    if body.trim().is_empty() {
        return Err(anyhow!("Received empty response for {}", what));
    }

    serde_json::from_str(&body)
        .with_context(|| format!("Failed to parse response for {what}. Response: '{body}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Deserialize)]
    struct Payload {
        value: u32,
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            retries: 2,
            delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_fetch_json_retries_server_errors() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/payload"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/payload"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"value": 7}"#))
            .mount(&mock_server)
            .await;

        let url = format!("{}/payload", mock_server.uri());
        let payload: Payload = fetch_json(&url, fast_policy(), "payload").await.unwrap();
        assert_eq!(payload.value, 7);
    }

    #[tokio::test]
    async fn test_fetch_json_gives_up_after_retries() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/payload"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&mock_server)
            .await;

        let url = format!("{}/payload", mock_server.uri());
        let result: Result<Payload> = fetch_json(&url, fast_policy(), "payload").await;
        assert_eq!(result.unwrap_err().to_string(), "Failed to fetch payload");
    }

    #[tokio::test]
    async fn test_fetch_json_rejects_empty_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/payload"))
            .respond_with(ResponseTemplate::new(200).set_body_string("  "))
            .mount(&mock_server)
            .await;

        let url = format!("{}/payload", mock_server.uri());
        let result: Result<Payload> = fetch_json(&url, fast_policy(), "payload").await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "Received empty response for payload"
        );
    }
}
