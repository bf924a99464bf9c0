// file: src/llm/retry.rs
// description: JSON POST with exponential backoff for rate-limited model APIs
// reference: https://docs.rs/reqwest

use crate::error::{PipelineError, Result};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Largest backoff exponent: delays grow 1x, 2x, 4x ... up to 32x the base.
const MAX_BACKOFF_EXPONENT: u32 = 5;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::from_secs(1),
        }
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(MAX_BACKOFF_EXPONENT);
        self.base_delay * (1u32 << exponent)
    }
}

pub fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

pub(crate) fn build_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| PipelineError::Config(format!("Failed to build HTTP client: {}", e)))
}

/// Sends `body` to `url` and returns the decoded JSON response, retrying
/// transport errors, 429 and 5xx responses according to `policy`.
pub(crate) async fn post_json_with_retry(
    client: &Client,
    url: &str,
    api_key: Option<&str>,
    body: &Value,
    policy: &RetryPolicy,
    to_error: fn(String) -> PipelineError,
) -> Result<Value> {
    let mut last_err = None;

    for attempt in 0..=policy.max_retries {
        if attempt > 0 {
            let delay = policy.delay_for(attempt);
            debug!("Retrying {} in {:?} (attempt {})", url, delay, attempt);
            tokio::time::sleep(delay).await;
        }

        let mut request = client.post(url).json(body);
        if let Some(key) = api_key {
            request = request.bearer_auth(key);
        }

        match request.send().await {
            Ok(response) => {
                let status = response.status();

                if status.is_success() {
                    return response
                        .json::<Value>()
                        .await
                        .map_err(|e| to_error(format!("Failed to parse response: {}", e)));
                }

                let body_text = response.text().await.unwrap_or_default();

                if is_retryable(status) {
                    warn!("{} returned {}, will retry", url, status);
                    last_err = Some(format!("request failed with status {}: {}", status, body_text));
                    continue;
                }

                return Err(to_error(format!(
                    "request failed with status {}: {}",
                    status, body_text
                )));
            }
            Err(e) => {
                warn!("Request to {} failed: {}", url, e);
                last_err = Some(format!("request failed: {}", e));
            }
        }
    }

    Err(to_error(last_err.unwrap_or_else(|| {
        "request failed after retries".to_string()
    })))
}
