//! Bounded retry with exponential backoff for store requests.

use std::time::Duration;

use reqwest::{Method, Request, Response, StatusCode};
use tracing::warn;

use super::{FetchError, HttpClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (0-based): `base * 2^attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(500),
        }
    }
}

/// Server errors and rate limiting are worth another try; other 4xx are not.
///
/// A POST is not idempotent: once it reached the server a 5xx may still mean
/// the rows were committed. It is only repeated on 429 and 503.
pub fn is_retryable_status(method: &Method, status: StatusCode) -> bool {
    if *method == Method::POST {
        matches!(
            status,
            StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE
        )
    } else {
        status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
    }
}

/// A POST is only repeated when the connection was never established.
fn is_retryable_error(method: &Method, err: &reqwest::Error) -> bool {
    if *method == Method::POST {
        err.is_connect()
    } else {
        err.is_timeout() || err.is_connect()
    }
}

/// Sends the request produced by `build`, retrying per `policy`.
///
/// Returns the last response received, whatever its status, so callers keep
/// deciding what counts as success. Only transport failures are errors.
pub async fn execute_with_retry<C, F>(
    client: &C,
    policy: &RetryPolicy,
    build: F,
) -> Result<Response, FetchError>
where
    C: HttpClient,
    F: Fn() -> Result<Request, FetchError>,
{
    let mut attempt = 0;
    loop {
        let req = build()?;
        let method = req.method().clone();
        let url = req.url().to_string();

        match client.execute(req).await {
            Ok(resp) => {
                let status = resp.status();
                if attempt < policy.max_retries && is_retryable_status(&method, status) {
                    let delay = policy.delay_for(attempt);
                    warn!(%method, %url, %status, attempt, delay_ms = delay.as_millis() as u64, "Retrying store request");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                    continue;
                }
                return Ok(resp);
            }
            Err(source) => {
                if attempt < policy.max_retries && is_retryable_error(&method, &source) {
                    let delay = policy.delay_for(attempt);
                    warn!(%method, %url, error = %source, attempt, delay_ms = delay.as_millis() as u64, "Retrying store request");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                    continue;
                }
                return Err(FetchError::Transport { url, source });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_doubles_per_attempt() {
        let policy = RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
        };
        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2), Duration::from_millis(400));
    }

    #[test]
    fn test_retryable_statuses() {
        for method in [Method::GET, Method::DELETE] {
            assert!(is_retryable_status(&method, StatusCode::INTERNAL_SERVER_ERROR));
            assert!(is_retryable_status(&method, StatusCode::BAD_GATEWAY));
            assert!(is_retryable_status(&method, StatusCode::GATEWAY_TIMEOUT));
            assert!(is_retryable_status(&method, StatusCode::TOO_MANY_REQUESTS));
            assert!(!is_retryable_status(&method, StatusCode::BAD_REQUEST));
            assert!(!is_retryable_status(&method, StatusCode::NOT_FOUND));
            assert!(!is_retryable_status(&method, StatusCode::OK));
        }
    }

    #[test]
    fn test_post_only_retried_when_not_processed() {
        assert!(is_retryable_status(&Method::POST, StatusCode::SERVICE_UNAVAILABLE));
        assert!(is_retryable_status(&Method::POST, StatusCode::TOO_MANY_REQUESTS));
        assert!(!is_retryable_status(&Method::POST, StatusCode::INTERNAL_SERVER_ERROR));
        assert!(!is_retryable_status(&Method::POST, StatusCode::BAD_GATEWAY));
        assert!(!is_retryable_status(&Method::POST, StatusCode::GATEWAY_TIMEOUT));
        assert!(!is_retryable_status(&Method::POST, StatusCode::CREATED));
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 2);
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
    }
}
