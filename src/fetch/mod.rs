mod basic;
mod client;
pub mod retry;

pub use basic::BasicClient;
pub use client::HttpClient;
pub use retry::RetryPolicy;

use bytes::Bytes;
use reqwest::{Method, Request, StatusCode, Url};

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned status {status}")]
    Status { url: String, status: StatusCode },
}

/// Parses `url` and builds a bare request for it.
pub fn build_request(method: Method, url: &str) -> Result<Request, FetchError> {
    let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    Ok(Request::new(method, parsed))
}

/// Downloads `url` and returns the body. Any non-2xx status is an error.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Bytes, FetchError> {
    let req = build_request(Method::GET, url)?;

    let resp = client
        .execute(req)
        .await
        .map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        })?;

    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status,
        });
    }

    resp.bytes().await.map_err(|source| FetchError::Transport {
        url: url.to_string(),
        source,
    })
}
