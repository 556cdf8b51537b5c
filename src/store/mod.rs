//! PostgREST-style store access.
//!
//! [`StoreConnection`] is the static descriptor (REST root plus headers),
//! [`StoreClient`] issues the clear, insert and select requests, and
//! [`PersistedRow`] is the wire shape of one inserted row.

mod client;
mod row;

pub use client::StoreClient;
pub use row::{PersistedRow, stamp};

use reqwest::header::{
    AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue,
};

use crate::config::StoreConfig;
use crate::error::{PipelineError, Result};

const APIKEY: HeaderName = HeaderName::from_static("apikey");
const PREFER: HeaderName = HeaderName::from_static("prefer");

/// Base URL and fixed header set for every store request.
#[derive(Debug, Clone)]
pub struct StoreConnection {
    rest_url: String,
    headers: HeaderMap,
}

impl StoreConnection {
    /// Builds the descriptor. No request is made.
    ///
    /// # Errors
    ///
    /// [`PipelineError::Config`] if the API key cannot be sent as a header
    /// value. [`crate::config::Settings`] already rejects such keys.
    pub fn connect(config: &StoreConfig) -> Result<Self> {
        let invalid_key = |_: InvalidHeaderValue| {
            PipelineError::config("STORE_API_KEY", "not a valid HTTP header value")
        };

        let mut apikey = HeaderValue::from_str(&config.api_key).map_err(invalid_key)?;
        apikey.set_sensitive(true);
        let mut bearer =
            HeaderValue::from_str(&format!("Bearer {}", config.api_key)).map_err(invalid_key)?;
        bearer.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(APIKEY, apikey);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(PREFER, HeaderValue::from_static("return=minimal"));

        Ok(Self {
            rest_url: format!("{}/rest/v1", config.url.trim_end_matches('/')),
            headers,
        })
    }

    pub fn rest_url(&self) -> &str {
        &self.rest_url
    }

    pub fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.rest_url, table)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

/// Result of the pre-insert delete. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClearOutcome {
    Cleared,
    NotCleared { reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InsertSummary {
    pub batches: usize,
    pub rows: usize,
}
