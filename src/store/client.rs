use bytes::Bytes;
use reqwest::{Method, Request, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, warn};

use super::{ClearOutcome, InsertSummary, PersistedRow, StoreConnection};
use crate::config::StoreConfig;
use crate::error::{PipelineError, Result, StoreError};
use crate::fetch::retry::execute_with_retry;
use crate::fetch::{FetchError, HttpClient, RetryPolicy, build_request};

/// Issues store requests over `C`, in order, one at a time.
pub struct StoreClient<C> {
    conn: StoreConnection,
    http: C,
    retry: RetryPolicy,
    batch_size: usize,
}

impl<C: HttpClient> StoreClient<C> {
    pub fn new(conn: StoreConnection, http: C, config: &StoreConfig) -> Self {
        Self {
            conn,
            http,
            retry: config.retry,
            batch_size: config.batch_size.max(1),
        }
    }

    pub fn connect(config: &StoreConfig, http: C) -> Result<Self> {
        let conn = StoreConnection::connect(config)?;
        info!(rest_url = conn.rest_url(), "Connected to store");
        Ok(Self::new(conn, http, config))
    }

    fn request(&self, method: Method, url: &str, body: Option<&Bytes>) -> Result<Request, FetchError> {
        let mut req = build_request(method, url)?;
        *req.headers_mut() = self.conn.headers().clone();
        if let Some(body) = body {
            *req.body_mut() = Some(body.clone().into());
        }
        Ok(req)
    }

    /// Deletes every row of `table`. Failures are reported, never raised.
    #[tracing::instrument(skip(self))]
    pub async fn clear(&self, table: &str) -> ClearOutcome {
        let url = format!("{}?id=gt.0", self.conn.table_url(table));

        let result =
            execute_with_retry(&self.http, &self.retry, || self.request(Method::DELETE, &url, None))
                .await;

        match result {
            Ok(resp) if matches!(resp.status(), StatusCode::OK | StatusCode::NO_CONTENT) => {
                info!("Cleared existing records");
                ClearOutcome::Cleared
            }
            Ok(resp) => {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                warn!(%status, %body, "Could not clear existing data");
                ClearOutcome::NotCleared {
                    reason: format!("status {status}: {body}"),
                }
            }
            Err(e) => {
                warn!(error = %e, "Could not clear existing data (table might be empty)");
                ClearOutcome::NotCleared {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Appends `rows` to `table` in batches of `batch_size`, stopping at the
    /// first failed batch. Batches already sent stay written.
    ///
    /// # Errors
    ///
    /// [`PipelineError::StoreWrite`] for the first batch that is rejected or
    /// cannot be delivered.
    #[tracing::instrument(skip(self, rows), fields(rows = rows.len(), batch_size = self.batch_size))]
    pub async fn insert(&self, table: &str, rows: &[PersistedRow]) -> Result<InsertSummary> {
        let url = self.conn.table_url(table);
        let total_batches = rows.len().div_ceil(self.batch_size);
        let mut written = 0;

        let failure = |batch: usize, written: usize, reason: String| PipelineError::StoreWrite {
            table: table.to_string(),
            batch,
            rows_written: written,
            reason,
        };

        for (index, batch) in rows.chunks(self.batch_size).enumerate() {
            let body = serde_json::to_vec(batch)
                .map(Bytes::from)
                .map_err(|e| failure(index, written, format!("could not encode rows: {e}")))?;
            debug!(batch = index + 1, bytes = body.len(), "Sending batch");

            let resp = execute_with_retry(&self.http, &self.retry, || {
                self.request(Method::POST, &url, Some(&body))
            })
            .await
            .map_err(|e| {
                error!(batch = index + 1, error = %e, "Error inserting batch");
                failure(index, written, e.to_string())
            })?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                error!(batch = index + 1, %status, %body, "Error inserting batch");
                return Err(failure(index, written, format!("status {status}: {body}")));
            }

            written += batch.len();
            info!(
                batch = index + 1,
                total_batches,
                records = batch.len(),
                "Inserted batch"
            );
        }

        Ok(InsertSummary {
            batches: total_batches,
            rows: written,
        })
    }

    /// Runs a GET against `table` with a raw PostgREST query string.
    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &str,
    ) -> Result<Vec<T>, StoreError> {
        let url = format!("{}?{}", self.conn.table_url(table), query);

        let resp =
            execute_with_retry(&self.http, &self.retry, || self.request(Method::GET, &url, None))
                .await?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.clone(),
                source,
            })?;

        if status != StatusCode::OK {
            return Err(StoreError::Status { status, body });
        }

        Ok(serde_json::from_str(&body)?)
    }
}
