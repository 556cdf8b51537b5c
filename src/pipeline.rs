//! Sequential load → normalize → score → persist → report run.
//!
//! Stages one to four are all-or-nothing: the first fatal error ends the run.
//! The report stage only ever logs.

use chrono::Utc;
use tracing::{Instrument, error, info, info_span, warn};

use crate::config::SourceConfig;
use crate::error::{PipelineError, Result};
use crate::fetch::HttpClient;
use crate::loader::{DataOrigin, Period, load_season};
use crate::normalize::normalize;
use crate::report::{Report, fetch_report, render};
use crate::scoring::score_all;
use crate::store::{ClearOutcome, StoreClient, stamp};

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub period: Period,
    /// `None` skips the report stage.
    pub report_limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReportStatus {
    Skipped,
    Rows(usize),
    Empty,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub period: Period,
    pub origin: DataOrigin,
    pub raw_rows: usize,
    pub normalized_rows: usize,
    pub dropped_rows: usize,
    pub batches_written: usize,
    pub rows_written: usize,
    pub clear: ClearOutcome,
    pub report: ReportStatus,
}

pub async fn run<S, T>(
    source_client: &S,
    source: &SourceConfig,
    store: &StoreClient<T>,
    options: &RunOptions,
) -> Result<RunSummary>
where
    S: HttpClient,
    T: HttpClient,
{
    let period = options.period;
    let table = period.table_name();

    let loaded = load_season(source_client, source, &period)
        .instrument(info_span!("stage", step = "load"))
        .await?;
    let origin = loaded.origin;
    let raw_rows = loaded.table.len();

    let normalized =
        info_span!("stage", step = "normalize").in_scope(|| normalize(&loaded.table))?;
    let normalized_rows = normalized.records.len();
    let dropped_rows = normalized.dropped_rows;

    let scored = info_span!("stage", step = "score").in_scope(|| score_all(normalized.records))?;

    let persist = info_span!("stage", step = "persist", %table);
    let (clear, inserted) = async {
        let rows = stamp(scored, Utc::now());
        let clear = store.clear(&table).await;
        let inserted = store.insert(&table, &rows).await?;
        info!(rows = inserted.rows, batches = inserted.batches, "Saved records to store");
        Ok::<_, PipelineError>((clear, inserted))
    }
    .instrument(persist)
    .await?;

    let report = match options.report_limit {
        Some(limit) => report_stage(store, &table, limit)
            .instrument(info_span!("stage", step = "report"))
            .await,
        None => ReportStatus::Skipped,
    };

    Ok(RunSummary {
        period,
        origin,
        raw_rows,
        normalized_rows,
        dropped_rows,
        batches_written: inserted.batches,
        rows_written: inserted.rows,
        clear,
        report,
    })
}

async fn report_stage<T: HttpClient>(
    store: &StoreClient<T>,
    table: &str,
    limit: usize,
) -> ReportStatus {
    match fetch_report(store, table, limit).await {
        Ok(Report::Rows(players)) => {
            info!(
                "Top {limit} Players by Fantasy Points:\n{}",
                render(&players)
            );
            ReportStatus::Rows(players.len())
        }
        Ok(Report::Empty) => {
            warn!("No data found");
            ReportStatus::Empty
        }
        Err(e) => {
            error!(error = %e, "Error fetching top players");
            ReportStatus::Failed(e.to_string())
        }
    }
}
