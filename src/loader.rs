//! Season dataset loading.
//!
//! Downloads the player stats CSV for a [`Period`], refreshing the local cache
//! copy on success and falling back to that copy when the download fails.

use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use csv::{ReaderBuilder, StringRecord};
use tracing::{info, warn};

use crate::config::SourceConfig;
use crate::error::{PipelineError, Result};
use crate::fetch::{HttpClient, fetch_bytes};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, clap::ValueEnum)]
pub enum SeasonType {
    #[value(name = "reg")]
    Regular,
    #[default]
    #[value(name = "post")]
    Post,
}

impl SeasonType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeasonType::Regular => "reg",
            SeasonType::Post => "post",
        }
    }
}

impl fmt::Display for SeasonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One dataset snapshot: a season plus regular/post flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Period {
    pub season: u16,
    pub season_type: SeasonType,
}

impl Period {
    pub fn new(season: u16, season_type: SeasonType) -> Self {
        Self {
            season,
            season_type,
        }
    }

    /// Name shared by the remote asset and the local cache file.
    pub fn file_name(&self) -> String {
        format!("stats_player_{}_{}.csv", self.season_type, self.season)
    }

    pub fn table_name(&self) -> String {
        format!("player_stats_{}", self.season)
    }
}

impl Default for Period {
    fn default() -> Self {
        Self::new(2024, SeasonType::Post)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.season, self.season_type)
    }
}

/// Unvalidated CSV contents: header row plus data rows, as provided by the source.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: StringRecord,
    pub records: Vec<StringRecord>,
}

impl RawTable {
    pub fn from_reader<R: Read>(reader: R) -> csv::Result<Self> {
        let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers = rdr.headers()?.clone();
        let records = rdr.records().collect::<csv::Result<Vec<_>>>()?;
        Ok(Self { headers, records })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|source| PipelineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file).map_err(|source| PipelineError::Csv {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataOrigin {
    Remote,
    Cache,
}

#[derive(Debug)]
pub struct LoadedData {
    pub table: RawTable,
    pub origin: DataOrigin,
    pub path: PathBuf,
}

/// Loads the dataset for `period`, preferring the remote copy.
///
/// # Errors
///
/// [`PipelineError::SourceUnavailable`] when the download fails and no
/// readable cache file exists.
#[tracing::instrument(skip(client, source, period), fields(period = %period))]
pub async fn load_season<C: HttpClient>(
    client: &C,
    source: &SourceConfig,
    period: &Period,
) -> Result<LoadedData> {
    let file_name = period.file_name();
    let url = format!("{}/{}", source.base_url.trim_end_matches('/'), file_name);
    let path = source.cache_dir.join(&file_name);

    info!(%url, "Attempting to download data");

    let fetch_error = match fetch_and_cache(client, &url, &path).await {
        Ok(table) => {
            info!(rows = table.len(), "Successfully downloaded data");
            return Ok(LoadedData {
                table,
                origin: DataOrigin::Remote,
                path,
            });
        }
        Err(e) => e,
    };

    warn!(error = %format!("{fetch_error:#}"), path = %path.display(), "Download failed, trying local file");

    if !path.exists() {
        return Err(PipelineError::SourceUnavailable {
            path,
            reason: format!("download failed ({fetch_error:#}) and no local copy exists"),
        });
    }

    match RawTable::from_path(&path) {
        Ok(table) => {
            info!(rows = table.len(), path = %path.display(), "Loaded data from local file");
            Ok(LoadedData {
                table,
                origin: DataOrigin::Cache,
                path,
            })
        }
        Err(e) => Err(PipelineError::SourceUnavailable {
            path,
            reason: format!("download failed ({fetch_error:#}) and local copy is unreadable ({e})"),
        }),
    }
}

async fn fetch_and_cache<C: HttpClient>(
    client: &C,
    url: &str,
    path: &Path,
) -> anyhow::Result<RawTable> {
    let bytes = fetch_bytes(client, url).await?;

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating cache directory {}", dir.display()))?;
    }
    std::fs::write(path, &bytes).with_context(|| format!("writing {}", path.display()))?;

    Ok(RawTable::from_reader(bytes.as_ref())?)
}
