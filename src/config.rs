//! Runtime settings, read from the process environment (after `.env` has
//! been loaded by the binary).
//!
//! | Variable              | Default                                                       |
//! |-----------------------|---------------------------------------------------------------|
//! | `STORE_URL`           | required                                                      |
//! | `STORE_API_KEY`       | required                                                      |
//! | `STORE_BATCH_SIZE`    | 500                                                           |
//! | `STORE_TIMEOUT_SECS`  | unset (transport default)                                     |
//! | `STORE_MAX_RETRIES`   | 2                                                             |
//! | `STORE_RETRY_BASE_MS` | 500                                                           |
//! | `SOURCE_BASE_URL`     | nflverse `stats_player` release                               |
//! | `SOURCE_TIMEOUT_SECS` | 10                                                            |
//! | `CACHE_DIR`           | `.`                                                           |

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{PipelineError, Result};
use crate::fetch::RetryPolicy;

pub const DEFAULT_SOURCE_BASE_URL: &str =
    "https://github.com/nflverse/nflverse-data/releases/download/stats_player";
pub const DEFAULT_BATCH_SIZE: usize = 500;
pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub cache_dir: PathBuf,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SOURCE_BASE_URL.to_string(),
            timeout: DEFAULT_SOURCE_TIMEOUT,
            cache_dir: PathBuf::from("."),
        }
    }
}

#[derive(Clone)]
pub struct StoreConfig {
    pub url: String,
    pub api_key: String,
    pub batch_size: usize,
    pub timeout: Option<Duration>,
    pub retry: RetryPolicy,
}

impl StoreConfig {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            timeout: None,
            retry: RetryPolicy::default(),
        }
    }
}

// Keeps the key out of logs.
impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .field("batch_size", &self.batch_size)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub source: SourceConfig,
    pub store: StoreConfig,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let url = get("STORE_URL").ok_or_else(|| PipelineError::config("STORE_URL", "must be set"))?;
        let api_key = get("STORE_API_KEY")
            .ok_or_else(|| PipelineError::config("STORE_API_KEY", "must be set"))?;

        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(PipelineError::config(
                "STORE_URL",
                format!("expected an http(s) URL, got '{url}'"),
            ));
        }
        if !api_key.chars().all(|c| c.is_ascii_graphic()) {
            return Err(PipelineError::config(
                "STORE_API_KEY",
                "must contain only visible ASCII characters",
            ));
        }

        let batch_size = parse_or(&get, "STORE_BATCH_SIZE", DEFAULT_BATCH_SIZE)?;
        if batch_size == 0 {
            return Err(PipelineError::config("STORE_BATCH_SIZE", "must be greater than zero"));
        }

        let store_timeout = get("STORE_TIMEOUT_SECS")
            .map(|raw| parse_value::<u64>("STORE_TIMEOUT_SECS", &raw))
            .transpose()?
            .map(Duration::from_secs);

        let defaults = RetryPolicy::default();
        let retry = RetryPolicy {
            max_retries: parse_or(&get, "STORE_MAX_RETRIES", defaults.max_retries)?,
            base_delay: Duration::from_millis(parse_or(
                &get,
                "STORE_RETRY_BASE_MS",
                defaults.base_delay.as_millis() as u64,
            )?),
        };

        let source_defaults = SourceConfig::default();
        let source = SourceConfig {
            base_url: get("SOURCE_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(source_defaults.base_url),
            timeout: Duration::from_secs(parse_or(
                &get,
                "SOURCE_TIMEOUT_SECS",
                source_defaults.timeout.as_secs(),
            )?),
            cache_dir: get("CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(source_defaults.cache_dir),
        };

        Ok(Self {
            source,
            store: StoreConfig {
                url: url.trim_end_matches('/').to_string(),
                api_key,
                batch_size,
                timeout: store_timeout,
                retry,
            },
        })
    }
}

fn parse_value<T: FromStr>(field: &str, raw: &str) -> Result<T>
where
    T::Err: fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| PipelineError::config(field, format!("invalid value '{raw}': {e}")))
}

fn parse_or<T, G>(get: &G, field: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(field) {
        Some(raw) => parse_value(field, &raw),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_applied() {
        let settings = Settings::from_lookup(lookup(&[
            ("STORE_URL", "https://example.supabase.co/"),
            ("STORE_API_KEY", "secret"),
        ]))
        .unwrap();

        assert_eq!(settings.store.url, "https://example.supabase.co");
        assert_eq!(settings.store.batch_size, 500);
        assert_eq!(settings.store.timeout, None);
        assert_eq!(settings.store.retry, RetryPolicy::default());
        assert_eq!(settings.source.timeout, Duration::from_secs(10));
        assert_eq!(settings.source.base_url, DEFAULT_SOURCE_BASE_URL);
        assert_eq!(settings.source.cache_dir, PathBuf::from("."));
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            ("STORE_URL", "http://localhost:54321"),
            ("STORE_API_KEY", "secret"),
            ("STORE_BATCH_SIZE", "100"),
            ("STORE_TIMEOUT_SECS", "30"),
            ("STORE_MAX_RETRIES", "0"),
            ("SOURCE_TIMEOUT_SECS", "5"),
            ("CACHE_DIR", "/tmp/cache"),
        ]))
        .unwrap();

        assert_eq!(settings.store.batch_size, 100);
        assert_eq!(settings.store.timeout, Some(Duration::from_secs(30)));
        assert_eq!(settings.store.retry.max_retries, 0);
        assert_eq!(settings.source.timeout, Duration::from_secs(5));
        assert_eq!(settings.source.cache_dir, PathBuf::from("/tmp/cache"));
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let err = Settings::from_lookup(lookup(&[("STORE_URL", "https://x.co")])).unwrap_err();
        assert!(matches!(err, PipelineError::Config { ref field, .. } if field == "STORE_API_KEY"));

        let err = Settings::from_lookup(lookup(&[("STORE_API_KEY", "k")])).unwrap_err();
        assert!(matches!(err, PipelineError::Config { ref field, .. } if field == "STORE_URL"));
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let err = Settings::from_lookup(lookup(&[
            ("STORE_URL", "https://x.co"),
            ("STORE_API_KEY", "k"),
            ("STORE_BATCH_SIZE", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, PipelineError::Config { ref field, .. } if field == "STORE_BATCH_SIZE"));
    }

    #[test]
    fn test_unparseable_number_rejected() {
        let err = Settings::from_lookup(lookup(&[
            ("STORE_URL", "https://x.co"),
            ("STORE_API_KEY", "k"),
            ("SOURCE_TIMEOUT_SECS", "ten"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("SOURCE_TIMEOUT_SECS"));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let store = StoreConfig::new("https://x.co", "super-secret-key");
        let rendered = format!("{store:?}");
        assert!(!rendered.contains("super-secret-key"));
        assert!(rendered.contains("<redacted>"));
    }
}
