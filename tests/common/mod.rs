#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use fantasy_points_etl::config::{SourceConfig, StoreConfig};
use fantasy_points_etl::fetch::{HttpClient, RetryPolicy};
use fantasy_points_etl::normalize::{IDENTITY_COLUMNS, NUMERIC_COLUMNS};
use reqwest::Method;
use reqwest::header::HeaderMap;

/// Canned reply for one request.
#[derive(Debug, Clone)]
pub enum Reply {
    Status(u16, String),
    /// A real connection-refused error from reqwest.
    ConnectError,
}

pub fn ok(body: &str) -> Reply {
    Reply::Status(200, body.to_string())
}

pub fn status(code: u16) -> Reply {
    Reply::Status(code, String::new())
}

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl Recorded {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(self.body.as_deref().expect("request has no body"))
            .expect("body is not JSON")
    }
}

/// Replays scripted replies in order and records every request it sees.
pub struct ScriptedClient {
    replies: Mutex<VecDeque<Reply>>,
    default: Reply,
    requests: Mutex<Vec<Recorded>>,
}

impl ScriptedClient {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            default: status(599),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_default(mut self, reply: Reply) -> Self {
        self.default = reply;
        self
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_with(&self, method: Method) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method)
            .collect()
    }
}

#[async_trait]
impl HttpClient for ScriptedClient {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        self.requests.lock().unwrap().push(Recorded {
            method: req.method().clone(),
            url: req.url().to_string(),
            headers: req.headers().clone(),
            body: req.body().and_then(|b| b.as_bytes()).map(<[u8]>::to_vec),
        });

        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.default.clone());

        match reply {
            Reply::Status(code, body) => {
                let resp = http::Response::builder().status(code).body(body).unwrap();
                Ok(reqwest::Response::from(resp))
            }
            Reply::ConnectError => {
                let err = reqwest::Client::new()
                    .get("http://127.0.0.1:1/")
                    .send()
                    .await
                    .expect_err("nothing should listen on port 1");
                Err(err)
            }
        }
    }
}

pub fn source_config(cache_dir: &Path) -> SourceConfig {
    SourceConfig {
        base_url: "https://data.test/stats_player".to_string(),
        timeout: Duration::from_secs(10),
        cache_dir: cache_dir.to_path_buf(),
    }
}

pub fn store_config(batch_size: usize, max_retries: u32) -> StoreConfig {
    let mut config = StoreConfig::new("https://store.test", "test-key");
    config.batch_size = batch_size;
    config.retry = RetryPolicy {
        max_retries,
        base_delay: Duration::ZERO,
    };
    config
}

/// One CSV row: position group, display name, and the non-blank stats.
pub struct Row<'a> {
    pub group: &'a str,
    pub name: &'a str,
    pub stats: &'a [(&'a str, f64)],
}

/// Builds a season CSV with the full projection header plus one extra
/// column the pipeline should ignore.
pub fn season_csv(rows: &[Row<'_>]) -> String {
    let mut header: Vec<&str> = vec!["player_id"];
    header.extend(IDENTITY_COLUMNS);
    header.extend(NUMERIC_COLUMNS);

    let mut out = header.join(",");
    out.push('\n');

    for (i, row) in rows.iter().enumerate() {
        let id = format!("00-{i:05}");
        let cells: Vec<String> = header
            .iter()
            .map(|&col| match col {
                "player_id" => id.clone(),
                "player_name" | "player_display_name" => row.name.to_string(),
                "position" | "position_group" => row.group.to_string(),
                "recent_team" => "KC".to_string(),
                stat => row
                    .stats
                    .iter()
                    .find(|(c, _)| *c == stat)
                    .map(|(_, v)| v.to_string())
                    .unwrap_or_default(),
            })
            .collect();
        out.push_str(&cells.join(","));
        out.push('\n');
    }
    out
}
