//! CLI entry point for the fantasy points loader.
//!
//! Downloads a season of player stats, scores every player, replaces the
//! season's table in the store and prints the leaderboard. Runs with no
//! arguments; the flags only override the default season.

use anyhow::Result;
use clap::Parser;
use fantasy_points_etl::config::Settings;
use fantasy_points_etl::fetch::BasicClient;
use fantasy_points_etl::loader::{Period, SeasonType};
use fantasy_points_etl::pipeline::{RunOptions, run};
use fantasy_points_etl::report::DEFAULT_REPORT_LIMIT;
use fantasy_points_etl::store::StoreClient;
use std::ffi::OsStr;
use std::path::Path;
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "fantasy_points_etl")]
#[command(about = "Load season player stats, score them and store the results", long_about = None)]
struct Cli {
    /// Season year to load
    #[arg(long, default_value_t = 2024)]
    season: u16,

    /// Regular season or postseason data
    #[arg(long, value_enum, default_value_t = SeasonType::Post)]
    season_type: SeasonType,

    /// Number of players in the closing leaderboard
    #[arg(long, default_value_t = DEFAULT_REPORT_LIMIT)]
    report_limit: usize,

    /// Skip the leaderboard query
    #[arg(long, default_value_t = false)]
    skip_report: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/fantasy_points_etl.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("fantasy_points_etl.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let settings = Settings::from_env()?;
    let period = Period::new(cli.season, cli.season_type);
    info!(%period, store = ?settings.store, "Starting run");

    // The source timeout bounds both connecting and the download; store
    // requests only get a limit when STORE_TIMEOUT_SECS is set.
    let source_timeout = Some(settings.source.timeout);
    let source_client = BasicClient::with_timeouts(source_timeout, source_timeout)?;
    let store_http = BasicClient::with_timeouts(None, settings.store.timeout)?;
    let store = StoreClient::connect(&settings.store, store_http)?;

    let options = RunOptions {
        period,
        report_limit: (!cli.skip_report).then_some(cli.report_limit),
    };

    match run(&source_client, &settings.source, &store, &options).await {
        Ok(summary) => {
            info!(?summary, "Process completed successfully");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Error occurred");
            Err(e.into())
        }
    }
}
