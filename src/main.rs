//! CLI entry point for the stock rater.
//!
//! Provides subcommands for syncing the ratings feed into the database,
//! scoring a saved feed page, summarizing the persisted table, printing a
//! ticker's recent price history and serving the read API.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use stock_rater::{
    analyzers::{DEFAULT_TOP_N, rank, summarize},
    api::{self, AppState, handlers::CHART_POINTS},
    config::Config,
    fetch::{BasicClient, auth::BearerAuth, fetch_bytes},
    infra::{chart::ChartApiClient, feed::FeedApiClient},
    models::NormalizedStock,
    output::{append_records, print_json},
    parser::parse_feed,
    pipeline,
    services::{chart_source::ChartSource, ratings_feed::RatingsFeed},
    store::{SqliteStore, StockRepository},
};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "stock_rater")]
#[command(about = "Scores analyst rating events and keeps them in sync", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the whole feed, score it and reconcile it into the database
    Sync,
    /// Score a saved feed page from a file or URL
    Analyze {
        /// Path to file or URL to fetch
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        /// Number of ranked records to keep
        #[arg(short, long, default_value_t = DEFAULT_TOP_N)]
        top: usize,

        /// CSV file to append ranked records to
        #[arg(short, long, default_value = "ranked.csv")]
        output: PathBuf,
    },
    /// Summarize the persisted table
    Summary,
    /// Print the most recent daily prices of a ticker
    Chart {
        /// Ticker symbol, e.g. AAPL
        ticker: String,
    },
    /// Serve the read API
    Serve {
        /// Address to bind, overriding BIND_ADDR
        #[arg(short, long)]
        bind: Option<SocketAddr>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/stock_rater.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("stock_rater.log"));

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
    let config = Config::from_env()?;

    match cli.command {
        Commands::Sync => {
            let feed = feed_client(&config)?;
            let store = SqliteStore::open(&config.database_path)?;
            let report = pipeline::run(feed.as_ref(), &store).await?;
            print_json(&report)?;
        }
        Commands::Analyze {
            source,
            top,
            output,
        } => {
            let client = BasicClient::with_timeout(config.feed_timeout)?;
            let bytes = fetch_bytes(&client, &source).await?;
            let raws = parse_feed(&bytes)?;

            let batch = pipeline::prepare_batch(&raws)?;
            let mut ranked = batch.scored;
            rank(&mut ranked);
            ranked.truncate(top);

            info!(
                records = raws.len(),
                rejected = batch.rejected,
                kept = ranked.len(),
                "Batch analyzed"
            );
            print_json(&ranked)?;
            print_json(&batch.summary)?;
            append_records(&output, &ranked)?;
        }
        Commands::Summary => {
            let store = SqliteStore::open(&config.database_path)?;
            let stocks: Vec<NormalizedStock> =
                store.stocks()?.into_iter().map(Into::into).collect();
            print_json(&summarize(&stocks))?;
        }
        Commands::Chart { ticker } => {
            let chart = chart_client(&config)?.context("CHART_API_KEY must be set to fetch charts")?;
            let mut series = chart.daily_series(&ticker.trim().to_uppercase()).await?;
            let start = series.len().saturating_sub(CHART_POINTS);
            print_json(&series.split_off(start))?;
        }
        Commands::Serve { bind } => {
            let store = SqliteStore::open(&config.database_path)?;
            let mut state = AppState::new(Arc::new(store));
            match chart_client(&config)? {
                Some(chart) => state = state.with_chart(chart),
                None => info!("CHART_API_KEY not set, /chart is disabled"),
            }
            api::serve(bind.unwrap_or(config.bind_addr), state).await?;
        }
    }

    Ok(())
}

/// Builds the paginated feed client, authenticated when `FEED_TOKEN` is set.
fn feed_client(config: &Config) -> Result<Box<dyn RatingsFeed>> {
    let url = config.require_feed_url()?;
    let http = BasicClient::with_timeout(config.feed_timeout)?;

    Ok(match config.feed_token.as_deref() {
        Some(token) => Box::new(FeedApiClient::new(BearerAuth::new(http, token)?, url)?),
        None => Box::new(FeedApiClient::new(http, url)?),
    })
}

/// Builds the chart provider client when `CHART_API_KEY` is set.
fn chart_client(config: &Config) -> Result<Option<Arc<dyn ChartSource>>> {
    let Some(key) = config.chart_api_key.as_deref() else {
        return Ok(None);
    };
    let http = BasicClient::with_timeout(config.feed_timeout)?;
    Ok(Some(Arc::new(ChartApiClient::new(http, &config.chart_url, key)?)))
}
