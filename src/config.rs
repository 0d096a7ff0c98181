//! Runtime configuration read from the environment (after `.env` is loaded).
//!
//! | Variable            | Default          |
//! |---------------------|------------------|
//! | `FEED_URL`          | required by sync |
//! | `FEED_TOKEN`        | none             |
//! | `DATABASE_PATH`     | `stocks.db`      |
//! | `BIND_ADDR`         | `127.0.0.1:3000` |
//! | `FEED_TIMEOUT_SECS` | `30`             |
//! | `CHART_API_KEY`     | none (no charts) |
//! | `CHART_URL`         | Alpha Vantage    |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::infra::chart::DEFAULT_CHART_URL;

pub const DEFAULT_DATABASE_PATH: &str = "stocks.db";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_FEED_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub feed_url: Option<String>,
    pub feed_token: Option<String>,
    pub database_path: PathBuf,
    pub bind_addr: SocketAddr,
    pub feed_timeout: Duration,
    pub chart_api_key: Option<String>,
    pub chart_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr: SocketAddr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("BIND_ADDR must be a socket address such as 127.0.0.1:3000")?;

        let feed_timeout: u64 = match get("FEED_TIMEOUT_SECS") {
            Some(v) => v.parse().context("FEED_TIMEOUT_SECS must be a whole number of seconds")?,
            None => DEFAULT_FEED_TIMEOUT_SECS,
        };

        Ok(Config {
            feed_url: get("FEED_URL"),
            feed_token: get("FEED_TOKEN"),
            database_path: get("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH)),
            bind_addr,
            feed_timeout: Duration::from_secs(feed_timeout),
            chart_api_key: get("CHART_API_KEY"),
            chart_url: get("CHART_URL").unwrap_or_else(|| DEFAULT_CHART_URL.to_string()),
        })
    }

    pub fn require_feed_url(&self) -> Result<&str> {
        self.feed_url
            .as_deref()
            .context("FEED_URL must be set to fetch the ratings feed")
    }
}
