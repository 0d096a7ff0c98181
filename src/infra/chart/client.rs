use std::collections::BTreeMap;

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::fetch::{HttpClient, fetch_json};
use crate::models::DailyPoint;
use crate::services::chart_source::ChartSource;

pub const DEFAULT_CHART_URL: &str = "https://www.alphavantage.co/query";

/// Client for an Alpha Vantage style `TIME_SERIES_DAILY` endpoint.
pub struct ChartApiClient<C> {
    client: C,
    base_url: Url,
    api_key: String,
}

/// Response body. The provider answers 200 with a message field instead of
/// the series when the key is wrong or rate limited.
#[derive(Deserialize)]
struct DailySeriesBody {
    #[serde(rename = "Time Series (Daily)")]
    series: Option<BTreeMap<String, RawBar>>,
    #[serde(rename = "Error Message")]
    error: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

#[derive(Deserialize)]
struct RawBar {
    #[serde(rename = "1. open")]
    open: String,
    #[serde(rename = "2. high")]
    high: String,
    #[serde(rename = "3. low")]
    low: String,
    #[serde(rename = "4. close")]
    close: String,
    #[serde(rename = "5. volume")]
    volume: String,
}

impl RawBar {
    fn into_point(self, date: &str) -> Result<DailyPoint> {
        let price = |name: &str, value: &str| -> Result<f64> {
            value
                .trim()
                .parse()
                .with_context(|| format!("{name} '{value}' is not a number"))
        };

        Ok(DailyPoint {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .with_context(|| format!("invalid date '{date}'"))?,
            open: price("open", &self.open)?,
            high: price("high", &self.high)?,
            low: price("low", &self.low)?,
            close: price("close", &self.close)?,
            volume: self
                .volume
                .trim()
                .parse()
                .with_context(|| format!("volume '{}' is not a whole number", self.volume))?,
        })
    }
}

impl DailySeriesBody {
    /// Parsed bars sorted by date. Malformed bars are skipped.
    fn into_points(self) -> Result<Vec<DailyPoint>> {
        let Some(series) = self.series else {
            let message = self.error.or(self.note).or(self.information);
            return Err(match message {
                Some(m) => anyhow!("chart provider refused the request: {m}"),
                None => anyhow!("chart response has no daily series"),
            });
        };

        let mut points: Vec<DailyPoint> = series
            .into_iter()
            .filter_map(|(date, bar)| match bar.into_point(&date) {
                Ok(point) => Some(point),
                Err(e) => {
                    warn!(date = %date, error = %e, "Skipping malformed daily bar");
                    None
                }
            })
            .collect();
        points.sort_by_key(|p| p.date);
        Ok(points)
    }
}

impl<C: HttpClient> ChartApiClient<C> {
    pub fn new(client: C, base_url: &str, api_key: &str) -> Result<Self> {
        let base_url = Url::parse(base_url).with_context(|| format!("invalid chart url '{base_url}'"))?;
        if api_key.trim().is_empty() {
            bail!("chart api key cannot be empty");
        }
        Ok(Self {
            client,
            base_url,
            api_key: api_key.to_string(),
        })
    }

    fn series_url(&self, ticker: &str) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("function", "TIME_SERIES_DAILY")
            .append_pair("symbol", ticker)
            .append_pair("apikey", &self.api_key);
        url
    }
}

#[async_trait]
impl<C: HttpClient> ChartSource for ChartApiClient<C> {
    #[tracing::instrument(skip(self))]
    async fn daily_series(&self, ticker: &str) -> Result<Vec<DailyPoint>> {
        let body: DailySeriesBody = fetch_json(&self.client, self.series_url(ticker))
            .await
            .with_context(|| format!("failed to fetch daily series for {ticker}"))?;

        let points = body.into_points()?;
        debug!(points = points.len(), "Daily series fetched");
        Ok(points)
    }
}
