//! Records flowing through the pipeline: raw feed items, normalized events
//! and scored rows.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A single analyst event exactly as the upstream feed returns it.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawStock {
    #[serde(default)]
    pub ticker: String,
    #[serde(default)]
    pub target_from: String,
    #[serde(default)]
    pub target_to: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub brokerage: String,
    #[serde(default)]
    pub rating_from: String,
    #[serde(default)]
    pub rating_to: String,
    #[serde(default)]
    pub time: String,
}

/// One page of the upstream feed. An empty `next_page` ends the listing.
#[derive(Debug, Default, Deserialize)]
pub struct FeedPage {
    #[serde(default)]
    pub items: Vec<RawStock>,
    #[serde(default)]
    pub next_page: Option<String>,
}

/// A validated event with typed fields and canonical vocabularies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedStock {
    pub ticker: String,
    pub target_from: f64,
    pub target_to: f64,
    pub company: String,
    pub action: String,
    pub brokerage: String,
    pub rating_from: String,
    pub rating_to: String,
    pub time: DateTime<Utc>,
}

impl NormalizedStock {
    /// Signed change between the two price targets.
    pub fn target_delta(&self) -> f64 {
        self.target_to - self.target_from
    }
}

/// A normalized event together with its batch-relative score.
///
/// This is also the shape of a persisted row, keyed by `ticker`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredStock {
    pub ticker: String,
    pub target_from: f64,
    pub target_to: f64,
    pub company: String,
    pub action: String,
    pub brokerage: String,
    pub rating_from: String,
    pub rating_to: String,
    pub time: DateTime<Utc>,
    pub score: f64,
}

impl ScoredStock {
    pub fn new(stock: NormalizedStock, score: f64) -> Self {
        Self {
            ticker: stock.ticker,
            target_from: stock.target_from,
            target_to: stock.target_to,
            company: stock.company,
            action: stock.action,
            brokerage: stock.brokerage,
            rating_from: stock.rating_from,
            rating_to: stock.rating_to,
            time: stock.time,
            score,
        }
    }
}

impl From<ScoredStock> for NormalizedStock {
    fn from(s: ScoredStock) -> Self {
        NormalizedStock {
            ticker: s.ticker,
            target_from: s.target_from,
            target_to: s.target_to,
            company: s.company,
            action: s.action,
            brokerage: s.brokerage,
            rating_from: s.rating_from,
            rating_to: s.rating_to,
            time: s.time,
        }
    }
}

/// One trading day of a ticker's price history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}
