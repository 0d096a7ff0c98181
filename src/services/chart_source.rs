//! Trait for sources of daily price history.

use anyhow::Result;

use crate::models::DailyPoint;

/// Abstraction over a market-data provider.
#[async_trait::async_trait]
pub trait ChartSource: Send + Sync {
    /// Daily history for `ticker`, oldest first.
    async fn daily_series(&self, ticker: &str) -> Result<Vec<DailyPoint>>;
}
