//! Trait for sources of analyst rating events.

use anyhow::Result;

use crate::models::RawStock;

/// Abstraction over an upstream ratings provider.
#[async_trait::async_trait]
pub trait RatingsFeed: Send + Sync {
    /// Returns every event the provider currently lists, across all pages.
    ///
    /// Any page failure fails the whole listing; callers never see a
    /// partial batch.
    async fn fetch_all(&self) -> Result<Vec<RawStock>>;
}
