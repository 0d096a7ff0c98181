//! Persistence of scored events.
//!
//! [`StockRepository`] is the capability the pipeline and the read API are
//! built against; [`SqliteStore`] is the SQLite-backed implementation.

mod reconcile;
mod schema;
mod sqlite;

pub use reconcile::latest_per_ticker;
pub use schema::Table;
pub use sqlite::SqliteStore;

use serde::Serialize;
use thiserror::Error;

use crate::models::ScoredStock;
use crate::query::StockQuery;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// What a reconciliation run changed.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Rows loaded into staging after collapsing repeated tickers.
    pub staged: usize,
    /// Staged rows with no identical persisted row.
    pub changed: usize,
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
}

impl SyncReport {
    pub fn is_noop(&self) -> bool {
        self.inserted == 0 && self.updated == 0 && self.deleted == 0
    }
}

/// One page of a listing plus the number of rows matching its filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockPage {
    pub stocks: Vec<ScoredStock>,
    pub length: usize,
}

pub trait StockRepository: Send + Sync {
    /// Makes the persisted table match `batch` exactly: new tickers are
    /// inserted, changed rows overwritten and missing tickers deleted, all
    /// in one transaction.
    fn sync(&self, batch: &[ScoredStock]) -> StoreResult<SyncReport>;

    /// Every persisted row, ordered by ticker.
    fn stocks(&self) -> StoreResult<Vec<ScoredStock>>;

    fn count(&self) -> StoreResult<usize>;

    fn query(&self, query: &StockQuery) -> StoreResult<StockPage>;
}
