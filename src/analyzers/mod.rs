//! Batch scoring and ranking of analyst events.
//!
//! Each batch is scanned once for its value ranges and brokerage frequencies
//! ([`metrics::BatchMetrics`]); every record is then scored against those
//! statistics with a fixed weighted sum ([`score::WEIGHTS`]).

pub mod metrics;
pub mod score;
pub mod summary;
pub mod utility;

use thiserror::Error;

pub use metrics::BatchMetrics;
pub use score::{DEFAULT_TOP_N, analyze, rank, score, score_batch};
pub use summary::{StockSummary, summarize};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("cannot score an empty batch")]
    EmptyBatch,
}
