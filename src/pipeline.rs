//! One ingestion cycle: fetch → normalize → score → reconcile.

use anyhow::{Context, Result, bail};
use serde::Serialize;
use tracing::{info, warn};

use crate::analyzers::{StockSummary, score_batch, summarize};
use crate::models::{RawStock, ScoredStock};
use crate::normalizer::normalize_batch;
use crate::services::ratings_feed::RatingsFeed;
use crate::store::{StockRepository, SyncReport};

/// Outcome of a full ingestion run.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub fetched: usize,
    pub rejected: usize,
    pub summary: StockSummary,
    pub sync: SyncReport,
}

/// A normalized, scored batch ready for reconciliation.
#[derive(Debug)]
pub struct PreparedBatch {
    pub scored: Vec<ScoredStock>,
    pub rejected: usize,
    pub summary: StockSummary,
}

/// Normalizes and scores a raw batch.
///
/// Rejected records are dropped; an empty result is an error because an
/// empty batch has no score ranges. A record whose score is not finite is
/// rejected too, since it can never be stored.
pub fn prepare_batch(raws: &[RawStock]) -> Result<PreparedBatch> {
    let normalized = normalize_batch(raws);
    let mut rejected = normalized.rejected.len();

    if normalized.stocks.is_empty() {
        bail!(
            "no valid records in batch ({} fetched, {} rejected)",
            raws.len(),
            rejected
        );
    }

    let mut scored = score_batch(&normalized.stocks)?;
    scored.retain(|s| {
        let finite = s.score.is_finite();
        if !finite {
            warn!(ticker = %s.ticker, score = s.score, "Record rejected: score is not finite");
            rejected += 1;
        }
        finite
    });

    Ok(PreparedBatch {
        scored,
        rejected,
        summary: summarize(&normalized.stocks),
    })
}

/// Runs one cycle against `feed` and `repo`.
///
/// A fetch failure or an empty batch aborts before the table is touched.
#[tracing::instrument(skip_all)]
pub async fn run(feed: &dyn RatingsFeed, repo: &dyn StockRepository) -> Result<RunReport> {
    let raws = feed.fetch_all().await.context("failed to fetch ratings feed")?;
    info!(fetched = raws.len(), "Feed fetched");

    let batch = prepare_batch(&raws)?;
    let sync = repo.sync(&batch.scored).context("failed to reconcile batch")?;

    let report = RunReport {
        fetched: raws.len(),
        rejected: batch.rejected,
        summary: batch.summary,
        sync,
    };
    info!(
        fetched = report.fetched,
        rejected = report.rejected,
        inserted = report.sync.inserted,
        updated = report.sync.updated,
        deleted = report.sync.deleted,
        "Ingestion run complete"
    );
    Ok(report)
}
