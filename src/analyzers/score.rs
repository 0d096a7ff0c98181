use crate::analyzers::AnalysisError;
use crate::analyzers::metrics::BatchMetrics;
use crate::analyzers::utility::{absolute_change, percentage_change};
use crate::models::{NormalizedStock, ScoredStock};
use crate::vocabulary::{Action, rating_ordinal};

/// Number of records returned by [`analyze`] unless the caller asks otherwise.
pub const DEFAULT_TOP_N: usize = 10;

/// Brokerages whose calls carry full weight. Matched exactly.
pub static TOP_BROKERAGES: &[&str] = &[
    "JPMorgan Chase & Co.",
    "Evercore ISI",
    "Bank of America",
    "Morgan Stanley",
    "Barclays",
    "Citigroup",
    "UBS Group",
    "The Goldman Sachs Group",
    "Wells Fargo & Company",
    "Deutsche Bank Aktiengesellschaft",
];

/// Contribution of each factor to the composite score. Sums to 1.0.
pub struct Weights {
    pub percent_change: f64,
    pub absolute_change: f64,
    pub recency: f64,
    pub brokerage: f64,
    pub rating: f64,
    pub rating_change: f64,
    pub action: f64,
}

pub const WEIGHTS: Weights = Weights {
    percent_change: 0.25,
    absolute_change: 0.15,
    recency: 0.15,
    brokerage: 0.10,
    rating: 0.20,
    rating_change: 0.10,
    action: 0.05,
};

pub fn is_top_brokerage(brokerage: &str) -> bool {
    TOP_BROKERAGES.contains(&brokerage)
}

fn brokerage_rating(brokerage: &str) -> f64 {
    if is_top_brokerage(brokerage) { 1.0 } else { 0.75 }
}

pub fn brokerage_score(brokerage: &str, metrics: &BatchMetrics) -> f64 {
    brokerage_rating(brokerage) * metrics.relative_frequency(brokerage)
}

/// Upgrades count, downgrades are floored at zero.
pub fn rating_change_score(rating_from: &str, rating_to: &str) -> f64 {
    (rating_ordinal(rating_to) - rating_ordinal(rating_from)).max(0.0)
}

pub fn action_score(action: &str) -> f64 {
    Action::parse(action).map(|a| a.score()).unwrap_or(0.0)
}

/// Composite score of one record relative to its batch.
pub fn score(stock: &NormalizedStock, metrics: &BatchMetrics) -> f64 {
    let percent = metrics
        .percent_change
        .normalize(percentage_change(stock.target_from, stock.target_to));
    let absolute = metrics
        .absolute_change
        .normalize(absolute_change(stock.target_from, stock.target_to));
    let recency = metrics.time.normalize(stock.time.timestamp() as f64);

    percent * WEIGHTS.percent_change
        + absolute * WEIGHTS.absolute_change
        + recency * WEIGHTS.recency
        + brokerage_score(&stock.brokerage, metrics) * WEIGHTS.brokerage
        + rating_ordinal(&stock.rating_to) * WEIGHTS.rating
        + rating_change_score(&stock.rating_from, &stock.rating_to) * WEIGHTS.rating_change
        + action_score(&stock.action) * WEIGHTS.action
}

/// Scores every record of the batch, preserving input order.
pub fn score_batch(stocks: &[NormalizedStock]) -> Result<Vec<ScoredStock>, AnalysisError> {
    let metrics = BatchMetrics::compute(stocks)?;

    Ok(stocks
        .iter()
        .map(|stock| ScoredStock::new(stock.clone(), score(stock, &metrics)))
        .collect())
}

/// Highest-scoring `top_n` records, best first. Ties keep input order.
pub fn analyze(stocks: &[NormalizedStock], top_n: usize) -> Result<Vec<ScoredStock>, AnalysisError> {
    let mut scored = score_batch(stocks)?;
    rank(&mut scored);
    scored.truncate(top_n);
    Ok(scored)
}

/// Stable sort by descending score.
pub fn rank(scored: &mut [ScoredStock]) {
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
}
