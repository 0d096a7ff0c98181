use std::collections::HashMap;

use crate::analyzers::AnalysisError;
use crate::analyzers::utility::{absolute_change, brokerage_key, normalize_value, percentage_change};
use crate::models::NormalizedStock;

/// Observed `[min, max]` of one quantity across a batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    fn of(value: f64) -> Self {
        Range {
            min: value,
            max: value,
        }
    }

    fn include(&mut self, value: f64) {
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }

    pub fn normalize(&self, value: f64) -> f64 {
        normalize_value(value, self.min, self.max)
    }
}

/// Batch-wide statistics every record is scored against.
#[derive(Debug, Clone)]
pub struct BatchMetrics {
    pub batch_size: usize,
    pub brokerage_counts: HashMap<String, usize>,
    pub percent_change: Range,
    pub absolute_change: Range,
    /// Event time as epoch seconds.
    pub time: Range,
}

impl BatchMetrics {
    /// Scans the batch once. An empty batch has no ranges and is rejected.
    pub fn compute(stocks: &[NormalizedStock]) -> Result<Self, AnalysisError> {
        let first = stocks.first().ok_or(AnalysisError::EmptyBatch)?;

        let mut percent = Range::of(percentage_change(first.target_from, first.target_to));
        let mut absolute = Range::of(absolute_change(first.target_from, first.target_to));
        let mut time = Range::of(first.time.timestamp() as f64);
        let mut brokerage_counts: HashMap<String, usize> = HashMap::new();

        for stock in stocks {
            percent.include(percentage_change(stock.target_from, stock.target_to));
            absolute.include(absolute_change(stock.target_from, stock.target_to));
            time.include(stock.time.timestamp() as f64);

            *brokerage_counts.entry(brokerage_key(&stock.brokerage)).or_default() += 1;
        }

        Ok(BatchMetrics {
            batch_size: stocks.len(),
            brokerage_counts,
            percent_change: percent,
            absolute_change: absolute,
            time,
        })
    }

    /// Share of the batch issued by this brokerage.
    pub fn relative_frequency(&self, brokerage: &str) -> f64 {
        let count = self
            .brokerage_counts
            .get(&brokerage_key(brokerage))
            .copied()
            .unwrap_or(0);
        count as f64 / self.batch_size as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::tests::stock;

    #[test]
    fn test_empty_batch_is_rejected() {
        assert!(matches!(
            BatchMetrics::compute(&[]),
            Err(AnalysisError::EmptyBatch)
        ));
    }

    #[test]
    fn test_single_record_ranges_collapse() {
        let metrics = BatchMetrics::compute(&[stock("AAPL", 100.0, 120.0)]).unwrap();

        assert_eq!(metrics.percent_change.min, metrics.percent_change.max);
        assert_eq!(metrics.percent_change.normalize(20.0), 1.0);
        assert_eq!(metrics.absolute_change.normalize(20.0), 1.0);
        assert_eq!(metrics.time.normalize(metrics.time.min), 1.0);
    }

    #[test]
    fn test_ranges_cover_batch() {
        let metrics = BatchMetrics::compute(&[
            stock("AAPL", 100.0, 120.0),
            stock("MSFT", 200.0, 180.0),
            stock("GOOG", 150.0, 150.0),
        ])
        .unwrap();

        assert_eq!(metrics.percent_change, Range { min: -10.0, max: 20.0 });
        assert_eq!(metrics.absolute_change, Range { min: -20.0, max: 20.0 });
        assert_eq!(metrics.batch_size, 3);
    }

    #[test]
    fn test_brokerage_frequency_counts_every_record() {
        let mut a = stock("AAPL", 1.0, 2.0);
        a.brokerage = "Barclays".into();
        let mut b = stock("MSFT", 1.0, 2.0);
        b.brokerage = " barclays ".into();
        let mut c = stock("GOOG", 1.0, 2.0);
        c.brokerage = "Citigroup".into();
        let mut d = stock("AMZN", 1.0, 2.0);
        d.brokerage = "Wedbush".into();

        let metrics = BatchMetrics::compute(&[a, b, c, d]).unwrap();

        assert_eq!(metrics.relative_frequency("BARCLAYS"), 0.5);
        assert_eq!(metrics.relative_frequency("Citigroup"), 0.25);
        assert_eq!(metrics.relative_frequency("Unknown"), 0.0);
    }
}
