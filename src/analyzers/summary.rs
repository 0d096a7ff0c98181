use serde::Serialize;

use crate::models::NormalizedStock;

/// Direction of price-target moves across a set of records.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct StockSummary {
    pub total_stocks: usize,
    pub positive_change: usize,
    pub negative_change: usize,
    pub no_change: usize,
}

pub fn summarize(stocks: &[NormalizedStock]) -> StockSummary {
    let mut s = StockSummary {
        total_stocks: stocks.len(),
        ..Default::default()
    };

    for stock in stocks {
        let delta = stock.target_delta();
        if delta > 0.0 {
            s.positive_change += 1;
        } else if delta < 0.0 {
            s.negative_change += 1;
        } else {
            s.no_change += 1;
        }
    }

    s
}
