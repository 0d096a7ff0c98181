//! Turns raw feed items into [`NormalizedStock`] records.
//!
//! Identity fields, both price targets and the event time are mandatory: a
//! record missing any of them is rejected. Ratings and the action fall back
//! to neutral defaults and only emit a warning.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{NormalizedStock, RawStock};
use crate::vocabulary::{DEFAULT_ACTION, DEFAULT_RATING, canonical_rating};

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("{field} is required")]
    Empty { field: &'static str },

    #[error("{field} '{value}' is not a number")]
    InvalidTarget { field: &'static str, value: String },

    #[error("{field} cannot be negative: {value}")]
    NegativeTarget { field: &'static str, value: f64 },

    #[error("invalid timestamp '{value}': {source}")]
    InvalidTime {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// A rejected feed item, identified by its raw ticker.
#[derive(Debug, Error)]
#[error("failed to normalize '{ticker}': {source}")]
pub struct RecordError {
    pub ticker: String,
    #[source]
    pub source: NormalizeError,
}

/// Result of normalizing a whole batch.
#[derive(Debug, Default)]
pub struct NormalizedBatch {
    pub stocks: Vec<NormalizedStock>,
    pub rejected: Vec<RecordError>,
}

/// Normalizes a single feed item.
pub fn normalize(raw: &RawStock) -> Result<NormalizedStock, RecordError> {
    normalize_fields(raw).map_err(|source| RecordError {
        ticker: raw.ticker.trim().to_string(),
        source,
    })
}

/// Normalizes every item, keeping valid records in input order.
///
/// Rejected records are logged and collected; they never stop the batch.
pub fn normalize_batch(raws: &[RawStock]) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();

    for raw in raws {
        match normalize(raw) {
            Ok(stock) => batch.stocks.push(stock),
            Err(e) => {
                warn!(ticker = %e.ticker, error = %e.source, "Record rejected");
                batch.rejected.push(e);
            }
        }
    }

    debug!(
        accepted = batch.stocks.len(),
        rejected = batch.rejected.len(),
        "Batch normalized"
    );
    batch
}

fn normalize_fields(raw: &RawStock) -> Result<NormalizedStock, NormalizeError> {
    let ticker = required("ticker", &raw.ticker)?.to_uppercase();
    let company = required("company", &raw.company)?.to_string();
    let brokerage = required("brokerage", &raw.brokerage)?.to_string();

    let target_from = parse_target("target_from", &raw.target_from)?;
    let target_to = parse_target("target_to", &raw.target_to)?;
    let time = parse_time(&raw.time)?;

    let rating_from = canonical_rating(&defaulted(&ticker, "rating_from", &raw.rating_from, DEFAULT_RATING));
    let rating_to = canonical_rating(&defaulted(&ticker, "rating_to", &raw.rating_to, DEFAULT_RATING));
    let action = defaulted(&ticker, "action", &raw.action, DEFAULT_ACTION);

    Ok(NormalizedStock {
        ticker,
        target_from,
        target_to,
        company,
        action,
        brokerage,
        rating_from,
        rating_to,
        time,
    })
}

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, NormalizeError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(NormalizeError::Empty { field });
    }
    Ok(value)
}

fn defaulted(ticker: &str, field: &'static str, value: &str, default: &str) -> String {
    let value = value.trim().to_lowercase();
    if value.is_empty() {
        warn!(ticker, field, default, "Empty field defaulted");
        return default.to_string();
    }
    value
}

/// Parses a price such as `"$1,234.56"`.
pub fn parse_target(field: &'static str, value: &str) -> Result<f64, NormalizeError> {
    let value = required(field, value)?;
    let cleaned: String = value.chars().filter(|c| *c != '$' && *c != ',').collect();
    let cleaned = cleaned.trim();

    let parsed: f64 = cleaned.parse().map_err(|_| NormalizeError::InvalidTarget {
        field,
        value: value.to_string(),
    })?;

    if !parsed.is_finite() {
        return Err(NormalizeError::InvalidTarget {
            field,
            value: value.to_string(),
        });
    }
    if parsed < 0.0 {
        return Err(NormalizeError::NegativeTarget {
            field,
            value: parsed,
        });
    }

    Ok(parsed)
}

/// Parses an RFC 3339 timestamp (fractional seconds optional) into UTC.
pub fn parse_time(value: &str) -> Result<DateTime<Utc>, NormalizeError> {
    let value = required("time", value)?;
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|source| NormalizeError::InvalidTime {
            value: value.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn raw() -> RawStock {
        RawStock {
            ticker: " aapl ".into(),
            target_from: "$150.00".into(),
            target_to: "$170.50".into(),
            company: " Apple Inc. ".into(),
            action: "Upgraded By".into(),
            brokerage: "Morgan Stanley".into(),
            rating_from: "Neutral".into(),
            rating_to: "Strong-Buy".into(),
            time: "2023-05-10T15:04:05Z".into(),
        }
    }

    #[test]
    fn test_normalize_valid_record() {
        let stock = normalize(&raw()).unwrap();

        assert_eq!(stock.ticker, "AAPL");
        assert_eq!(stock.target_from, 150.0);
        assert_eq!(stock.target_to, 170.5);
        assert_eq!(stock.company, "Apple Inc.");
        assert_eq!(stock.action, "upgraded by");
        assert_eq!(stock.brokerage, "Morgan Stanley");
        assert_eq!(stock.rating_from, "hold");
        assert_eq!(stock.rating_to, "buy");
        assert_eq!(stock.time, Utc.with_ymd_and_hms(2023, 5, 10, 15, 4, 5).unwrap());
    }

    #[test]
    fn test_parse_target_strips_symbols() {
        assert_eq!(parse_target("target_to", "$1,234.56").unwrap(), 1234.56);
        assert_eq!(parse_target("target_to", "  42 ").unwrap(), 42.0);
        assert_eq!(parse_target("target_to", "$0").unwrap(), 0.0);
    }

    #[test]
    fn test_parse_target_rejects_bad_input() {
        assert!(matches!(
            parse_target("target_from", ""),
            Err(NormalizeError::Empty { field: "target_from" })
        ));
        assert!(matches!(
            parse_target("target_from", "$abc"),
            Err(NormalizeError::InvalidTarget { .. })
        ));
        assert!(matches!(
            parse_target("target_from", "$-5.00"),
            Err(NormalizeError::NegativeTarget { .. })
        ));
        assert!(matches!(
            parse_target("target_from", "inf"),
            Err(NormalizeError::InvalidTarget { .. })
        ));
    }

    #[test]
    fn test_parse_time_with_fraction_and_offset() {
        let t = parse_time("2025-01-15T09:30:00.123456789-05:00").unwrap();
        assert_eq!(t.timestamp(), Utc.with_ymd_and_hms(2025, 1, 15, 14, 30, 0).unwrap().timestamp());
        assert_eq!(t.timestamp_subsec_nanos(), 123_456_789);

        assert!(matches!(parse_time("  "), Err(NormalizeError::Empty { .. })));
        assert!(matches!(
            parse_time("2025-01-15 yesterday"),
            Err(NormalizeError::InvalidTime { .. })
        ));
    }

    #[test]
    fn test_empty_optional_fields_are_defaulted() {
        let mut r = raw();
        r.action = "  ".into();
        r.rating_from = String::new();
        r.rating_to = String::new();

        let stock = normalize(&r).unwrap();
        assert_eq!(stock.action, DEFAULT_ACTION);
        assert_eq!(stock.rating_from, "hold");
        assert_eq!(stock.rating_to, "hold");
    }

    #[test]
    fn test_unknown_rating_is_kept() {
        let mut r = raw();
        r.rating_to = " Cautious ".into();
        assert_eq!(normalize(&r).unwrap().rating_to, "cautious");
    }

    #[test]
    fn test_mandatory_fields_reject_record() {
        let cases: [fn(&mut RawStock); 5] = [
            |r| r.ticker = " ".into(),
            |r| r.company = String::new(),
            |r| r.brokerage = "\t".into(),
            |r| r.target_to = "n/a".into(),
            |r| r.time = "not a time".into(),
        ];
        for mutate in cases {
            let mut r = raw();
            mutate(&mut r);
            assert!(normalize(&r).is_err());
        }
    }

    #[test]
    fn test_error_carries_ticker() {
        let mut r = raw();
        r.target_from = "-1".into();
        let err = normalize(&r).unwrap_err();
        assert_eq!(err.ticker, "aapl");
        assert!(err.to_string().contains("cannot be negative"));
    }

    #[test]
    fn test_normalize_batch_keeps_going() {
        let mut bad = raw();
        bad.ticker = String::new();
        let mut other = raw();
        other.ticker = "msft".into();

        let batch = normalize_batch(&[raw(), bad, other]);
        assert_eq!(batch.stocks.len(), 2);
        assert_eq!(batch.rejected.len(), 1);
        assert_eq!(batch.stocks[0].ticker, "AAPL");
        assert_eq!(batch.stocks[1].ticker, "MSFT");
    }
}
