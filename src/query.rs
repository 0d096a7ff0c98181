//! Validated read parameters for the persisted table.
//!
//! Sort columns and directions are closed enums, so nothing a caller types
//! ever reaches generated SQL verbatim.

use std::str::FromStr;

use thiserror::Error;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;
/// Highest page whose offset still fits in an `i64` at [`MAX_LIMIT`].
pub const MAX_PAGE: i64 = i64::MAX / MAX_LIMIT;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("invalid field '{0}'")]
    InvalidField(String),

    #[error("invalid order '{0}'")]
    InvalidOrder(String),
}

/// Columns a listing may be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    Ticker,
    TargetFrom,
    TargetTo,
    Company,
    Action,
    Brokerage,
    RatingFrom,
    RatingTo,
    #[default]
    Time,
    Score,
}

impl SortField {
    pub fn column(&self) -> &'static str {
        match self {
            SortField::Ticker => "ticker",
            SortField::TargetFrom => "target_from",
            SortField::TargetTo => "target_to",
            SortField::Company => "company",
            SortField::Action => "action",
            SortField::Brokerage => "brokerage",
            SortField::RatingFrom => "rating_from",
            SortField::RatingTo => "rating_to",
            SortField::Time => "time",
            SortField::Score => "score",
        }
    }
}

impl FromStr for SortField {
    type Err = QueryError;

    /// Case-insensitive. An empty value selects the default column.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let field = s.trim().to_lowercase();
        match field.as_str() {
            "" => Ok(SortField::default()),
            "ticker" => Ok(SortField::Ticker),
            "target_from" => Ok(SortField::TargetFrom),
            "target_to" => Ok(SortField::TargetTo),
            "company" => Ok(SortField::Company),
            "action" => Ok(SortField::Action),
            "brokerage" => Ok(SortField::Brokerage),
            "rating_from" => Ok(SortField::RatingFrom),
            "rating_to" => Ok(SortField::RatingTo),
            "time" => Ok(SortField::Time),
            "score" => Ok(SortField::Score),
            _ => Err(QueryError::InvalidField(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "" => Ok(SortOrder::default()),
            "ASC" => Ok(SortOrder::Asc),
            "DESC" => Ok(SortOrder::Desc),
            _ => Err(QueryError::InvalidOrder(s.to_string())),
        }
    }
}

/// A fully validated listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockQuery {
    pub field: SortField,
    pub order: SortOrder,
    /// Trimmed search term; `None` when blank.
    pub search: Option<String>,
    pub page: i64,
    pub limit: i64,
}

impl Default for StockQuery {
    fn default() -> Self {
        StockQuery {
            field: SortField::default(),
            order: SortOrder::default(),
            search: None,
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl StockQuery {
    /// Validates raw parameters. Invalid field or order is an error; out of
    /// range paging values are normalized.
    pub fn new(field: &str, order: &str, search: &str, page: i64, limit: i64) -> Result<Self, QueryError> {
        let (page, limit) = normalize_pagination(page, limit);
        let search = search.trim();

        Ok(StockQuery {
            field: field.parse()?,
            order: order.parse()?,
            search: (!search.is_empty()).then(|| search.to_string()),
            page,
            limit,
        })
    }

    /// Rows skipped before this page. Saturates for hand-built queries
    /// outside the normalized range.
    pub fn offset(&self) -> i64 {
        self.page.saturating_sub(1).max(0).saturating_mul(self.limit)
    }
}

/// Non-positive values fall back to defaults; `page` and `limit` are capped.
pub fn normalize_pagination(page: i64, limit: i64) -> (i64, i64) {
    let page = if page <= 0 { DEFAULT_PAGE } else { page.min(MAX_PAGE) };
    let limit = if limit <= 0 { DEFAULT_LIMIT } else { limit.min(MAX_LIMIT) };
    (page, limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults_and_cap() {
        assert_eq!(normalize_pagination(1, 0), (1, 10));
        assert_eq!(normalize_pagination(1, -5), (1, 10));
        assert_eq!(normalize_pagination(1, 500), (1, 100));
        assert_eq!(normalize_pagination(0, 20), (1, 20));
        assert_eq!(normalize_pagination(-3, 20), (1, 20));
        assert_eq!(normalize_pagination(4, 100), (4, 100));
        assert_eq!(normalize_pagination(i64::MAX, 100), (MAX_PAGE, 100));
    }

    #[test]
    fn test_offset_of_last_page_fits() {
        let q = StockQuery::new("", "", "", i64::MAX, 100).unwrap();
        assert_eq!(q.offset(), (MAX_PAGE - 1) * 100);

        let hand_built = StockQuery {
            page: i64::MAX,
            limit: i64::MAX,
            ..StockQuery::default()
        };
        assert_eq!(hand_built.offset(), i64::MAX);
    }

    #[test]
    fn test_field_is_case_insensitive() {
        assert_eq!("Target_To".parse::<SortField>(), Ok(SortField::TargetTo));
        assert_eq!(" SCORE ".parse::<SortField>(), Ok(SortField::Score));
        assert_eq!("".parse::<SortField>(), Ok(SortField::Time));
    }

    #[test]
    fn test_invalid_field_is_rejected() {
        assert_eq!(
            "ticker; DROP TABLE stocks".parse::<SortField>(),
            Err(QueryError::InvalidField("ticker; DROP TABLE stocks".into()))
        );
    }

    #[test]
    fn test_order_parsing() {
        assert_eq!("asc".parse::<SortOrder>(), Ok(SortOrder::Asc));
        assert_eq!("DESC".parse::<SortOrder>(), Ok(SortOrder::Desc));
        assert_eq!("".parse::<SortOrder>(), Ok(SortOrder::Desc));
        assert!(matches!(
            "sideways".parse::<SortOrder>(),
            Err(QueryError::InvalidOrder(_))
        ));
    }

    #[test]
    fn test_stock_query_new() {
        let q = StockQuery::new("company", "asc", "  apple ", 3, 25).unwrap();
        assert_eq!(q.field, SortField::Company);
        assert_eq!(q.order, SortOrder::Asc);
        assert_eq!(q.search.as_deref(), Some("apple"));
        assert_eq!(q.offset(), 50);

        let q = StockQuery::new("", "", "   ", 0, 0).unwrap();
        assert_eq!(q, StockQuery::default());
    }
}
