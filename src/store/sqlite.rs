use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{Connection, ToSql};
use tracing::{debug, info};

use super::schema::{COLUMNS, Table, create_table, row_to_stock};
use super::{StockPage, StockRepository, StoreResult, SyncReport, reconcile};
use crate::models::ScoredStock;
use crate::query::StockQuery;

/// SQLite-backed [`StockRepository`] owning a single connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) the database file and ensures the schema exists.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;

        // WAL lets readers in other processes proceed during a sync.
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        info!(path = %path.display(), "Opened stock database");
        Self::init(conn)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        create_table(&conn, Table::Stocks)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl StockRepository for SqliteStore {
    fn sync(&self, batch: &[ScoredStock]) -> StoreResult<SyncReport> {
        let mut conn = self.conn.lock();
        reconcile::sync(&mut conn, batch)
    }

    fn stocks(&self) -> StoreResult<Vec<ScoredStock>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM {} ORDER BY ticker",
            Table::Stocks.name()
        ))?;

        let stocks = stmt
            .query_map([], row_to_stock)?
            .collect::<Result<Vec<_>, _>>()?;

        debug!(count = stocks.len(), "Loaded persisted stocks");
        Ok(stocks)
    }

    fn count(&self) -> StoreResult<usize> {
        let conn = self.conn.lock();
        let n: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", Table::Stocks.name()),
            [],
            |row| row.get(0),
        )?;
        Ok(n as usize)
    }

    fn query(&self, query: &StockQuery) -> StoreResult<StockPage> {
        let conn = self.conn.lock();

        let pattern = query.search.as_deref().map(like_pattern);
        let filter = if pattern.is_some() {
            "WHERE ticker LIKE ?1 ESCAPE '\\' OR company LIKE ?1 ESCAPE '\\' OR brokerage LIKE ?1 ESCAPE '\\'"
        } else {
            ""
        };

        let length: i64 = {
            let sql = format!("SELECT COUNT(*) FROM {} {filter}", Table::Stocks.name());
            match &pattern {
                Some(p) => conn.query_row(&sql, [p], |row| row.get(0))?,
                None => conn.query_row(&sql, [], |row| row.get(0))?,
            }
        };

        // Ticker breaks ties so pages never overlap.
        let order_by = format!(
            "ORDER BY {} {}, ticker ASC",
            query.field.column(),
            query.order.keyword()
        );
        let limit = query.limit;
        let offset = query.offset();

        let mut params: Vec<&dyn ToSql> = Vec::with_capacity(3);
        if let Some(p) = &pattern {
            params.push(p);
        }
        let first_paging = params.len() + 1;
        params.push(&limit);
        params.push(&offset);

        let sql = format!(
            "SELECT {COLUMNS} FROM {} {filter} {order_by} LIMIT ?{} OFFSET ?{}",
            Table::Stocks.name(),
            first_paging,
            first_paging + 1
        );

        let mut stmt = conn.prepare(&sql)?;
        let stocks = stmt
            .query_map(params.as_slice(), row_to_stock)?
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            returned = stocks.len(),
            length,
            page = query.page,
            limit = query.limit,
            "Stock query served"
        );

        Ok(StockPage {
            stocks,
            length: length as usize,
        })
    }
}

/// Substring pattern for `LIKE ... ESCAPE '\'` with wildcards in the term escaped.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{SortField, SortOrder};
    use chrono::{Duration, TimeZone, Utc};

    fn scored(ticker: &str, company: &str, brokerage: &str, score: f64, hours: i64) -> ScoredStock {
        ScoredStock {
            ticker: ticker.to_string(),
            target_from: 10.0,
            target_to: 12.0,
            company: company.to_string(),
            action: "upgraded by".to_string(),
            brokerage: brokerage.to_string(),
            rating_from: "hold".to_string(),
            rating_to: "buy".to_string(),
            time: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() + Duration::hours(hours),
            score,
        }
    }

    fn seeded() -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .sync(&[
                scored("AAPL", "Apple Inc.", "Barclays", 0.9, 1),
                scored("MSFT", "Microsoft Corp.", "Citigroup", 0.4, 3),
                scored("GOOG", "Alphabet Inc.", "Barclays", 0.6, 2),
                scored("AMZN", "Amazon.com Inc.", "Wedbush", 0.6, 0),
            ])
            .unwrap();
        store
    }

    fn tickers(page: &StockPage) -> Vec<&str> {
        page.stocks.iter().map(|s| s.ticker.as_str()).collect()
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("apple"), "%apple%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn test_default_query_is_newest_first() {
        let store = seeded();
        let page = store.query(&StockQuery::default()).unwrap();

        assert_eq!(page.length, 4);
        assert_eq!(tickers(&page), ["MSFT", "GOOG", "AAPL", "AMZN"]);
    }

    #[test]
    fn test_sort_with_tie_break() {
        let store = seeded();
        let query = StockQuery {
            field: SortField::Score,
            order: SortOrder::Desc,
            ..Default::default()
        };
        let page = store.query(&query).unwrap();

        assert_eq!(tickers(&page), ["AAPL", "AMZN", "GOOG", "MSFT"]);
    }

    #[test]
    fn test_search_is_case_insensitive_across_columns() {
        let store = seeded();

        let page = store.query(&StockQuery::new("ticker", "asc", "INC", 1, 10).unwrap()).unwrap();
        assert_eq!(tickers(&page), ["AAPL", "AMZN", "GOOG"]);
        assert_eq!(page.length, 3);

        let page = store.query(&StockQuery::new("", "", "barclays", 1, 10).unwrap()).unwrap();
        assert_eq!(tickers(&page), ["GOOG", "AAPL"]);
    }

    #[test]
    fn test_search_wildcards_are_literal() {
        let store = seeded();
        let page = store.query(&StockQuery::new("", "", "%", 1, 10).unwrap()).unwrap();
        assert_eq!(page.length, 0);
        assert!(page.stocks.is_empty());
    }

    #[test]
    fn test_pagination() {
        let store = seeded();

        let first = store.query(&StockQuery::new("ticker", "asc", "", 1, 3).unwrap()).unwrap();
        let second = store.query(&StockQuery::new("ticker", "asc", "", 2, 3).unwrap()).unwrap();

        assert_eq!(tickers(&first), ["AAPL", "AMZN", "GOOG"]);
        assert_eq!(tickers(&second), ["MSFT"]);
        assert_eq!(second.length, 4);
    }

    #[test]
    fn test_last_possible_page_is_empty() {
        let store = seeded();
        let page = store
            .query(&StockQuery::new("", "", "", i64::MAX, 100).unwrap())
            .unwrap();

        assert!(page.stocks.is_empty());
        assert_eq!(page.length, 4);
    }

    #[test]
    fn test_stocks_and_count() {
        let store = seeded();
        assert_eq!(store.count().unwrap(), 4);

        let all = store.stocks().unwrap();
        let tickers: Vec<_> = all.iter().map(|s| s.ticker.as_str()).collect();
        assert_eq!(tickers, ["AAPL", "AMZN", "GOOG", "MSFT"]);
    }

    #[test]
    fn test_open_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stocks.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.sync(&[scored("AAPL", "Apple Inc.", "Barclays", 0.9, 1)]).unwrap();
        }

        let reopened = SqliteStore::open(&path).unwrap();
        assert_eq!(reopened.count().unwrap(), 1);
    }
}
