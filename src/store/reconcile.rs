//! Diff-based reconciliation of a fresh batch into the `stocks` table.
//!
//! The batch is bulk-loaded into a temporary staging table. Staged rows with
//! no identical persisted row trigger the insert and update passes; persisted
//! tickers missing from staging are deleted. Everything runs in one
//! transaction, and the staging table is dropped on every exit path.

use std::collections::HashMap;

use rusqlite::Connection;
use tracing::{debug, error, info};

use super::schema::{COLUMNS, Table, create_table, drop_table, insert_rows};
use super::{StoreResult, SyncReport};
use crate::models::ScoredStock;

/// Columns compared and overwritten by the update pass.
const TRACKED: &[&str] = &[
    "target_from",
    "target_to",
    "company",
    "action",
    "brokerage",
    "rating_from",
    "rating_to",
    "score",
    "time",
];

pub fn sync(conn: &mut Connection, batch: &[ScoredStock]) -> StoreResult<SyncReport> {
    let result = sync_in_transaction(conn, batch);

    if let Err(e) = drop_table(conn, Table::Staging) {
        error!(error = %e, "Failed to drop staging table");
    }

    result
}

fn sync_in_transaction(conn: &mut Connection, batch: &[ScoredStock]) -> StoreResult<SyncReport> {
    let rows = latest_per_ticker(batch);
    if rows.len() < batch.len() {
        debug!(
            batch = batch.len(),
            unique = rows.len(),
            "Collapsed repeated tickers to their latest event"
        );
    }

    let tx = conn.transaction()?;
    let mut report = SyncReport::default();

    create_table(&tx, Table::Staging)?;
    tx.execute(&format!("DELETE FROM {}", Table::Staging.name()), [])?;
    report.staged = insert_rows(&tx, Table::Staging, &rows)?;

    report.changed = count_changed(&tx)?;
    if report.changed > 0 {
        report.inserted = insert_new(&tx)?;
        report.updated = update_changed(&tx)?;
    }

    let obsolete = count_obsolete(&tx)?;
    if obsolete > 0 {
        report.deleted = delete_obsolete(&tx)?;
    }

    tx.commit()?;

    info!(
        staged = report.staged,
        changed = report.changed,
        inserted = report.inserted,
        updated = report.updated,
        deleted = report.deleted,
        "Reconciliation committed"
    );
    Ok(report)
}

/// Keeps one event per ticker: the latest by time, later position on ties.
/// Output follows the order in which tickers first appear.
pub fn latest_per_ticker(batch: &[ScoredStock]) -> Vec<&ScoredStock> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut latest: Vec<&ScoredStock> = Vec::with_capacity(batch.len());

    for stock in batch {
        match index.get(stock.ticker.as_str()) {
            Some(&i) => {
                if stock.time >= latest[i].time {
                    latest[i] = stock;
                }
            }
            None => {
                index.insert(stock.ticker.as_str(), latest.len());
                latest.push(stock);
            }
        }
    }

    latest
}

fn count(conn: &Connection, sql: &str) -> StoreResult<usize> {
    let n: i64 = conn.query_row(sql, [], |row| row.get(0))?;
    Ok(n as usize)
}

/// Staged rows minus persisted rows, over every column.
fn count_changed(conn: &Connection) -> StoreResult<usize> {
    count(
        conn,
        &format!(
            "SELECT COUNT(*) FROM (SELECT {COLUMNS} FROM {staging} EXCEPT SELECT {COLUMNS} FROM {stocks})",
            staging = Table::Staging.name(),
            stocks = Table::Stocks.name(),
        ),
    )
}

fn insert_new(conn: &Connection) -> StoreResult<usize> {
    let inserted = conn.execute(
        &format!(
            "INSERT INTO {stocks} ({COLUMNS})
             SELECT {COLUMNS} FROM {staging} AS s
             WHERE NOT EXISTS (SELECT 1 FROM {stocks} AS p WHERE p.ticker = s.ticker)",
            staging = Table::Staging.name(),
            stocks = Table::Stocks.name(),
        ),
        [],
    )?;
    debug!(inserted, "Inserted new tickers");
    Ok(inserted)
}

fn update_changed(conn: &Connection) -> StoreResult<usize> {
    let stocks = Table::Stocks.name();
    let assignments = TRACKED
        .iter()
        .map(|c| format!("{c} = s.{c}"))
        .collect::<Vec<_>>()
        .join(", ");
    let differs = TRACKED
        .iter()
        .map(|c| format!("{stocks}.{c} IS NOT s.{c}"))
        .collect::<Vec<_>>()
        .join(" OR ");

    let updated = conn.execute(
        &format!(
            "UPDATE {stocks} SET {assignments}
             FROM {staging} AS s
             WHERE {stocks}.ticker = s.ticker AND ({differs})",
            staging = Table::Staging.name(),
        ),
        [],
    )?;
    debug!(updated, "Updated changed tickers");
    Ok(updated)
}

/// Persisted tickers with no staged counterpart.
fn count_obsolete(conn: &Connection) -> StoreResult<usize> {
    count(
        conn,
        &format!(
            "SELECT COUNT(*) FROM {stocks} AS p
             WHERE NOT EXISTS (SELECT 1 FROM {staging} AS s WHERE s.ticker = p.ticker)",
            staging = Table::Staging.name(),
            stocks = Table::Stocks.name(),
        ),
    )
}

fn delete_obsolete(conn: &Connection) -> StoreResult<usize> {
    let deleted = conn.execute(
        &format!(
            "DELETE FROM {stocks}
             WHERE NOT EXISTS (SELECT 1 FROM {staging} AS s WHERE s.ticker = {stocks}.ticker)",
            staging = Table::Staging.name(),
            stocks = Table::Stocks.name(),
        ),
        [],
    )?;
    debug!(deleted, "Deleted obsolete tickers");
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::schema::row_to_stock;
    use chrono::{Duration, TimeZone, Utc};

    fn scored(ticker: &str, target_to: f64, score: f64) -> ScoredStock {
        ScoredStock {
            ticker: ticker.to_string(),
            target_from: 100.0,
            target_to,
            company: format!("{ticker} Inc."),
            action: "target raised by".to_string(),
            brokerage: "Barclays".to_string(),
            rating_from: "hold".to_string(),
            rating_to: "buy".to_string(),
            time: Utc.with_ymd_and_hms(2025, 2, 3, 14, 0, 0).unwrap(),
            score,
        }
    }

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_table(&conn, Table::Stocks).unwrap();
        conn
    }

    fn persisted(conn: &Connection) -> Vec<ScoredStock> {
        let mut stmt = conn
            .prepare(&format!("SELECT {COLUMNS} FROM stocks ORDER BY ticker"))
            .unwrap();
        stmt.query_map([], row_to_stock)
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    fn staging_exists(conn: &Connection) -> bool {
        let n: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_temp_master WHERE name = 'stocks_staging'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        n > 0
    }

    #[test]
    fn test_first_sync_inserts_everything() {
        let mut conn = conn();
        let batch = vec![scored("AAPL", 120.0, 0.8), scored("MSFT", 90.0, 0.3)];

        let report = sync(&mut conn, &batch).unwrap();

        assert_eq!(report.staged, 2);
        assert_eq!(report.changed, 2);
        assert_eq!(report.inserted, 2);
        assert_eq!(report.updated, 0);
        assert_eq!(report.deleted, 0);
        assert_eq!(persisted(&conn), batch);
        assert!(!staging_exists(&conn));
    }

    #[test]
    fn test_second_identical_sync_is_noop() {
        let mut conn = conn();
        let batch = vec![scored("AAPL", 120.0, 0.812345678), scored("MSFT", 90.0, 0.3)];

        sync(&mut conn, &batch).unwrap();
        let before = persisted(&conn);
        let report = sync(&mut conn, &batch).unwrap();

        assert_eq!(report.changed, 0);
        assert!(report.is_noop());
        assert_eq!(persisted(&conn), before);
    }

    #[test]
    fn test_changed_columns_are_updated() {
        let mut conn = conn();
        sync(&mut conn, &[scored("AAPL", 120.0, 0.8), scored("MSFT", 90.0, 0.3)]).unwrap();

        let mut aapl = scored("AAPL", 120.0, 0.8);
        aapl.rating_to = "outperform".to_string();
        let mut msft = scored("MSFT", 90.0, 0.3);
        msft.time += Duration::hours(1);

        let report = sync(&mut conn, &[aapl.clone(), msft.clone()]).unwrap();

        assert_eq!(report.inserted, 0);
        assert_eq!(report.updated, 2);
        assert_eq!(persisted(&conn), vec![aapl, msft]);
    }

    #[test]
    fn test_each_tracked_column_change_is_updated() {
        let edits: [(&str, fn(&mut ScoredStock)); 9] = [
            ("target_from", |s| s.target_from = 95.5),
            ("target_to", |s| s.target_to = 121.25),
            ("company", |s| s.company = "Apple Computer".to_string()),
            ("action", |s| s.action = "downgraded by".to_string()),
            ("brokerage", |s| s.brokerage = "Citigroup".to_string()),
            ("rating_from", |s| s.rating_from = "sell".to_string()),
            ("rating_to", |s| s.rating_to = "outperform".to_string()),
            ("score", |s| s.score = 0.123456),
            ("time", |s| s.time += Duration::seconds(1)),
        ];
        assert_eq!(edits.len(), TRACKED.len());

        for (column, edit) in edits {
            assert!(TRACKED.contains(&column), "{column} is not tracked");

            let mut conn = conn();
            let msft = scored("MSFT", 90.0, 0.3);
            sync(&mut conn, &[scored("AAPL", 120.0, 0.8), msft.clone()]).unwrap();

            let mut aapl = scored("AAPL", 120.0, 0.8);
            edit(&mut aapl);
            let report = sync(&mut conn, &[aapl.clone(), msft.clone()]).unwrap();

            assert_eq!(report.changed, 1, "{column}");
            assert_eq!(report.updated, 1, "{column}");
            assert_eq!(report.inserted, 0, "{column}");
            assert_eq!(persisted(&conn), vec![aapl, msft], "{column}");
        }
    }

    #[test]
    fn test_missing_ticker_is_deleted() {
        let mut conn = conn();
        sync(&mut conn, &[scored("AAPL", 120.0, 0.8), scored("MSFT", 90.0, 0.3)]).unwrap();

        let report = sync(&mut conn, &[scored("AAPL", 120.0, 0.8), scored("GOOG", 150.0, 0.5)]).unwrap();

        assert_eq!(report.inserted, 1);
        assert_eq!(report.updated, 0);
        assert_eq!(report.deleted, 1);
        let tickers: Vec<_> = persisted(&conn).into_iter().map(|s| s.ticker).collect();
        assert_eq!(tickers, ["AAPL", "GOOG"]);
    }

    #[test]
    fn test_delete_only_batch() {
        let mut conn = conn();
        sync(&mut conn, &[scored("AAPL", 120.0, 0.8), scored("MSFT", 90.0, 0.3)]).unwrap();

        let report = sync(&mut conn, &[scored("AAPL", 120.0, 0.8)]).unwrap();

        assert_eq!(report.changed, 0);
        assert_eq!(report.deleted, 1);
        assert_eq!(persisted(&conn).len(), 1);
    }

    #[test]
    fn test_failed_sync_rolls_back_and_drops_staging() {
        let mut conn = conn();
        sync(&mut conn, &[scored("AAPL", 120.0, 0.8)]).unwrap();

        // A trigger that aborts any insert makes the insert pass fail midway.
        conn.execute_batch(
            "CREATE TRIGGER reject_insert BEFORE INSERT ON stocks
             BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
        )
        .unwrap();

        let result = sync(&mut conn, &[scored("MSFT", 90.0, 0.3)]);

        assert!(result.is_err());
        let tickers: Vec<_> = persisted(&conn).into_iter().map(|s| s.ticker).collect();
        assert_eq!(tickers, ["AAPL"]);
        assert!(!staging_exists(&conn));
    }

    #[test]
    fn test_latest_per_ticker() {
        let old = scored("AAPL", 110.0, 0.1);
        let mut new = scored("AAPL", 130.0, 0.9);
        new.time += Duration::days(1);
        let msft = scored("MSFT", 90.0, 0.3);

        let binding = [new.clone(), msft.clone(), old];
        let rows = latest_per_ticker(&binding);
        assert_eq!(rows, vec![&new, &msft]);
    }

    #[test]
    fn test_repeated_tickers_sync_once() {
        let mut conn = conn();
        let mut later = scored("AAPL", 130.0, 0.9);
        later.time += Duration::days(1);

        let report = sync(&mut conn, &[scored("AAPL", 110.0, 0.1), later.clone()]).unwrap();

        assert_eq!(report.staged, 1);
        assert_eq!(persisted(&conn), vec![later]);
    }
}
