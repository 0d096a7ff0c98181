use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, Row, params};

use crate::models::ScoredStock;

/// Tables the store may touch. Statements only ever interpolate these names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Stocks,
    Staging,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Table::Stocks => "stocks",
            Table::Staging => "stocks_staging",
        }
    }

    fn create_keyword(&self) -> &'static str {
        match self {
            Table::Stocks => "CREATE TABLE",
            Table::Staging => "CREATE TEMP TABLE",
        }
    }
}

/// Column list shared by every statement, in table order.
pub const COLUMNS: &str =
    "ticker, target_from, target_to, company, action, brokerage, rating_from, rating_to, score, time";

pub fn create_table(conn: &Connection, table: Table) -> rusqlite::Result<()> {
    conn.execute_batch(&format!(
        "{} IF NOT EXISTS {} (
            ticker      TEXT PRIMARY KEY NOT NULL,
            target_from REAL NOT NULL,
            target_to   REAL NOT NULL,
            company     TEXT NOT NULL,
            action      TEXT NOT NULL,
            brokerage   TEXT NOT NULL,
            rating_from TEXT NOT NULL,
            rating_to   TEXT NOT NULL,
            score       REAL NOT NULL,
            time        TEXT NOT NULL
        )",
        table.create_keyword(),
        table.name()
    ))
}

pub fn drop_table(conn: &Connection, table: Table) -> rusqlite::Result<()> {
    conn.execute_batch(&format!("DROP TABLE IF EXISTS {}", table.name()))
}

/// Bulk-loads rows with a single prepared statement.
pub fn insert_rows(conn: &Connection, table: Table, rows: &[&ScoredStock]) -> rusqlite::Result<usize> {
    let mut stmt = conn.prepare(&format!(
        "INSERT INTO {} ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        table.name()
    ))?;

    for stock in rows {
        stmt.execute(params![
            stock.ticker,
            round_to(stock.target_from, 2),
            round_to(stock.target_to, 2),
            stock.company,
            stock.action,
            stock.brokerage,
            stock.rating_from,
            stock.rating_to,
            round_to(stock.score, 6),
            encode_time(&stock.time),
        ])?;
    }

    Ok(rows.len())
}

/// Fixed-width RFC 3339 in UTC, so text order is chronological order.
pub fn encode_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Values too large to scale are already whole and returned unchanged.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / factor
}

/// Maps a row selected with [`COLUMNS`].
pub fn row_to_stock(row: &Row<'_>) -> rusqlite::Result<ScoredStock> {
    let time: String = row.get(9)?;
    let time = DateTime::parse_from_rfc3339(&time)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(9, Type::Text, Box::new(e)))?
        .with_timezone(&Utc);

    Ok(ScoredStock {
        ticker: row.get(0)?,
        target_from: row.get(1)?,
        target_to: row.get(2)?,
        company: row.get(3)?,
        action: row.get(4)?,
        brokerage: row.get(5)?,
        rating_from: row.get(6)?,
        rating_to: row.get(7)?,
        score: row.get(8)?,
        time,
    })
}
