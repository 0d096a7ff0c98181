//! Output formatting and persistence for ranked results.
//!
//! Supports JSON logging and CSV append.

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use crate::models::ScoredStock;
use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::path::Path;

/// Logs any serializable value as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Appends ranked records as rows to a CSV file, one row per record with its
/// 1-based rank.
///
/// Creates the file with headers if it does not already exist.
pub fn append_records(path: &Path, ranked: &[ScoredStock]) -> Result<()> {
    let file_exists = path.exists();
    debug!(path = %path.display(), file_exists, rows = ranked.len(), "Appending CSV records");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    for (i, stock) in ranked.iter().enumerate() {
        writer.serialize(RankedRow::new(i + 1, stock))?;
    }
    writer.flush()?;

    Ok(())
}

/// Flat CSV shape; the csv writer cannot serialize nested structs.
#[derive(Serialize)]
struct RankedRow<'a> {
    rank: usize,
    ticker: &'a str,
    company: &'a str,
    brokerage: &'a str,
    action: &'a str,
    rating_from: &'a str,
    rating_to: &'a str,
    target_from: f64,
    target_to: f64,
    time: String,
    score: f64,
}

impl<'a> RankedRow<'a> {
    fn new(rank: usize, s: &'a ScoredStock) -> Self {
        RankedRow {
            rank,
            ticker: &s.ticker,
            company: &s.company,
            brokerage: &s.brokerage,
            action: &s.action,
            rating_from: &s.rating_from,
            rating_to: &s.rating_to,
            target_from: s.target_from,
            target_to: s.target_to,
            time: s.time.to_rfc3339(),
            score: s.score,
        }
    }
}
