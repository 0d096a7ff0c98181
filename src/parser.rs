//! JSON parser for saved feed dumps.

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::models::{FeedPage, RawStock};

#[derive(Deserialize)]
#[serde(untagged)]
enum FeedDocument {
    Items(Vec<RawStock>),
    Page(FeedPage),
}

/// Decodes either a single feed page (`{"items": [...], "next_page": ...}`)
/// or a bare array of items.
///
/// # Errors
///
/// Returns an error if the bytes are not JSON in one of those shapes.
pub fn parse_feed(bytes: &[u8]) -> Result<Vec<RawStock>> {
    let doc: FeedDocument = serde_json::from_slice(bytes).context("not a feed page or item array")?;
    Ok(match doc {
        FeedDocument::Items(items) => items,
        FeedDocument::Page(page) => page.items,
    })
}
