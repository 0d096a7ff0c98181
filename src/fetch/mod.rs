mod basic;
mod client;
pub mod auth;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Result, bail};
use reqwest::Url;
use serde::de::DeserializeOwned;

/// Issues a GET through `client` and decodes the JSON body.
///
/// # Errors
///
/// Fails on transport errors, non-success status codes (the body is included
/// in the message) and bodies that do not decode as `T`.
pub async fn fetch_json<C: HttpClient, T: DeserializeOwned>(client: &C, url: Url) -> Result<T> {
    let mut req = reqwest::Request::new(reqwest::Method::GET, url);
    req.headers_mut().insert(
        reqwest::header::ACCEPT,
        reqwest::header::HeaderValue::from_static("application/json"),
    );

    let resp = client.execute(req).await?;
    let status = resp.status();
    let body = resp.bytes().await?;

    if !status.is_success() {
        bail!(
            "feed returned status {}: {}",
            status,
            String::from_utf8_lossy(&body)
        );
    }

    Ok(serde_json::from_slice(&body)?)
}

/// Loads raw bytes from a local path or, for `http(s)` sources, via `client`.
pub async fn fetch_bytes<C: HttpClient>(client: &C, source: &str) -> Result<Vec<u8>> {
    if source.starts_with("http://") || source.starts_with("https://") {
        let req = reqwest::Request::new(reqwest::Method::GET, source.parse()?);
        let resp = client.execute(req).await?.error_for_status()?;
        Ok(resp.bytes().await?.to_vec())
    } else {
        Ok(std::fs::read(source)?)
    }
}
