use std::collections::HashSet;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::Url;
use tracing::{debug, info};

use crate::fetch::{HttpClient, fetch_json};
use crate::models::{FeedPage, RawStock};
use crate::services::ratings_feed::RatingsFeed;

/// Client for the paginated ratings endpoint.
///
/// Pages are requested as `<base_url>?next_page=<token>` until the response
/// carries an empty `next_page`.
pub struct FeedApiClient<C> {
    client: C,
    base_url: Url,
}

impl<C: HttpClient> FeedApiClient<C> {
    pub fn new(client: C, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url).with_context(|| format!("invalid feed url '{base_url}'"))?;
        Ok(Self { client, base_url })
    }

    fn page_url(&self, token: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        if let Some(token) = token {
            url.query_pairs_mut().append_pair("next_page", token);
        }
        url
    }
}

#[async_trait]
impl<C: HttpClient> RatingsFeed for FeedApiClient<C> {
    #[tracing::instrument(skip(self), fields(base_url = %self.base_url))]
    async fn fetch_all(&self) -> Result<Vec<RawStock>> {
        let mut stocks = Vec::new();
        let mut seen_tokens = HashSet::new();
        let mut token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let url = self.page_url(token.as_deref());
            debug!(%url, "Fetching feed page");

            let page: FeedPage = fetch_json(&self.client, url)
                .await
                .with_context(|| format!("failed to fetch feed page {}", pages + 1))?;
            pages += 1;
            stocks.extend(page.items);

            match page.next_page.filter(|t| !t.is_empty()) {
                Some(next) => {
                    if !seen_tokens.insert(next.clone()) {
                        bail!("feed repeated page token '{next}'");
                    }
                    token = Some(next);
                }
                None => break,
            }
        }

        info!(pages, records = stocks.len(), "Feed drained");
        Ok(stocks)
    }
}
