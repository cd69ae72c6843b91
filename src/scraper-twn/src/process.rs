use std::collections::HashSet;

use chrono::Utc;
use core_twn::{NewsApiClient, PoliteDelay};
use data_model_twn::api::ClaimedNews;
use url::Url;

use crate::errors::Error;
use crate::fetcher::PageFetcher;
use crate::sites::NewsSite;

pub const DEFAULT_MAX_PAGES: u32 = 10;
pub const DEFAULT_BATCH_SIZE: i64 = 10;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ListSummary {
    pub pages: u32,
    pub submitted: usize,
    pub inserted: usize,
    pub rejected: usize,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FetchSummary {
    pub claimed: usize,
    pub fetched: usize,
    pub failed: usize,
}

/// One site's scraper, talking to the ingestion API.
pub struct Scraper<F: PageFetcher> {
    api: NewsApiClient,
    fetcher: F,
    site: Box<dyn NewsSite>,
    delay: PoliteDelay,
}

impl<F: PageFetcher> Scraper<F> {
    pub fn new(api: NewsApiClient, fetcher: F, site: Box<dyn NewsSite>, delay: PoliteDelay) -> Self {
        Self {
            api,
            fetcher,
            site,
            delay,
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Walks listing pages 1..=max_pages and submits what they list.
    /// Stops at the first page that lists nothing, or nothing the API didn't already have.
    pub async fn list_pass(&self, max_pages: u32) -> Result<ListSummary, Error> {
        let source = self.site.source().slug();
        let mut summary = ListSummary::default();

        for page in 1..=max_pages {
            if page > 1 {
                self.delay.sleep().await;
            }

            let page_url = Url::parse(&self.site.listing_url(page))?;
            let html = match self.fetcher.fetch(page_url.as_str()).await {
                Ok(html) => html,
                Err(e) => {
                    tracing::warn!("[{}] Stopping list pass at page {}: {}", source, page, e);
                    break;
                }
            };
            summary.pages += 1;

            let drafts = self.site.parse_listing(&html, &page_url, Utc::now().naive_utc());
            if drafts.is_empty() {
                tracing::info!("[{}] Page {} lists no news, stopping", source, page);
                break;
            }

            let response = self.api.post_news(&drafts).await?;
            summary.submitted += drafts.len();
            summary.inserted += response.success.len();
            summary.rejected += response.error.len();
            tracing::info!(
                "[{}] Page {}: {} listed, {} new, {} rejected",
                source,
                page,
                drafts.len(),
                response.success.len(),
                response.error.len()
            );

            if response.success.is_empty() {
                tracing::info!("[{}] Page {} had nothing new, stopping", source, page);
                break;
            }
        }

        Ok(summary)
    }

    /// Claims batches of listed articles and writes back their detail pages until nothing is left.
    ///
    /// A failed article is logged and skipped; it stays claimed until its lease runs out.
    pub async fn fetch_pass(&self, batch_size: i64) -> Result<FetchSummary, Error> {
        let source = self.site.source();
        let mut summary = FetchSummary::default();
        let mut attempted: HashSet<i32> = HashSet::new();

        loop {
            let batch = self.api.claim_news(source, batch_size).await?;
            if batch.is_empty() {
                tracing::info!("[{}] Nothing left to fetch", source.slug());
                break;
            }
            // Only articles that already failed this run came back (their lease expired meanwhile).
            if batch.iter().all(|item| attempted.contains(&item.id)) {
                tracing::warn!("[{}] Claimed only articles that already failed, stopping", source.slug());
                break;
            }
            for item in batch {
                if !attempted.insert(item.id) {
                    continue;
                }
                summary.claimed += 1;
                self.delay.sleep().await;
                match self.fetch_one(&item).await {
                    Ok(()) => {
                        summary.fetched += 1;
                        tracing::debug!("[{}] Stored news {}", source.slug(), item.id);
                    }
                    Err(e) => {
                        summary.failed += 1;
                        tracing::error!("[SKIP] [{}] News {} ({}): {}", source.slug(), item.id, item.news_url, e);
                    }
                }
            }
        }

        Ok(summary)
    }

    async fn fetch_one(&self, item: &ClaimedNews) -> Result<(), Error> {
        let html = self.fetcher.fetch(&item.news_url).await?;
        let update = self.site.parse_detail(&html, &item.news_url)?;
        self.api.update_news(item.id, &update).await?;
        Ok(())
    }

    /// List pass, then fetch pass.
    pub async fn run(&self, max_pages: u32, batch_size: i64) -> Result<(ListSummary, FetchSummary), Error> {
        let listed = self.list_pass(max_pages).await?;
        let fetched = self.fetch_pass(batch_size).await?;
        Ok((listed, fetched))
    }
}
