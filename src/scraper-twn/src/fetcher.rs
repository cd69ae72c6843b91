use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::errors::Error;

/// Browser user-agent; both sites serve an error page to obvious bots.
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/99.0.4844.82 Safari/537.36";

/// Downloads the HTML of a page.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, Error>;
}

pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl HttpPageFetcher {
    pub fn new(timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Result<String, Error> {
        let url = Url::parse(url)?;
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::PageFetch {
                url: url.to_string(),
                reason: format!("status {}", status),
            });
        }
        Ok(response.text().await?)
    }
}

/// Serves pages from memory. Unknown URLs fail like a 404 would.
#[derive(Default)]
pub struct FixturePageFetcher {
    pages: HashMap<String, String>,
    requested: Mutex<Vec<String>>,
}

impl FixturePageFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(normalize(url), html.to_string());
        self
    }

    /// URLs requested so far, in order.
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

/// Percent-encodes the same way `Url` does so fixtures can be keyed by the readable form.
fn normalize(url: &str) -> String {
    Url::parse(url).map(|u| u.to_string()).unwrap_or_else(|_| url.to_string())
}

#[async_trait]
impl PageFetcher for FixturePageFetcher {
    async fn fetch(&self, url: &str) -> Result<String, Error> {
        let url = normalize(url);
        if let Ok(mut requested) = self.requested.lock() {
            requested.push(url.clone());
        }
        self.pages.get(&url).cloned().ok_or_else(|| Error::PageFetch {
            url,
            reason: "status 404 Not Found".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixture_fetcher_matches_encoded_urls() {
        let fetcher = FixturePageFetcher::new().with_page("https://news.ttv.com.tw/category/社會/1", "<html></html>");

        let html = fetcher
            .fetch("https://news.ttv.com.tw/category/%E7%A4%BE%E6%9C%83/1")
            .await
            .unwrap();
        assert_eq!(html, "<html></html>");

        let missing = fetcher.fetch("https://news.ttv.com.tw/category/社會/2").await;
        assert!(matches!(missing, Err(Error::PageFetch { .. })));
        assert_eq!(fetcher.requested().len(), 2);
    }
}
