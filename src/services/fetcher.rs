//! Page fetching seam.

use async_trait::async_trait;
use reqwest::Client;

use crate::error::Result;
use crate::models::ScraperConfig;
use crate::utils::http;

/// Retrieves the raw HTML of a page.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Fetcher backed by a shared, browser-like HTTP client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        Ok(Self {
            client: http::create_client(config)?,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        http::fetch_page(&self.client, url).await
    }
}
