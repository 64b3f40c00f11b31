// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};

use crate::error::{AppError, Result};
use crate::models::ScraperConfig;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Create an HTTP client that presents itself like a desktop browser.
pub fn create_client(config: &ScraperConfig) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
    let language = HeaderValue::from_str(&config.accept_language)
        .map_err(|e| AppError::config(format!("Invalid scraper.accept_language: {e}")))?;
    headers.insert(ACCEPT_LANGUAGE, language);

    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Fetch a page body, treating non-2xx statuses as errors.
pub async fn fetch_page(client: &reqwest::Client, url: &str) -> Result<String> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(AppError::fetch(url, format!("HTTP status {status}")));
    }
    Ok(response.text().await?)
}
