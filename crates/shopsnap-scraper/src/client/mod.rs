//! HTTP client for a storefront's public sitemap, product JSON and HTML pages.

mod origin;
mod pages;
mod products;
mod sitemap;

use std::time::Duration;

use reqwest::Client;

use crate::error::ScraperError;
use crate::rate_limit::retry_with_backoff;

pub use origin::store_origin;
pub use products::{FetchFailure, ProductFetchReport};

// Re-export for test visibility via `use super::*`
#[cfg(test)]
use origin::extract_domain;

/// HTTP client for one or more storefronts.
///
/// Rate limiting (429), not-found (404) and other non-2xx responses surface as
/// typed errors. Transient errors (429, 5xx, network failures) are retried
/// with exponential backoff up to `max_retries` additional attempts.
pub struct StorefrontClient {
    client: Client,
    /// Maximum number of retry attempts after the first failure.
    max_retries: u32,
    /// Base delay in seconds for exponential backoff: `backoff_base_secs * 2^attempt`.
    backoff_base_secs: u64,
}

impl StorefrontClient {
    /// Creates a `StorefrontClient` with configured timeout, `User-Agent`, and retry policy.
    ///
    /// `max_retries` is the number of additional attempts after the first failure for
    /// retriable errors. Set to `0` to disable retries.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            max_retries,
            backoff_base_secs,
        })
    }

    /// Builds a client from the shared application config.
    ///
    /// # Errors
    ///
    /// See [`Self::new`].
    pub fn from_app_config(config: &shopsnap_core::AppConfig) -> Result<Self, ScraperError> {
        Self::new(
            config.scraper_request_timeout_secs,
            &config.scraper_user_agent,
            config.scraper_max_retries,
            config.scraper_retry_backoff_base_secs,
        )
    }

    /// GETs `url` and returns the response body as text, retrying transient
    /// failures.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::RateLimited`] — HTTP 429 after all retries exhausted.
    /// - [`ScraperError::NotFound`] — HTTP 404 (not retried).
    /// - [`ScraperError::UnexpectedStatus`] — any other non-2xx status (5xx retried, 4xx not).
    /// - [`ScraperError::Http`] — network or TLS failure after all retries exhausted.
    pub async fn fetch_text(&self, url: &str) -> Result<String, ScraperError> {
        retry_with_backoff(self.max_retries, self.backoff_base_secs, || async move {
            let response = self
                .client
                .get(url)
                .header(
                    reqwest::header::ACCEPT,
                    "application/json,application/xml,text/html;q=0.9,*/*;q=0.8",
                )
                .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
                .send()
                .await?;
            let status = response.status();

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                let retry_after_secs = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(60);

                return Err(ScraperError::RateLimited {
                    domain: origin::extract_domain(url),
                    retry_after_secs,
                });
            }

            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(ScraperError::NotFound {
                    url: url.to_owned(),
                });
            }

            if !status.is_success() {
                return Err(ScraperError::UnexpectedStatus {
                    status: status.as_u16(),
                    url: url.to_owned(),
                });
            }

            Ok(response.text().await?)
        })
        .await
    }

    /// Builds `<origin>/sitemap.xml` for a shop URL.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidShopUrl`] if no origin can be derived.
    pub fn sitemap_url(shop_url: &str) -> Result<String, ScraperError> {
        Ok(format!("{}/sitemap.xml", store_origin(shop_url)?))
    }

    /// Builds the JSON endpoint for a product detail URL: `<url>.json`.
    #[must_use]
    pub fn product_json_url(product_url: &str) -> String {
        format!("{}.json", product_url.trim_end_matches('/'))
    }

    /// Builds `<origin>/<path>` for a key page, normalizing slashes.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidShopUrl`] if no origin can be derived.
    pub fn key_page_url(shop_url: &str, path: &str) -> Result<String, ScraperError> {
        Ok(format!(
            "{}/{}",
            store_origin(shop_url)?,
            path.trim().trim_start_matches('/')
        ))
    }
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
