//! Homepage and key-page scraping.
//!
//! Both paths are best-effort: any failure is logged and reported as `None`
//! so page content never blocks a product export.

use futures::stream::{self, StreamExt};

use crate::page::{parse_homepage, parse_key_page};
use crate::types::{HomepageSummary, KeyPageRecord};

use super::{store_origin, StorefrontClient};

impl StorefrontClient {
    /// Fetches the store homepage and summarizes its `<section>` blocks.
    pub async fn scrape_homepage(&self, shop_url: &str) -> Option<HomepageSummary> {
        let url = match store_origin(shop_url) {
            Ok(origin) => origin,
            Err(e) => {
                tracing::error!(shop_url, error = %e, "cannot derive homepage URL");
                return None;
            }
        };
        match self.fetch_text(&url).await {
            Ok(html) => Some(parse_homepage(&html, &url)),
            Err(e) => {
                tracing::error!(url = %url, error = %e, "failed to fetch homepage");
                None
            }
        }
    }

    /// Fetches `<origin>/<path>` and extracts its visible text and images.
    pub async fn scrape_key_page(&self, shop_url: &str, path: &str) -> Option<KeyPageRecord> {
        let url = match Self::key_page_url(shop_url, path) {
            Ok(url) => url,
            Err(e) => {
                tracing::error!(shop_url, path, error = %e, "cannot derive key page URL");
                return None;
            }
        };
        match self.fetch_text(&url).await {
            Ok(html) => Some(parse_key_page(&html, &url)),
            Err(e) => {
                tracing::error!(url = %url, error = %e, "failed to fetch key page");
                None
            }
        }
    }

    /// Scrapes several key pages concurrently, dropping the ones that fail.
    /// Output follows the order of `paths`.
    pub async fn scrape_key_pages(
        &self,
        shop_url: &str,
        paths: &[String],
        max_concurrent: usize,
    ) -> Vec<KeyPageRecord> {
        stream::iter(
            paths
                .iter()
                .map(|path| self.scrape_key_page(shop_url, path))
                .collect::<Vec<_>>(),
        )
        .buffered(max_concurrent.max(1))
        .filter_map(|page| async move { page })
        .collect()
        .await
    }
}
