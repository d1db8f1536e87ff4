//! Product URL discovery through the sitemap index.

use crate::error::ScraperError;
use crate::sitemap::{is_product_page, is_product_sitemap, parse_locs};

use super::StorefrontClient;

impl StorefrontClient {
    /// Resolves every product detail URL listed in the store's sitemaps.
    ///
    /// Fetches `<origin>/sitemap.xml`, follows each child sitemap whose URL
    /// contains `products`, and keeps child entries under `/products/` that
    /// are not CDN assets. URLs are returned in discovery order; a product
    /// listed in two child sitemaps appears twice.
    ///
    /// A child sitemap that fails to fetch or parse is logged and skipped.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::InvalidShopUrl`] — `shop_url` has no usable origin.
    /// - Any transport error from [`Self::fetch_text`] for the index itself.
    /// - [`ScraperError::Xml`] — the index is not well-formed XML.
    pub async fn resolve_product_urls(&self, shop_url: &str) -> Result<Vec<String>, ScraperError> {
        let index_url = Self::sitemap_url(shop_url)?;
        let index = self.fetch_text(&index_url).await.inspect_err(|e| {
            tracing::error!(url = %index_url, error = %e, "failed to fetch sitemap index");
        })?;
        let child_sitemaps: Vec<String> = parse_locs(&index, &index_url)?
            .into_iter()
            .filter(|loc| is_product_sitemap(loc))
            .collect();

        let mut product_urls = Vec::new();
        for child_url in &child_sitemaps {
            match self.fetch_product_sitemap(child_url).await {
                Ok(urls) => product_urls.extend(urls),
                Err(e) => {
                    tracing::error!(url = %child_url, error = %e, "failed to fetch product sitemap");
                }
            }
        }

        tracing::info!(
            shop_url,
            child_sitemaps = child_sitemaps.len(),
            product_urls = product_urls.len(),
            "resolved product URLs from sitemap"
        );
        Ok(product_urls)
    }

    async fn fetch_product_sitemap(&self, url: &str) -> Result<Vec<String>, ScraperError> {
        let body = self.fetch_text(url).await?;
        Ok(parse_locs(&body, url)?
            .into_iter()
            .filter(|loc| is_product_page(loc))
            .collect())
    }
}
