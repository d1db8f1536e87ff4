//! Per-product JSON fetches and the bounded concurrent fan-out over them.

use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde::Serialize;

use crate::error::ScraperError;
use crate::types::{ProductEnvelope, ProductRecord};

use super::StorefrontClient;

/// A product URL that yielded no record, with the reason it was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchFailure {
    pub url: String,
    pub reason: String,
}

/// Products fetched by [`StorefrontClient::fetch_products`], in input order,
/// plus every URL that failed.
#[derive(Debug, Default)]
pub struct ProductFetchReport {
    pub products: Vec<ProductRecord>,
    pub failures: Vec<FetchFailure>,
}

impl StorefrontClient {
    /// Fetches and parses `<product_url>.json`.
    ///
    /// # Errors
    ///
    /// - Any transport error from [`Self::fetch_text`].
    /// - [`ScraperError::Deserialize`] — the body is not JSON or has no
    ///   `product` object.
    pub async fn fetch_product(&self, product_url: &str) -> Result<ProductRecord, ScraperError> {
        let json_url = Self::product_json_url(product_url);
        let body = self.fetch_text(&json_url).await?;
        let envelope = serde_json::from_str::<ProductEnvelope>(&body).map_err(|e| {
            ScraperError::Deserialize {
                context: format!("product JSON from {json_url}"),
                source: e,
            }
        })?;
        Ok(envelope.product)
    }

    /// Fetches every product URL with at most `max_concurrent` requests in
    /// flight, each bounded by `task_timeout`.
    ///
    /// Failures never abort the batch: the URL is logged and recorded in
    /// [`ProductFetchReport::failures`]. Successful records keep the order of
    /// `urls`.
    pub async fn fetch_products(
        &self,
        urls: &[String],
        max_concurrent: usize,
        task_timeout: Duration,
    ) -> ProductFetchReport {
        let results: Vec<(&String, Result<ProductRecord, ScraperError>)> = stream::iter(
            urls.iter()
                .map(|url| async move {
                    let result = tokio::time::timeout(task_timeout, self.fetch_product(url))
                        .await
                        .unwrap_or_else(|_| {
                            Err(ScraperError::Timeout {
                                url: Self::product_json_url(url),
                                timeout: task_timeout,
                            })
                        });
                    (url, result)
                })
                .collect::<Vec<_>>(),
        )
        .buffered(max_concurrent.max(1))
        .collect()
        .await;

        let mut report = ProductFetchReport::default();
        for (url, result) in results {
            match result {
                Ok(product) => report.products.push(product),
                Err(e) => {
                    tracing::error!(url = %url, error = %e, "failed to fetch product data");
                    report.failures.push(FetchFailure {
                        url: url.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            requested = urls.len(),
            fetched = report.products.len(),
            failed = report.failures.len(),
            "product fetch complete"
        );
        report
    }
}
