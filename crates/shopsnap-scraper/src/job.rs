//! End-to-end scrape job: sitemap → product fetch → flatten, with optional
//! homepage and key-page scraping running alongside.

use std::time::Duration;

use serde::Deserialize;

use crate::client::{store_origin, FetchFailure, StorefrontClient};
use crate::error::ScraperError;
use crate::flatten::{flatten_products, FlatRow, SkipReason, SkippedRecord};
use crate::types::{ProductRecord, ScrapeSnapshot};

/// Concurrency and validation knobs for a job.
#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    pub max_concurrent_requests: usize,
    /// Deadline for each product fetch, retries included.
    pub task_timeout: Duration,
    /// Fail the job on the first invalid variant instead of skipping it.
    pub strict_variants: bool,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 8,
            task_timeout: Duration::from_secs(45),
            strict_variants: false,
        }
    }
}

impl ScrapeOptions {
    #[must_use]
    pub fn from_app_config(config: &shopsnap_core::AppConfig) -> Self {
        Self {
            max_concurrent_requests: config.scraper_max_concurrent_requests.max(1),
            task_timeout: Duration::from_secs(config.scraper_task_timeout_secs),
            strict_variants: config.scraper_strict_variants,
        }
    }
}

/// What to scrape for one storefront.
#[derive(Debug, Clone, Deserialize)]
pub struct ScrapeRequest {
    pub shop_url: String,
    #[serde(default)]
    pub homepage: bool,
    #[serde(default = "default_products")]
    pub products: bool,
    /// Paths relative to the store root, e.g. `pages/about`.
    #[serde(default)]
    pub key_pages: Vec<String>,
}

fn default_products() -> bool {
    true
}

impl ScrapeRequest {
    /// A products-only request for `shop_url`.
    #[must_use]
    pub fn products_only(shop_url: impl Into<String>) -> Self {
        Self {
            shop_url: shop_url.into(),
            homepage: false,
            products: true,
            key_pages: Vec::new(),
        }
    }
}

/// Everything a job produced.
#[derive(Debug, Default)]
pub struct ScrapeOutput {
    pub snapshot: ScrapeSnapshot,
    pub rows: Vec<FlatRow>,
    pub skipped: Vec<SkippedRecord>,
    pub fetch_failures: Vec<FetchFailure>,
}

struct ProductPath {
    products: Vec<ProductRecord>,
    rows: Vec<FlatRow>,
    skipped: Vec<SkippedRecord>,
    fetch_failures: Vec<FetchFailure>,
}

/// Runs one scrape job.
///
/// Page scraping is best-effort and never fails the job. The product path
/// fails the job when the sitemap index cannot be read, or when it ends with
/// no URLs, no product records or no rows.
///
/// # Errors
///
/// - [`ScraperError::InvalidShopUrl`] / [`ScraperError::InvalidRequest`] — bad input.
/// - Transport or [`ScraperError::Xml`] errors from the sitemap index.
/// - [`ScraperError::NoProductUrls`], [`ScraperError::NoProductData`],
///   [`ScraperError::NoRows`] — the store yielded nothing to export.
/// - [`ScraperError::Validation`] — a variant was invalid and
///   [`ScrapeOptions::strict_variants`] is set.
pub async fn run_scrape(
    client: &StorefrontClient,
    options: &ScrapeOptions,
    request: &ScrapeRequest,
) -> Result<ScrapeOutput, ScraperError> {
    let shop_url = request.shop_url.trim();
    let origin = store_origin(shop_url)?;
    if !request.products && !request.homepage && request.key_pages.is_empty() {
        return Err(ScraperError::InvalidRequest(
            "nothing to scrape: enable products, homepage or at least one key page".to_owned(),
        ));
    }

    tracing::info!(
        shop_url = %origin,
        products = request.products,
        homepage = request.homepage,
        key_pages = request.key_pages.len(),
        "starting scrape"
    );

    let product_path = async {
        if request.products {
            scrape_products(client, options, shop_url).await.map(Some)
        } else {
            Ok(None)
        }
    };
    let homepage = async {
        if request.homepage {
            client.scrape_homepage(shop_url).await
        } else {
            None
        }
    };
    let key_pages = client.scrape_key_pages(
        shop_url,
        &request.key_pages,
        options.max_concurrent_requests,
    );

    let (product_path, homepage, key_pages) = tokio::join!(product_path, homepage, key_pages);
    let product_path = product_path?;

    let mut output = ScrapeOutput {
        snapshot: ScrapeSnapshot {
            shop_url: origin,
            homepage,
            products: Vec::new(),
            key_pages,
        },
        ..ScrapeOutput::default()
    };
    if let Some(path) = product_path {
        output.snapshot.products = path.products;
        output.rows = path.rows;
        output.skipped = path.skipped;
        output.fetch_failures = path.fetch_failures;
    }

    tracing::info!(
        shop_url = %output.snapshot.shop_url,
        products = output.snapshot.products.len(),
        rows = output.rows.len(),
        skipped = output.skipped.len(),
        fetch_failures = output.fetch_failures.len(),
        key_pages = output.snapshot.key_pages.len(),
        "scrape complete"
    );
    Ok(output)
}

async fn scrape_products(
    client: &StorefrontClient,
    options: &ScrapeOptions,
    shop_url: &str,
) -> Result<ProductPath, ScraperError> {
    let urls = client.resolve_product_urls(shop_url).await?;
    if urls.is_empty() {
        return Err(ScraperError::NoProductUrls {
            shop_url: shop_url.to_owned(),
        });
    }

    let report = client
        .fetch_products(&urls, options.max_concurrent_requests, options.task_timeout)
        .await;
    if report.products.is_empty() {
        return Err(ScraperError::NoProductData {
            shop_url: shop_url.to_owned(),
        });
    }

    let outcome = flatten_products(&report.products);
    if options.strict_variants {
        if let Some(err) = outcome.skipped.iter().find_map(strict_violation) {
            return Err(err);
        }
    }
    if outcome.rows.is_empty() {
        return Err(ScraperError::NoRows {
            shop_url: shop_url.to_owned(),
        });
    }

    Ok(ProductPath {
        products: report.products,
        rows: outcome.rows,
        skipped: outcome.skipped,
        fetch_failures: report.failures,
    })
}

fn strict_violation(skipped: &SkippedRecord) -> Option<ScraperError> {
    match (&skipped.reason, skipped.variant_position) {
        (SkipReason::MissingField { field }, Some(variant_position)) => {
            Some(ScraperError::Validation {
                handle: skipped.handle.clone(),
                variant_position,
                field: *field,
            })
        }
        _ => None,
    }
}
