//! URL origin and domain extraction utilities for the storefront client.

use crate::error::ScraperError;

/// Extracts the scheme+host origin from a shop URL.
///
/// Given `"https://drinkcann.com/collections/all"`, returns `"https://drinkcann.com"`.
/// Sitemaps, the homepage and key pages all live at the store root regardless
/// of the path the caller submitted.
///
/// # Errors
///
/// Returns [`ScraperError::InvalidShopUrl`] if the URL does not parse, is not
/// `http`/`https`, or has no host.
pub fn store_origin(shop_url: &str) -> Result<String, ScraperError> {
    let invalid = |reason: String| ScraperError::InvalidShopUrl {
        shop_url: shop_url.to_owned(),
        reason,
    };

    let url = reqwest::Url::parse(shop_url.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme \"{}\"", url.scheme())));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid("URL has no host".to_owned()));
    }
    Ok(url.origin().ascii_serialization())
}

/// Extracts the hostname from a URL for use in error messages.
///
/// Falls back to the full URL string if parsing fails.
pub(super) fn extract_domain(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
        .unwrap_or_else(|| url.to_owned())
}
