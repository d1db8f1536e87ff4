use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("XML parse error for {context}: {source}")]
    Xml {
        context: String,
        #[source]
        source: quick_xml::Error,
    },

    #[error("rate limited by {domain} (retry after {retry_after_secs}s)")]
    RateLimited {
        domain: String,
        retry_after_secs: u64,
    },

    #[error("endpoint not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("invalid shop URL \"{shop_url}\": {reason}")]
    InvalidShopUrl { shop_url: String, reason: String },

    #[error("invalid scrape request: {0}")]
    InvalidRequest(String),

    #[error("variant {variant_position} of product {handle} is missing required field `{field}`")]
    Validation {
        handle: String,
        variant_position: usize,
        field: &'static str,
    },

    #[error("no product URLs found in sitemap for {shop_url}")]
    NoProductUrls { shop_url: String },

    #[error("no product data could be fetched for {shop_url}")]
    NoProductData { shop_url: String },

    #[error("no exportable rows were produced for {shop_url}")]
    NoRows { shop_url: String },

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse grouping of [`ScraperError`] used by callers that need to pick a
/// response code or exit status without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    Transport,
    Timeout,
    Parse,
    Validation,
    NoData,
    Internal,
}

impl ScraperError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidShopUrl { .. } | Self::InvalidRequest(_) => ErrorKind::InvalidInput,
            Self::Http(e) if e.is_timeout() => ErrorKind::Timeout,
            Self::Http(_)
            | Self::RateLimited { .. }
            | Self::NotFound { .. }
            | Self::UnexpectedStatus { .. } => ErrorKind::Transport,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Deserialize { .. } | Self::Xml { .. } => ErrorKind::Parse,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::NoProductUrls { .. } | Self::NoProductData { .. } | Self::NoRows { .. } => {
                ErrorKind::NoData
            }
            Self::Csv(_) | Self::Json(_) | Self::Io(_) => ErrorKind::Internal,
        }
    }
}
