pub mod client;
pub mod error;
pub mod export;
pub mod flatten;
pub mod job;
pub mod page;
mod rate_limit;
pub mod sitemap;
pub mod types;

pub use client::{store_origin, FetchFailure, ProductFetchReport, StorefrontClient};
pub use error::{ErrorKind, ScraperError};
pub use export::{ArtifactKind, ExportStore, SavedArtifacts};
pub use flatten::{flatten_products, FlatRow, FlattenOutcome, SkipReason, SkippedRecord};
pub use job::{run_scrape, ScrapeOptions, ScrapeOutput, ScrapeRequest};
pub use types::{ProductRecord, ScrapeSnapshot};
