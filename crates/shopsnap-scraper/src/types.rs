//! Storefront response types for the per-product `<product-url>.json` endpoint
//! and the page-scrape records that travel alongside them in a snapshot.
//!
//! ## Observed shape of `/products/<handle>.json`
//!
//! ### Tags
//! The single-product endpoint returns tags as a **comma-separated string**
//! (`"blood orange, ginger"`), while the `products.json` listing returns a JSON
//! array. Both are accepted and normalized to an ordered `Vec<String>`.
//!
//! ### Required variant fields
//! `sku`, `price`, `grams`, `requires_shipping` and `taxable` are always present
//! on well-formed stores, but `sku` and `barcode` are frequently `null`. A key
//! that is present with `null` exports as an empty cell; a key that is missing
//! entirely marks the variant invalid. [`Required`] keeps that distinction.
//!
//! ### `price` / `grams`
//! `price` is a decimal string (`"30.00"`) and `grams` an integer, but some
//! themes proxy the endpoint and emit numbers for both. [`Scalar`] accepts
//! either and renders the value back as it appeared.

use serde::{Deserialize, Deserializer, Serialize};

/// A field whose absence is meaningful: `None` when the key was missing,
/// `Some(None)` when it was present with `null`.
pub type Required<T> = Option<Option<T>>;

/// Top-level response from `GET /products/<handle>.json`.
#[derive(Debug, Deserialize)]
pub struct ProductEnvelope {
    pub product: ProductRecord,
}

/// A single product as exposed by the storefront.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProductRecord {
    /// Numeric product ID.
    #[serde(default)]
    pub id: Option<i64>,

    /// URL slug, unique per store (e.g. `"hi-boy-blood-orange-5mg"`).
    pub handle: String,

    pub title: String,

    /// Raw HTML description.
    #[serde(default)]
    pub body_html: Option<String>,

    #[serde(default)]
    pub vendor: Option<String>,

    #[serde(default)]
    pub product_type: Option<String>,

    #[serde(default, deserialize_with = "deserialize_tags")]
    pub tags: Vec<String>,

    /// RFC 3339 publication timestamp, passed through verbatim.
    #[serde(default)]
    pub published_at: Option<String>,

    /// Up to three option axes (e.g. `Size`, `Flavor`), in display order.
    #[serde(default)]
    pub options: Vec<ProductOption>,

    #[serde(default)]
    pub variants: Vec<VariantRecord>,

    #[serde(default)]
    pub images: Vec<ImageRecord>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProductOption {
    pub name: String,
    #[serde(default)]
    pub values: Vec<String>,
}

/// A purchasable variant of a [`ProductRecord`].
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct VariantRecord {
    #[serde(default)]
    pub id: Option<i64>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub sku: Required<String>,

    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Required<Scalar>,

    /// `null` when the variant is not on sale.
    #[serde(default)]
    pub compare_at_price: Option<Scalar>,

    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub grams: Required<Scalar>,

    /// Inventory tracker, e.g. `"shopify"`; `null` when untracked.
    #[serde(default)]
    pub inventory_management: Option<String>,

    #[serde(default)]
    pub inventory_policy: Option<String>,

    #[serde(default)]
    pub fulfillment_service: Option<String>,

    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub requires_shipping: Required<bool>,

    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub taxable: Required<bool>,

    #[serde(default)]
    pub barcode: Option<String>,

    #[serde(default)]
    pub option1: Option<String>,

    #[serde(default)]
    pub option2: Option<String>,

    #[serde(default)]
    pub option3: Option<String>,

    /// ID of the image shown when this variant is selected.
    #[serde(default)]
    pub image_id: Option<i64>,

    #[serde(default)]
    pub weight_unit: Option<String>,
}

/// A product image.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImageRecord {
    #[serde(default)]
    pub id: Option<i64>,
    /// Canonical CDN URL.
    pub src: String,
    /// 1-based gallery position.
    #[serde(default)]
    pub position: Option<i64>,
    #[serde(default)]
    pub alt: Option<String>,
}

/// A JSON scalar kept in its original textual form for export.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl Scalar {
    #[must_use]
    pub fn to_cell(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Integer(n) => n.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Bool(b) => bool_cell(*b).to_string(),
        }
    }
}

/// Renders a boolean the way spreadsheet import formats expect.
#[must_use]
pub fn bool_cell(value: bool) -> &'static str {
    if value {
        "TRUE"
    } else {
        "FALSE"
    }
}

/// Summary of the storefront homepage: one group per `<section>` element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomepageSummary {
    pub url: String,
    pub sections: Vec<SectionGroup>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionGroup {
    pub images: Vec<String>,
    /// Links within the section that point at product detail pages.
    pub product_links: Vec<String>,
}

/// Visible text and images of a static storefront page (about, FAQ, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPageRecord {
    pub url: String,
    pub text: String,
    pub images: Vec<String>,
}

/// Aggregate result of one scrape job, serialized as the JSON snapshot.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScrapeSnapshot {
    pub shop_url: String,
    pub homepage: Option<HomepageSummary>,
    pub products: Vec<ProductRecord>,
    pub key_pages: Vec<KeyPageRecord>,
}

fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TagsRepr {
    List(Vec<String>),
    Joined(String),
}

fn deserialize_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let tags = match Option::<TagsRepr>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(TagsRepr::List(list)) => list,
        Some(TagsRepr::Joined(joined)) => joined
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_owned)
            .collect(),
    };
    Ok(tags)
}
