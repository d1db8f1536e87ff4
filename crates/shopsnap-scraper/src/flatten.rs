//! Projection of nested product records into flat export rows.
//!
//! Every (variant, image) pair of a product becomes one [`FlatRow`]: a product
//! with V variants and I images yields V×I rows. The column layout matches the
//! storefront product-import spreadsheet, so columns the public JSON cannot
//! populate (SEO, Google Shopping, regional pricing, ...) are still emitted as
//! empty cells.

use serde::Serialize;

use crate::types::{bool_cell, ImageRecord, ProductRecord, Required, Scalar, VariantRecord};

/// Header of the export, in column order. Must stay in sync with the field
/// order of [`FlatRow`].
pub const EXPORT_COLUMNS: [&str; 55] = [
    "Handle",
    "Title",
    "Body (HTML)",
    "Vendor",
    "Product Category",
    "Type",
    "Tags",
    "Published",
    "Option1 Name",
    "Option1 Value",
    "Option2 Name",
    "Option2 Value",
    "Option3 Name",
    "Option3 Value",
    "Variant SKU",
    "Variant Grams",
    "Variant Inventory Tracker",
    "Variant Inventory Policy",
    "Variant Fulfillment Service",
    "Variant Price",
    "Variant Compare At Price",
    "Variant Requires Shipping",
    "Variant Taxable",
    "Variant Barcode",
    "Image Src",
    "Image Position",
    "Image Alt Text",
    "Gift Card",
    "SEO Title",
    "SEO Description",
    "Google Shopping / Google Product Category",
    "Google Shopping / Gender",
    "Google Shopping / Age Group",
    "Google Shopping / MPN",
    "Google Shopping / Condition",
    "Google Shopping / Custom Product",
    "Google Shopping / Custom Label 0",
    "Google Shopping / Custom Label 1",
    "Google Shopping / Custom Label 2",
    "Google Shopping / Custom Label 3",
    "Google Shopping / Custom Label 4",
    "Variant Image",
    "Variant Weight Unit",
    "Variant Tax Code",
    "Cost per item",
    "Included / Canada",
    "Price / Canada",
    "Compare At Price / Canada",
    "Included / International",
    "Price / International",
    "Compare At Price / International",
    "Included / United States",
    "Price / United States",
    "Compare At Price / United States",
    "Status",
];

const DEFAULT_INVENTORY_POLICY: &str = "continue";

/// One exported record: a single variant/image pairing of a product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlatRow {
    #[serde(rename = "Handle")]
    pub handle: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Body (HTML)")]
    pub body_html: String,
    #[serde(rename = "Vendor")]
    pub vendor: String,
    #[serde(rename = "Product Category")]
    pub product_category: String,
    #[serde(rename = "Type")]
    pub product_type: String,
    #[serde(rename = "Tags")]
    pub tags: String,
    #[serde(rename = "Published")]
    pub published: String,
    #[serde(rename = "Option1 Name")]
    pub option1_name: String,
    #[serde(rename = "Option1 Value")]
    pub option1_value: String,
    #[serde(rename = "Option2 Name")]
    pub option2_name: String,
    #[serde(rename = "Option2 Value")]
    pub option2_value: String,
    #[serde(rename = "Option3 Name")]
    pub option3_name: String,
    #[serde(rename = "Option3 Value")]
    pub option3_value: String,
    #[serde(rename = "Variant SKU")]
    pub variant_sku: String,
    #[serde(rename = "Variant Grams")]
    pub variant_grams: String,
    #[serde(rename = "Variant Inventory Tracker")]
    pub variant_inventory_tracker: String,
    #[serde(rename = "Variant Inventory Policy")]
    pub variant_inventory_policy: String,
    #[serde(rename = "Variant Fulfillment Service")]
    pub variant_fulfillment_service: String,
    #[serde(rename = "Variant Price")]
    pub variant_price: String,
    #[serde(rename = "Variant Compare At Price")]
    pub variant_compare_at_price: String,
    #[serde(rename = "Variant Requires Shipping")]
    pub variant_requires_shipping: String,
    #[serde(rename = "Variant Taxable")]
    pub variant_taxable: String,
    #[serde(rename = "Variant Barcode")]
    pub variant_barcode: String,
    #[serde(rename = "Image Src")]
    pub image_src: String,
    #[serde(rename = "Image Position")]
    pub image_position: String,
    #[serde(rename = "Image Alt Text")]
    pub image_alt_text: String,
    #[serde(rename = "Gift Card")]
    pub gift_card: String,
    #[serde(rename = "SEO Title")]
    pub seo_title: String,
    #[serde(rename = "SEO Description")]
    pub seo_description: String,
    #[serde(rename = "Google Shopping / Google Product Category")]
    pub google_product_category: String,
    #[serde(rename = "Google Shopping / Gender")]
    pub google_gender: String,
    #[serde(rename = "Google Shopping / Age Group")]
    pub google_age_group: String,
    #[serde(rename = "Google Shopping / MPN")]
    pub google_mpn: String,
    #[serde(rename = "Google Shopping / Condition")]
    pub google_condition: String,
    #[serde(rename = "Google Shopping / Custom Product")]
    pub google_custom_product: String,
    #[serde(rename = "Google Shopping / Custom Label 0")]
    pub google_custom_label_0: String,
    #[serde(rename = "Google Shopping / Custom Label 1")]
    pub google_custom_label_1: String,
    #[serde(rename = "Google Shopping / Custom Label 2")]
    pub google_custom_label_2: String,
    #[serde(rename = "Google Shopping / Custom Label 3")]
    pub google_custom_label_3: String,
    #[serde(rename = "Google Shopping / Custom Label 4")]
    pub google_custom_label_4: String,
    #[serde(rename = "Variant Image")]
    pub variant_image: String,
    #[serde(rename = "Variant Weight Unit")]
    pub variant_weight_unit: String,
    #[serde(rename = "Variant Tax Code")]
    pub variant_tax_code: String,
    #[serde(rename = "Cost per item")]
    pub cost_per_item: String,
    #[serde(rename = "Included / Canada")]
    pub included_canada: String,
    #[serde(rename = "Price / Canada")]
    pub price_canada: String,
    #[serde(rename = "Compare At Price / Canada")]
    pub compare_at_price_canada: String,
    #[serde(rename = "Included / International")]
    pub included_international: String,
    #[serde(rename = "Price / International")]
    pub price_international: String,
    #[serde(rename = "Compare At Price / International")]
    pub compare_at_price_international: String,
    #[serde(rename = "Included / United States")]
    pub included_united_states: String,
    #[serde(rename = "Price / United States")]
    pub price_united_states: String,
    #[serde(rename = "Compare At Price / United States")]
    pub compare_at_price_united_states: String,
    #[serde(rename = "Status")]
    pub status: String,
}

/// Why a product or variant produced no rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// A required variant field was missing from the source JSON.
    MissingField {
        field: &'static str,
    },
    NoVariants,
    NoImages,
}

/// A product or variant left out of the export, with enough context to find it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    pub handle: String,
    /// 1-based position of the variant; `None` for product-level skips.
    pub variant_position: Option<usize>,
    pub variant_id: Option<i64>,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Result of a flatten pass: the rows that could be built plus what was skipped.
#[derive(Debug, Default)]
pub struct FlattenOutcome {
    pub rows: Vec<FlatRow>,
    pub skipped: Vec<SkippedRecord>,
}

/// Variant fields that must be present before any of its rows can be built.
struct ValidVariant<'a> {
    variant: &'a VariantRecord,
    sku: String,
    price: String,
    grams: String,
    requires_shipping: &'static str,
    taxable: &'static str,
}

/// Flattens every product, skipping (and recording) invalid variants rather
/// than aborting the pass.
#[must_use]
pub fn flatten_products(products: &[ProductRecord]) -> FlattenOutcome {
    let mut outcome = FlattenOutcome::default();
    for product in products {
        flatten_product_into(product, &mut outcome);
    }
    outcome
}

/// Flattens a single product into `outcome`.
pub fn flatten_product_into(product: &ProductRecord, outcome: &mut FlattenOutcome) {
    let product_skip = |reason| SkippedRecord {
        handle: product.handle.clone(),
        variant_position: None,
        variant_id: None,
        reason,
    };
    if product.variants.is_empty() {
        outcome.skipped.push(product_skip(SkipReason::NoVariants));
        return;
    }
    if product.images.is_empty() {
        outcome.skipped.push(product_skip(SkipReason::NoImages));
        return;
    }

    let base = product_columns(product);

    for (idx, variant) in product.variants.iter().enumerate() {
        let valid = match validate_variant(variant) {
            Ok(valid) => valid,
            Err(field) => {
                tracing::warn!(
                    handle = %product.handle,
                    variant_position = idx + 1,
                    field,
                    "skipping variant with missing required field"
                );
                outcome.skipped.push(SkippedRecord {
                    handle: product.handle.clone(),
                    variant_position: Some(idx + 1),
                    variant_id: variant.id,
                    reason: SkipReason::MissingField { field },
                });
                continue;
            }
        };

        for (image_idx, image) in product.images.iter().enumerate() {
            outcome
                .rows
                .push(build_row(&base, &valid, image, image_idx));
        }
    }
}

/// Product-level cells shared by every row of the product.
fn product_columns(product: &ProductRecord) -> FlatRow {
    let option_name = |i: usize| {
        product
            .options
            .get(i)
            .map(|o| o.name.clone())
            .unwrap_or_default()
    };

    FlatRow {
        handle: product.handle.clone(),
        title: product.title.clone(),
        body_html: product.body_html.clone().unwrap_or_default(),
        vendor: product.vendor.clone().unwrap_or_default(),
        product_type: product.product_type.clone().unwrap_or_default(),
        tags: product.tags.join(", "),
        published: product.published_at.clone().unwrap_or_default(),
        option1_name: option_name(0),
        option2_name: option_name(1),
        option3_name: option_name(2),
        gift_card: "FALSE".to_owned(),
        status: "active".to_owned(),
        ..FlatRow::default()
    }
}

fn validate_variant(variant: &VariantRecord) -> Result<ValidVariant<'_>, &'static str> {
    fn require<'a, T>(
        value: &'a Required<T>,
        field: &'static str,
    ) -> Result<Option<&'a T>, &'static str> {
        value.as_ref().map(Option::as_ref).ok_or(field)
    }

    let sku = require(&variant.sku, "sku")?.cloned().unwrap_or_default();
    let price = require(&variant.price, "price")?
        .map(Scalar::to_cell)
        .unwrap_or_default();
    let grams = require(&variant.grams, "grams")?
        .map(Scalar::to_cell)
        .unwrap_or_default();
    let requires_shipping =
        require(&variant.requires_shipping, "requires_shipping")?.map_or("", |b| bool_cell(*b));
    let taxable = require(&variant.taxable, "taxable")?.map_or("", |b| bool_cell(*b));

    Ok(ValidVariant {
        variant,
        sku,
        price,
        grams,
        requires_shipping,
        taxable,
    })
}

fn build_row(
    base: &FlatRow,
    valid: &ValidVariant<'_>,
    image: &ImageRecord,
    image_idx: usize,
) -> FlatRow {
    let variant = valid.variant;
    let text = |value: &Option<String>| value.clone().unwrap_or_default();
    let position = image
        .position
        .map_or_else(|| (image_idx + 1).to_string(), |p| p.to_string());

    FlatRow {
        option1_value: text(&variant.option1),
        option2_value: text(&variant.option2),
        option3_value: text(&variant.option3),
        variant_sku: valid.sku.clone(),
        variant_grams: valid.grams.clone(),
        variant_inventory_tracker: text(&variant.inventory_management),
        variant_inventory_policy: variant
            .inventory_policy
            .clone()
            .unwrap_or_else(|| DEFAULT_INVENTORY_POLICY.to_owned()),
        variant_fulfillment_service: text(&variant.fulfillment_service),
        variant_price: valid.price.clone(),
        variant_compare_at_price: variant
            .compare_at_price
            .as_ref()
            .map(Scalar::to_cell)
            .unwrap_or_default(),
        variant_requires_shipping: valid.requires_shipping.to_owned(),
        variant_taxable: valid.taxable.to_owned(),
        variant_barcode: text(&variant.barcode),
        image_src: image.src.clone(),
        image_position: position,
        image_alt_text: text(&image.alt),
        variant_image: variant
            .image_id
            .map(|id| id.to_string())
            .unwrap_or_default(),
        variant_weight_unit: text(&variant.weight_unit),
        ..base.clone()
    }
}

#[cfg(test)]
#[path = "flatten_test.rs"]
mod tests;
