//! HTML extraction for the homepage summary and key-page records.
//!
//! Parsing is synchronous and works on an already-fetched body; the returned
//! records own plain strings so no parsed document outlives the call.

use std::sync::LazyLock;

use reqwest::Url;
use scraper::{ElementRef, Html, Selector};

use crate::types::{HomepageSummary, KeyPageRecord, SectionGroup};

static SECTION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("section").expect("valid section selector"));
static IMG: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img").expect("valid img selector"));
static LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid link selector"));
static BODY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("valid body selector"));

/// Elements whose text content never renders.
const HIDDEN_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Builds the homepage summary: one [`SectionGroup`] per `<section>`, in
/// document order, holding its image sources and product links.
#[must_use]
pub fn parse_homepage(html: &str, page_url: &str) -> HomepageSummary {
    let document = Html::parse_document(html);
    let base = Url::parse(page_url).ok();

    let sections = document
        .select(&SECTION)
        .map(|section| SectionGroup {
            images: image_sources(section, base.as_ref()),
            product_links: section
                .select(&LINK)
                .filter_map(|a| a.value().attr("href"))
                .filter(|href| href.contains("/products/"))
                .filter_map(|href| resolve(href, base.as_ref()))
                .collect(),
        })
        .collect();

    HomepageSummary {
        url: page_url.to_owned(),
        sections,
    }
}

/// Builds a key-page record from the page's visible text and images.
#[must_use]
pub fn parse_key_page(html: &str, page_url: &str) -> KeyPageRecord {
    let document = Html::parse_document(html);
    let base = Url::parse(page_url).ok();
    let scope = document
        .select(&BODY)
        .next()
        .unwrap_or_else(|| document.root_element());

    KeyPageRecord {
        url: page_url.to_owned(),
        text: visible_text(scope),
        images: image_sources(scope, base.as_ref()),
    }
}

fn image_sources(scope: ElementRef<'_>, base: Option<&Url>) -> Vec<String> {
    scope
        .select(&IMG)
        .filter_map(|img| {
            let attrs = img.value();
            attrs
                .attr("src")
                .filter(|s| !s.trim().is_empty())
                .or_else(|| attrs.attr("data-src"))
        })
        .filter_map(|src| resolve(src, base))
        .collect()
}

/// Concatenates text nodes outside hidden elements, collapsing whitespace.
fn visible_text(scope: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in scope.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| HIDDEN_ELEMENTS.contains(&el.name()))
        });
        if hidden {
            continue;
        }
        for word in text.split_whitespace() {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(word);
        }
    }
    out
}

/// Resolves relative and protocol-relative references against the page URL.
/// `data:` URIs and unparseable references are dropped.
fn resolve(reference: &str, base: Option<&Url>) -> Option<String> {
    let reference = reference.trim();
    if reference.is_empty() || reference.starts_with("data:") {
        return None;
    }
    match base {
        Some(base) => base.join(reference).ok().map(String::from),
        None => Some(reference.to_owned()),
    }
}
