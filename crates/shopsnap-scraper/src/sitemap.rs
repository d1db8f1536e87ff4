//! Sitemap parsing and URL selection.
//!
//! Storefront sitemaps are two levels deep: `/sitemap.xml` is an index whose
//! `<loc>` entries point at child sitemaps (`sitemap_products_1.xml?...`,
//! `sitemap_pages_1.xml`, ...), and each product child sitemap lists product
//! detail URLs. Product child sitemaps also carry `<image:loc>` entries for
//! CDN-hosted product photos; those share the `/products/` path segment and
//! are removed by the `cdn` filter.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::ScraperError;

/// Extracts the text of every `<loc>` element in document order.
///
/// Elements are matched by local name, so namespaced variants such as
/// `<image:loc>` are included. Text with an entity that cannot be resolved is
/// kept verbatim. If the document turns malformed partway through, the
/// entries read before that point are returned and the error is logged.
///
/// # Errors
///
/// Returns [`ScraperError::Xml`] if the document is malformed before any
/// `<loc>` could be read.
pub fn parse_locs(xml: &str, context: &str) -> Result<Vec<String>, ScraperError> {
    let xml_err = |source: quick_xml::Error| ScraperError::Xml {
        context: context.to_owned(),
        source,
    };

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut locs = Vec::new();
    let mut in_loc = false;
    let mut current = String::new();

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) if locs.is_empty() => return Err(xml_err(e)),
            Err(e) => {
                tracing::warn!(
                    context,
                    error = %e,
                    position = reader.error_position(),
                    recovered = locs.len(),
                    "malformed sitemap XML, keeping entries read so far"
                );
                break;
            }
        };
        match event {
            Event::Start(e) if e.local_name().as_ref() == b"loc" => {
                in_loc = true;
                current.clear();
            }
            Event::End(e) if e.local_name().as_ref() == b"loc" => {
                in_loc = false;
                let value = current.trim();
                if !value.is_empty() {
                    locs.push(value.to_owned());
                }
            }
            Event::Text(e) if in_loc => match e.unescape() {
                Ok(text) => current.push_str(&text),
                Err(_) => current.push_str(&String::from_utf8_lossy(e.as_ref())),
            },
            Event::CData(e) if in_loc => {
                current.push_str(&String::from_utf8_lossy(e.as_ref()));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(locs)
}

/// Index entries pointing at product child sitemaps.
#[must_use]
pub fn is_product_sitemap(loc: &str) -> bool {
    loc.contains("products")
}

/// Child sitemap entries that are product detail pages rather than CDN assets.
#[must_use]
pub fn is_product_page(loc: &str) -> bool {
    loc.contains("/products/") && !loc.contains("cdn")
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sitemap><loc>https://shop.example.com/sitemap_products_1.xml?from=1&amp;to=99</loc></sitemap>
  <sitemap><loc>https://shop.example.com/sitemap_pages_1.xml</loc></sitemap>
  <sitemap><loc>https://shop.example.com/sitemap_collections_1.xml</loc></sitemap>
</sitemapindex>"#;

    const PRODUCTS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"
        xmlns:image="http://www.google.com/schemas/sitemap-image/1.1">
  <url><loc>https://shop.example.com/</loc></url>
  <url>
    <loc>https://shop.example.com/products/hi-boy</loc>
    <image:image>
      <image:loc>https://cdn.shop.example.com/s/files/1/products/hi-boy.png</image:loc>
      <image:title>Hi Boy</image:title>
    </image:image>
  </url>
  <url><loc><![CDATA[https://shop.example.com/products/hi-girl]]></loc></url>
</urlset>"#;

    #[test]
    fn parse_locs_unescapes_entities() {
        let locs = parse_locs(INDEX, "index").unwrap();
        assert_eq!(locs.len(), 3);
        assert_eq!(
            locs[0],
            "https://shop.example.com/sitemap_products_1.xml?from=1&to=99"
        );
    }

    #[test]
    fn parse_locs_includes_namespaced_and_cdata_entries() {
        let locs = parse_locs(PRODUCTS, "products").unwrap();
        assert_eq!(
            locs,
            vec![
                "https://shop.example.com/",
                "https://shop.example.com/products/hi-boy",
                "https://cdn.shop.example.com/s/files/1/products/hi-boy.png",
                "https://shop.example.com/products/hi-girl",
            ]
        );
    }

    #[test]
    fn parse_locs_rejects_mismatched_tags() {
        let result = parse_locs("<urlset><loc>https://a/products/x</lo></urlset>", "broken");
        assert!(
            matches!(result, Err(ScraperError::Xml { ref context, .. }) if context == "broken"),
            "expected Xml error, got: {result:?}"
        );
    }

    #[test]
    fn parse_locs_keeps_unknown_entities_verbatim() {
        let xml = "<urlset>\
            <url><loc>https://a.com/products/caf&eacute;</loc></url>\
            <url><loc>https://a.com/products/b</loc></url>\
            </urlset>";
        let locs = parse_locs(xml, "entities").unwrap();
        assert_eq!(
            locs,
            vec![
                "https://a.com/products/caf&eacute;",
                "https://a.com/products/b"
            ]
        );
    }

    #[test]
    fn parse_locs_keeps_entries_before_malformed_tail() {
        let xml = "<urlset>\
            <url><loc>https://a.com/products/a</loc></url>\
            <url><loc>https://a.com/products/b</lo></url>\
            </urlset>";
        let locs = parse_locs(xml, "truncated").unwrap();
        assert_eq!(locs, vec!["https://a.com/products/a"]);
    }

    #[test]
    fn parse_locs_empty_document_yields_nothing() {
        assert!(parse_locs("", "empty").unwrap().is_empty());
    }

    #[test]
    fn product_sitemap_filter_selects_products_entries_only() {
        let locs = parse_locs(INDEX, "index").unwrap();
        let selected: Vec<_> = locs.iter().filter(|l| is_product_sitemap(l)).collect();
        assert_eq!(selected.len(), 1);
        assert!(selected[0].contains("sitemap_products_1.xml"));
    }

    #[test]
    fn product_page_filter_excludes_cdn_assets() {
        let locs = parse_locs(PRODUCTS, "products").unwrap();
        let pages: Vec<_> = locs.into_iter().filter(|l| is_product_page(l)).collect();
        assert_eq!(
            pages,
            vec![
                "https://shop.example.com/products/hi-boy",
                "https://shop.example.com/products/hi-girl",
            ]
        );
    }

    #[test]
    fn product_page_filter_rejects_cdn_even_on_products_path() {
        assert!(!is_product_page(
            "https://shop.example.com/cdn/shop/products/a.jpg"
        ));
        assert!(is_product_page("https://shop.example.com/products/a"));
        assert!(!is_product_page("https://shop.example.com/collections/a"));
    }
}
