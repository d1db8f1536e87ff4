use super::*;

#[test]
fn sitemap_url_uses_store_root() {
    let url = StorefrontClient::sitemap_url("https://drinkcann.com/collections/all").unwrap();
    assert_eq!(url, "https://drinkcann.com/sitemap.xml");
}

#[test]
fn sitemap_url_bare_domain_with_trailing_slash() {
    let url = StorefrontClient::sitemap_url("https://drinkcann.com/").unwrap();
    assert_eq!(url, "https://drinkcann.com/sitemap.xml");
}

#[test]
fn sitemap_url_keeps_port() {
    let url = StorefrontClient::sitemap_url("http://127.0.0.1:8080").unwrap();
    assert_eq!(url, "http://127.0.0.1:8080/sitemap.xml");
}

#[test]
fn sitemap_url_rejects_invalid_origin() {
    let result = StorefrontClient::sitemap_url("not-a-url");
    let err = result.unwrap_err();
    assert!(
        matches!(err, ScraperError::InvalidShopUrl { .. }),
        "expected InvalidShopUrl, got: {err:?}"
    );
}

#[test]
fn store_origin_rejects_non_http_scheme() {
    let err = store_origin("ftp://drinkcann.com").unwrap_err();
    assert!(
        matches!(err, ScraperError::InvalidShopUrl { ref reason, .. } if reason.contains("ftp")),
        "expected InvalidShopUrl naming the scheme, got: {err:?}"
    );
}

#[test]
fn store_origin_trims_whitespace() {
    assert_eq!(
        store_origin("  https://drinkcann.com/pages/about \n").unwrap(),
        "https://drinkcann.com"
    );
}

#[test]
fn product_json_url_appends_extension() {
    assert_eq!(
        StorefrontClient::product_json_url("https://drinkcann.com/products/tea"),
        "https://drinkcann.com/products/tea.json"
    );
}

#[test]
fn product_json_url_strips_trailing_slash() {
    assert_eq!(
        StorefrontClient::product_json_url("https://drinkcann.com/products/tea/"),
        "https://drinkcann.com/products/tea.json"
    );
}

#[test]
fn key_page_url_normalizes_slashes() {
    assert_eq!(
        StorefrontClient::key_page_url("https://drinkcann.com/collections/all", "/pages/about")
            .unwrap(),
        "https://drinkcann.com/pages/about"
    );
    assert_eq!(
        StorefrontClient::key_page_url("https://drinkcann.com", "pages/faq").unwrap(),
        "https://drinkcann.com/pages/faq"
    );
}

#[test]
fn extract_domain_returns_host() {
    assert_eq!(
        extract_domain("https://drinkcann.com/products/tea.json"),
        "drinkcann.com"
    );
}

#[test]
fn extract_domain_falls_back_to_input() {
    assert_eq!(extract_domain("garbage"), "garbage");
}

#[test]
fn new_client_builds_with_zero_retries() {
    assert!(StorefrontClient::new(5, "shopsnap-test/0.1", 0, 0).is_ok());
}
