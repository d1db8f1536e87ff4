use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::Request;
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;

fn test_state(export_dir: &std::path::Path) -> AppState {
    test_state_with_timeout(export_dir, 5)
}

fn test_state_with_timeout(export_dir: &std::path::Path, timeout_secs: u64) -> AppState {
    let client =
        StorefrontClient::new(timeout_secs, "shopsnap-test/0.1", 0, 0).expect("client");
    AppState::new(
        Arc::new(client),
        ScrapeOptions {
            max_concurrent_requests: 2,
            task_timeout: Duration::from_secs(5),
            strict_variants: false,
        },
        ExportStore::new(export_dir),
    )
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

fn post_scrape(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    serde_json::from_slice(&body).expect("json parse")
}

/// Storefront with one product sitemap listing a single 2-variant, 1-image product.
async fn mount_storefront(server: &MockServer) {
    let uri = server.uri();
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "<sitemapindex><sitemap><loc>{uri}/sitemap_products_1.xml</loc></sitemap></sitemapindex>"
        )))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sitemap_products_1.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "<urlset><url><loc>{uri}/products/tea</loc></url></urlset>"
        )))
        .mount(server)
        .await;

    let variant = |id: i64, size: &str| {
        json!({
            "id": id,
            "sku": format!("TEA-{size}"),
            "price": "9.50",
            "grams": 250,
            "requires_shipping": true,
            "taxable": true,
            "option1": size
        })
    };
    Mock::given(method("GET"))
        .and(path("/products/tea.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({
            "product": {
                "handle": "tea",
                "title": "Tea",
                "vendor": "Acme",
                "tags": ["calm"],
                "options": [{"name": "Size", "values": ["S", "L"]}],
                "variants": [variant(1, "S"), variant(2, "L")],
                "images": [{"id": 9, "src": "https://cdn.shopify.com/tea.jpg", "position": 1}]
            }
        })))
        .mount(server)
        .await;
}

#[test]
fn api_error_codes_map_to_statuses() {
    let cases = [
        ("bad_request", StatusCode::BAD_REQUEST),
        ("not_found", StatusCode::NOT_FOUND),
        ("no_data", StatusCode::NOT_FOUND),
        ("validation_error", StatusCode::UNPROCESSABLE_ENTITY),
        ("parse_error", StatusCode::FAILED_DEPENDENCY),
        ("upstream_error", StatusCode::BAD_GATEWAY),
        ("upstream_timeout", StatusCode::GATEWAY_TIMEOUT),
        ("internal_error", StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (code, status) in cases {
        let response = ApiError::new("req-1", code, "msg").into_response();
        assert_eq!(response.status(), status, "code {code}");
    }
}

#[test]
fn map_scraper_error_hides_internal_details() {
    let io = ScraperError::Io(std::io::Error::other("disk on fire"));
    let err = map_scraper_error("req-1".to_owned(), &io);
    assert_eq!(err.error.code, "internal_error");
    assert!(!err.error.message.contains("disk"));

    let no_rows = ScraperError::NoRows {
        shop_url: "https://a.com".to_owned(),
    };
    assert_eq!(
        map_scraper_error("req-1".to_owned(), &no_rows).error.code,
        "no_data"
    );
}

#[tokio::test]
async fn health_returns_ok_with_request_id() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = build_app(test_state(dir.path()));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .header(REQUEST_ID_HEADER, "req-abc")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(REQUEST_ID_HEADER).unwrap(),
        "req-abc"
    );
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "ok");
    assert_eq!(json["meta"]["request_id"], "req-abc");
}

#[tokio::test]
async fn generates_request_id_when_absent() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = build_app(test_state(dir.path()));

    let response = app.oneshot(get("/api/v1/health")).await.expect("response");
    let id = response
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .expect("x-request-id header");
    assert!(Uuid::parse_str(id).is_ok());
}

#[tokio::test]
async fn scrape_rejects_invalid_shop_url() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = build_app(test_state(dir.path()));

    let response = app
        .oneshot(post_scrape(
            "/api/v1/scrape",
            &json!({"shop_url": "notaurl"}),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "bad_request");
}

#[tokio::test]
async fn scrape_rejects_malformed_body() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = build_app(test_state(dir.path()));

    let response = app
        .oneshot(post_scrape("/api/v1/scrape", &json!({"homepage": true})))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "bad_request");
}

#[tokio::test]
async fn scrape_reports_upstream_error_when_sitemap_missing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let app = build_app(test_state(dir.path()));
    let response = app
        .oneshot(post_scrape(
            "/api/v1/scrape",
            &json!({"shop_url": server.uri()}),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(response).await["error"]["code"], "upstream_error");
}

#[tokio::test]
async fn scrape_stores_artifacts_and_serves_latest() {
    let server = MockServer::start().await;
    mount_storefront(&server).await;

    let dir = tempfile::tempdir().expect("tempdir");
    let app = build_app(test_state(dir.path()));

    let response = app
        .clone()
        .oneshot(post_scrape(
            "/api/v1/scrape",
            &json!({"shop_url": format!("{}/collections/all", server.uri())}),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let data = &json["data"];
    assert_eq!(data["product_count"], 1);
    assert_eq!(data["row_count"], 2);
    assert_eq!(data["shop_url"], server.uri());
    let job_id = data["job_id"].as_str().expect("job id").to_owned();
    assert_eq!(
        data["artifacts"]["csv"],
        format!("/api/v1/exports/{job_id}/products.csv")
    );
    assert!(dir.path().join(&job_id).join("products.csv").exists());
    assert!(dir.path().join(&job_id).join("snapshot.json").exists());

    let response = app
        .clone()
        .oneshot(get("/api/v1/exports/latest/products.csv"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("text/csv")));
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let text = String::from_utf8(body.to_vec()).expect("utf8");
    assert_eq!(text.lines().count(), 3);
    assert!(text.starts_with("Handle,Title,"));
    assert!(text.contains("TEA-S"));
    assert!(text.contains("TEA-L"));

    let response = app
        .oneshot(get(&format!("/api/v1/exports/{job_id}/snapshot.json")))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let snapshot = body_json(response).await;
    assert_eq!(snapshot["products"][0]["handle"], "tea");
}

#[tokio::test]
async fn scrape_csv_format_returns_attachment() {
    let server = MockServer::start().await;
    mount_storefront(&server).await;

    let dir = tempfile::tempdir().expect("tempdir");
    let app = build_app(test_state(dir.path()));
    let response = app
        .oneshot(post_scrape(
            "/api/v1/scrape?format=csv",
            &json!({"shop_url": server.uri()}),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .expect("content-disposition")
        .to_owned();
    assert!(disposition.starts_with("attachment;"));
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    assert_eq!(String::from_utf8_lossy(&body).lines().count(), 3);
}

#[tokio::test]
async fn scrape_rejects_unknown_format() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = build_app(test_state(dir.path()));

    let response = app
        .oneshot(post_scrape(
            "/api/v1/scrape?format=xml",
            &json!({"shop_url": "https://shop.example.com"}),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn latest_export_is_not_found_before_any_job() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = build_app(test_state(dir.path()));

    let response = app
        .oneshot(get("/api/v1/exports/latest/products.csv"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"]["code"], "not_found");
}

#[tokio::test]
async fn export_with_malformed_job_id_is_bad_request() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = build_app(test_state(dir.path()));

    let response = app
        .oneshot(get("/api/v1/exports/not-a-uuid/snapshot.json"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn export_for_unknown_job_is_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = build_app(test_state(dir.path()));

    let response = app
        .oneshot(get(&format!(
            "/api/v1/exports/{}/products.csv",
            Uuid::new_v4()
        )))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn scrape_reports_upstream_timeout_when_sitemap_is_slow() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<sitemapindex></sitemapindex>")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let app = build_app(test_state_with_timeout(dir.path(), 1));
    let response = app
        .oneshot(post_scrape(
            "/api/v1/scrape",
            &json!({"shop_url": server.uri()}),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(
        body_json(response).await["error"]["code"],
        "upstream_timeout"
    );
}

#[tokio::test]
async fn scrape_csv_format_without_products_is_no_data() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<section></section>"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let app = build_app(test_state(dir.path()));
    let response = app
        .clone()
        .oneshot(post_scrape(
            "/api/v1/scrape?format=csv",
            &json!({"shop_url": server.uri(), "homepage": true, "products": false}),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"]["code"], "no_data");

    let response = app
        .oneshot(get("/api/v1/exports/latest/snapshot.json"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
