//! Integration tests for the reqwest fetcher, caching and XML helpers.

use std::sync::Arc;
use std::time::Duration;

use ogc_common::OgcError;
use ogc_http::{
    fetch_bytes, fetch_xml, post_xml, CachingFetcher, CancellationToken, HttpConfig, HttpFetcher,
    MemoryResponseCache, ReqwestFetcher,
};
use url::Url;
use wiremock::matchers::{body_string_contains, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher() -> ReqwestFetcher {
    ReqwestFetcher::new(&HttpConfig::default()).unwrap()
}

fn xml_response(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/xml")
}

#[tokio::test]
async fn test_fetch_xml_parses_capabilities() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wms"))
        .and(query_param("REQUEST", "GetCapabilities"))
        .respond_with(xml_response(test_utils::wms::WORLD_130))
        .mount(&server)
        .await;

    let url = Url::parse(&format!("{}/wms?SERVICE=WMS&REQUEST=GetCapabilities", server.uri())).unwrap();
    let doc = fetch_xml(&fetcher(), &url, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(doc.root().attribute("version"), Some("1.3.0"));
}

#[tokio::test]
async fn test_exception_report_becomes_service_exception() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(xml_response(test_utils::wfs::EXCEPTION_REPORT))
        .mount(&server)
        .await;

    let url = Url::parse(&format!("{}/wfs", server.uri())).unwrap();
    let err = fetch_xml(&fetcher(), &url, &CancellationToken::new())
        .await
        .unwrap_err();
    match err {
        OgcError::ServiceException { code, .. } => {
            assert_eq!(code.as_deref(), Some("InvalidParameterValue"))
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_http_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let url = Url::parse(&format!("{}/wms", server.uri())).unwrap();
    let err = fetch_xml(&fetcher(), &url, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, OgcError::HttpStatus { status: 500, .. }));
}

#[tokio::test]
async fn test_post_xml_sends_body_and_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/wfs"))
        .and(header("content-type", "text/xml"))
        .and(body_string_contains("<wfs:GetFeature"))
        .respond_with(xml_response(test_utils::wfs::FEATURES_GML2))
        .expect(1)
        .mount(&server)
        .await;

    let url = Url::parse(&format!("{}/wfs", server.uri())).unwrap();
    let doc = post_xml(
        &fetcher(),
        &url,
        "<wfs:GetFeature service=\"WFS\"/>".to_string(),
        &CancellationToken::new(),
    )
    .await
    .unwrap();
    assert_eq!(doc.root().local_name(), "FeatureCollection");
}

#[tokio::test]
async fn test_basic_auth_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header_exists("authorization"))
        .respond_with(xml_response("<ok/>"))
        .mount(&server)
        .await;

    let config = HttpConfig {
        username: Some("alice".to_string()),
        password: Some("secret".to_string()),
        ..HttpConfig::default()
    };
    let fetcher = ReqwestFetcher::new(&config).unwrap();
    let url = Url::parse(&format!("{}/secure", server.uri())).unwrap();
    let response = fetcher.get(&url).await.unwrap();
    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn test_fetch_bytes_returns_image() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/png")
                .set_body_bytes(vec![0x89, b'P', b'N', b'G']),
        )
        .mount(&server)
        .await;

    let url = Url::parse(&format!("{}/wms?REQUEST=GetMap", server.uri())).unwrap();
    let (content_type, body) = fetch_bytes(&fetcher(), &url, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(content_type.as_deref(), Some("image/png"));
    assert_eq!(&body[1..], b"PNG");
}

#[tokio::test]
async fn test_fetch_bytes_sniffs_mislabelled_exception() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(test_utils::wms::EXCEPTION_REPORT, "text/plain"),
        )
        .mount(&server)
        .await;

    let url = Url::parse(&format!("{}/wms?REQUEST=GetMap", server.uri())).unwrap();
    let err = fetch_bytes(&fetcher(), &url, &CancellationToken::new())
        .await
        .unwrap_err();
    match err {
        OgcError::ServiceException { code, message } => {
            assert_eq!(code.as_deref(), Some("LayerNotDefined"));
            assert_eq!(message, "Layer 'missing' is not defined");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_caching_fetcher_serves_repeat_get_from_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(xml_response(test_utils::wms::WORLD_130))
        .expect(1)
        .mount(&server)
        .await;

    let cache = Arc::new(MemoryResponseCache::new(1024 * 1024, Duration::from_secs(60)));
    let caching = CachingFetcher::new(Arc::new(fetcher()), cache.clone());
    let url = Url::parse(&format!("{}/wms?REQUEST=GetCapabilities", server.uri())).unwrap();

    let token = CancellationToken::new();
    fetch_xml(&caching, &url, &token).await.unwrap();
    fetch_xml(&caching, &url, &token).await.unwrap();

    let stats = cache.stats();
    assert_eq!(stats.hits.load(std::sync::atomic::Ordering::Relaxed), 1);
}

#[tokio::test]
async fn test_caching_fetcher_never_caches_post() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(xml_response("<ok/>"))
        .expect(2)
        .mount(&server)
        .await;

    let cache = Arc::new(MemoryResponseCache::new(1024, Duration::from_secs(60)));
    let caching = CachingFetcher::new(Arc::new(fetcher()), cache.clone());
    let url = Url::parse(&format!("{}/wfs", server.uri())).unwrap();
    for _ in 0..2 {
        caching.post(&url, "<q/>".to_string(), "text/xml").await.unwrap();
    }
    assert!(cache.is_empty().await);
}

#[tokio::test]
async fn test_cancellation_aborts_slow_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(xml_response("<slow/>").set_delay(Duration::from_secs(10)))
        .mount(&server)
        .await;

    let url = Url::parse(&format!("{}/slow", server.uri())).unwrap();
    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let started = std::time::Instant::now();
    let err = fetch_xml(&fetcher(), &url, &token).await.unwrap_err();
    assert!(matches!(err, OgcError::Cancelled));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_transport_error_for_unreachable_host() {
    let url = Url::parse("http://127.0.0.1:9/unreachable").unwrap();
    let config = HttpConfig {
        timeout_secs: 2,
        connect_timeout_secs: 1,
        ..HttpConfig::default()
    };
    let err = ReqwestFetcher::new(&config)
        .unwrap()
        .get(&url)
        .await
        .unwrap_err();
    assert!(err.is_transport());
}
