//! Tests for the resource client module

use super::*;
use crate::config::FeederConfig;
use crate::error::Error;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(base_url: &str) -> FeederConfig {
    FeederConfig::builder()
        .base_url(base_url)
        .version("v2")
        .access_key("key-123")
        .resource("documents")
        .build()
        .unwrap()
}

fn params_with_offset(offset: &str) -> crate::types::StringMap {
    let mut params = crate::types::StringMap::new();
    params.insert("offset".to_string(), offset.to_string());
    params.insert("descending".to_string(), "false".to_string());
    params
}

#[tokio::test]
async fn test_fetch_page_decodes_envelope() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/documents/feed"))
        .and(header(ACCESS_KEY_HEADER, "key-123"))
        .and(query_param("offset", "tok-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(AFFINITY_HEADER, "replica-a")
                .set_body_json(serde_json::json!({
                    "status": 0,
                    "items": [{"id": 1}, {"id": 2}],
                    "next_page": {"offset": "tok-2"},
                    "prev_page": {"offset": "tok-0"}
                })),
        )
        .mount(&server)
        .await;

    let client = HttpResourceClient::new(&test_config(&server.uri())).unwrap();
    let page = client
        .fetch_page(&params_with_offset("tok-1"), None)
        .await
        .unwrap();

    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0]["id"], 1);
    assert_eq!(page.next_offset, Some("tok-2".to_string()));
    assert_eq!(page.prev_offset, Some("tok-0".to_string()));
    assert_eq!(page.affinity, Some("replica-a".to_string()));
}

#[tokio::test]
async fn test_fetch_page_sends_affinity_header() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/documents/feed"))
        .and(header(AFFINITY_HEADER, "replica-a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": 0,
            "items": []
        })))
        .mount(&server)
        .await;

    let client = HttpResourceClient::new(&test_config(&server.uri())).unwrap();
    let page = client
        .fetch_page(&params_with_offset("tok-1"), Some("replica-a"))
        .await
        .unwrap();

    assert!(page.is_empty());
    assert_eq!(page.next_offset, None);
}

#[tokio::test]
async fn test_fetch_page_classifies_precondition_failed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/documents/feed"))
        .respond_with(ResponseTemplate::new(412).set_body_string("stale cursor"))
        .mount(&server)
        .await;

    let client = HttpResourceClient::new(&test_config(&server.uri())).unwrap();
    let err = client
        .fetch_page(&params_with_offset("tok-1"), None)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::PreconditionFailed { .. }));
}

#[tokio::test]
async fn test_fetch_page_classifies_rate_limited() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/documents/feed"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
        .mount(&server)
        .await;

    let client = HttpResourceClient::new(&test_config(&server.uri())).unwrap();
    let err = client
        .fetch_page(&params_with_offset("tok-1"), None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::RateLimited {
            retry_after_seconds: 7
        }
    ));
}

#[tokio::test]
async fn test_fetch_page_classifies_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/documents/feed"))
        .respond_with(ResponseTemplate::new(404).set_body_string("offset expired"))
        .mount(&server)
        .await;

    let client = HttpResourceClient::new(&test_config(&server.uri())).unwrap();
    let err = client
        .fetch_page(&params_with_offset("tok-old"), None)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::OffsetNotFound { .. }));
}

#[tokio::test]
async fn test_fetch_page_generic_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/documents/feed"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = HttpResourceClient::new(&test_config(&server.uri())).unwrap();
    let err = client
        .fetch_page(&params_with_offset("tok-1"), None)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 503, .. }));
    assert!(err.is_transient());
}

#[test]
fn test_client_rejects_invalid_base_url() {
    let config = FeederConfig::builder()
        .base_url("not a url")
        .resource("documents")
        .build()
        .unwrap();
    assert!(HttpResourceClient::new(&config).is_err());
}

#[test]
fn test_envelope_into_page() {
    let envelope: FeedEnvelope = serde_json::from_str(
        r#"{"status": 0, "items": [1, 2, 3], "next_page": {"offset": "a"}, "prev_page": null}"#,
    )
    .unwrap();
    let page = envelope.into_page(Some("replica-z".to_string()));
    assert_eq!(page.items.len(), 3);
    assert_eq!(page.next_offset, Some("a".to_string()));
    assert_eq!(page.prev_offset, None);
    assert_eq!(page.affinity, Some("replica-z".to_string()));
}
