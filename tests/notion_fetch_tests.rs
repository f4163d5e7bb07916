use std::time::Duration;

use habits_etl::config::NotionCredentials;
use habits_etl::connectors::{FetchError, NotionClient, RecordSource};
use serde_json::json;
mod test_utils;
use test_utils::{notion_page, query_response};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, body_partial_json, header, method, path},
};

const QUERY_PATH: &str = "/databases/db123/query";

fn client(server: &MockServer, timeout: Duration) -> NotionClient {
    NotionClient::new(
        &server.uri(),
        NotionCredentials {
            token: "secret_test".to_string(),
            database_id: "db123".to_string(),
        },
        "2022-06-28",
        100,
        timeout,
    )
    .unwrap()
}

async fn mount_page(server: &MockServer, cursor: Option<&str>, response: ResponseTemplate) {
    let mock = Mock::given(method("POST")).and(path(QUERY_PATH));
    let mock = match cursor {
        None => mock.and(body_json(json!({"page_size": 100}))),
        Some(c) => mock.and(body_partial_json(json!({"start_cursor": c}))),
    };
    mock.respond_with(response).expect(1).mount(server).await;
}

#[tokio::test]
async fn test_pages_are_concatenated_in_order() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        None,
        ResponseTemplate::new(200).set_body_json(query_response(
            vec![
                notion_page("a", "Read", "2024-01-01", "Done"),
                notion_page("b", "Gym", "2024-01-01", "Skipped"),
            ],
            Some("c1"),
        )),
    )
    .await;
    mount_page(
        &server,
        Some("c1"),
        ResponseTemplate::new(200).set_body_json(query_response(
            vec![notion_page("c", "Read", "2024-01-02", "Done")],
            Some("c2"),
        )),
    )
    .await;
    mount_page(
        &server,
        Some("c2"),
        ResponseTemplate::new(200).set_body_json(query_response(
            vec![notion_page("d", "Gym", "2024-01-02", "Done")],
            None,
        )),
    )
    .await;

    let fetched = client(&server, Duration::from_secs(5))
        .fetch_all_records(None)
        .await;

    assert!(fetched.is_complete());
    assert_eq!(fetched.pages, 3);
    let ids: Vec<&str> = fetched
        .records
        .iter()
        .map(|r| r["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["a", "b", "c", "d"]);
}

#[tokio::test]
async fn test_request_carries_auth_and_version_headers() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(QUERY_PATH))
        .and(header("authorization", "Bearer secret_test"))
        .and(header("notion-version", "2022-06-28"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(query_response(vec![], None)))
        .expect(1)
        .mount(&server)
        .await;

    let fetched = client(&server, Duration::from_secs(5))
        .fetch_all_records(None)
        .await;

    assert!(fetched.is_complete());
    assert!(fetched.is_empty());
}

#[tokio::test]
async fn test_failure_after_first_page_keeps_earlier_records() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        None,
        ResponseTemplate::new(200).set_body_json(query_response(
            vec![notion_page("a", "Read", "2024-01-01", "Done")],
            Some("c1"),
        )),
    )
    .await;
    mount_page(
        &server,
        Some("c1"),
        ResponseTemplate::new(502).set_body_string("bad gateway"),
    )
    .await;

    let fetched = client(&server, Duration::from_secs(5))
        .fetch_all_records(None)
        .await;

    assert_eq!(fetched.len(), 1);
    assert_eq!(fetched.pages, 1);
    match fetched.interrupted {
        Some(FetchError::Http {
            status,
            body_snippet,
        }) => {
            assert_eq!(status, 502);
            assert_eq!(body_snippet.as_deref(), Some("bad gateway"));
        }
        other => panic!("expected HTTP interruption, got {other:?}"),
    }
}

#[tokio::test]
async fn test_first_page_failure_returns_nothing() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        None,
        ResponseTemplate::new(401).set_body_json(json!({
            "object": "error",
            "status": 401,
            "code": "unauthorized",
            "message": "API token is invalid."
        })),
    )
    .await;

    let fetched = client(&server, Duration::from_secs(5))
        .fetch_all_records(None)
        .await;

    assert!(fetched.is_empty());
    assert_eq!(fetched.pages, 0);
    let err = fetched.interrupted.expect("fetch should be interrupted");
    assert!(matches!(err, FetchError::Http { status: 401, .. }));
    assert!(err.to_string().contains("API token is invalid."));
}

#[tokio::test]
async fn test_limit_requests_a_single_page() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(QUERY_PATH))
        .and(body_json(json!({"page_size": 2})))
        .respond_with(ResponseTemplate::new(200).set_body_json(query_response(
            vec![
                notion_page("a", "Read", "2024-01-01", "Done"),
                notion_page("b", "Gym", "2024-01-01", "Done"),
            ],
            Some("c1"),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let fetched = client(&server, Duration::from_secs(5))
        .fetch_all_records(Some(2))
        .await;

    assert!(fetched.is_complete());
    assert_eq!(fetched.len(), 2);
    assert_eq!(fetched.pages, 1);
}

#[tokio::test]
async fn test_has_more_without_cursor_is_reported() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        None,
        ResponseTemplate::new(200).set_body_json(json!({
            "results": [notion_page("a", "Read", "2024-01-01", "Done")],
            "has_more": true,
            "next_cursor": null
        })),
    )
    .await;

    let fetched = client(&server, Duration::from_secs(5))
        .fetch_all_records(None)
        .await;

    assert_eq!(fetched.len(), 1);
    assert!(matches!(
        fetched.interrupted,
        Some(FetchError::MissingCursor)
    ));
}

#[tokio::test]
async fn test_malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        None,
        ResponseTemplate::new(200).set_body_string("<html>not json</html>"),
    )
    .await;

    let fetched = client(&server, Duration::from_secs(5))
        .fetch_all_records(None)
        .await;

    assert!(fetched.is_empty());
    assert!(matches!(fetched.interrupted, Some(FetchError::Decode(_))));
}

#[tokio::test]
async fn test_slow_upstream_times_out() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        None,
        ResponseTemplate::new(200)
            .set_body_json(query_response(vec![], None))
            .set_delay(Duration::from_secs(2)),
    )
    .await;

    let fetched = client(&server, Duration::from_millis(200))
        .fetch_all_records(None)
        .await;

    assert!(fetched.is_empty());
    match fetched.interrupted {
        Some(FetchError::Network(err)) => assert!(err.is_timeout()),
        other => panic!("expected timeout, got {other:?}"),
    }
}
