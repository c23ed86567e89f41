//! Attendance API contract tests.
//!
//! Verify the HTTP shape of every attendance call (auth header, paths,
//! query parameters) and the dispatcher's normalization over the real
//! client against canned service responses.

use std::sync::Arc;

use palaver::attendance::client::{AttendanceApi, AttendanceClient};
use palaver::attendance::{AttendanceResult, dispatch};
use palaver::config::AttendanceConfig;
use palaver::directive::Directive;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> AttendanceClient {
    let config = AttendanceConfig {
        base_url: server.uri(),
        api_key: "test_key_123".into(),
        timeout_secs: 5,
    };
    match AttendanceClient::new(&config) {
        Ok(c) => c,
        Err(e) => unreachable!("client builds: {e}"),
    }
}

fn directive(query_type: &str, parameters: &str) -> Directive {
    Directive {
        query_type: query_type.to_owned(),
        parameters: parameters.to_owned(),
    }
}

fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

// ── HTTP contract ───────────────────────────────────────────────────────────

#[tokio::test]
async fn records_sends_api_key_and_filters() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/attendance"))
        .and(header("X-API-KEY", "test_key_123"))
        .and(query_param("name", "Ana"))
        .and(query_param("date", "2025-09-05"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client.records(Some("Ana"), Some("2025-09-05")).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn records_without_filters_sends_no_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/attendance"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client.records(None, None).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn history_sends_name_and_limit() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/attendance/history"))
        .and(header("X-API-KEY", "test_key_123"))
        .and(query_param("name", "João"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client.history("João", 10).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn record_by_id_uses_path_segment() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/attendance/42"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"name": "Rui", "date": "2025-09-01"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client.record_by_id(42).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn status_probes_the_root() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client.status().await;
    assert!(matches!(result, Ok(v) if v["status"] == "ok"));
}

#[tokio::test]
async fn non_2xx_is_a_dispatch_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client.records(None, None).await;
    match result {
        Err(e) => {
            assert_eq!(e.code(), "DISPATCH_FAILED");
            assert!(e.message().contains("503"));
        }
        Ok(_) => unreachable!("request should fail"),
    }
}

// ── Dispatch over the real client ───────────────────────────────────────────

#[tokio::test]
async fn check_entry_round_trip_normalizes_entry_time() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/attendance"))
        .and(query_param("name", "João"))
        .and(query_param("date", today()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [{
                "name": "João",
                "date": today(),
                "time_entry": "08:42:00",
                "time_exit": null,
                "location": "Porto"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api: Arc<dyn AttendanceApi> = Arc::new(client_for(&server));
    let result = dispatch(api.as_ref(), &directive("check_entry", "João")).await;

    assert_eq!(
        result,
        AttendanceResult::CheckEntry {
            employee: "João".into(),
            has_entered: true,
            entry_time: Some("08:42:00".into()),
        }
    );
}

#[tokio::test]
async fn get_records_hoje_resolves_before_the_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/attendance"))
        .and(query_param("date", today()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "Ana", "date": today(), "time_entry": "09:00:00"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let api: Arc<dyn AttendanceApi> = Arc::new(client_for(&server));
    let result = dispatch(api.as_ref(), &directive("get_records", "date:hoje")).await;

    match result {
        AttendanceResult::Records { data } => {
            assert_eq!(data.len(), 1);
            assert_eq!(data[0].name, "Ana");
        }
        other => unreachable!("expected records, got {other:?}"),
    }
}

#[tokio::test]
async fn service_failure_becomes_error_result() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let api: Arc<dyn AttendanceApi> = Arc::new(client_for(&server));
    let result = dispatch(api.as_ref(), &directive("list_all", "")).await;

    match result {
        AttendanceResult::Error { error } => assert!(error.contains("500")),
        other => unreachable!("expected error variant, got {other:?}"),
    }
}
