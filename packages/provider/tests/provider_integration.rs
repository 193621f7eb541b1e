//! End-to-end lifecycle tests through the plugin router.
//!
//! Each test boots the full Axum router (same assembly as `main.rs`) and
//! drives it with `tower::ServiceExt::oneshot`. The Logz.io API is a wiremock
//! server; the provider is pointed at it through `base_url` in the
//! `/configure` call, exactly as a host would.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::{
    matchers::{body_partial_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

use logzio_provider::{
    api::{create_router, PluginState},
    config::Config,
    metrics::ProviderMetrics,
    provider::Provider,
};

// ---- Helpers ----------------------------------------------------------------

const TOKEN: &str = "integration-token";

/// Build the router and configure it against `server`.
///
/// Returns `(Router, Arc<ProviderMetrics>)` so tests can inspect counters.
async fn build_test_app(server: &MockServer) -> (Router, Arc<ProviderMetrics>) {
    let metrics = Arc::new(ProviderMetrics::new().unwrap());
    let provider = Arc::new(Provider::new(Config::default(), metrics.clone()));
    let app = create_router(PluginState {
        provider,
        metrics: metrics.clone(),
    });

    let (status, _) = send(
        &app,
        Method::POST,
        "/configure",
        Some(json!({"api_token": TOKEN, "base_url": server.uri()})),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    (app, metrics)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

fn remote_alert(id: i64, title: &str) -> Value {
    json!({
        "alertId": id,
        "title": title,
        "description": "checkout errors",
        "query_string": "service:checkout AND level:error",
        "filter": "",
        "operation": "GREATER_THAN_OR_EQUALS",
        "severityThresholdTiers": [
            {"severity": "HIGH", "threshold": 100},
            {"severity": "LOW", "threshold": 10}
        ],
        "searchTimeFrameMinutes": 15,
        "notificationEmails": ["oncall@example.com"],
        "isEnabled": true,
        "suppressNotificationsMinutes": 30,
        "valueAggregationType": "COUNT",
        "valueAggregationField": null,
        "groupByAggregationFields": null,
        "alertNotificationEndpoints": [21],
        "lastUpdated": "2024-05-02T08:00:00Z"
    })
}

fn alert_config(title: &str) -> Value {
    json!({
        "title": title,
        "description": "checkout errors",
        "query_string": "service:checkout AND level:error",
        "operation": "GREATER_THAN_OR_EQUALS",
        "severity_threshold_tiers": [
            {"severity": "HIGH", "threshold": 100},
            {"severity": "LOW", "threshold": 10}
        ],
        "search_timeframe_minutes": 15,
        "notification_emails": ["oncall@example.com"],
        "suppress_notifications_minutes": 30,
        "value_aggregation_type": "COUNT",
        "alert_notification_endpoints": [21]
    })
}

// ---- Alerts -----------------------------------------------------------------

#[tokio::test]
async fn alert_lifecycle_create_read_update_delete() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/alerts"))
        .and(header("X-API-TOKEN", TOKEN))
        .and(body_partial_json(json!({
            "title": "Checkout errors",
            "operation": "GREATER_THAN_OR_EQUALS",
            "alertNotificationEndpoints": [21]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(remote_alert(5, "Checkout errors")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/alerts/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(remote_alert(5, "Checkout errors")))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/alerts/5"))
        .and(body_partial_json(json!({"title": "Checkout errors (prod)", "isEnabled": true})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(remote_alert(5, "Checkout errors (prod)")),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v1/alerts/5"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/alerts/5"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let (app, metrics) = build_test_app(&server).await;

    let (status, created) = send(
        &app,
        Method::POST,
        "/resources/logzio_alert",
        Some(alert_config("Checkout errors")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["id"], "5");
    assert_eq!(created["title"], "Checkout errors");
    assert_eq!(created["severity_threshold_tiers"][1]["severity"], "LOW");
    assert_eq!(created["is_enabled"], true);

    let (status, read) = send(&app, Method::GET, "/resources/logzio_alert/5", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(read, created);

    let (status, updated) = send(
        &app,
        Method::PUT,
        "/resources/logzio_alert/5",
        Some(json!({"prior": created, "config": alert_config("Checkout errors (prod)")})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Checkout errors (prod)");
    assert_eq!(updated["query_string"], created["query_string"]);

    let (status, _) = send(&app, Method::DELETE, "/resources/logzio_alert/5", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, Method::GET, "/resources/logzio_alert/5", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "not_found");

    let ok = metrics
        .operations_total
        .with_label_values(&["logzio_alert", "create", "ok"])
        .get();
    assert!((ok - 1.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn alert_api_rejection_is_propagated_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/alerts"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_string(r#"{"errorCode":"ALERT/INVALID_QUERY","message":"bad query"}"#),
        )
        .mount(&server)
        .await;

    let (app, _) = build_test_app(&server).await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/resources/logzio_alert",
        Some(alert_config("Checkout errors")),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(
        body["error"],
        r#"Logz.io API returned HTTP 400: {"errorCode":"ALERT/INVALID_QUERY","message":"bad query"}"#
    );
}

#[tokio::test]
async fn malformed_id_is_rejected_without_api_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (app, _) = build_test_app(&server).await;
    let (status, body) = send(&app, Method::GET, "/resources/logzio_user/not-a-number", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_id");
}

// ---- Endpoints --------------------------------------------------------------

#[tokio::test]
async fn custom_endpoint_create_and_update() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/endpoints/custom"))
        .and(body_partial_json(json!({
            "endpointType": "Custom",
            "url": "https://hooks.example.com/logz",
            "method": "POST",
            "headers": "Authorization=Bearer abc,X-Source=logzio",
            "bodyTemplate": {"text": "{{alert_title}}"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 44})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/endpoints/44"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 44,
            "endpointType": "Custom",
            "title": "webhook",
            "description": "",
            "url": "https://hooks.example.com/logz",
            "method": "POST",
            "headers": "Authorization=Bearer abc,X-Source=logzio",
            "bodyTemplate": {"text": "{{alert_title}}"}
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/endpoints/custom/44"))
        .and(body_partial_json(json!({"method": "PUT", "title": "webhook"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 44})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/endpoints/44"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 44,
            "endpointType": "Custom",
            "title": "webhook",
            "description": "",
            "url": "https://hooks.example.com/logz",
            "method": "PUT",
            "headers": "Authorization=Bearer abc,X-Source=logzio",
            "bodyTemplate": {"text": "{{alert_title}}"}
        })))
        .mount(&server)
        .await;

    let (app, _) = build_test_app(&server).await;

    let config = json!({
        "endpoint_type": "custom",
        "title": "webhook",
        "custom": {
            "url": "https://hooks.example.com/logz",
            "method": "POST",
            "headers": {"X-Source": "logzio", "Authorization": "Bearer abc"},
            "body_template": "{\"text\": \"{{alert_title}}\"}"
        }
    });
    let (status, created) = send(&app, Method::POST, "/resources/logzio_endpoint", Some(config.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["id"], "44");
    assert_eq!(created["endpoint_type"], "custom");
    assert_eq!(created["custom"]["headers"]["X-Source"], "logzio");
    assert!(created.get("slack").is_none());

    let mut new_config = config;
    new_config["custom"]["method"] = json!("PUT");
    let (status, updated) = send(
        &app,
        Method::PUT,
        "/resources/logzio_endpoint/44",
        Some(json!({"prior": created, "config": new_config})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["custom"]["method"], "PUT");
}

#[tokio::test]
async fn endpoint_type_change_is_refused_in_place() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (app, _) = build_test_app(&server).await;
    let (status, body) = send(
        &app,
        Method::PUT,
        "/resources/logzio_endpoint/9",
        Some(json!({
            "prior": {"id": "9", "endpoint_type": "slack", "title": "t", "description": "", "slack": {"url": "https://hooks.slack.com/a"}},
            "config": {"endpoint_type": "datadog", "title": "t", "datadog": {"api_key": "k"}}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("requires replacing"));
}

// ---- Users ------------------------------------------------------------------

#[tokio::test]
async fn user_create_then_delete() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/user-management"))
        .and(body_partial_json(json!({"username": "sam@example.com", "accountId": 1000, "roles": [3]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 61})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/user-management/61"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 61,
            "username": "sam@example.com",
            "fullName": "Sam Admin",
            "accountId": 1000,
            "roles": [3],
            "active": true
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v1/user-management/61"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let (app, _) = build_test_app(&server).await;
    let (status, created) = send(
        &app,
        Method::POST,
        "/resources/logzio_user",
        Some(json!({
            "username": "sam@example.com",
            "fullname": "Sam Admin",
            "account_id": 1000,
            "roles": [3]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        created,
        json!({
            "id": "61",
            "username": "sam@example.com",
            "fullname": "Sam Admin",
            "account_id": 1000,
            "roles": [3],
            "active": true
        })
    );

    let (status, _) = send(&app, Method::DELETE, "/resources/logzio_user/61", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}
