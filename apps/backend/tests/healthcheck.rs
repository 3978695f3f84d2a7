// Health endpoints answer regardless of database state and never trigger a
// connection attempt themselves.

mod common;

use std::time::Duration;

use actix_web::http::StatusCode;
use actix_web::test;
use astrotalk_backend::db::{ConnectError, ConnectionState};
use astrotalk_backend::test_support::{
    create_test_app, lazy_database, test_guard, test_state, ScriptedConnector, TEST_DATABASE,
};
use astrotalk_backend::AllowedOrigins;
use serde_json::{json, Value};

use common::wait_for_state;

fn connector() -> ScriptedConnector<mongodb::Database> {
    ScriptedConnector::new(|| lazy_database(TEST_DATABASE))
}

#[actix_web::test]
async fn test_root_reports_ok_without_connecting() {
    let connector = connector();
    let calls = connector.handle();
    let guard = test_guard(connector, Duration::from_secs(5));
    let app = create_test_app(test_state(
        guard.clone(),
        AllowedOrigins::default(),
        Duration::from_millis(200),
    ))
    .await;

    let req = test::TestRequest::get().uri("/").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "status": "ok", "service": "Astrotalk API" }));

    assert_eq!(calls.calls(), 0);
    assert_eq!(guard.state(), ConnectionState::Disconnected);
}

#[actix_web::test]
async fn test_root_reports_ok_while_connecting() {
    let connector = ScriptedConnector::held(|| lazy_database(TEST_DATABASE));
    let control = connector.handle();
    let guard = test_guard(connector, Duration::from_secs(5));
    let app = create_test_app(test_state(
        guard.clone(),
        AllowedOrigins::default(),
        Duration::from_millis(200),
    ))
    .await;

    guard.connect_in_background();
    wait_for_state(&guard, ConnectionState::Connecting).await;

    let req = test::TestRequest::get().uri("/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    control.release(1);
    wait_for_state(&guard, ConnectionState::Connected).await;
}

#[actix_web::test]
async fn test_root_and_health_report_ok_after_failure() {
    let connector = connector().then_fail(ConnectError::Handshake("bad auth".to_string()));
    let guard = test_guard(connector, Duration::from_secs(30));
    let app = create_test_app(test_state(
        guard.clone(),
        AllowedOrigins::default(),
        Duration::from_millis(200),
    ))
    .await;

    assert!(guard.ensure_connected().await.is_err());
    assert_eq!(guard.state(), ConnectionState::Failed);

    let req = test::TestRequest::get().uri("/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "Astrotalk API");
    assert_eq!(body["db"], "failed");
    assert_eq!(body["db_attempts"], 1);
    assert!(body["db_retry_after_ms"].as_u64().unwrap() <= 30_000);
    assert!(body["time"].is_string());
}

#[actix_web::test]
async fn test_health_reports_connected() {
    let guard = test_guard(connector(), Duration::from_secs(5));
    let app = create_test_app(test_state(
        guard.clone(),
        AllowedOrigins::default(),
        Duration::from_millis(200),
    ))
    .await;

    guard.ensure_connected().await.expect("scripted connect succeeds");

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["db"], "connected");
    assert_eq!(body["db_attempts"], 1);
    assert!(body.get("db_retry_after_ms").is_none());
    assert_eq!(body["app_version"], env!("CARGO_PKG_VERSION"));
}

#[actix_web::test]
async fn test_responses_carry_request_id() {
    let guard = test_guard(connector(), Duration::from_secs(5));
    let app = create_test_app(test_state(
        guard,
        AllowedOrigins::default(),
        Duration::from_millis(200),
    ))
    .await;

    let req = test::TestRequest::get().uri("/").to_request();
    let resp = test::call_service(&app, req).await;

    let request_id = resp
        .headers()
        .get("x-request-id")
        .expect("x-request-id header should be present")
        .to_str()
        .unwrap();
    assert_eq!(request_id.len(), 36, "expected a uuid, got {request_id}");
}
