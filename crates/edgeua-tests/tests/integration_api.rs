// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Integration tests for the REST method endpoint.
//!
//! Requests go through the full router into a real [`DeviceRegistry`] backed
//! by the mock OPC UA connection.
//!
//! [`DeviceRegistry`]: edgeua_opcua::DeviceRegistry

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use edgeua_api::{ApiConfig, ApiServer, AppState, BaseResponse, PingResponse, CALL_PATH, CORRELATION_HEADER, PING_PATH};
use edgeua_core::MethodInvoker;
use edgeua_opcua::client::transport::status;
use edgeua_opcua::OpcUaValue;
use edgeua_tests::prelude::*;
use http_body_util::BodyExt;
use tower::ServiceExt;

// =============================================================================
// Helpers
// =============================================================================

async fn api_rig() -> (DriverRig, Router) {
    init_test_logging();
    let rig = DriverRig::new().with_boiler().await;
    assert!(rig.transport.wait_for_subscription(Duration::from_secs(2)).await);

    let state = AppState::builder()
        .config(ApiConfig::new().with_request_timeout(Duration::from_secs(5)))
        .invoker(Arc::clone(&rig.registry) as Arc<dyn MethodInvoker>)
        .service_name("edgeua-test")
        .build()
        .unwrap();
    let router = ApiServer::new(state).router();
    (rig, router)
}

fn call_request(body: &str, correlation_id: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(CALL_PATH)
        .header("content-type", "application/json");
    if let Some(id) = correlation_id {
        builder = builder.header(CORRELATION_HEADER, id);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, BaseResponse) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

// =============================================================================
// Method Calls
// =============================================================================

#[tokio::test]
async fn test_call_returns_method_output() {
    let (rig, router) = api_rig().await;
    rig.transport
        .set_call_result(status::GOOD, vec![OpcUaValue::String("reset done".into())]);

    let body = r#"{"device":"boiler-1","method":"Reset","parameters":["auto","5"]}"#;
    let (status, response) = send(router, call_request(body, Some("req-7"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response.id, "req-7");
    assert_eq!(response.message, "reset done");
    assert_eq!(response.status_code, 200);

    let calls = rig.transport.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].arguments,
        vec![OpcUaValue::String("auto".into()), OpcUaValue::String("5".into())]
    );
}

#[tokio::test]
async fn test_numeric_output_is_rendered_as_text() {
    let (rig, router) = api_rig().await;
    rig.transport.set_call_result(status::GOOD, vec![OpcUaValue::UInt16(7)]);

    let (_, response) = send(router, call_request(r#"{"device":"boiler-1","method":"Reset"}"#, None)).await;

    assert_eq!(response.message, "7");
}

#[tokio::test]
async fn test_correlation_id_generated_when_absent() {
    let (rig, router) = api_rig().await;
    rig.transport.set_call_result(status::GOOD, vec![OpcUaValue::Int32(1)]);

    let (_, response) = send(router, call_request(r#"{"device":"boiler-1","method":"Reset"}"#, None)).await;

    assert_eq!(response.id.len(), 36);
    assert_eq!(response.id.matches('-').count(), 4);
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let (rig, router) = api_rig().await;

    let (status, response) = send(router, call_request("{not json", Some("req-1"))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response.id, "req-1");
    assert_eq!(response.status_code, 400);
    assert!(rig.transport.calls().is_empty());
}

#[tokio::test]
async fn test_missing_device_is_bad_request() {
    let (_rig, router) = api_rig().await;

    let (status, response) = send(router, call_request(r#"{"method":"Reset"}"#, None)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response.message, "invalid request: device is required");
}

#[tokio::test]
async fn test_missing_method_is_bad_request() {
    let (_rig, router) = api_rig().await;

    let (status, response) = send(router, call_request(r#"{"device":"boiler-1"}"#, None)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response.message, "invalid request: method is required");
}

#[tokio::test]
async fn test_unknown_device_hides_details() {
    let (_rig, router) = api_rig().await;

    let (status, response) = send(router, call_request(r#"{"device":"ghost","method":"Reset"}"#, None)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.message, "error interacting with device");
    assert_eq!(response.status_code, 500);
}

#[tokio::test]
async fn test_hidden_method_is_refused() {
    let (rig, router) = api_rig().await;

    let (status, _) = send(
        router,
        call_request(r#"{"device":"boiler-1","method":"Calibrate"}"#, None),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(rig.transport.calls().is_empty());
}

#[tokio::test]
async fn test_failed_call_status_is_server_error() {
    let (rig, router) = api_rig().await;
    rig.transport.set_call_result(status::BAD_TYPE_MISMATCH, Vec::new());

    let (status, response) = send(router, call_request(r#"{"device":"boiler-1","method":"Reset"}"#, None)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.message, "error interacting with device");
}

// =============================================================================
// Ping
// =============================================================================

#[tokio::test]
async fn test_ping_reports_service() {
    let (_rig, router) = api_rig().await;

    let request = Request::builder().uri(PING_PATH).body(Body::empty()).unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let ping: PingResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(ping.service_name, "edgeua-test");
    assert_eq!(ping.api_version, "v4");
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let (_rig, router) = api_rig().await;

    let request = Request::builder().uri("/api/v4/nothing").body(Body::empty()).unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
