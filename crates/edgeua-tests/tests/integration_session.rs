// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Integration tests for per-device sessions.
//!
//! Reads, writes and method calls run through the registry against a mock
//! connection, covering reconnects, device gating and timeouts.

use std::time::Duration;

use edgeua_core::{CommandRequest, CommandValue, DriverError, MethodInvoker, ProtocolDriver, Value, ValueType};
use edgeua_opcua::client::transport::status;
use edgeua_opcua::client::TransportState;
use edgeua_opcua::{OpcUaValue, SecurityMode, SecurityPolicy, SessionSettings};
use edgeua_tests::prelude::*;

const WAIT: Duration = Duration::from_secs(2);

async fn boiler_rig() -> DriverRig {
    init_test_logging();
    let rig = DriverRig::new().with_boiler().await;
    assert!(rig.transport.wait_for_subscription(WAIT).await);
    rig
}

fn requests(resources: &[edgeua_core::DeviceResource]) -> Vec<CommandRequest> {
    resources.iter().map(|r| r.to_request()).collect()
}

// =============================================================================
// Read
// =============================================================================

#[tokio::test]
async fn test_read_deduplicates_shared_nodes() {
    let rig = boiler_rig().await;
    rig.transport.set_value(NodeFixtures::temperature(), OpcUaValue::Double(21.5));
    rig.transport.set_value(NodeFixtures::pressure(), OpcUaValue::Int32(1013));

    let reqs = requests(&[
        ResourceFixtures::temperature(),
        ResourceFixtures::pressure(),
        ResourceFixtures::temperature_alias(),
    ]);
    let values = rig.registry.handle_read_commands(BOILER_DEVICE, &reqs).await.unwrap();

    let reads = rig.transport.read_calls();
    assert_eq!(reads.len(), 1);
    assert_eq!(reads[0], vec![NodeFixtures::temperature(), NodeFixtures::pressure()]);

    assert_eq!(values.len(), 3);
    assert_eq!(values[0].as_ref().unwrap().value, Value::Float64(21.5));
    assert_eq!(values[1].as_ref().unwrap().value, Value::Int32(1013));
    let alias = values[2].as_ref().unwrap();
    assert_eq!(alias.resource_name, "TemperatureAlias");
    assert_eq!(alias.value, Value::Float32(21.5));
}

#[tokio::test]
async fn test_read_bad_status_leaves_gap() {
    let rig = boiler_rig().await;
    rig.transport.set_bad(NodeFixtures::temperature(), status::BAD_NODE_ID_UNKNOWN);
    rig.transport.set_value(NodeFixtures::running(), OpcUaValue::Boolean(true));

    let reqs = requests(&[ResourceFixtures::temperature(), ResourceFixtures::running()]);
    let values = rig.registry.handle_read_commands(BOILER_DEVICE, &reqs).await.unwrap();

    assert!(values[0].is_none());
    assert_eq!(values[1].as_ref().unwrap().value, Value::Bool(true));
}

#[tokio::test]
async fn test_empty_read_sends_nothing() {
    let rig = boiler_rig().await;

    let values = rig.registry.handle_read_commands(BOILER_DEVICE, &[]).await.unwrap();

    assert!(values.is_empty());
    assert!(rig.transport.read_calls().is_empty());
}

#[tokio::test]
async fn test_read_conversion_failure_fails_batch() {
    let rig = boiler_rig().await;
    rig.transport
        .set_value(NodeFixtures::pressure(), OpcUaValue::String("high".to_string()));

    let reqs = requests(&[ResourceFixtures::pressure()]);
    let err = rig.registry.handle_read_commands(BOILER_DEVICE, &reqs).await.unwrap_err();

    assert_eq!(err.error_type(), "value_conversion");
}

#[tokio::test]
async fn test_read_of_method_resource_rejected() {
    let rig = boiler_rig().await;

    let reqs = requests(&[ResourceFixtures::reset_method()]);
    let err = rig.registry.handle_read_commands(BOILER_DEVICE, &reqs).await.unwrap_err();

    assert_eq!(err.error_type(), "protocol");
    assert!(rig.transport.read_calls().is_empty());
}

#[tokio::test]
async fn test_read_transport_failure_is_connection_error() {
    let rig = boiler_rig().await;
    rig.transport.fail_reads(true);

    let reqs = requests(&[ResourceFixtures::temperature()]);
    let err = rig.registry.handle_read_commands(BOILER_DEVICE, &reqs).await.unwrap_err();

    assert_eq!(err.error_type(), "connection");
}

#[tokio::test]
async fn test_read_times_out() {
    init_test_logging();
    let rig = DriverRig::with_settings(SessionSettings::default().with_request_timeout(Duration::from_millis(50)))
        .with_boiler()
        .await;
    assert!(rig.transport.wait_for_subscription(WAIT).await);
    rig.transport.set_read_delay(Duration::from_millis(500));

    let reqs = requests(&[ResourceFixtures::temperature()]);
    let err = rig.registry.handle_read_commands(BOILER_DEVICE, &reqs).await.unwrap_err();

    assert!(matches!(err, DriverError::Timeout { timeout, .. } if timeout == Duration::from_millis(50)));
    assert!(err.is_retryable());
}

// =============================================================================
// Write
// =============================================================================

#[tokio::test]
async fn test_write_encodes_declared_type() {
    let rig = boiler_rig().await;

    let reqs = requests(&[ResourceFixtures::setpoint()]);
    let values = vec![CommandValue::new("Setpoint", ValueType::Float64, Value::Float64(65.0))];
    rig.registry
        .handle_write_commands(BOILER_DEVICE, &reqs, &values)
        .await
        .unwrap();

    assert_eq!(
        rig.transport.writes(),
        vec![(NodeFixtures::setpoint(), OpcUaValue::Double(65.0))]
    );
}

#[tokio::test]
async fn test_write_rejected_status_is_protocol_error() {
    let rig = boiler_rig().await;
    rig.transport.set_write_status(status::BAD_NOT_WRITABLE);

    let reqs = requests(&[ResourceFixtures::setpoint()]);
    let values = vec![CommandValue::new("Setpoint", ValueType::Float64, Value::Float64(65.0))];
    let err = rig
        .registry
        .handle_write_commands(BOILER_DEVICE, &reqs, &values)
        .await
        .unwrap_err();

    assert_eq!(err.error_type(), "protocol");
}

#[tokio::test]
async fn test_write_type_mismatch_sends_nothing() {
    let rig = boiler_rig().await;

    let reqs = requests(&[ResourceFixtures::pressure()]);
    let values = vec![CommandValue::new("Pressure", ValueType::Int32, Value::String("1".into()))];
    let err = rig
        .registry
        .handle_write_commands(BOILER_DEVICE, &reqs, &values)
        .await
        .unwrap_err();

    assert_eq!(err.error_type(), "value_conversion");
    assert!(rig.transport.writes().is_empty());
}

#[tokio::test]
async fn test_write_stops_at_first_failure() {
    let rig = boiler_rig().await;

    let reqs = requests(&[ResourceFixtures::setpoint(), ResourceFixtures::pressure()]);
    let values = vec![CommandValue::new("Setpoint", ValueType::Float64, Value::Float64(1.0))];
    let err = rig
        .registry
        .handle_write_commands(BOILER_DEVICE, &reqs, &values)
        .await
        .unwrap_err();

    assert_eq!(err.error_type(), "not_found");
    assert_eq!(rig.transport.writes().len(), 1);
}

// =============================================================================
// Method Calls
// =============================================================================

#[tokio::test]
async fn test_method_call_returns_first_output() {
    let rig = boiler_rig().await;
    rig.transport.set_call_result(
        status::GOOD,
        vec![OpcUaValue::Int32(42), OpcUaValue::String("ignored".into())],
    );

    let output = rig
        .registry
        .call_method(BOILER_DEVICE, "Reset", &["auto".to_string(), "5".to_string()])
        .await
        .unwrap();

    assert_eq!(output, Value::Int32(42));
    let calls = rig.transport.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].object, NodeFixtures::boiler());
    assert_eq!(calls[0].method, NodeFixtures::reset());
    assert_eq!(
        calls[0].arguments,
        vec![OpcUaValue::String("auto".into()), OpcUaValue::String("5".into())]
    );
}

#[tokio::test]
async fn test_hidden_method_rejected() {
    let rig = boiler_rig().await;

    let err = rig.registry.call_method(BOILER_DEVICE, "Calibrate", &[]).await.unwrap_err();

    assert!(matches!(err, DriverError::NotAllowed { .. }));
    assert!(err.to_string().contains("not allowed"));
    assert!(rig.transport.calls().is_empty());
}

#[tokio::test]
async fn test_unknown_method_not_found() {
    let rig = boiler_rig().await;

    let err = rig.registry.call_method(BOILER_DEVICE, "Explode", &[]).await.unwrap_err();

    assert_eq!(err.error_type(), "not_found");
}

#[tokio::test]
async fn test_method_without_output_fails() {
    let rig = boiler_rig().await;
    rig.transport.set_call_result(status::GOOD, Vec::new());

    let err = rig.registry.call_method(BOILER_DEVICE, "Reset", &[]).await.unwrap_err();

    assert!(err.to_string().contains("no output"));
}

#[tokio::test]
async fn test_method_bad_status_is_protocol_error() {
    let rig = boiler_rig().await;
    rig.transport
        .set_call_result(status::BAD_TYPE_MISMATCH, vec![OpcUaValue::Int32(1)]);

    let err = rig.registry.call_method(BOILER_DEVICE, "Reset", &[]).await.unwrap_err();

    assert_eq!(err.error_type(), "protocol");
}

// =============================================================================
// Connection Lifecycle
// =============================================================================

#[tokio::test]
async fn test_closed_transport_reconnects() {
    let rig = boiler_rig().await;
    assert_eq!(rig.connector.open_count(), 1);
    rig.transport.set_value(NodeFixtures::temperature(), OpcUaValue::Double(20.0));

    rig.transport.set_state(TransportState::Closed);
    let reqs = requests(&[ResourceFixtures::temperature()]);
    let values = rig.registry.handle_read_commands(BOILER_DEVICE, &reqs).await.unwrap();

    assert_eq!(rig.connector.open_count(), 2);
    assert_eq!(values[0].as_ref().unwrap().value, Value::Float64(20.0));
}

#[tokio::test]
async fn test_failed_reconnect_reports_client_not_initialized() {
    let rig = boiler_rig().await;
    rig.transport.set_state(TransportState::Closed);
    rig.connector.fail_open(true);

    let reqs = requests(&[ResourceFixtures::temperature()]);
    let err = rig.registry.handle_read_commands(BOILER_DEVICE, &reqs).await.unwrap_err();

    match &err {
        DriverError::Connection { message, source, .. } => {
            assert_eq!(message, "client not initialized");
            assert!(source.is_some());
        }
        other => panic!("expected connection error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_locked_device_is_gated() {
    init_test_logging();
    let rig = DriverRig::new();
    rig.add_device(DeviceBuilder::new("boiler-locked").locked().build()).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    let reqs = requests(&[ResourceFixtures::temperature()]);
    let err = rig
        .registry
        .handle_read_commands("boiler-locked", &reqs)
        .await
        .unwrap_err();

    assert_eq!(err.error_type(), "device_state");
    assert_eq!(rig.connector.discover_count(), 0);
}

#[tokio::test]
async fn test_down_device_rejects_method_calls() {
    init_test_logging();
    let rig = DriverRig::new();
    rig.add_device(DeviceBuilder::new("boiler-down").down().build()).await;

    let err = rig.registry.call_method("boiler-down", "Reset", &[]).await.unwrap_err();

    assert_eq!(err.error_type(), "device_state");
    assert!(rig.transport.calls().is_empty());
}

#[tokio::test]
async fn test_endpoint_selection_honors_security() {
    init_test_logging();
    let rig = DriverRig::new();
    rig.add_device(
        DeviceBuilder::new("boiler-secure")
            .security("Basic256Sha256", "SignAndEncrypt")
            .property("CertFile", "/etc/edgeua/client.pem")
            .property("KeyFile", "/etc/edgeua/client.key")
            .build(),
    )
    .await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Only a None/None endpoint is advertised.
    assert_eq!(rig.connector.open_count(), 0);
    assert!(rig.connector.discover_count() >= 1);

    let reqs = requests(&[ResourceFixtures::temperature()]);
    let err = rig
        .registry
        .handle_read_commands("boiler-secure", &reqs)
        .await
        .unwrap_err();
    assert_eq!(err.error_type(), "connection");

    rig.connector.set_endpoints(vec![
        endpoint(SecurityPolicy::Basic256Sha256, SecurityMode::SignAndEncrypt, 1),
        endpoint(SecurityPolicy::Basic256Sha256, SecurityMode::Sign, 9),
        endpoint(SecurityPolicy::Basic256Sha256, SecurityMode::SignAndEncrypt, 3),
    ]);
    rig.registry
        .handle_read_commands("boiler-secure", &reqs)
        .await
        .unwrap();

    let opened = rig.connector.opened();
    let (selected, settings) = opened.last().unwrap();
    assert_eq!(selected.security_level, 3);
    assert_eq!(selected.endpoint_url, ENDPOINT);
    assert_eq!(settings.device_name, "boiler-secure");
}
