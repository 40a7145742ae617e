// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Integration tests for the device registry and subscription listener.

use std::sync::Arc;
use std::time::Duration;

use edgeua_core::{DriverError, ProtocolDriver, Value};
use edgeua_opcua::client::transport::status;
use edgeua_opcua::{DeviceRegistry, OpcUaValue, SessionSettings, DRIVER_NAME};
use edgeua_tests::prelude::*;

const WAIT: Duration = Duration::from_secs(2);

/// Polls until the device's subscription handle map has `count` entries.
async fn wait_for_handles(rig: &DriverRig, device: &str, count: usize) {
    let session = rig.registry.session(device).expect("session should exist");
    let deadline = tokio::time::Instant::now() + WAIT;
    while session.resource_map().await.len() < count {
        assert!(tokio::time::Instant::now() < deadline, "handles were not registered in time");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

async fn subscribed_rig(resources: &[&str]) -> DriverRig {
    init_test_logging();
    let rig = DriverRig::new();
    rig.add_device(DeviceBuilder::default().resources(resources).build()).await;
    assert!(rig.transport.wait_for_subscription(WAIT).await);
    rig
}

// =============================================================================
// Subscriptions
// =============================================================================

#[tokio::test]
async fn test_handles_follow_resource_positions() {
    let rig = subscribed_rig(&["Temperature", "Missing", "Pressure"]).await;
    wait_for_handles(&rig, BOILER_DEVICE, 2).await;

    let items = rig.transport.monitored_items();
    let handles: Vec<u32> = items.iter().map(|i| i.client_handle).collect();
    assert_eq!(handles, vec![42, 44]);
    assert_eq!(items[0].node, NodeFixtures::temperature());
    assert_eq!(items[1].node, NodeFixtures::pressure());

    let map = rig.registry.session(BOILER_DEVICE).unwrap().resource_map().await;
    assert_eq!(map.get(&42).map(String::as_str), Some("Temperature"));
    assert_eq!(map.get(&44).map(String::as_str), Some("Pressure"));
    assert!(!map.contains_key(&43));
}

#[tokio::test]
async fn test_blank_resource_keeps_its_slot() {
    let rig = subscribed_rig(&["Temperature", "", "Running"]).await;
    wait_for_handles(&rig, BOILER_DEVICE, 2).await;

    let handles: Vec<u32> = rig
        .transport
        .monitored_items()
        .iter()
        .map(|i| i.client_handle)
        .collect();
    assert_eq!(handles, vec![42, 44]);
}

#[tokio::test]
async fn test_notification_forwards_reading() {
    let rig = subscribed_rig(&["Temperature", "Pressure"]).await;
    wait_for_handles(&rig, BOILER_DEVICE, 2).await;

    assert!(rig.transport.notify(vec![(43, OpcUaValue::Int32(998))]));
    let readings = rig.host.wait_for_readings(1, WAIT).await;

    assert_eq!(readings.len(), 1);
    assert_eq!(readings[0].device_name, BOILER_DEVICE);
    assert_eq!(readings[0].values.len(), 1);
    assert_eq!(readings[0].values[0].resource_name, "Pressure");
    assert_eq!(readings[0].values[0].value, Value::Int32(998));
}

#[tokio::test]
async fn test_one_reading_per_notification_item() {
    let rig = subscribed_rig(&["Temperature", "Pressure"]).await;
    wait_for_handles(&rig, BOILER_DEVICE, 2).await;

    rig.transport.notify(vec![
        (42, OpcUaValue::Double(70.25)),
        (99, OpcUaValue::Int32(1)),
        (43, OpcUaValue::String("not a number".into())),
        (43, OpcUaValue::Int32(1001)),
    ]);
    let readings = rig.host.wait_for_readings(2, WAIT).await;

    let names: Vec<&str> = readings.iter().map(|r| r.values[0].resource_name.as_str()).collect();
    assert_eq!(names, vec!["Temperature", "Pressure"]);
    assert_eq!(readings[0].values[0].value, Value::Float64(70.25));
    assert_eq!(readings[1].values[0].value, Value::Int32(1001));
}

#[tokio::test]
async fn test_host_rejection_keeps_listening() {
    let rig = subscribed_rig(&["Temperature"]).await;
    wait_for_handles(&rig, BOILER_DEVICE, 1).await;

    rig.host.fail_readings(true);
    rig.transport.notify(vec![(42, OpcUaValue::Double(1.0))]);
    tokio::time::sleep(Duration::from_millis(20)).await;

    rig.host.fail_readings(false);
    rig.transport.notify(vec![(42, OpcUaValue::Double(2.0))]);
    let readings = rig.host.wait_for_readings(1, WAIT).await;

    assert_eq!(readings.len(), 1);
    assert_eq!(readings[0].values[0].value, Value::Float64(2.0));
}

#[tokio::test]
async fn test_monitor_failure_stops_listener() {
    init_test_logging();
    let rig = DriverRig::new();
    rig.transport.set_monitor_status(status::BAD_NODE_ID_UNKNOWN);
    rig.add_device(DeviceBuilder::default().resources(&["Temperature"]).build())
        .await;

    let session = rig.registry.session(BOILER_DEVICE).unwrap();
    let deadline = tokio::time::Instant::now() + WAIT;
    while session.is_listening().await {
        assert!(tokio::time::Instant::now() < deadline, "listener should stop");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(session.resource_map().await.is_empty());
}

// =============================================================================
// Device Lifecycle
// =============================================================================

#[tokio::test]
async fn test_initialize_seeds_from_host() {
    init_test_logging();
    let rig = DriverRig::new();
    rig.host.put_device(DeviceBuilder::new("boiler-a").build());
    rig.host.put_device(DeviceBuilder::new("boiler-b").locked().build());

    rig.registry.initialize().await.unwrap();

    assert_eq!(rig.registry.device_names(), vec!["boiler-a", "boiler-b"]);
    assert_eq!(rig.registry.name(), DRIVER_NAME);
}

#[tokio::test]
async fn test_locked_device_never_discovers() {
    init_test_logging();
    let rig = DriverRig::new();
    rig.add_device(DeviceBuilder::default().locked().resources(&["Temperature"]).build())
        .await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(rig.connector.discover_count(), 0);
    assert!(rig.transport.monitored_items().is_empty());
}

#[tokio::test]
async fn test_add_device_replaces_session() {
    let rig = subscribed_rig(&["Temperature"]).await;
    let first = rig.registry.session(BOILER_DEVICE).unwrap();

    rig.add_device(DeviceBuilder::default().resources(&["Pressure"]).build())
        .await;
    let second = rig.registry.session(BOILER_DEVICE).unwrap();

    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(rig.registry.len(), 1);
    assert!(rig.transport.close_count() >= 1);
}

#[tokio::test]
async fn test_update_device_resubscribes() {
    let rig = subscribed_rig(&["Temperature"]).await;
    wait_for_handles(&rig, BOILER_DEVICE, 1).await;
    let closes = rig.transport.close_count();

    let updated = DeviceBuilder::default().resources(&["Pressure", "Running"]).build();
    rig.host.put_device(updated.clone());
    rig.registry.update_device(&updated).await.unwrap();
    wait_for_handles(&rig, BOILER_DEVICE, 2).await;

    assert_eq!(rig.transport.close_count(), closes + 1);
    let map = rig.registry.session(BOILER_DEVICE).unwrap().resource_map().await;
    assert_eq!(map.get(&42).map(String::as_str), Some("Pressure"));
    assert_eq!(map.get(&43).map(String::as_str), Some("Running"));
}

#[tokio::test]
async fn test_unknown_device_operations_not_found() {
    init_test_logging();
    let rig = DriverRig::new();
    let ghost = DeviceBuilder::new("ghost").build();

    let err = rig.registry.update_device(&ghost).await.unwrap_err();
    assert!(matches!(err, DriverError::NotFound { .. }));

    let err = rig.registry.remove_device("ghost").await.unwrap_err();
    assert!(matches!(err, DriverError::NotFound { .. }));

    let err = rig.registry.handle_read_commands("ghost", &[]).await.unwrap_err();
    assert_eq!(err.error_type(), "not_found");
}

#[tokio::test]
async fn test_remove_device_closes_connection() {
    let rig = subscribed_rig(&["Temperature"]).await;

    rig.registry.remove_device(BOILER_DEVICE).await.unwrap();

    assert!(rig.registry.is_empty());
    assert!(rig.transport.close_count() >= 1);
    assert!(!rig.transport.notify(vec![(42, OpcUaValue::Double(1.0))]));
}

#[tokio::test]
async fn test_stop_releases_every_session() {
    init_test_logging();
    let rig = DriverRig::new();
    rig.add_device(DeviceBuilder::new("boiler-a").build()).await;
    rig.add_device(DeviceBuilder::new("boiler-b").build()).await;
    assert!(rig.transport.wait_for_subscription(WAIT).await);

    rig.registry.stop(false).await.unwrap();

    assert!(rig.registry.is_empty());
    assert!(rig.transport.close_count() >= 1);
}

#[tokio::test]
async fn test_forced_stop_does_not_wait_for_listener() {
    let rig = subscribed_rig(&["Temperature"]).await;

    tokio::time::timeout(WAIT, rig.registry.stop(true))
        .await
        .expect("forced stop should return promptly")
        .unwrap();
    assert!(rig.registry.is_empty());
}

// =============================================================================
// Concurrent Lifecycle
// =============================================================================

#[tokio::test]
async fn test_cleanup_stops_listener_queued_behind_connect() {
    let rig = subscribed_rig(&["Temperature"]).await;
    wait_for_handles(&rig, BOILER_DEVICE, 1).await;
    let session = rig.registry.session(BOILER_DEVICE).unwrap();
    let items_before = rig.transport.monitored_items().len();
    rig.connector.set_discovery_delay(Duration::from_millis(300));

    // The connect holds the session lock through discovery.
    let connecting = tokio::spawn({
        let session = Arc::clone(&session);
        async move { session.connect().await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Queued behind the connect; it runs after cleanup has swapped the token.
    let spawning = tokio::spawn({
        let session = Arc::clone(&session);
        async move { session.spawn_listener().await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    tokio::time::timeout(Duration::from_secs(3), session.cleanup(true))
        .await
        .expect("cleanup should not wait on a live listener");

    connecting.await.unwrap().unwrap();
    spawning.await.unwrap();
    assert!(!session.is_listening().await);
    assert_eq!(rig.transport.monitored_items().len(), items_before);
    assert!(session.resource_map().await.is_empty());
}

#[tokio::test]
async fn test_concurrent_updates_settle_on_one_listener() {
    let rig = subscribed_rig(&["Temperature"]).await;
    wait_for_handles(&rig, BOILER_DEVICE, 1).await;
    let session = rig.registry.session(BOILER_DEVICE).unwrap();
    rig.connector.set_discovery_delay(Duration::from_millis(100));

    let updated = DeviceBuilder::default().resources(&["Pressure", "Running"]).build();
    rig.host.put_device(updated.clone());

    let (_, first, second) = tokio::time::timeout(Duration::from_secs(5), async {
        tokio::join!(
            session.connect(),
            rig.registry.update_device(&updated),
            rig.registry.update_device(&updated),
        )
    })
    .await
    .expect("lifecycle operations should not deadlock");
    first.unwrap();
    second.unwrap();

    wait_for_handles(&rig, BOILER_DEVICE, 2).await;
    assert!(session.is_listening().await);
    let map = session.resource_map().await;
    assert_eq!(map.get(&42).map(String::as_str), Some("Pressure"));
    assert_eq!(map.get(&43).map(String::as_str), Some("Running"));

    tokio::time::timeout(WAIT, rig.registry.stop(false))
        .await
        .expect("stop should not hang after concurrent updates")
        .unwrap();
    assert!(rig.registry.is_empty());
}

// =============================================================================
// Validation and Discovery
// =============================================================================

#[tokio::test]
async fn test_validate_device_checks_properties() {
    let rig = DriverRig::new();

    assert!(rig.registry.validate_device(&DeviceBuilder::default().build()).is_ok());

    let err = rig
        .registry
        .validate_device(&DeviceBuilder::default().endpoint("").build())
        .unwrap_err();
    assert_eq!(err.error_type(), "config");

    let err = rig
        .registry
        .validate_device(&DeviceBuilder::default().security("Basic256", "Sign").build())
        .unwrap_err();
    assert!(err.to_string().contains("CertFile"));

    let err = rig
        .registry
        .validate_device(&DeviceBuilder::default().security("Aes128", "None").build())
        .unwrap_err();
    assert_eq!(err.error_type(), "config");
}

#[tokio::test]
async fn test_discover_not_supported() {
    let rig = DriverRig::new();

    let err = rig.registry.discover().await.unwrap_err();

    assert!(matches!(err, DriverError::NotSupported { .. }));
}

#[tokio::test]
async fn test_registry_debug_lists_devices() {
    init_test_logging();
    let rig = DriverRig::new();
    rig.add_device(DeviceBuilder::new("boiler-z").locked().build()).await;

    let debug = format!("{:?}", rig.registry);
    assert!(debug.contains("boiler-z"));

    let empty = DeviceRegistry::new(
        rig.host.clone(),
        rig.connector.clone(),
        SessionSettings::default(),
    );
    assert!(empty.is_empty());
}
