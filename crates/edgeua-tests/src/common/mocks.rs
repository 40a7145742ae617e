// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Mock Implementations
//!
//! Test doubles for the host framework and the OPC UA wire.
//!
//! ## Design Principles
//!
//! - Configurable behavior for different test scenarios
//! - Recording of interactions for verification
//! - Thread-safe for concurrent testing
//! - Easy to set up error injection
//!
//! [`MockConnector`] hands out one shared [`MockTransport`]. Reopening it
//! flips it back to `Connected`, so values seeded on the transport survive a
//! reconnect the way they would on a real server.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tokio::sync::Notify;

use edgeua_core::{AsyncValues, Device, DeviceHost, DeviceResource, DriverError, DriverResult, Operation};
use edgeua_opcua::client::transport::status;
use edgeua_opcua::client::{
    CallResult, ConnectionSettings, DataChangeNotification, EndpointDescription, MonitoredItemNotification,
    NotificationSender, OpcUaConnector, OpcUaTransport, OpcUaValue, ReadResult, TransportResult, TransportState,
};
use edgeua_opcua::{NodeId, SecurityMode, SecurityPolicy, TransportError};

// =============================================================================
// Mock Host
// =============================================================================

/// An in-memory host with recorded readings.
#[derive(Default)]
pub struct MockHost {
    devices: RwLock<HashMap<String, Device>>,
    profiles: RwLock<HashMap<String, Vec<DeviceResource>>>,
    readings: Mutex<Vec<AsyncValues>>,
    reading_arrived: Notify,
    fail_readings: AtomicBool,
}

impl MockHost {
    /// Creates an empty host.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a device.
    pub fn put_device(&self, device: Device) {
        self.devices.write().insert(device.name.clone(), device);
    }

    /// Removes a device.
    pub fn remove_device(&self, name: &str) {
        self.devices.write().remove(name);
    }

    /// Adds a resource to a profile.
    pub fn add_resource(&self, profile: &str, resource: DeviceResource) {
        self.profiles
            .write()
            .entry(profile.to_string())
            .or_default()
            .push(resource);
    }

    /// Makes `send_readings` fail.
    pub fn fail_readings(&self, fail: bool) {
        self.fail_readings.store(fail, Ordering::SeqCst);
    }

    /// Returns every reading batch received so far.
    pub fn readings(&self) -> Vec<AsyncValues> {
        self.readings.lock().clone()
    }

    /// Waits until at least `count` batches arrived or `timeout` elapsed.
    pub async fn wait_for_readings(&self, count: usize, timeout: Duration) -> Vec<AsyncValues> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let notified = self.reading_arrived.notified();
            {
                let readings = self.readings.lock();
                if readings.len() >= count {
                    return readings.clone();
                }
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.readings();
            }
        }
    }
}

#[async_trait]
impl DeviceHost for MockHost {
    fn device_by_name(&self, name: &str) -> DriverResult<Device> {
        self.devices
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| DriverError::not_found(name, Operation::Manage, format!("device {}", name)))
    }

    fn device_resource(&self, device: &str, resource: &str) -> Option<DeviceResource> {
        let profile = self.devices.read().get(device)?.profile_name.clone();
        self.profiles
            .read()
            .get(&profile)?
            .iter()
            .find(|r| r.name == resource)
            .cloned()
    }

    fn devices(&self) -> Vec<Device> {
        self.devices.read().values().cloned().collect()
    }

    async fn send_readings(&self, values: AsyncValues) -> DriverResult<()> {
        if self.fail_readings.load(Ordering::SeqCst) {
            return Err(DriverError::connection(
                values.device_name,
                Operation::Subscribe,
                "mock host rejected readings",
            ));
        }
        self.readings.lock().push(values);
        self.reading_arrived.notify_waiters();
        Ok(())
    }
}

// =============================================================================
// Mock Transport
// =============================================================================

/// A recorded method call.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// Object node.
    pub object: NodeId,
    /// Method node.
    pub method: NodeId,
    /// Input arguments.
    pub arguments: Vec<OpcUaValue>,
}

/// A recorded monitored item.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedItem {
    /// Subscription the item was added to.
    pub subscription_id: u32,
    /// Monitored node.
    pub node: NodeId,
    /// Client handle.
    pub client_handle: u32,
}

/// A scripted OPC UA connection.
pub struct MockTransport {
    state: Mutex<TransportState>,
    values: Mutex<HashMap<NodeId, ReadResult>>,
    read_calls: Mutex<Vec<Vec<NodeId>>>,
    writes: Mutex<Vec<(NodeId, OpcUaValue)>>,
    calls: Mutex<Vec<RecordedCall>>,
    items: Mutex<Vec<RecordedItem>>,
    call_result: Mutex<CallResult>,
    sink: Mutex<Option<NotificationSender>>,
    sink_ready: Notify,
    read_delay: Mutex<Duration>,
    write_status: AtomicU32,
    monitor_status: AtomicU32,
    fail_reads: AtomicBool,
    next_subscription: AtomicU32,
    close_count: AtomicUsize,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self {
            state: Mutex::new(TransportState::Connected),
            values: Mutex::new(HashMap::new()),
            read_calls: Mutex::new(Vec::new()),
            writes: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            items: Mutex::new(Vec::new()),
            call_result: Mutex::new(CallResult::default()),
            sink: Mutex::new(None),
            sink_ready: Notify::new(),
            read_delay: Mutex::new(Duration::ZERO),
            write_status: AtomicU32::new(status::GOOD),
            monitor_status: AtomicU32::new(status::GOOD),
            fail_reads: AtomicBool::new(false),
            next_subscription: AtomicU32::new(1),
            close_count: AtomicUsize::new(0),
        }
    }
}

impl MockTransport {
    /// Creates a connected transport.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    // -------------------------------------------------------------------------
    // Scripting
    // -------------------------------------------------------------------------

    /// Sets the value a node reads as.
    pub fn set_value(&self, node: NodeId, value: OpcUaValue) {
        self.values.lock().insert(node, ReadResult::good(value));
    }

    /// Makes a node read with a bad status.
    pub fn set_bad(&self, node: NodeId, status_code: u32) {
        self.values.lock().insert(node, ReadResult::bad(status_code));
    }

    /// Forces the connection state.
    pub fn set_state(&self, state: TransportState) {
        *self.state.lock() = state;
    }

    /// Sets the result returned by every method call.
    pub fn set_call_result(&self, status_code: u32, outputs: Vec<OpcUaValue>) {
        *self.call_result.lock() = CallResult { status_code, outputs };
    }

    /// Sets the status returned by writes.
    pub fn set_write_status(&self, status_code: u32) {
        self.write_status.store(status_code, Ordering::SeqCst);
    }

    /// Sets the status returned when creating monitored items.
    pub fn set_monitor_status(&self, status_code: u32) {
        self.monitor_status.store(status_code, Ordering::SeqCst);
    }

    /// Makes every read request fail.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Delays every read request.
    pub fn set_read_delay(&self, delay: Duration) {
        *self.read_delay.lock() = delay;
    }

    /// Pushes a data change to the active subscription.
    ///
    /// Returns `false` if no subscription is active.
    pub fn notify(&self, items: Vec<(u32, OpcUaValue)>) -> bool {
        let notification = DataChangeNotification {
            items: items
                .into_iter()
                .map(|(client_handle, value)| MonitoredItemNotification {
                    client_handle,
                    value: Some(value),
                })
                .collect(),
        };
        self.sink
            .lock()
            .as_ref()
            .is_some_and(|sink| sink.send(notification).is_ok())
    }

    /// Waits until a subscription has been created.
    pub async fn wait_for_subscription(&self, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let notified = self.sink_ready.notified();
            if self.sink.lock().is_some() {
                return true;
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.sink.lock().is_some();
            }
        }
    }

    // -------------------------------------------------------------------------
    // Inspection
    // -------------------------------------------------------------------------

    /// Node lists of every read request, in order.
    pub fn read_calls(&self) -> Vec<Vec<NodeId>> {
        self.read_calls.lock().clone()
    }

    /// Every write, in order.
    pub fn writes(&self) -> Vec<(NodeId, OpcUaValue)> {
        self.writes.lock().clone()
    }

    /// Every method call, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Every monitored item created.
    pub fn monitored_items(&self) -> Vec<RecordedItem> {
        self.items.lock().clone()
    }

    /// Number of times the connection was closed.
    pub fn close_count(&self) -> usize {
        self.close_count.load(Ordering::SeqCst)
    }

    fn reopen(&self) {
        *self.state.lock() = TransportState::Connected;
    }

    fn check_open(&self, service: &'static str) -> TransportResult<()> {
        if self.state.lock().needs_reconnect() {
            return Err(TransportError::request(service, "connection is closed"));
        }
        Ok(())
    }
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("state", &*self.state.lock())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl OpcUaTransport for MockTransport {
    fn state(&self) -> TransportState {
        *self.state.lock()
    }

    async fn close(&self) -> TransportResult<()> {
        *self.state.lock() = TransportState::Closed;
        self.sink.lock().take();
        self.close_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn read_values(&self, nodes: &[NodeId], _max_age: Duration) -> TransportResult<Vec<ReadResult>> {
        self.check_open("read")?;
        self.read_calls.lock().push(nodes.to_vec());

        let delay = *self.read_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(TransportError::request("read", "mock read failure"));
        }

        let values = self.values.lock();
        Ok(nodes
            .iter()
            .map(|node| {
                values
                    .get(node)
                    .cloned()
                    .unwrap_or_else(|| ReadResult::bad(status::BAD_NODE_ID_UNKNOWN))
            })
            .collect())
    }

    async fn write_value(&self, node: &NodeId, value: OpcUaValue) -> TransportResult<u32> {
        self.check_open("write")?;
        self.writes.lock().push((node.clone(), value.clone()));

        let status_code = self.write_status.load(Ordering::SeqCst);
        if status::is_good(status_code) {
            self.values.lock().insert(node.clone(), ReadResult::good(value));
        }
        Ok(status_code)
    }

    async fn call_method(
        &self,
        object: &NodeId,
        method: &NodeId,
        arguments: Vec<OpcUaValue>,
    ) -> TransportResult<CallResult> {
        self.check_open("call")?;
        self.calls.lock().push(RecordedCall {
            object: object.clone(),
            method: method.clone(),
            arguments,
        });
        Ok(self.call_result.lock().clone())
    }

    async fn create_subscription(&self, _interval: Duration, sink: NotificationSender) -> TransportResult<u32> {
        self.check_open("subscribe")?;
        *self.sink.lock() = Some(sink);
        self.sink_ready.notify_waiters();
        Ok(self.next_subscription.fetch_add(1, Ordering::SeqCst))
    }

    async fn create_monitored_item(
        &self,
        subscription_id: u32,
        node: &NodeId,
        client_handle: u32,
    ) -> TransportResult<u32> {
        self.check_open("monitor")?;
        self.items.lock().push(RecordedItem {
            subscription_id,
            node: node.clone(),
            client_handle,
        });
        Ok(self.monitor_status.load(Ordering::SeqCst))
    }
}

// =============================================================================
// Mock Connector
// =============================================================================

/// Hands out a shared [`MockTransport`] and records connection attempts.
pub struct MockConnector {
    transport: Arc<MockTransport>,
    endpoints: Mutex<Vec<EndpointDescription>>,
    discovered_urls: Mutex<Vec<String>>,
    opened: Mutex<Vec<(EndpointDescription, ConnectionSettings)>>,
    discovery_delay: Mutex<Duration>,
    fail_discovery: AtomicBool,
    fail_open: AtomicBool,
}

impl MockConnector {
    /// Creates a connector whose server offers a `None`/`None` endpoint.
    pub fn new(transport: Arc<MockTransport>) -> Arc<Self> {
        Arc::new(Self {
            transport,
            endpoints: Mutex::new(vec![endpoint(SecurityPolicy::None, SecurityMode::None, 0)]),
            discovered_urls: Mutex::new(Vec::new()),
            opened: Mutex::new(Vec::new()),
            discovery_delay: Mutex::new(Duration::ZERO),
            fail_discovery: AtomicBool::new(false),
            fail_open: AtomicBool::new(false),
        })
    }

    /// Replaces the advertised endpoints.
    pub fn set_endpoints(&self, endpoints: Vec<EndpointDescription>) {
        *self.endpoints.lock() = endpoints;
    }

    /// Delays every discovery request, keeping connects in flight.
    pub fn set_discovery_delay(&self, delay: Duration) {
        *self.discovery_delay.lock() = delay;
    }

    /// Makes discovery fail.
    pub fn fail_discovery(&self, fail: bool) {
        self.fail_discovery.store(fail, Ordering::SeqCst);
    }

    /// Makes opening a session fail.
    pub fn fail_open(&self, fail: bool) {
        self.fail_open.store(fail, Ordering::SeqCst);
    }

    /// The shared transport.
    pub fn transport(&self) -> &Arc<MockTransport> {
        &self.transport
    }

    /// URLs passed to discovery, in order.
    pub fn discovered_urls(&self) -> Vec<String> {
        self.discovered_urls.lock().clone()
    }

    /// Number of discovery calls.
    pub fn discover_count(&self) -> usize {
        self.discovered_urls.lock().len()
    }

    /// Number of successful opens.
    pub fn open_count(&self) -> usize {
        self.opened.lock().len()
    }

    /// Endpoint and settings of every successful open.
    pub fn opened(&self) -> Vec<(EndpointDescription, ConnectionSettings)> {
        self.opened.lock().clone()
    }
}

#[async_trait]
impl OpcUaConnector for MockConnector {
    async fn discover_endpoints(&self, url: &str) -> TransportResult<Vec<EndpointDescription>> {
        self.discovered_urls.lock().push(url.to_string());
        let delay = *self.discovery_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_discovery.load(Ordering::SeqCst) {
            return Err(TransportError::Discovery {
                url: url.to_string(),
                message: "mock discovery failure".to_string(),
            });
        }
        Ok(self.endpoints.lock().clone())
    }

    async fn open(
        &self,
        endpoint: &EndpointDescription,
        settings: &ConnectionSettings,
    ) -> TransportResult<Arc<dyn OpcUaTransport>> {
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(TransportError::Open {
                url: endpoint.endpoint_url.clone(),
                message: "mock open failure".to_string(),
            });
        }
        self.opened.lock().push((endpoint.clone(), settings.clone()));
        self.transport.reopen();
        Ok(Arc::clone(&self.transport) as Arc<dyn OpcUaTransport>)
    }
}

/// Builds an endpoint description for a policy and mode.
pub fn endpoint(policy: SecurityPolicy, mode: SecurityMode, security_level: u8) -> EndpointDescription {
    EndpointDescription {
        endpoint_url: "opc.tcp://advertised-host:4840".to_string(),
        security_policy_uri: policy.uri(),
        security_mode: mode.to_value(),
        security_level,
    }
}
