// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! OPC UA client side.
//!
//! - **Transport Layer**: connector and transport traits the session talks to
//! - **Session Management**: per-device connection lifecycle and listener
//! - **Data Conversion**: the declared-type codec table
//! - **Endpoint Selection**: matching server endpoints to configured security
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       SessionManager                            │
//! │        (connect / reconnect / cleanup, listener task)           │
//! └─────────────────────────────────────────────────────────────────┘
//!            │                                      │
//!            ▼                                      ▼
//! ┌──────────────────────┐            ┌──────────────────────────────┐
//! │    ValueCoercer      │            │ OpcUaConnector/OpcUaTransport│
//! │  (codec table)       │            │   (wire, behind traits)      │
//! └──────────────────────┘            └──────────────────────────────┘
//! ```

mod conversion;
mod endpoint;
mod session;
pub mod subscription;
pub mod transport;
mod unavailable;

#[cfg(feature = "real-transport")]
mod real_transport;

pub use conversion::ValueCoercer;
pub use endpoint::select_endpoint;
pub use session::{SessionManager, SessionSettings, DEFAULT_REQUEST_TIMEOUT};
pub use subscription::{CLIENT_HANDLE_BASE, SUBSCRIPTION_INTERVAL};
pub use transport::{
    CallResult, ConnectionSettings, DataChangeNotification, EndpointDescription, MonitoredItemNotification,
    NotificationSender, OpcUaConnector, OpcUaTransport, OpcUaValue, ReadResult, TransportResult, TransportState,
};
pub use unavailable::UnavailableConnector;

#[cfg(feature = "real-transport")]
pub use real_transport::RealOpcUaConnector;
