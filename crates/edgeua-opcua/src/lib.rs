// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! OPC UA device driver for EdgeUA.
//!
//! This crate keeps one OPC UA session per configured device and translates
//! the host's read, write and method-call commands into OPC UA service
//! requests. Values are coerced between the host's declared resource types
//! and OPC UA variants; subscription notifications are pushed back to the
//! host as asynchronous readings.
//!
//! # Features
//!
//! - Lazy connection with endpoint selection by security policy and mode
//! - Reconnect on demand after the session closed or dropped
//! - Batched, deduplicated reads
//! - Method calls against `objectId`/`methodId` resources
//! - A subscription listener per device, restartable on configuration change
//!
//! # Error Handling
//!
//! ```text
//! OpcUaError
//! ├── NodeId        - Malformed node id strings
//! ├── Configuration - Invalid protocol properties
//! ├── Conversion    - Value coercion failures
//! └── Transport     - Discovery, session and service failures
//! ```
//!
//! Every error is converted into [`edgeua_core::DriverError`] before it
//! reaches the host.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use edgeua_core::ProtocolDriver;
//! use edgeua_opcua::{DeviceRegistry, SessionSettings, UnavailableConnector};
//!
//! let registry = DeviceRegistry::new(host, Arc::new(UnavailableConnector), SessionSettings::default());
//! registry.initialize().await?;
//! let readings = registry.handle_read_commands("boiler-1", &requests).await?;
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod client;
pub mod command;
pub mod error;
pub mod registry;
pub mod types;

pub use client::{
    select_endpoint, OpcUaConnector, OpcUaTransport, OpcUaValue, SessionManager, SessionSettings,
    UnavailableConnector, ValueCoercer, DEFAULT_REQUEST_TIMEOUT,
};
pub use command::{resolve_node, ReadPlan};
pub use error::{ConfigurationError, ConversionError, NodeIdError, OpcUaError, OpcUaResult, TransportError};
pub use registry::{DeviceRegistry, DRIVER_NAME};
pub use types::{NodeId, NodeIdentifier, OpcUaConfig, SecurityMode, SecurityPolicy};

#[cfg(feature = "real-transport")]
pub use client::RealOpcUaConnector;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
