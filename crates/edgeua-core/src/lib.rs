// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # edgeua-core
//!
//! Shared model and driver contracts for the EdgeUA device service.
//!
//! This crate provides the types and traits every other EdgeUA crate builds on:
//!
//! - **Types**: `Device`, `DeviceResource`, `CommandRequest`, `CommandValue`, `Value`
//! - **Error**: `DriverError` with device and operation context
//! - **Host**: `DeviceHost`, the services the host framework exposes to drivers
//! - **Driver**: `ProtocolDriver` and `MethodInvoker`
//!
//! ## Example
//!
//! ```
//! use edgeua_core::types::{CommandValue, Value, ValueType};
//!
//! let reading = CommandValue::new("Temperature", ValueType::Float64, Value::Float64(21.5));
//! assert_eq!(reading.value.as_f64(), Some(21.5));
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Core Modules
// =============================================================================

pub mod error;
pub mod types;

// =============================================================================
// Driver Contracts
// =============================================================================

pub mod driver;
pub mod host;

// =============================================================================
// Re-exports for convenience
// =============================================================================

pub use driver::{MethodInvoker, ProtocolDriver};
pub use error::{BoxError, DriverError, DriverResult, Operation};
pub use host::DeviceHost;
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
