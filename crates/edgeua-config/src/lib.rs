// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # edgeua-config
//!
//! Configuration management for the edgeua OPC UA device service.
//!
//! ## Features
//!
//! - **Schema Definition**: service, API, logging, profiles and devices
//! - **Multi-Format Support**: YAML, TOML, and JSON configuration files
//! - **Environment Overrides**: `EDGEUA_*` variables and `${VAR:default}` placeholders
//!
//! ## Quick Start
//!
//! ```no_run
//! use edgeua_config::loader::load_config;
//!
//! let config = load_config("edgeua.yaml").unwrap();
//! println!("Devices: {}", config.devices.len());
//! ```
//!
//! Protocol properties are carried through untouched; the driver validates
//! them.

#![warn(missing_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Modules
// =============================================================================

pub mod error;
pub mod loader;
pub mod schema;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{ConfigError, ConfigResult};
pub use loader::{load_config, load_config_str, ConfigFormat, ConfigLoader, ConfigLoaderBuilder};
pub use schema::{
    ApiConfig, DeviceConfig, EdgeUaConfig, LogFormat, LogLevel, LoggingConfig, ProfileConfig, ResourceConfig,
    ServiceConfig,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name() {
        assert_eq!(NAME, "edgeua-config");
    }
}
