// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # EdgeUA Integration Tests
//!
//! Integration tests and test doubles for the EdgeUA device service.
//!
//! ## Module Structure
//!
//! - [`common`]: Shared test utilities
//!   - `fixtures`: Boiler resources, node ids and config documents
//!   - `builders`: `DeviceBuilder` and `DriverRig`
//!   - `mocks`: `MockHost`, `MockConnector`, `MockTransport`
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p edgeua-tests
//! cargo test -p edgeua-tests --test integration_session
//! cargo test -p edgeua-tests --test integration_registry
//! cargo test -p edgeua-tests --test integration_api
//! cargo test -p edgeua-tests --test integration_config
//! ```
//!
//! ## Writing New Tests
//!
//! ```rust,ignore
//! use edgeua_tests::prelude::*;
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let rig = DriverRig::new().with_boiler().await;
//!     rig.transport.set_value(NodeFixtures::temperature(), OpcUaValue::Double(21.5));
//!     // ... drive rig.registry
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod common;

/// Re-export commonly used items for convenience.
pub mod prelude {
    pub use crate::common::builders::*;
    pub use crate::common::fixtures::*;
    pub use crate::common::init_test_logging;
    pub use crate::common::mocks::*;
}
