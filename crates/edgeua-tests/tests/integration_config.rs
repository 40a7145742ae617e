// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Integration tests for configuration loading.

use std::fs;
use std::path::Path;
use std::time::Duration;

use edgeua_config::{load_config, ConfigError, ConfigLoader, LogFormat, LogLevel};
use edgeua_core::{lookup, AdminState, ProtocolDriver, ValueType};
use edgeua_tests::common::temp_test_dir;
use edgeua_tests::prelude::*;

fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

/// A loader whose env overrides cannot collide with other tests.
fn isolated_loader(prefix: &str) -> ConfigLoader {
    ConfigLoader::builder().env_prefix(prefix).build()
}

// =============================================================================
// Formats
// =============================================================================

#[test]
fn test_load_yaml_file() {
    let dir = temp_test_dir("edgeua-yaml");
    let path = write(dir.path(), "edgeua.yaml", ConfigFixtures::yaml());

    let config = isolated_loader("EDGEUA_IT_YAML").load(&path).unwrap();

    assert_eq!(config.service.name, "edgeua-test");
    assert_eq!(config.service.request_timeout, Duration::from_secs(5));
    assert_eq!(config.api.port, 59990);
    assert_eq!(config.logging.level, LogLevel::Debug);
    assert_eq!(config.logging.format, LogFormat::Json);
    assert_eq!(config.devices.len(), 2);

    let locked = config.device("boiler-2").unwrap();
    assert_eq!(locked.admin_state, AdminState::Locked);

    let resources = config.profile("boiler").unwrap().to_resources().unwrap();
    assert_eq!(resources[0].value_type, ValueType::Float64);
    assert_eq!(
        lookup(&resources[1].attributes, "methodId").and_then(|v| v.as_str()),
        Some("ns=2;s=Boiler.Reset")
    );
}

#[test]
fn test_load_toml_file() {
    let dir = temp_test_dir("edgeua-toml");
    let path = write(dir.path(), "edgeua.toml", ConfigFixtures::toml());

    let config = isolated_loader("EDGEUA_IT_TOML").load(&path).unwrap();

    assert_eq!(config.devices.len(), 1);
    let props = &config.devices[0].protocols["opcua"];
    assert_eq!(props["Resources"], serde_json::json!(["Temperature"]));
}

#[test]
fn test_load_json_file() {
    let dir = temp_test_dir("edgeua-json");
    let path = write(dir.path(), "edgeua.json", ConfigFixtures::json());

    let config = isolated_loader("EDGEUA_IT_JSON").load(&path).unwrap();

    assert_eq!(config.service.name, "edgeua-test");
    assert!(config.api.enabled);
}

#[test]
fn test_unknown_extension_rejected() {
    let dir = temp_test_dir("edgeua-ext");
    let path = write(dir.path(), "edgeua.ini", "[service]");

    let err = load_config(&path).unwrap_err();

    assert!(matches!(err, ConfigError::UnsupportedFormat { .. }));
}

#[test]
fn test_missing_file() {
    let dir = temp_test_dir("edgeua-missing");

    let err = load_config(dir.path().join("absent.yaml")).unwrap_err();

    assert!(matches!(err, ConfigError::FileNotFound { .. }));
}

// =============================================================================
// Resolution
// =============================================================================

#[test]
fn test_relative_credentials_resolved_against_config_dir() {
    let dir = temp_test_dir("edgeua-paths");
    let path = write(dir.path(), "edgeua.yaml", ConfigFixtures::yaml());

    let config = isolated_loader("EDGEUA_IT_PATHS").load(&path).unwrap();

    let props = &config.device("boiler-2").unwrap().protocols["opcua"];
    let cert = lookup(props, "CertFile").and_then(|v| v.as_str()).unwrap();
    let key = lookup(props, "KeyFile").and_then(|v| v.as_str()).unwrap();
    assert_eq!(Path::new(cert), dir.path().join("certs/client.pem"));
    assert_eq!(Path::new(key), dir.path().join("certs/client.key"));
}

#[test]
fn test_placeholder_defaults_applied() {
    let dir = temp_test_dir("edgeua-placeholders");
    let content = r#"
service:
  name: ${EDGEUA_IT_UNSET_NAME:edgeua-default}
api:
  port: ${EDGEUA_IT_UNSET_PORT:59981}
"#;
    let path = write(dir.path(), "edgeua.yaml", content);

    let config = isolated_loader("EDGEUA_IT_PH").load(&path).unwrap();

    assert_eq!(config.service.name, "edgeua-default");
    assert_eq!(config.api.port, 59981);
}

#[test]
fn test_env_overrides_take_precedence() {
    std::env::set_var("EDGEUA_IT_OVR_SERVICE_NAME", "edgeua-from-env");
    std::env::set_var("EDGEUA_IT_OVR_REQUEST_TIMEOUT", "1500ms");

    let dir = temp_test_dir("edgeua-env");
    let path = write(dir.path(), "edgeua.yaml", ConfigFixtures::yaml());
    let config = isolated_loader("EDGEUA_IT_OVR").load(&path).unwrap();

    assert_eq!(config.service.name, "edgeua-from-env");
    assert_eq!(config.service.request_timeout, Duration::from_millis(1500));
    assert_eq!(config.api.port, 59990);
}

// =============================================================================
// Validation
// =============================================================================

#[test]
fn test_unknown_profile_rejected() {
    let json = r#"{
  "devices": [ { "name": "boiler-9", "profile": "furnace" } ]
}"#;
    let err = isolated_loader("EDGEUA_IT_PROFILE")
        .load_from_str(json, edgeua_config::ConfigFormat::Json)
        .unwrap_err();

    assert!(matches!(err, ConfigError::UnknownProfile { ref profile, .. } if profile == "furnace"));
}

#[test]
fn test_duplicate_device_rejected() {
    let json = r#"{
  "profiles": [ { "name": "boiler" } ],
  "devices": [
    { "name": "boiler-1", "profile": "boiler" },
    { "name": "boiler-1", "profile": "boiler" }
  ]
}"#;
    let err = isolated_loader("EDGEUA_IT_DUP")
        .load_from_str(json, edgeua_config::ConfigFormat::Json)
        .unwrap_err();

    assert!(matches!(err, ConfigError::DuplicateDevice { .. }));
}

#[test]
fn test_unknown_value_type_rejected() {
    let json = r#"{
  "profiles": [ { "name": "boiler", "resources": [ { "name": "T", "value_type": "Quaternion" } ] } ]
}"#;
    let err = isolated_loader("EDGEUA_IT_TYPE")
        .load_from_str(json, edgeua_config::ConfigFormat::Json)
        .unwrap_err();

    assert!(err.is_validation());
}

#[tokio::test]
async fn test_configured_devices_accepted_by_driver() {
    let dir = temp_test_dir("edgeua-driver");
    let path = write(dir.path(), "edgeua.yaml", ConfigFixtures::yaml());
    let config = isolated_loader("EDGEUA_IT_DRIVER").load(&path).unwrap();

    let rig = DriverRig::new();
    for device in &config.devices {
        rig.registry.validate_device(&device.to_device()).unwrap();
    }
}
