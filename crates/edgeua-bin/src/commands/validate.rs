// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `validate` command.

use std::path::Path;
use std::sync::Arc;

use edgeua_config::EdgeUaConfig;
use edgeua_core::{AdminState, ProtocolDriver};
use edgeua_opcua::{DeviceRegistry, SessionSettings, UnavailableConnector};

use crate::cli::{Cli, OutputFormat, ValidateArgs};
use crate::error::{BinError, BinResult};
use crate::host::StaticHost;

/// Outcome of validating a configuration.
#[derive(Debug, Default)]
pub struct ValidationReport {
    /// Devices whose protocol properties were rejected, with the reason.
    pub device_errors: Vec<(String, String)>,
    /// Non-fatal findings.
    pub warnings: Vec<String>,
}

impl ValidationReport {
    /// Checks every device's OPC UA properties against the driver.
    pub fn check(config: &EdgeUaConfig) -> BinResult<Self> {
        let (host, _readings) = StaticHost::from_config(config, 1)?;
        let registry = DeviceRegistry::new(
            Arc::new(host),
            Arc::new(UnavailableConnector),
            SessionSettings::default(),
        );

        let mut report = Self::default();
        for device in &config.devices {
            if let Err(e) = registry.validate_device(&device.to_device()) {
                report.device_errors.push((device.name.clone(), e.to_string()));
            }
            if device.admin_state == AdminState::Locked {
                report.warnings.push(format!("Device '{}' is locked", device.name));
            }
        }

        if config.devices.is_empty() {
            report.warnings.push("No devices configured".to_string());
        }
        if !config.api.enabled {
            report.warnings.push("API server is disabled".to_string());
        }

        Ok(report)
    }

    /// Returns true if no device was rejected.
    pub fn is_valid(&self) -> bool {
        self.device_errors.is_empty()
    }

    fn to_json(&self, path: &Path, config: &EdgeUaConfig, show_config: bool) -> serde_json::Value {
        let errors: Vec<_> = self
            .device_errors
            .iter()
            .map(|(device, error)| serde_json::json!({ "device": device, "error": error }))
            .collect();

        serde_json::json!({
            "valid": self.is_valid(),
            "config_path": path.display().to_string(),
            "summary": {
                "service_name": config.service.name,
                "device_count": config.devices.len(),
                "profile_count": config.profiles.len(),
                "api_enabled": config.api.enabled,
                "api_port": config.api.port,
            },
            "errors": errors,
            "warnings": self.warnings,
            "config": if show_config { Some(config) } else { None },
        })
    }
}

/// Executes the `validate` command to validate configuration.
pub fn validate(cli: &Cli, args: ValidateArgs) -> BinResult<()> {
    let config_path = &cli.config;

    if !config_path.exists() {
        return Err(BinError::config(format!(
            "Configuration file not found: {}",
            config_path.display()
        )));
    }

    let config = edgeua_config::load_config(config_path)
        .map_err(|e| BinError::from(e).with_context("Configuration validation failed"))?;
    let report = ValidationReport::check(&config)?;

    match args.format {
        OutputFormat::Text => print_text(config_path, &config, &report, args.show_config),
        OutputFormat::Json => {
            let output = report.to_json(config_path, &config, args.show_config);
            let text = serde_json::to_string_pretty(&output).map_err(|e| BinError::runtime(e.to_string()))?;
            println!("{}", text);
        }
    }

    if !report.is_valid() {
        return Err(BinError::config(format!(
            "{} device(s) have invalid OPC UA properties",
            report.device_errors.len()
        )));
    }

    if args.strict && !report.warnings.is_empty() {
        return Err(BinError::config(format!(
            "Strict mode: {} warning(s) found",
            report.warnings.len()
        )));
    }

    Ok(())
}

fn print_text(path: &Path, config: &EdgeUaConfig, report: &ValidationReport, show_config: bool) {
    if report.is_valid() {
        println!("✓ Configuration is valid: {}", path.display());
    } else {
        println!("✗ Configuration has errors: {}", path.display());
    }
    println!();
    println!("Summary:");
    println!("  Service:  {}", config.service.name);
    println!("  Profiles: {}", config.profiles.len());
    println!("  Devices:  {}", config.devices.len());
    if config.api.enabled {
        println!("  API:      {}:{}", config.api.host, config.api.port);
    } else {
        println!("  API:      disabled");
    }

    if !report.device_errors.is_empty() {
        println!();
        println!("Errors:");
        for (device, error) in &report.device_errors {
            println!("  ✗ {}: {}", device, error);
        }
    }

    if !report.warnings.is_empty() {
        println!();
        println!("Warnings:");
        for warning in &report.warnings {
            println!("  ⚠ {}", warning);
        }
    }

    if show_config {
        println!();
        println!("Parsed configuration:");
        println!(
            "{}",
            serde_json::to_string_pretty(config).unwrap_or_else(|_| "(serialization error)".to_string())
        );
    }
}
