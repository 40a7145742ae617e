// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `run` command.

use edgeua_config::load_config;

use crate::cli::{Cli, RunArgs};
use crate::error::{BinError, BinResult};
use crate::logging::init_logging;
use crate::runtime::RuntimeBuilder;

/// Executes the `run` command to start the service.
///
/// The config is loaded before logging starts so the file's logging section
/// can take effect.
pub async fn run(cli: &Cli, args: RunArgs) -> BinResult<()> {
    let config = load_config(&cli.config)
        .map_err(|e| BinError::from(e).with_context(format!("Failed to load {}", cli.config.display())))?;

    init_logging(
        &cli.effective_log_level(&config.logging),
        cli.effective_log_format(&config.logging),
    );
    tracing::info!(config = %cli.config.display(), "Configuration loaded");

    RuntimeBuilder::new()
        .config(config)
        .disable_api(args.no_api)
        .build()?
        .run()
        .await
}
