// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `version` command.

use crate::cli::Cli;
use crate::error::BinResult;

/// Executes the `version` command to display version information.
pub fn version(_cli: &Cli) -> BinResult<()> {
    println!("EdgeUA - OPC UA device service");
    println!();
    println!("Version Information:");
    println!("  edgeua-bin:    {}", crate::VERSION);
    println!("  edgeua-core:   {}", edgeua_core::VERSION);
    println!("  edgeua-opcua:  {}", edgeua_opcua::VERSION);
    println!("  edgeua-api:    {}", edgeua_api::VERSION);
    println!("  edgeua-config: {}", edgeua_config::VERSION);
    println!();
    println!("Build Information:");
    println!("  Target:       {}", std::env::consts::ARCH);
    println!("  OS:           {}", std::env::consts::OS);
    println!();
    println!("Features:");
    println!(
        "  Real transport: {}",
        if cfg!(feature = "real-transport") { "enabled" } else { "disabled" }
    );
    println!();
    println!("License: PolyForm Noncommercial License 1.0.0");
    println!("Copyright (c) 2025 Sylvex. All rights reserved.");

    Ok(())
}
