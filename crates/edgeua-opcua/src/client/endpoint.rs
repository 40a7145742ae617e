// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Endpoint selection.

use crate::client::transport::EndpointDescription;
use crate::error::TransportError;
use crate::types::OpcUaConfig;

/// Picks the strongest endpoint matching the configured policy and mode.
///
/// Ties on security level keep the first advertised endpoint. The returned
/// endpoint's URL is replaced by the configured one, since servers often
/// advertise host names that are not reachable from the gateway.
pub fn select_endpoint(
    endpoints: &[EndpointDescription],
    config: &OpcUaConfig,
) -> Result<EndpointDescription, TransportError> {
    let policy_uri = config.policy.uri();
    let mode = config.mode.to_value();

    let mut best: Option<&EndpointDescription> = None;
    for candidate in endpoints
        .iter()
        .filter(|ep| ep.security_policy_uri == policy_uri && ep.security_mode == mode)
    {
        if best.map_or(true, |b| candidate.security_level > b.security_level) {
            best = Some(candidate);
        }
    }

    let mut selected = best.cloned().ok_or_else(|| TransportError::NoMatchingEndpoint {
        policy: config.policy.to_string(),
        mode: config.mode.to_string(),
    })?;
    selected.endpoint_url = config.endpoint.clone();
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SecurityMode, SecurityPolicy};

    fn endpoint(policy: SecurityPolicy, mode: SecurityMode, level: u8) -> EndpointDescription {
        EndpointDescription {
            endpoint_url: "opc.tcp://internal-name:4840".to_string(),
            security_policy_uri: policy.uri(),
            security_mode: mode.to_value(),
            security_level: level,
        }
    }

    fn config(policy: SecurityPolicy, mode: SecurityMode) -> OpcUaConfig {
        OpcUaConfig {
            endpoint: "opc.tcp://10.0.0.5:4840".to_string(),
            policy,
            mode,
            cert_file: None,
            key_file: None,
            resources: Vec::new(),
        }
    }

    #[test]
    fn test_selects_highest_level_match() {
        let endpoints = vec![
            endpoint(SecurityPolicy::None, SecurityMode::None, 0),
            endpoint(SecurityPolicy::Basic256Sha256, SecurityMode::Sign, 3),
            endpoint(SecurityPolicy::Basic256Sha256, SecurityMode::Sign, 7),
            endpoint(SecurityPolicy::Basic256Sha256, SecurityMode::SignAndEncrypt, 9),
        ];
        let selected =
            select_endpoint(&endpoints, &config(SecurityPolicy::Basic256Sha256, SecurityMode::Sign)).unwrap();
        assert_eq!(selected.security_level, 7);
        assert_eq!(selected.endpoint_url, "opc.tcp://10.0.0.5:4840");
    }

    #[test]
    fn test_no_match() {
        let endpoints = vec![endpoint(SecurityPolicy::None, SecurityMode::None, 0)];
        let err = select_endpoint(&endpoints, &config(SecurityPolicy::Basic256, SecurityMode::Sign)).unwrap_err();
        assert!(matches!(err, TransportError::NoMatchingEndpoint { .. }));
        assert!(select_endpoint(&[], &config(SecurityPolicy::None, SecurityMode::None)).is_err());
    }
}
