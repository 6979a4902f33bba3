//! Shared core types used across the profile, credential and installer layers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of the reserved default connection profile.
///
/// The default profile is always considered present, even when the profile
/// store has never seen an entry with this name.
pub const DEFAULT_CONTEXT_NAME: &str = "default";

/// Reserved credential key prefix for ambient endpoint material.
pub const ENDPOINT_KEY_PREFIX: &str = "berth.endpoint.";

/// Reserved credential key carrying the serialized registry auth map.
pub const REGISTRY_CREDS_KEY: &str = "berth.registry-creds";

/// Kind of orchestration endpoint a connection profile can reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointKind {
    /// Container engine API endpoint.
    Docker,
    /// Kubernetes API server endpoint.
    Kubernetes,
}

impl EndpointKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointKind::Docker => "docker",
            EndpointKind::Kubernetes => "kubernetes",
        }
    }

    /// Credential key under which this endpoint's material is injected.
    pub fn credential_key(&self) -> String {
        format!("{ENDPOINT_KEY_PREFIX}{}", self.as_str())
    }
}

impl fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for EndpointKind {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "docker" => Ok(EndpointKind::Docker),
            "kubernetes" => Ok(EndpointKind::Kubernetes),
            other => anyhow::bail!("Unknown endpoint kind: {other}. Use 'docker' or 'kubernetes'"),
        }
    }
}

/// Short, non-reversible fingerprint of secret material for log output.
pub fn fingerprint(bytes: &[u8]) -> String {
    let hash = blake3::hash(bytes).to_hex();
    hash.as_str()[..12].to_string()
}
