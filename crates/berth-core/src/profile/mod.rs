//! Connection profiles and their storage.
//!
//! A connection profile names one or more orchestration endpoints together
//! with the credential material needed to reach them. Profiles are only ever
//! created whole: either decoded from packaged material by [`archive`] or
//! loaded back from a [`store::ProfileStore`].

pub mod archive;
pub mod bootstrap;
pub mod store;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::EndpointKind;

pub use archive::decode_profile;
pub use bootstrap::{BootstrapImporter, ImportError};
pub use store::{FileProfileStore, ProfileStore, StoreError};

/// A named set of endpoints plus the material used to authenticate to them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionProfile {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub endpoints: BTreeMap<EndpointKind, Endpoint>,
}

/// Endpoint metadata for one orchestrator kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Address of the endpoint, e.g. `tcp://host:2376` or `unix:///var/run/docker.sock`
    pub host: String,

    #[serde(default)]
    pub skip_tls_verify: bool,

    /// Kubernetes only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<CredentialMaterial>,
}

/// Credential material attached to an endpoint.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialMaterial {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<TlsMaterial>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// PEM-encoded TLS material.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsMaterial {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl CredentialMaterial {
    pub fn is_empty(&self) -> bool {
        self.token.is_none() && self.tls.as_ref().is_none_or(TlsMaterial::is_empty)
    }
}

impl TlsMaterial {
    pub fn is_empty(&self) -> bool {
        self.ca.is_none() && self.cert.is_none() && self.key.is_none()
    }
}

// Material is secret-bearing: Debug shows presence only.
impl fmt::Debug for CredentialMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialMaterial")
            .field("tls", &self.tls)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl fmt::Debug for TlsMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsMaterial")
            .field("ca", &self.ca.is_some())
            .field("cert", &self.cert.is_some())
            .field("key", &self.key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ConnectionProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            endpoints: BTreeMap::new(),
        }
    }

    pub fn with_endpoint(mut self, kind: EndpointKind, endpoint: Endpoint) -> Self {
        self.endpoints.insert(kind, endpoint);
        self
    }

    /// Endpoints that carry non-empty credential material.
    pub fn endpoints_with_material(
        &self,
    ) -> impl Iterator<Item = (EndpointKind, &Endpoint, &CredentialMaterial)> {
        self.endpoints.iter().filter_map(|(kind, endpoint)| {
            endpoint
                .material
                .as_ref()
                .filter(|material| !material.is_empty())
                .map(|material| (*kind, endpoint, material))
        })
    }

    /// Validate the profile before it is written to a store.
    ///
    /// `reserved` is the configured default context name, which always means
    /// "no profile" and so can never be stored.
    pub fn validate(&self, reserved: &str) -> anyhow::Result<()> {
        if self.name.trim().is_empty() {
            anyhow::bail!("Profile name cannot be empty");
        }
        if self.name == reserved {
            anyhow::bail!("'{reserved}' is a reserved profile name");
        }
        self.validate_endpoints()
    }

    /// Structural checks on the endpoints, independent of where the profile
    /// is stored.
    pub fn validate_endpoints(&self) -> anyhow::Result<()> {
        if self.endpoints.is_empty() {
            anyhow::bail!("Profile '{}' has no endpoints", self.name);
        }
        for (kind, endpoint) in &self.endpoints {
            url::Url::parse(&endpoint.host).map_err(|e| {
                anyhow::anyhow!(
                    "Profile '{}' has an invalid {} endpoint host '{}': {}",
                    self.name,
                    kind,
                    endpoint.host,
                    e
                )
            })?;
            if endpoint.namespace.is_some() && *kind != EndpointKind::Kubernetes {
                anyhow::bail!(
                    "Profile '{}': namespace is only valid on kubernetes endpoints",
                    self.name
                );
            }
        }
        Ok(())
    }
}

impl Endpoint {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            skip_tls_verify: false,
            namespace: None,
            material: None,
        }
    }

    pub fn with_material(mut self, material: CredentialMaterial) -> Self {
        self.material = Some(material);
        self
    }
}
