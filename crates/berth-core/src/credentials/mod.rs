//! Credential sets and the pipeline that composes them.
//!
//! A credential set is assembled fresh for every installer invocation from
//! up to four sources (see [`source::CredentialSource`]) by the
//! [`compose::CredentialComposer`]. Nothing in this module persists the
//! result, and nothing here logs or prints secret values.

pub mod compose;
pub mod registry_auth;
pub mod source;
pub mod store;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::fingerprint;

pub use compose::{Composition, CompositionError, CredentialComposer};
pub use registry_auth::{
    ConfigFileAuthSource, FetchError, LayeredAuthSource, PackagedAuthSource, RegistryAuthSource,
};
pub use source::{CredentialSource, CredentialSourceError, SourceKind};
pub use store::{CredentialStore, CredentialStoreError, FileCredentialStore};

/// A single credential value.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CredentialValue {
    /// Plain secret string
    Secret(String),
    /// Structured blob (e.g. endpoint material, registry auth map)
    Blob(serde_json::Value),
}

impl CredentialValue {
    pub fn secret(value: impl Into<String>) -> Self {
        CredentialValue::Secret(value.into())
    }

    pub fn as_secret(&self) -> Option<&str> {
        match self {
            CredentialValue::Secret(s) => Some(s),
            CredentialValue::Blob(_) => None,
        }
    }

    pub fn as_blob(&self) -> Option<&serde_json::Value> {
        match self {
            CredentialValue::Secret(_) => None,
            CredentialValue::Blob(v) => Some(v),
        }
    }

    /// Fingerprint safe to log in place of the value.
    pub fn fingerprint(&self) -> String {
        match self {
            CredentialValue::Secret(s) => fingerprint(s.as_bytes()),
            CredentialValue::Blob(v) => fingerprint(v.to_string().as_bytes()),
        }
    }
}

impl fmt::Debug for CredentialValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialValue::Secret(_) => f.write_str("Secret(<redacted>)"),
            CredentialValue::Blob(_) => f.write_str("Blob(<redacted>)"),
        }
    }
}

/// Authentication for one container registry.
///
/// Field names follow the `auths` entries of a docker-style `config.json`.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// base64("username:password")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,

    #[serde(
        default,
        rename = "identitytoken",
        alias = "identity_token",
        skip_serializing_if = "Option::is_none"
    )]
    pub identity_token: Option<String>,

    #[serde(
        default,
        rename = "registrytoken",
        alias = "registry_token",
        skip_serializing_if = "Option::is_none"
    )]
    pub registry_token: Option<String>,

    #[serde(
        default,
        rename = "serveraddress",
        alias = "server_address",
        skip_serializing_if = "Option::is_none"
    )]
    pub server_address: Option<String>,
}

impl fmt::Debug for AuthEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redacted = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("AuthEntry")
            .field("username", &self.username)
            .field("password", &redacted(&self.password))
            .field("auth", &redacted(&self.auth))
            .field("identity_token", &redacted(&self.identity_token))
            .field("registry_token", &redacted(&self.registry_token))
            .field("server_address", &self.server_address)
            .finish()
    }
}

/// Merged credentials for one installer operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CredentialSet {
    #[serde(default)]
    pub credentials: BTreeMap<String, CredentialValue>,

    /// Registry host → auth entry
    #[serde(default)]
    pub registry_auth: BTreeMap<String, AuthEntry>,
}

impl CredentialSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: CredentialValue) {
        self.credentials.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&CredentialValue> {
        self.credentials.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.credentials.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.credentials.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty() && self.registry_auth.is_empty()
    }
}

/// Where a credential key came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialOrigin {
    /// A named credential set (store entry or file)
    NamedSet(String),
    /// A `key=value` override
    Explicit,
    /// Endpoint material of the active profile
    AmbientEndpoint,
    /// Registry authentication
    RegistryAuth,
}

impl fmt::Display for CredentialOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialOrigin::NamedSet(name) => write!(f, "credential set '{name}'"),
            CredentialOrigin::Explicit => f.write_str("explicit override"),
            CredentialOrigin::AmbientEndpoint => f.write_str("ambient endpoint"),
            CredentialOrigin::RegistryAuth => f.write_str("registry auth"),
        }
    }
}

/// Non-fatal findings of a composition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A later source replaced a key written by an earlier one
    Overwritten {
        key: String,
        previous: CredentialOrigin,
        new: CredentialOrigin,
    },
    /// An optional source failed; its contribution was treated as empty
    SourceSkipped { source: SourceKind, reason: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::Overwritten { key, previous, new } => {
                write!(f, "credential '{key}' from {previous} overwritten by {new}")
            }
            Warning::SourceSkipped { source, reason } => {
                write!(f, "{source} skipped: {reason}")
            }
        }
    }
}
