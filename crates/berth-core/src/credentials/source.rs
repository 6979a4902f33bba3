//! Credential source providers.
//!
//! Each variant of [`CredentialSource`] has exactly one handler here. A
//! handler produces one or more [`Layer`]s; the composer decides how layers
//! are merged.

use std::fmt;
use std::path::Path;

use thiserror::Error;

use super::registry_auth::{FetchError, RegistryAuthSource};
use super::store::{CredentialStore, CredentialStoreError, parse_credential_set_file};
use super::{CredentialOrigin, CredentialSet, CredentialValue};
use crate::profile::{ProfileStore, StoreError};

/// The four credential origins, in precedence order (lowest first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SourceKind {
    NamedSet,
    Explicit,
    AmbientEndpoint,
    RegistryAuth,
}

impl SourceKind {
    /// Failures of required sources abort composition.
    pub fn is_required(&self) -> bool {
        matches!(self, SourceKind::NamedSet | SourceKind::Explicit)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SourceKind::NamedSet => "named credential sets",
            SourceKind::Explicit => "explicit overrides",
            SourceKind::AmbientEndpoint => "ambient endpoint credentials",
            SourceKind::RegistryAuth => "registry auth",
        })
    }
}

/// One configured credential source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Credential-store entry names or credential-set file paths
    NamedSet(Vec<String>),
    /// `key=value` strings
    Explicit(Vec<String>),
    /// Endpoint material of the named profile
    AmbientEndpoint(String),
    /// Registry auth, only gathered when enabled
    RegistryAuth(bool),
}

impl CredentialSource {
    pub fn kind(&self) -> SourceKind {
        match self {
            CredentialSource::NamedSet(_) => SourceKind::NamedSet,
            CredentialSource::Explicit(_) => SourceKind::Explicit,
            CredentialSource::AmbientEndpoint(_) => SourceKind::AmbientEndpoint,
            CredentialSource::RegistryAuth(_) => SourceKind::RegistryAuth,
        }
    }
}

#[derive(Debug, Error)]
pub enum CredentialSourceError {
    #[error(
        "unknown credential set '{name}': not in the credential store and not a credential set file"
    )]
    UnknownCredentialSet { name: String },

    #[error("invalid credential set '{name}': {reason}")]
    InvalidCredentialSet { name: String, reason: String },

    #[error("malformed credential '{raw}': expected key=value")]
    MalformedOverride { raw: String },

    #[error("failed to read endpoint credentials of profile '{name}': {source}")]
    ProfileLookup {
        name: String,
        #[source]
        source: StoreError,
    },

    #[error(transparent)]
    RegistryFetch(#[from] FetchError),
}

/// Partial credential set attributed to a single origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub origin: CredentialOrigin,
    pub set: CredentialSet,
}

impl Layer {
    pub fn new(origin: CredentialOrigin, set: CredentialSet) -> Self {
        Self { origin, set }
    }
}

/// Resolve each name to a credential set, one layer per name.
///
/// A name is looked up in the credential store first and only then tried
/// as a path to a credential-set file.
pub fn named_sets(
    store: &dyn CredentialStore,
    names: &[String],
) -> Result<Vec<Layer>, CredentialSourceError> {
    let mut layers = Vec::with_capacity(names.len());
    for name in names {
        let set = match store.resolve_named_set(name) {
            Ok(set) => set,
            Err(CredentialStoreError::NotFound { .. }) => named_set_from_file(name)?,
            Err(CredentialStoreError::Unreadable { name, reason }) => {
                return Err(CredentialSourceError::InvalidCredentialSet { name, reason });
            }
            Err(e @ CredentialStoreError::InvalidContext { .. }) => {
                return Err(CredentialSourceError::InvalidCredentialSet {
                    name: name.clone(),
                    reason: e.to_string(),
                });
            }
        };
        tracing::debug!(set = %name, keys = set.len(), "Resolved credential set");
        layers.push(Layer::new(CredentialOrigin::NamedSet(name.clone()), set));
    }
    Ok(layers)
}

fn named_set_from_file(name: &str) -> Result<CredentialSet, CredentialSourceError> {
    let path = Path::new(name);
    if !path.is_file() {
        return Err(CredentialSourceError::UnknownCredentialSet {
            name: name.to_string(),
        });
    }
    parse_credential_set_file(path).map_err(|e| CredentialSourceError::InvalidCredentialSet {
        name: name.to_string(),
        reason: format!("{e:#}"),
    })
}

/// Parse `key=value` overrides.
///
/// All-or-nothing: one malformed entry means no keys are contributed.
pub fn explicit_overrides(pairs: &[String]) -> Result<Layer, CredentialSourceError> {
    let mut set = CredentialSet::new();
    for raw in pairs {
        let (key, value) = raw
            .split_once('=')
            .filter(|(key, _)| !key.trim().is_empty())
            .ok_or_else(|| CredentialSourceError::MalformedOverride { raw: raw.clone() })?;
        set.insert(key, CredentialValue::secret(value));
    }
    Ok(Layer::new(CredentialOrigin::Explicit, set))
}

/// Endpoint material of `profile_name`, one reserved key per endpoint kind.
///
/// Returns `None` when the profile carries no material, or when it is the
/// reserved default profile and the store has no entry for it.
pub fn ambient_endpoint(
    profiles: &dyn ProfileStore,
    profile_name: &str,
    default_name: &str,
) -> Result<Option<Layer>, CredentialSourceError> {
    let profile = match profiles.lookup(profile_name) {
        Ok(profile) => profile,
        Err(e) if e.is_not_found() && profile_name == default_name => return Ok(None),
        Err(source) => {
            return Err(CredentialSourceError::ProfileLookup {
                name: profile_name.to_string(),
                source,
            });
        }
    };

    let mut set = CredentialSet::new();
    for (kind, endpoint, material) in profile.endpoints_with_material() {
        let blob = serde_json::json!({
            "profile": profile.name,
            "host": endpoint.host,
            "skip_tls_verify": endpoint.skip_tls_verify,
            "namespace": endpoint.namespace,
            "material": material,
        });
        set.insert(kind.credential_key(), CredentialValue::Blob(blob));
    }

    if set.is_empty() {
        tracing::debug!(profile = profile_name, "Profile carries no endpoint material");
        return Ok(None);
    }
    Ok(Some(Layer::new(CredentialOrigin::AmbientEndpoint, set)))
}

/// Registry auth entries as the registry-auth sub-map.
///
/// The reserved registry credentials key is derived by the composer from
/// the final merged map, not here.
pub fn registry_auth(source: &dyn RegistryAuthSource) -> Result<Layer, CredentialSourceError> {
    let mut set = CredentialSet::new();
    set.registry_auth = source.fetch()?;
    Ok(Layer::new(CredentialOrigin::RegistryAuth, set))
}
