//! Credential composition.
//!
//! Sources are applied in a fixed precedence order, lowest first:
//! NamedSet -> Explicit -> AmbientEndpoint -> RegistryAuth
//!
//! A later layer overwrites keys written by an earlier one and every
//! overwrite is reported as a [`Warning::Overwritten`]. Failures of required
//! sources abort; failures of optional sources are reported as
//! [`Warning::SourceSkipped`] and treated as an empty contribution.

use std::collections::BTreeMap;

use thiserror::Error;

use super::registry_auth::RegistryAuthSource;
use super::source::{self, CredentialSource, CredentialSourceError, Layer, SourceKind};
use super::store::CredentialStore;
use super::{CredentialOrigin, CredentialSet, CredentialValue, Warning};
use crate::profile::ProfileStore;
use crate::types::{DEFAULT_CONTEXT_NAME, REGISTRY_CREDS_KEY};

/// A required credential source failed.
#[derive(Debug, Error)]
#[error("failed to compose credentials from {kind}: {error}")]
pub struct CompositionError {
    pub kind: SourceKind,
    #[source]
    pub error: CredentialSourceError,
}

/// Result of a composition, including where every key came from.
#[derive(Debug, Clone, Default)]
pub struct Composition {
    pub credentials: CredentialSet,
    /// Origin of the final value of each key. Registry entries are keyed
    /// `registry-auth/<host>`.
    pub origins: BTreeMap<String, CredentialOrigin>,
    pub warnings: Vec<Warning>,
}

/// Merges the output of credential sources into one [`CredentialSet`].
pub struct CredentialComposer<'a> {
    credentials: &'a dyn CredentialStore,
    profiles: &'a dyn ProfileStore,
    registry: &'a dyn RegistryAuthSource,
    default_context: String,
}

impl<'a> CredentialComposer<'a> {
    pub fn new(
        credentials: &'a dyn CredentialStore,
        profiles: &'a dyn ProfileStore,
        registry: &'a dyn RegistryAuthSource,
    ) -> Self {
        Self {
            credentials,
            profiles,
            registry,
            default_context: DEFAULT_CONTEXT_NAME.to_string(),
        }
    }

    /// Override the reserved default profile name.
    pub fn with_default_context(mut self, name: impl Into<String>) -> Self {
        self.default_context = name.into();
        self
    }

    /// Compose `sources` into a credential set.
    ///
    /// The order of `sources` does not matter; sources of the same kind keep
    /// their relative order.
    pub fn compose(
        &self,
        sources: &[CredentialSource],
    ) -> Result<(CredentialSet, Vec<Warning>), CompositionError> {
        self.compose_detailed(sources)
            .map(|composition| (composition.credentials, composition.warnings))
    }

    /// Like [`CredentialComposer::compose`], also reporting the origin of each key.
    pub fn compose_detailed(
        &self,
        sources: &[CredentialSource],
    ) -> Result<Composition, CompositionError> {
        let mut ordered: Vec<&CredentialSource> = sources.iter().collect();
        ordered.sort_by_key(|source| source.kind());

        let mut merge = Merge::default();
        for source in ordered {
            let kind = source.kind();
            match self.produce(source) {
                Ok(layers) => {
                    for layer in layers {
                        merge.apply(layer);
                    }
                }
                Err(error) if kind.is_required() => {
                    return Err(CompositionError { kind, error });
                }
                Err(error) => {
                    tracing::warn!(source = %kind, error = %error, "Skipping optional credential source");
                    merge.warnings.push(Warning::SourceSkipped {
                        source: kind,
                        reason: error.to_string(),
                    });
                }
            }
        }

        merge.attach_registry_creds();

        tracing::debug!(
            keys = merge.set.len(),
            registries = merge.set.registry_auth.len(),
            warnings = merge.warnings.len(),
            "Composed credential set"
        );
        Ok(Composition {
            credentials: merge.set,
            origins: merge.origins,
            warnings: merge.warnings,
        })
    }

    fn produce(&self, source: &CredentialSource) -> Result<Vec<Layer>, CredentialSourceError> {
        match source {
            CredentialSource::NamedSet(names) => source::named_sets(self.credentials, names),
            CredentialSource::Explicit(pairs) => Ok(vec![source::explicit_overrides(pairs)?]),
            CredentialSource::AmbientEndpoint(profile) => Ok(source::ambient_endpoint(
                self.profiles,
                profile,
                &self.default_context,
            )?
            .into_iter()
            .collect()),
            CredentialSource::RegistryAuth(false) => Ok(Vec::new()),
            CredentialSource::RegistryAuth(true) => {
                Ok(vec![source::registry_auth(self.registry)?])
            }
        }
    }
}

/// Running state of one composition.
#[derive(Default)]
struct Merge {
    set: CredentialSet,
    origins: BTreeMap<String, CredentialOrigin>,
    warnings: Vec<Warning>,
}

impl Merge {
    fn apply(&mut self, layer: Layer) {
        let Layer { origin, set } = layer;

        for (key, value) in set.credentials {
            self.record(key.clone(), &origin);
            tracing::debug!(key = %key, origin = %origin, value = %value.fingerprint(), "Credential set");
            self.set.credentials.insert(key, value);
        }

        for (host, entry) in set.registry_auth {
            self.record(format!("registry-auth/{host}"), &origin);
            self.set.registry_auth.insert(host, entry);
        }
    }

    /// Serialize the final registry auth map under the reserved key.
    ///
    /// Runs once after every layer is applied, so the blob always matches
    /// the merged sub-map whichever layers supplied the hosts.
    fn attach_registry_creds(&mut self) {
        if self.set.registry_auth.is_empty() {
            return;
        }
        match serde_json::to_value(&self.set.registry_auth) {
            Ok(blob) => {
                self.record(
                    REGISTRY_CREDS_KEY.to_string(),
                    &CredentialOrigin::RegistryAuth,
                );
                self.set.insert(REGISTRY_CREDS_KEY, CredentialValue::Blob(blob));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to encode registry auth");
                self.warnings.push(Warning::SourceSkipped {
                    source: SourceKind::RegistryAuth,
                    reason: format!("failed to encode registry auth: {e}"),
                });
            }
        }
    }

    fn record(&mut self, key: String, origin: &CredentialOrigin) {
        if let Some(previous) = self.origins.insert(key.clone(), origin.clone()) {
            tracing::warn!(key = %key, previous = %previous, new = %origin, "Credential overwritten");
            self.warnings.push(Warning::Overwritten {
                key,
                previous,
                new: origin.clone(),
            });
        }
    }
}
