//! One-time seeding of the profile store from packaged material.
//!
//! The installer image ships the privileged connection profile it must run
//! against, plus the registry credentials it may need for pulls. Importing
//! the profile does not activate it; activation goes through
//! [`crate::installer::ProcessContext::set_active`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::store::{ProfileStore, StoreError};
use crate::credentials::AuthEntry;
use crate::types::fingerprint;

/// Default location of the packaged profile material inside an installer image.
pub const PACKAGED_PROFILE_PATH: &str = "/cnab/app/context.berthprofile";

/// Default location of the packaged registry credentials.
pub const PACKAGED_REGISTRY_CREDS_PATH: &str = "/cnab/app/registry-creds.json";

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("profile material unavailable at {}: {source}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid material for profile '{name}': {reason}")]
    InvalidMaterial { name: String, reason: String },

    #[error("failed to write imported profile: {0}")]
    Write(#[source] StoreError),
}

/// Imports packaged connection profiles into a [`ProfileStore`].
pub struct BootstrapImporter<'a, S: ProfileStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: ProfileStore + ?Sized> BootstrapImporter<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Import the material at `material_path` as profile `profile_name`.
    ///
    /// Any existing profile with the same name is replaced, so repeating the
    /// import with the same material has no further effect.
    pub fn import(&self, profile_name: &str, material_path: &Path) -> Result<(), ImportError> {
        let data =
            std::fs::read(material_path).map_err(|source| ImportError::SourceUnavailable {
                path: material_path.to_path_buf(),
                source,
            })?;

        self.store.import(profile_name, &mut data.as_slice())?;

        tracing::info!(
            profile = profile_name,
            material = %fingerprint(&data),
            "Imported connection profile"
        );
        Ok(())
    }

    /// Read packaged registry credentials (registry host → auth entry).
    pub fn load_registry_auth(
        &self,
        path: &Path,
    ) -> Result<BTreeMap<String, AuthEntry>, ImportError> {
        let data = std::fs::read(path).map_err(|source| ImportError::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        })?;

        let entries: BTreeMap<String, AuthEntry> =
            serde_json::from_slice(&data).map_err(|e| ImportError::InvalidMaterial {
                name: path.display().to_string(),
                reason: e.to_string(),
            })?;

        tracing::debug!(registries = entries.len(), "Loaded packaged registry credentials");
        Ok(entries)
    }
}
