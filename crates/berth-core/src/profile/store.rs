//! Connection profile store.
//!
//! Profiles live at `<root>/meta/<blake3(name)>/meta.json`. Hashing the name
//! keeps arbitrary profile names out of the filesystem namespace.

use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::ConnectionProfile;
use super::bootstrap::ImportError;
use crate::types::{DEFAULT_CONTEXT_NAME, fingerprint};

/// Failures reported by a [`ProfileStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("connection profile '{name}' not found")]
    NotFound { name: String },

    #[error("failed to access profile store at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("stored profile '{name}' is corrupt: {source}")]
    Decode {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("profile '{name}' rejected: {reason}")]
    Invalid { name: String, reason: String },
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Storage for named connection profiles.
///
/// Writes are whole-profile: a reader never observes a partially written
/// profile.
pub trait ProfileStore {
    fn lookup(&self, name: &str) -> Result<ConnectionProfile, StoreError>;

    /// Write `profile` under `name`, replacing any existing profile.
    fn put(&self, name: &str, profile: &ConnectionProfile) -> Result<(), StoreError>;

    /// Decode a serialized profile from `reader` and store it under `name`.
    fn import(&self, name: &str, reader: &mut dyn Read) -> Result<(), ImportError> {
        let mut data = Vec::new();
        reader
            .read_to_end(&mut data)
            .map_err(|e| ImportError::InvalidMaterial {
                name: name.to_string(),
                reason: format!("failed to read material: {e}"),
            })?;

        let profile =
            super::archive::decode_profile(name, &data).map_err(|e| ImportError::InvalidMaterial {
                name: name.to_string(),
                reason: format!("{e:#}"),
            })?;

        self.put(name, &profile).map_err(ImportError::Write)
    }

    /// Whether a profile named `name` exists.
    fn contains(&self, name: &str) -> Result<bool, StoreError> {
        match self.lookup(name) {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// File-backed profile store.
#[derive(Debug, Clone)]
pub struct FileProfileStore {
    root: PathBuf,
    reserved_name: String,
}

impl FileProfileStore {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            reserved_name: DEFAULT_CONTEXT_NAME.to_string(),
        }
    }

    /// Refuse writes under `name`, the configured default context.
    pub fn with_reserved_name(mut self, name: impl Into<String>) -> Self {
        self.reserved_name = name.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn profile_dir(&self, name: &str) -> PathBuf {
        let digest = blake3::hash(name.as_bytes());
        self.root.join("meta").join(digest.to_hex().as_str())
    }

    fn meta_path(&self, name: &str) -> PathBuf {
        self.profile_dir(name).join("meta.json")
    }
}

impl ProfileStore for FileProfileStore {
    fn lookup(&self, name: &str) -> Result<ConnectionProfile, StoreError> {
        let path = self.meta_path(name);
        let content = match std::fs::read(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound {
                    name: name.to_string(),
                });
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        let profile: ConnectionProfile =
            serde_json::from_slice(&content).map_err(|source| StoreError::Decode {
                name: name.to_string(),
                source,
            })?;

        if profile.name != name {
            return Err(StoreError::Invalid {
                name: name.to_string(),
                reason: format!("meta file names profile '{}'", profile.name),
            });
        }
        Ok(profile)
    }

    fn put(&self, name: &str, profile: &ConnectionProfile) -> Result<(), StoreError> {
        if profile.name != name {
            return Err(StoreError::Invalid {
                name: name.to_string(),
                reason: format!("profile is named '{}'", profile.name),
            });
        }
        profile.validate(&self.reserved_name).map_err(|e| StoreError::Invalid {
            name: name.to_string(),
            reason: e.to_string(),
        })?;

        let content = serde_json::to_vec_pretty(profile).map_err(|source| StoreError::Decode {
            name: name.to_string(),
            source,
        })?;

        let meta_path = self.meta_path(name);
        crate::fs::write_private_atomic(&meta_path, &content).map_err(|source| {
            StoreError::Io {
                path: meta_path.clone(),
                source,
            }
        })?;

        tracing::debug!(
            profile = name,
            digest = %fingerprint(&content),
            "Stored connection profile"
        );
        Ok(())
    }
}
