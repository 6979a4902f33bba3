//! Named credential-set store.
//!
//! Credential sets are scoped to the target context the bundle is installed
//! into: `<root>/<target-context>/<name>.toml`.

use std::path::{Path, PathBuf};

use anyhow::Context;
use thiserror::Error;

use super::CredentialSet;
use crate::config::parser::enhance_toml_error;

#[derive(Debug, Error)]
pub enum CredentialStoreError {
    #[error("credential set '{name}' not found")]
    NotFound { name: String },

    #[error("failed to read credential set '{name}': {reason}")]
    Unreadable { name: String, reason: String },

    #[error("invalid target context name '{name}'")]
    InvalidContext { name: String },
}

/// Lookup of credential sets by name.
pub trait CredentialStore {
    fn resolve_named_set(&self, name: &str) -> Result<CredentialSet, CredentialStoreError>;
}

/// File-backed credential store for one target context.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    dir: PathBuf,
}

impl FileCredentialStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Store scoped to `target_context` under `root`.
    ///
    /// The context becomes a single directory component, so only plain names
    /// are accepted.
    pub fn for_context(root: &Path, target_context: &str) -> Result<Self, CredentialStoreError> {
        if !is_plain_name(target_context) {
            return Err(CredentialStoreError::InvalidContext {
                name: target_context.to_string(),
            });
        }
        Ok(Self::new(root.join(target_context)))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, name: &str) -> Option<PathBuf> {
        is_plain_name(name).then(|| self.dir.join(format!("{name}.toml")))
    }
}

fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

impl CredentialStore for FileCredentialStore {
    fn resolve_named_set(&self, name: &str) -> Result<CredentialSet, CredentialStoreError> {
        let Some(path) = self.entry_path(name) else {
            return Err(CredentialStoreError::NotFound {
                name: name.to_string(),
            });
        };
        if !path.is_file() {
            return Err(CredentialStoreError::NotFound {
                name: name.to_string(),
            });
        }

        parse_credential_set_file(&path).map_err(|e| CredentialStoreError::Unreadable {
            name: name.to_string(),
            reason: format!("{e:#}"),
        })
    }
}

/// Parse a credential-set file.
///
/// ```toml
/// name = "production"        # optional, informational
///
/// [credentials]
/// api_token = "..."
/// kubeconfig = { path = "/etc/kube/config" }
///
/// [registry_auth."registry.example.com"]
/// username = "ci"
/// password = "..."
/// ```
pub fn parse_credential_set_file(path: &Path) -> anyhow::Result<CredentialSet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read credential set file: {}", path.display()))?;

    parse_credential_set_str(&content)
        .with_context(|| format!("Failed to parse credential set file: {}", path.display()))
}

pub fn parse_credential_set_str(content: &str) -> anyhow::Result<CredentialSet> {
    let set: CredentialSet =
        toml::from_str(content).map_err(|e| enhance_toml_error(e, content))?;

    if let Some(key) = set.credentials.keys().find(|k| k.trim().is_empty()) {
        anyhow::bail!("Credential set contains an empty key: '{key}'");
    }
    Ok(set)
}
