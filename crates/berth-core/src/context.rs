//! Application context for unified dependency injection.

use std::path::{Path, PathBuf};

use crate::config::{BerthConfig, ConfigStore, paths};
use crate::credentials::{
    ConfigFileAuthSource, CredentialStoreError, FileCredentialStore, LayeredAuthSource,
    PackagedAuthSource,
};
use crate::profile::FileProfileStore;

/// Unified application context for dependency injection.
///
/// Provides access to the stores and configuration paths. Frontends create
/// this once and pass it to commands.
#[derive(Debug, Clone)]
pub struct AppContext {
    home_dir: PathBuf,
    config_dir: PathBuf,
    state_dir: PathBuf,
}

impl AppContext {
    /// Create a new context with explicit paths.
    pub fn new(home_dir: PathBuf, config_dir: PathBuf, state_dir: PathBuf) -> Self {
        Self {
            home_dir,
            config_dir,
            state_dir,
        }
    }

    /// Create a context from the platform's standard directories.
    pub fn with_defaults() -> anyhow::Result<Self> {
        let home_dir = dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
        let config_dir = dirs::config_dir()
            .map(|p| p.join("berth"))
            .unwrap_or_else(|| home_dir.join(".config").join("berth"));
        let state_dir = dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .ok_or_else(|| anyhow::anyhow!("Could not determine state directory"))?
            .join("berth");

        Ok(Self::new(home_dir, config_dir, state_dir))
    }

    pub fn home_dir(&self) -> &Path {
        &self.home_dir
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    /// Get a ConfigStore for berth.toml.
    pub fn config_store(&self) -> ConfigStore {
        ConfigStore::from_dir(&self.config_dir)
    }

    /// Get the connection profile store.
    pub fn profile_store(&self) -> FileProfileStore {
        FileProfileStore::new(paths::profiles_dir(&self.config_dir))
    }

    /// Get the profile store refusing writes under the configured default name.
    pub fn profile_store_for(&self, config: &BerthConfig) -> FileProfileStore {
        self.profile_store().with_reserved_name(config.default_context.clone())
    }

    /// Get the credential store scoped to `target_context`.
    pub fn credential_store(
        &self,
        target_context: &str,
    ) -> Result<FileCredentialStore, CredentialStoreError> {
        FileCredentialStore::for_context(&paths::credentials_dir(&self.state_dir), target_context)
    }

    /// Where bootstrap keeps the packaged registry credentials.
    pub fn packaged_registry_auth_path(&self) -> PathBuf {
        paths::packaged_registry_auth_file(&self.config_dir)
    }

    /// Get the registry client config named in `config`.
    pub fn client_auth_source(&self, config: &BerthConfig) -> ConfigFileAuthSource {
        let path = config
            .registry_auth_file
            .clone()
            .unwrap_or_else(|| paths::default_registry_auth_file(&self.home_dir));
        ConfigFileAuthSource::new(path)
    }

    /// Get the registry auth source for composition.
    ///
    /// Packaged credentials come first; a login in the client config wins
    /// for the same host.
    pub fn registry_auth_source(&self, config: &BerthConfig) -> LayeredAuthSource {
        LayeredAuthSource::new()
            .with_layer(PackagedAuthSource::new(self.packaged_registry_auth_path()))
            .with_layer(self.client_auth_source(config))
    }
}
