//! Bootstrap command implementation.
//!
//! Seeds the profile store with the connection profile packaged alongside an
//! installer, and keeps the packaged registry credentials for later
//! composition.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::context::AppContext;
use crate::credentials::AuthEntry;
use crate::profile::bootstrap::{PACKAGED_PROFILE_PATH, PACKAGED_REGISTRY_CREDS_PATH};
use crate::profile::{BootstrapImporter, ProfileStore};
use crate::types::EndpointKind;

/// Options for the bootstrap command
#[derive(Debug, Clone)]
pub struct BootstrapOptions {
    /// Name the imported profile is stored under
    pub profile_name: String,
    /// Profile material (JSON or zip)
    pub material_path: PathBuf,
    /// Packaged registry credentials, if any
    pub registry_creds_path: Option<PathBuf>,
    /// Whether a missing registry credentials file is an error
    pub registry_creds_required: bool,
}

impl BootstrapOptions {
    pub fn new(profile_name: impl Into<String>, material_path: impl Into<PathBuf>) -> Self {
        Self {
            profile_name: profile_name.into(),
            material_path: material_path.into(),
            registry_creds_path: None,
            registry_creds_required: false,
        }
    }

    /// Options for the material packaged at the well-known installer paths.
    ///
    /// Not every installer image ships registry credentials, so the packaged
    /// credentials file may be absent.
    pub fn packaged(profile_name: impl Into<String>) -> Self {
        let mut options = Self::new(profile_name, PACKAGED_PROFILE_PATH);
        options.registry_creds_path = Some(PathBuf::from(PACKAGED_REGISTRY_CREDS_PATH));
        options
    }

    /// Read registry credentials from `path`, which must exist.
    pub fn with_registry_creds(mut self, path: impl Into<PathBuf>) -> Self {
        self.registry_creds_path = Some(path.into());
        self.registry_creds_required = true;
        self
    }

    fn registry_creds_to_load(&self) -> Option<&Path> {
        let path = self.registry_creds_path.as_deref()?;
        if !self.registry_creds_required && !path.exists() {
            tracing::debug!(path = %path.display(), "No packaged registry credentials");
            return None;
        }
        Some(path)
    }
}

/// Report from a bootstrap operation
#[derive(Debug, Clone)]
pub struct BootstrapReport {
    /// Name of the imported profile
    pub profile: String,
    /// Endpoint kinds the profile defines
    pub endpoints: Vec<EndpointKind>,
    /// Packaged registry credentials (empty when none were requested)
    pub registry_auth: BTreeMap<String, AuthEntry>,
}

/// Bootstrap command orchestrator
#[derive(Debug)]
pub struct BootstrapCommand {
    app: AppContext,
}

impl BootstrapCommand {
    pub fn new(app: AppContext) -> Self {
        Self { app }
    }

    /// Create a bootstrap command with default paths
    pub fn with_defaults() -> anyhow::Result<Self> {
        Ok(Self::new(AppContext::with_defaults()?))
    }

    /// Execute the import.
    ///
    /// Registry credentials are read before the profile is written, so a bad
    /// credentials file leaves the store untouched. Once the profile is in
    /// place they are persisted where registry auth composition reads them.
    pub fn execute(&self, options: &BootstrapOptions) -> anyhow::Result<BootstrapReport> {
        let config = self
            .app
            .config_store()
            .load_with_env()
            .context("Failed to load berth configuration")?;
        let store = self.app.profile_store_for(&config);
        let importer = BootstrapImporter::new(&store);

        let registry_creds = options.registry_creds_to_load();
        let registry_auth = match registry_creds {
            Some(path) => importer.load_registry_auth(path)?,
            None => BTreeMap::new(),
        };

        importer.import(&options.profile_name, &options.material_path)?;

        if registry_creds.is_some() {
            self.persist_registry_auth(&registry_auth)?;
        }

        let profile = store.lookup(&options.profile_name)?;
        Ok(BootstrapReport {
            profile: profile.name,
            endpoints: profile.endpoints.keys().copied().collect(),
            registry_auth,
        })
    }

    fn persist_registry_auth(&self, entries: &BTreeMap<String, AuthEntry>) -> anyhow::Result<()> {
        let path = self.app.packaged_registry_auth_path();
        let content = serde_json::to_vec_pretty(entries)
            .context("Failed to encode packaged registry credentials")?;
        crate::fs::write_private_atomic(&path, &content)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        tracing::info!(
            registries = entries.len(),
            path = %path.display(),
            "Stored packaged registry credentials"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn app(temp: &TempDir) -> AppContext {
        AppContext::new(
            temp.path().join("home"),
            temp.path().join("config"),
            temp.path().join("state"),
        )
    }

    #[test]
    fn test_packaged_options_use_installer_paths() {
        let options = BootstrapOptions::packaged("cnab");
        assert_eq!(options.material_path, PathBuf::from(PACKAGED_PROFILE_PATH));
        assert_eq!(
            options.registry_creds_path,
            Some(PathBuf::from(PACKAGED_REGISTRY_CREDS_PATH))
        );
        assert!(!options.registry_creds_required);
    }

    #[test]
    fn test_missing_optional_registry_creds_are_skipped() {
        let temp = TempDir::new().unwrap();
        let ctx = app(&temp);
        let material = temp.path().join("profile.json");
        std::fs::write(&material, r#"{"endpoints": {"docker": {"host": "tcp://h:2376"}}}"#)
            .unwrap();
        let mut options = BootstrapOptions::packaged("cnab");
        options.material_path = material;
        options.registry_creds_path = Some(temp.path().join("absent.json"));

        let report = BootstrapCommand::new(ctx.clone()).execute(&options).unwrap();

        assert!(report.registry_auth.is_empty());
        assert!(!ctx.packaged_registry_auth_path().exists());
    }

    #[test]
    fn test_missing_required_registry_creds_fail() {
        let temp = TempDir::new().unwrap();
        let material = temp.path().join("profile.json");
        std::fs::write(&material, r#"{"endpoints": {"docker": {"host": "tcp://h:2376"}}}"#)
            .unwrap();

        let result = BootstrapCommand::new(app(&temp)).execute(
            &BootstrapOptions::new("cnab", &material)
                .with_registry_creds(temp.path().join("absent.json")),
        );

        assert!(result.is_err());
    }

    #[test]
    fn test_execute_reports_endpoints_and_registries() {
        let temp = TempDir::new().unwrap();
        let material = temp.path().join("profile.json");
        std::fs::write(
            &material,
            r#"{"endpoints": {
                "docker": {"host": "tcp://10.0.0.1:2376"},
                "kubernetes": {"host": "https://10.0.0.1:6443", "namespace": "apps"}
            }}"#,
        )
        .unwrap();
        let creds = temp.path().join("registry-creds.json");
        std::fs::write(&creds, r#"{"registry.example.com": {"username": "u", "password": "p"}}"#)
            .unwrap();

        let report = BootstrapCommand::new(app(&temp))
            .execute(&BootstrapOptions::new("cnab", &material).with_registry_creds(&creds))
            .unwrap();

        assert_eq!(report.profile, "cnab");
        assert_eq!(
            report.endpoints,
            vec![EndpointKind::Docker, EndpointKind::Kubernetes]
        );
        assert!(report.registry_auth.contains_key("registry.example.com"));
    }

    #[test]
    fn test_execute_persists_registry_creds_owner_only() {
        let temp = TempDir::new().unwrap();
        let ctx = app(&temp);
        let material = temp.path().join("profile.json");
        std::fs::write(&material, r#"{"endpoints": {"docker": {"host": "tcp://h:2376"}}}"#)
            .unwrap();
        let creds = temp.path().join("registry-creds.json");
        std::fs::write(&creds, r#"{"registry.example.com": {"username": "u", "password": "p"}}"#)
            .unwrap();

        BootstrapCommand::new(ctx.clone())
            .execute(&BootstrapOptions::new("cnab", &material).with_registry_creds(&creds))
            .unwrap();

        let stored: BTreeMap<String, AuthEntry> =
            serde_json::from_slice(&std::fs::read(ctx.packaged_registry_auth_path()).unwrap())
                .unwrap();
        assert_eq!(stored["registry.example.com"].username.as_deref(), Some("u"));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(ctx.packaged_registry_auth_path())
                .unwrap()
                .permissions()
                .mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn test_execute_rejects_configured_default_name() {
        let temp = TempDir::new().unwrap();
        let ctx = app(&temp);
        std::fs::create_dir_all(ctx.config_dir()).unwrap();
        std::fs::write(
            ctx.config_dir().join("berth.toml"),
            "default_context = \"local\"\ncurrent_context = \"local\"\n",
        )
        .unwrap();
        let material = temp.path().join("profile.json");
        std::fs::write(&material, r#"{"endpoints": {"docker": {"host": "tcp://h:2376"}}}"#)
            .unwrap();

        let result =
            BootstrapCommand::new(ctx.clone()).execute(&BootstrapOptions::new("local", &material));

        assert!(result.is_err());
        assert!(!ctx.profile_store().contains("local").unwrap());
    }

    #[test]
    fn test_bad_registry_creds_leave_store_untouched() {
        let temp = TempDir::new().unwrap();
        let ctx = app(&temp);
        let material = temp.path().join("profile.json");
        std::fs::write(&material, r#"{"endpoints": {"docker": {"host": "tcp://h:2376"}}}"#)
            .unwrap();
        let creds = temp.path().join("registry-creds.json");
        std::fs::write(&creds, "not json").unwrap();

        let result = BootstrapCommand::new(ctx.clone())
            .execute(&BootstrapOptions::new("cnab", &material).with_registry_creds(&creds));

        assert!(result.is_err());
        assert!(!ctx.profile_store().contains("cnab").unwrap());
    }
}
