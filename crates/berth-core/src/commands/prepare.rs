//! Prepare command implementation.
//!
//! Resolves the installer context and composes the credential set an
//! installer invocation needs. The order matters:
//! 1. resolve (and validate) the installer context
//! 2. compose credentials against the target context
//! 3. make the installer context active
//!
//! A context that cannot be resolved stops the command before any
//! credential source is read.

use std::collections::BTreeMap;

use anyhow::Context;

use crate::config::BerthConfig;
use crate::context::AppContext;
use crate::credentials::{
    CredentialComposer, CredentialOrigin, CredentialSet, CredentialSource, Warning,
};
use crate::installer::{InstallerTargets, ProcessContext};
use crate::profile::FileProfileStore;

/// Options for the prepare command
#[derive(Debug, Clone, Default)]
pub struct PrepareOptions {
    /// Installer context override
    pub installer_context: Option<String>,
    /// Credential set names or files
    pub credential_sets: Vec<String>,
    /// Single `key=value` credentials
    pub credentials: Vec<String>,
    /// Send registry auth; `None` uses the configured default
    pub with_registry_auth: Option<bool>,
}

impl PrepareOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the installer context override
    pub fn with_installer_context(mut self, context: impl Into<String>) -> Self {
        self.installer_context = Some(context.into());
        self
    }

    /// Add a credential set name or file path
    pub fn with_credential_set(mut self, name: impl Into<String>) -> Self {
        self.credential_sets.push(name.into());
        self
    }

    /// Add a single credential (KEY=VALUE)
    pub fn with_credential(mut self, pair: impl Into<String>) -> Self {
        self.credentials.push(pair.into());
        self
    }

    /// Enable or disable registry auth
    pub fn with_registry_auth(mut self, enabled: bool) -> Self {
        self.with_registry_auth = Some(enabled);
        self
    }
}

/// Report from a prepare operation
#[derive(Debug, Clone)]
pub struct PrepareReport {
    /// Profile the installer runs under
    pub installer_context: String,
    /// Profile the bundle is installed into
    pub target_context: String,
    /// Composed credentials
    pub credentials: CredentialSet,
    /// Origin of each composed key
    pub origins: BTreeMap<String, CredentialOrigin>,
    /// Non-fatal findings of the composition
    pub warnings: Vec<Warning>,
}

/// Prepare command orchestrator
#[derive(Debug)]
pub struct PrepareCommand {
    app: AppContext,
}

impl PrepareCommand {
    pub fn new(app: AppContext) -> Self {
        Self { app }
    }

    /// Create a prepare command with default paths
    pub fn with_defaults() -> anyhow::Result<Self> {
        Ok(Self::new(AppContext::with_defaults()?))
    }

    fn load_config(&self) -> anyhow::Result<BerthConfig> {
        self.app
            .config_store()
            .load_with_env()
            .context("Failed to load berth configuration")
    }

    fn process_context(&self, config: &BerthConfig) -> ProcessContext<FileProfileStore> {
        ProcessContext::new(
            self.app.profile_store_for(config),
            config.current_context.as_str(),
            config.default_context.as_str(),
        )
    }

    /// Installer context override: explicit option, then configuration.
    fn explicit_installer_context<'a>(
        options: &'a PrepareOptions,
        config: &'a BerthConfig,
    ) -> &'a str {
        options
            .installer_context
            .as_deref()
            .or(config.installer_context.as_deref())
            .unwrap_or("")
    }

    /// Resolve the installer and target contexts without composing credentials.
    pub fn resolve_contexts(&self, options: &PrepareOptions) -> anyhow::Result<InstallerTargets> {
        let config = self.load_config()?;
        let process = self.process_context(&config);
        let explicit = Self::explicit_installer_context(options, &config);

        let installer_context = process.resolve_installer_context(explicit)?;
        Ok(InstallerTargets {
            installer_context,
            target_context: process.target_context().to_string(),
        })
    }

    /// Execute the prepare flow
    pub fn execute(&self, options: &PrepareOptions) -> anyhow::Result<PrepareReport> {
        let config = self.load_config()?;
        let mut process = self.process_context(&config);
        let explicit = Self::explicit_installer_context(options, &config);

        let installer_context = process.resolve_installer_context(explicit)?;
        let target_context = process.target_context().to_string();
        tracing::info!(
            installer = %installer_context,
            target = %target_context,
            "Resolved installer context"
        );

        let credential_store = self.app.credential_store(&target_context)?;
        let registry = self.app.registry_auth_source(&config);
        let sources = vec![
            CredentialSource::NamedSet(options.credential_sets.clone()),
            CredentialSource::Explicit(options.credentials.clone()),
            CredentialSource::AmbientEndpoint(target_context.clone()),
            CredentialSource::RegistryAuth(
                options
                    .with_registry_auth
                    .unwrap_or(config.with_registry_auth),
            ),
        ];

        let composition = CredentialComposer::new(&credential_store, process.store(), &registry)
            .with_default_context(process.default_name())
            .compose_detailed(&sources)?;

        if installer_context != process.active() {
            process.set_active(&installer_context)?;
        }

        Ok(PrepareReport {
            installer_context,
            target_context,
            credentials: composition.credentials,
            origins: composition.origins,
            warnings: composition.warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_builder() {
        let options = PrepareOptions::new()
            .with_installer_context("ops")
            .with_credential_set("prod")
            .with_credential("a=b")
            .with_credential("c=d")
            .with_registry_auth(true);

        assert_eq!(options.installer_context.as_deref(), Some("ops"));
        assert_eq!(options.credential_sets, vec!["prod".to_string()]);
        assert_eq!(options.credentials.len(), 2);
        assert_eq!(options.with_registry_auth, Some(true));
    }

    #[test]
    fn test_explicit_option_beats_config() {
        let config = BerthConfig {
            installer_context: Some("from-config".to_string()),
            ..Default::default()
        };
        let options = PrepareOptions::new().with_installer_context("from-flag");
        assert_eq!(
            PrepareCommand::explicit_installer_context(&options, &config),
            "from-flag"
        );
        assert_eq!(
            PrepareCommand::explicit_installer_context(&PrepareOptions::new(), &config),
            "from-config"
        );
        assert_eq!(
            PrepareCommand::explicit_installer_context(
                &PrepareOptions::new(),
                &BerthConfig::default()
            ),
            ""
        );
    }
}
