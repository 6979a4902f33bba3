//! Configuration schema for berth.toml
//!
//! ```toml
//! current_context = "prod"
//! default_context = "default"
//! installer_context = "ops"
//! with_registry_auth = false
//! registry_auth_file = "/home/me/.docker/config.json"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::types::DEFAULT_CONTEXT_NAME;

/// Environment variable overriding `current_context`.
pub const CONTEXT_ENV_VAR: &str = "BERTH_CONTEXT";

/// Root configuration structure for berth.toml
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BerthConfig {
    /// Profile active when a command starts (also the target context)
    #[serde(default = "default_context")]
    pub current_context: String,

    /// Reserved default profile name
    #[serde(default = "default_context")]
    pub default_context: String,

    /// Installer context used when none is given on the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installer_context: Option<String>,

    /// Gather registry auth unless told otherwise
    #[serde(default)]
    pub with_registry_auth: bool,

    /// Docker-style config.json to read registry auth from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_auth_file: Option<PathBuf>,
}

fn default_context() -> String {
    DEFAULT_CONTEXT_NAME.to_string()
}

impl Default for BerthConfig {
    fn default() -> Self {
        Self {
            current_context: default_context(),
            default_context: default_context(),
            installer_context: None,
            with_registry_auth: false,
            registry_auth_file: None,
        }
    }
}

impl BerthConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply environment overrides using `lookup` to read variables.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(context) = lookup(CONTEXT_ENV_VAR).filter(|c| !c.trim().is_empty()) {
            self.current_context = context;
        }
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.current_context.trim().is_empty() {
            anyhow::bail!("current_context cannot be empty");
        }
        if self.default_context.trim().is_empty() {
            anyhow::bail!("default_context cannot be empty");
        }
        if let Some(installer) = &self.installer_context
            && installer.trim().is_empty()
        {
            anyhow::bail!("installer_context cannot be empty when set; remove the key instead");
        }
        Ok(())
    }
}
