//! Config store for loading berth.toml.

use std::path::{Path, PathBuf};

use super::{BerthConfig, parser, paths::config_path};

#[derive(Debug, Clone)]
pub struct ConfigStore {
    config_path: PathBuf,
}

impl ConfigStore {
    pub fn from_dir(config_dir: &Path) -> Self {
        Self {
            config_path: config_path(config_dir),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load berth.toml; a missing file yields the default configuration.
    pub fn load(&self) -> anyhow::Result<BerthConfig> {
        if !self.config_path.exists() {
            return Ok(BerthConfig::new());
        }
        parser::parse_berth_toml(&self.config_path)
    }

    /// Load berth.toml and apply process environment overrides.
    pub fn load_with_env(&self) -> anyhow::Result<BerthConfig> {
        let config = self.load()?.with_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }
}
