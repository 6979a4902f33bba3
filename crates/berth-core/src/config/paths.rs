//! Path layout helpers.

use std::path::{Path, PathBuf};

pub fn config_path(config_dir: &Path) -> PathBuf {
    config_dir.join("berth.toml")
}

pub fn profiles_dir(config_dir: &Path) -> PathBuf {
    config_dir.join("profiles")
}

pub fn credentials_dir(state_dir: &Path) -> PathBuf {
    state_dir.join("credentials")
}

/// Docker-style client config holding registry logins.
pub fn default_registry_auth_file(home_dir: &Path) -> PathBuf {
    home_dir.join(".docker").join("config.json")
}

/// Registry credentials persisted by a bootstrap import.
pub fn packaged_registry_auth_file(config_dir: &Path) -> PathBuf {
    config_dir.join("registry-creds.json")
}
