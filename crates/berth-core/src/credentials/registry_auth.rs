//! Registry authentication sources.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use thiserror::Error;

use super::AuthEntry;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to read registry auth from {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse registry auth from {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Provider of registry auth entries, keyed by registry host.
pub trait RegistryAuthSource {
    fn fetch(&self) -> Result<BTreeMap<String, AuthEntry>, FetchError>;
}

/// Entries already in memory, e.g. loaded from packaged registry credentials.
impl RegistryAuthSource for BTreeMap<String, AuthEntry> {
    fn fetch(&self) -> Result<BTreeMap<String, AuthEntry>, FetchError> {
        Ok(self.clone())
    }
}

/// Reads the `auths` section of a docker-style `config.json`.
#[derive(Debug, Clone)]
pub struct ConfigFileAuthSource {
    path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    auths: BTreeMap<String, AuthEntry>,
}

impl ConfigFileAuthSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RegistryAuthSource for ConfigFileAuthSource {
    fn fetch(&self) -> Result<BTreeMap<String, AuthEntry>, FetchError> {
        // No config file means no registries are logged in
        let Some(content) = read_optional(&self.path)? else {
            return Ok(BTreeMap::new());
        };

        let config: ConfigFile =
            serde_json::from_slice(&content).map_err(|source| FetchError::Parse {
                path: self.path.clone(),
                source,
            })?;

        Ok(config
            .auths
            .into_iter()
            .map(|(host, entry)| (host, expand_basic_auth(entry)))
            .collect())
    }
}

/// Reads registry credentials persisted by a bootstrap import: a plain JSON
/// map of registry host to auth entry.
#[derive(Debug, Clone)]
pub struct PackagedAuthSource {
    path: PathBuf,
}

impl PackagedAuthSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl RegistryAuthSource for PackagedAuthSource {
    fn fetch(&self) -> Result<BTreeMap<String, AuthEntry>, FetchError> {
        let Some(content) = read_optional(&self.path)? else {
            return Ok(BTreeMap::new());
        };

        let entries: BTreeMap<String, AuthEntry> =
            serde_json::from_slice(&content).map_err(|source| FetchError::Parse {
                path: self.path.clone(),
                source,
            })?;

        Ok(entries
            .into_iter()
            .map(|(host, entry)| (host, expand_basic_auth(entry)))
            .collect())
    }
}

/// Several sources read in order; a later source wins for the same host.
#[derive(Default)]
pub struct LayeredAuthSource {
    layers: Vec<Box<dyn RegistryAuthSource>>,
}

impl LayeredAuthSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layer(mut self, source: impl RegistryAuthSource + 'static) -> Self {
        self.layers.push(Box::new(source));
        self
    }
}

impl RegistryAuthSource for LayeredAuthSource {
    fn fetch(&self) -> Result<BTreeMap<String, AuthEntry>, FetchError> {
        let mut merged = BTreeMap::new();
        for layer in &self.layers {
            merged.extend(layer.fetch()?);
        }
        Ok(merged)
    }
}

fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, FetchError> {
    match std::fs::read(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(FetchError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Fill `username`/`password` from the base64 `auth` field when absent.
///
/// An `auth` value that does not decode is left untouched.
fn expand_basic_auth(mut entry: AuthEntry) -> AuthEntry {
    if entry.username.is_some() || entry.password.is_some() {
        return entry;
    }
    let Some(decoded) = entry
        .auth
        .as_deref()
        .and_then(|auth| STANDARD.decode(auth.trim()).ok())
        .and_then(|bytes| String::from_utf8(bytes).ok())
    else {
        return entry;
    };
    if let Some((user, pass)) = decoded.split_once(':') {
        entry.username = Some(user.to_string());
        entry.password = Some(pass.to_string());
    }
    entry
}
