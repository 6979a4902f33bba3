//! Berth Core Library
//!
//! Composes the credential set handed to an installer, resolves which
//! connection profile the installer runs under, and seeds the profile store
//! from material packaged with the installer.

pub mod commands;
pub mod config;
pub mod context;
pub mod credentials;
pub mod fs;
pub mod installer;
pub mod profile;
pub mod types;

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration
    pub use crate::config::{BerthConfig, ConfigStore};
    pub use crate::context::AppContext;

    // Credentials
    pub use crate::credentials::{
        AuthEntry, CredentialComposer, CredentialOrigin, CredentialSet, CredentialSource,
        CredentialStore, CredentialValue, RegistryAuthSource, SourceKind, Warning,
    };

    // Profiles
    pub use crate::profile::{
        BootstrapImporter, ConnectionProfile, Endpoint, FileProfileStore, ProfileStore,
    };

    // Installer context
    pub use crate::installer::{InstallerTargets, ProcessContext, resolve_installer_context};

    pub use crate::types::{DEFAULT_CONTEXT_NAME, EndpointKind};
}
