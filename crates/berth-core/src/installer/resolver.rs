//! Installer context resolution.

use thiserror::Error;

use crate::profile::{ProfileStore, StoreError};
use crate::types::DEFAULT_CONTEXT_NAME;

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("installer context '{name}' does not exist")]
    NotFound { name: String },

    #[error("context '{name}' disappeared before it could be activated")]
    RaceOrMissing { name: String },

    #[error("failed to look up context '{name}': {source}")]
    Store {
        name: String,
        #[source]
        source: StoreError,
    },
}

/// Inputs of one installer context resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallerContextRequest {
    /// Explicitly requested installer context; empty when not given
    pub explicit: String,
    /// Profile active in the calling process
    pub current_active: String,
    /// Reserved default profile name
    pub default_name: String,
}

impl InstallerContextRequest {
    pub fn new(
        explicit: impl Into<String>,
        current_active: impl Into<String>,
        default_name: impl Into<String>,
    ) -> Self {
        Self {
            explicit: explicit.into(),
            current_active: current_active.into(),
            default_name: default_name.into(),
        }
    }

    /// Request with the standard reserved default name.
    pub fn with_current(explicit: impl Into<String>, current_active: impl Into<String>) -> Self {
        Self::new(explicit, current_active, DEFAULT_CONTEXT_NAME)
    }
}

/// Decide which profile the installer itself runs under.
///
/// - no explicit override: the current active profile, unvalidated
/// - explicit override equal to the default name: always accepted
/// - any other override: must exist in `store`
pub fn resolve_installer_context(
    store: &dyn ProfileStore,
    request: &InstallerContextRequest,
) -> Result<String, ContextError> {
    if request.explicit.is_empty() {
        return Ok(request.current_active.clone());
    }
    if request.explicit == request.default_name {
        return Ok(request.explicit.clone());
    }

    match store.lookup(&request.explicit) {
        Ok(_) => Ok(request.explicit.clone()),
        Err(e) if e.is_not_found() => Err(ContextError::NotFound {
            name: request.explicit.clone(),
        }),
        Err(source) => Err(ContextError::Store {
            name: request.explicit.clone(),
            source,
        }),
    }
}
