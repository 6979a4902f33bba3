//! Process-scoped context holding the active profile pointer.

use super::resolver::{ContextError, InstallerContextRequest, resolve_installer_context};
use crate::profile::ProfileStore;

/// The pair of contexts an installer operation works with.
///
/// The installer context is where the installer runs; the target context
/// is where the bundle is installed. Neither is derived from the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallerTargets {
    pub installer_context: String,
    pub target_context: String,
}

/// Per-invocation state shared by every operation of one process.
///
/// The active profile pointer only changes through [`ProcessContext::set_active`].
#[derive(Debug)]
pub struct ProcessContext<S: ProfileStore> {
    store: S,
    active: String,
    target: String,
    default_name: String,
}

impl<S: ProfileStore> ProcessContext<S> {
    /// Create a context whose active and target profile is `active`.
    pub fn new(store: S, active: impl Into<String>, default_name: impl Into<String>) -> Self {
        let active = active.into();
        Self {
            store,
            target: active.clone(),
            active,
            default_name: default_name.into(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Currently active profile.
    pub fn active(&self) -> &str {
        &self.active
    }

    /// Profile that was active when the process started.
    pub fn target_context(&self) -> &str {
        &self.target
    }

    pub fn default_name(&self) -> &str {
        &self.default_name
    }

    /// Resolve the installer context against the current active profile.
    pub fn resolve_installer_context(&self, explicit: &str) -> Result<String, ContextError> {
        let request =
            InstallerContextRequest::new(explicit, self.active.as_str(), self.default_name.as_str());
        resolve_installer_context(&self.store, &request)
    }

    /// Make `name` the active profile.
    ///
    /// The name is validated first; on any failure the active pointer is
    /// left exactly as it was.
    pub fn set_active(&mut self, name: &str) -> Result<(), ContextError> {
        if name != self.default_name {
            match self.store.lookup(name) {
                Ok(_) => {}
                Err(e) if e.is_not_found() => {
                    return Err(ContextError::RaceOrMissing {
                        name: name.to_string(),
                    });
                }
                Err(source) => {
                    return Err(ContextError::Store {
                        name: name.to_string(),
                        source,
                    });
                }
            }
        }

        if self.active != name {
            tracing::info!(from = %self.active, to = name, "Switching active context");
            self.active = name.to_string();
        }
        Ok(())
    }

    /// Resolve the installer context and make it active.
    pub fn activate_installer_context(
        &mut self,
        explicit: &str,
    ) -> Result<InstallerTargets, ContextError> {
        let installer_context = self.resolve_installer_context(explicit)?;
        // The current active profile was validated when it became active
        if installer_context != self.active {
            self.set_active(&installer_context)?;
        }
        Ok(InstallerTargets {
            installer_context,
            target_context: self.target.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{ConnectionProfile, Endpoint, FileProfileStore};
    use crate::types::EndpointKind;
    use tempfile::TempDir;

    fn context_with(names: &[&str], active: &str) -> (TempDir, ProcessContext<FileProfileStore>) {
        let temp = TempDir::new().unwrap();
        let store = FileProfileStore::new(temp.path().to_path_buf());
        for name in names {
            let profile = ConnectionProfile::new(*name)
                .with_endpoint(EndpointKind::Docker, Endpoint::new("tcp://h:2376"));
            store.put(name, &profile).unwrap();
        }
        (temp, ProcessContext::new(store, active, "default"))
    }

    #[test]
    fn test_set_active_switches_pointer() {
        let (_temp, mut ctx) = context_with(&["ops"], "prod");
        ctx.set_active("ops").unwrap();
        assert_eq!(ctx.active(), "ops");
        assert_eq!(ctx.target_context(), "prod");
    }

    #[test]
    fn test_set_active_missing_leaves_pointer_untouched() {
        let (_temp, mut ctx) = context_with(&["ops"], "prod");
        let before = ctx.active().to_string();

        let err = ctx.set_active("vanished").unwrap_err();

        assert!(matches!(err, ContextError::RaceOrMissing { .. }));
        assert_eq!(ctx.active(), before);
    }

    #[test]
    fn test_set_active_default_without_store_entry() {
        let (_temp, mut ctx) = context_with(&[], "prod");
        ctx.set_active("default").unwrap();
        assert_eq!(ctx.active(), "default");
    }

    #[test]
    fn test_activate_without_override_keeps_active() {
        let (_temp, mut ctx) = context_with(&[], "prod");
        let targets = ctx.activate_installer_context("").unwrap();
        assert_eq!(
            targets,
            InstallerTargets {
                installer_context: "prod".to_string(),
                target_context: "prod".to_string(),
            }
        );
    }

    #[test]
    fn test_activate_override_keeps_target_separate() {
        let (_temp, mut ctx) = context_with(&["ops"], "prod");
        let targets = ctx.activate_installer_context("ops").unwrap();
        assert_eq!(targets.installer_context, "ops");
        assert_eq!(targets.target_context, "prod");
        assert_eq!(ctx.active(), "ops");
    }

    #[test]
    fn test_activate_unknown_override_fails_before_mutation() {
        let (_temp, mut ctx) = context_with(&[], "prod");
        assert!(matches!(
            ctx.activate_installer_context("nope"),
            Err(ContextError::NotFound { .. })
        ));
        assert_eq!(ctx.active(), "prod");
    }
}
