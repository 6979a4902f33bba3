//! Installer context handling.
//!
//! The installer context names the connection profile the installer process
//! itself runs against. It is resolved independently from the target
//! context the bundle is installed into.

pub mod resolver;
pub mod session;

pub use resolver::{ContextError, InstallerContextRequest, resolve_installer_context};
pub use session::{InstallerTargets, ProcessContext};
