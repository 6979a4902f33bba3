//! High-level commands for berth operations.
//!
//! This module provides the public API the CLI calls into: seeding the
//! profile store, resolving contexts and preparing installer credentials.

pub mod bootstrap;
pub mod prepare;
pub mod profile;

pub use bootstrap::{BootstrapCommand, BootstrapOptions, BootstrapReport};
pub use prepare::{PrepareCommand, PrepareOptions, PrepareReport};
pub use profile::{EndpointSummary, ProfileCommand, ProfileSummary};
