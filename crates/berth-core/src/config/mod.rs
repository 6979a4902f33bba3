//! Configuration management
//!
//! `berth.toml` lives in the global config directory and selects the active
//! context at process start, the reserved default name, and registry auth
//! defaults. `BERTH_CONTEXT` overrides the active context.

pub mod parser;
pub mod paths;
pub mod schema;
pub mod store;

pub use parser::{parse_berth_toml, parse_berth_toml_str};
pub use schema::{BerthConfig, CONTEXT_ENV_VAR};
pub use store::ConfigStore;
