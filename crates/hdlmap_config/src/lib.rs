//! Parsing and validation of `hdlmap.toml` analysis configuration.
//!
//! Every section is optional: an absent file or an empty one yields the
//! built-in defaults. [`resolve_toolchain`] and [`resolve_resolver`] merge the
//! user's overrides with the per-dialect defaults into the value types the
//! descriptor locator and the top-module resolver consume.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod resolve;
pub mod rules;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_file, load_config_from_str, load_config_or_default, CONFIG_FILE_NAME};
pub use resolve::{resolve_resolver, resolve_toolchain, ResolverConfig, ToolchainConfig};
pub use rules::{default_rules, NameRule, RuleKind};
pub use types::*;
