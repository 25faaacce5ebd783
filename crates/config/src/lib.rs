//! Configuration: schema, discovery, loading.
//!
//! Config lives in `parley.{toml,yaml,yml,json}`, found project-local first,
//! then under `~/.config/parley/`. String values support `${ENV}`
//! substitution. A default file is written on first run.

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    loader::{clear_config_dir, discover_and_load, load_config, set_config_dir},
    schema::{GatewaySection, MatchingSection, ParleyConfig},
};
