//! Config discovery and loading.

use std::{
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard, PoisonError},
};

use tracing::{debug, warn};

use crate::{env_subst::substitute_env, schema::ParleyConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["parley.toml", "parley.yaml", "parley.yml", "parley.json"];

/// Override for the config directory, set via `set_config_dir()`.
static CONFIG_DIR_OVERRIDE: Mutex<Option<PathBuf>> = Mutex::new(None);

fn override_guard() -> MutexGuard<'static, Option<PathBuf>> {
    CONFIG_DIR_OVERRIDE.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Set a custom config directory. When set, discovery only looks there;
/// project-local and user-global paths are skipped. Each call replaces the
/// previous override (tests rely on this).
pub fn set_config_dir(path: PathBuf) {
    *override_guard() = Some(path);
}

/// Clear the config directory override, restoring default discovery.
pub fn clear_config_dir() {
    *override_guard() = None;
}

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<ParleyConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./parley.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/parley/parley.{toml,yaml,yml,json}` (user-global)
///
/// Returns `ParleyConfig::default()` if no config file is found, writing the
/// defaults out so the operator has something to edit.
pub fn discover_and_load() -> ParleyConfig {
    let Some(path) = find_config_file() else {
        debug!("no config file found, writing default config");
        let config = ParleyConfig::default();
        if let Err(e) = write_default_config(&config) {
            warn!(error = %e, "failed to write default config file");
        }
        return config;
    };

    debug!(path = %path.display(), "loading config");
    match load_config(&path) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            ParleyConfig::default()
        },
    }
}

/// Find the first config file in standard locations.
fn find_config_file() -> Option<PathBuf> {
    if let Some(dir) = override_guard().clone() {
        return CONFIG_FILENAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|p| p.exists());
    }

    // Project-local
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    // User-global: ~/.config/parley/
    let dir = home_dir()?.join(".config").join("parley");
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

/// Returns the config directory: override, or `~/.config/parley/`.
pub fn config_dir() -> Option<PathBuf> {
    if let Some(dir) = override_guard().clone() {
        return Some(dir);
    }
    home_dir().map(|h| h.join(".config").join("parley"))
}

fn home_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf())
}

/// Write the default config file to the config directory, if none exists.
fn write_default_config(config: &ParleyConfig) -> anyhow::Result<()> {
    let path = config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("parley.toml");
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str =
        toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("serialize config: {e}"))?;
    std::fs::write(&path, toml_str)?;
    debug!(path = %path.display(), "wrote default config file");
    Ok(())
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<ParleyConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");
    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        other => Err(anyhow::anyhow!("unsupported config format: .{other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The override is process-global, so these tests share one temp dir
    // sequence; each sets its own override before loading.

    #[test]
    fn loads_toml_from_override_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("parley.toml"),
            "[gateway]\nbind = \"0.0.0.0\"\nport = 1234\n",
        )
        .unwrap();

        set_config_dir(dir.path().to_path_buf());
        let cfg = discover_and_load();
        clear_config_dir();

        assert_eq!(cfg.gateway.bind, "0.0.0.0");
        assert_eq!(cfg.gateway.port, 1234);
    }

    #[test]
    fn yaml_and_json_parse_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = dir.path().join("parley.yaml");
        std::fs::write(&yaml, "matching:\n  bot_fallback_ms: 50\n").unwrap();
        assert_eq!(load_config(&yaml).unwrap().matching.bot_fallback_ms, 50);

        let json = dir.path().join("parley.json");
        std::fs::write(&json, r#"{"gateway": {"port": 7}}"#).unwrap();
        assert_eq!(load_config(&json).unwrap().gateway.port, 7);
    }

    #[test]
    fn env_substitution_applies_to_loaded_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("parley.toml");
        // An unset variable passes through as-is rather than erroring.
        std::fs::write(&path, "[gateway]\nbind = \"${PARLEY_UNSET_VAR}\"\n").unwrap();
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.gateway.bind, "${PARLEY_UNSET_VAR}");
    }

    #[test]
    fn bad_file_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("parley.toml");
        std::fs::write(&path, "not valid toml [[[").unwrap();
        assert!(load_config(&path).is_err());
        assert!(load_config(&dir.path().join("missing.toml")).is_err());
    }
}
