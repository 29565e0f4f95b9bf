//! Configuration file discovery.
//!
//! Resolution order: CLI argument → `OPM_CONFIG` → XDG config dir → none.

use std::path::{Path, PathBuf};

use crate::APP_NAME;

/// Where the configuration file was found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Set via the `OPM_CONFIG` environment variable.
    Environment,

    /// Found in the XDG config directory.
    XdgConfig,

    /// No file; environment and built-in defaults only.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

const ENV_CONFIG_PATH: &str = "OPM_CONFIG";
const CONFIG_FILENAME: &str = "config.toml";

/// Locate the config file, if any.
///
/// An explicit CLI path is returned even when it does not exist so that the
/// loader can report it; the other sources are only used when present.
pub fn resolve_config_file(cli_path: Option<&Path>) -> (Option<PathBuf>, ConfigSource) {
    if let Some(path) = cli_path {
        return (Some(path.to_path_buf()), ConfigSource::CliArgument);
    }

    if let Ok(env_path) = std::env::var(ENV_CONFIG_PATH) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return (Some(path), ConfigSource::Environment);
        }
    }

    if let Some(dir) = xdg_config_dir() {
        let path = dir.join(CONFIG_FILENAME);
        if path.exists() {
            return (Some(path), ConfigSource::XdgConfig);
        }
    }

    (None, ConfigSource::BuiltinDefault)
}

/// `~/.config/openproject-mcp` (or the platform equivalent).
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Default location of the template catalog.
pub fn default_templates_dir() -> PathBuf {
    xdg_config_dir()
        .map(|d| d.join("templates"))
        .unwrap_or_else(|| PathBuf::from("templates"))
}
