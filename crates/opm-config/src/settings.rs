//! Server settings and layered loading.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::resolve::{default_templates_dir, resolve_config_file, ConfigSource};
use crate::validate::{ValidationError, ValidationResult};

pub const ENV_URL: &str = "OPENPROJECT_URL";
pub const ENV_API_KEY: &str = "OPENPROJECT_API_KEY";
pub const ENV_DEBUG: &str = "MCP_DEBUG_MODE";
pub const ENV_TIMEOUT: &str = "REQUEST_TIMEOUT";
pub const ENV_TEMPLATES_DIR: &str = "OPM_TEMPLATES_DIR";
pub const ENV_SERVER_NAME: &str = "MCP_SERVER_NAME";
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";

/// Resolved server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Base URL of the OpenProject instance.
    #[serde(default)]
    pub openproject_url: Option<String>,

    /// API key (sent as the basic-auth password for user `apikey`).
    #[serde(default)]
    pub api_key: Option<String>,

    /// Include internal error details in JSON-RPC errors.
    #[serde(default)]
    pub debug: bool,

    /// Timeout for each backend call, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Directory holding one YAML file per report template.
    #[serde(default)]
    pub templates_dir: Option<PathBuf>,

    /// Name reported in `serverInfo`.
    #[serde(default = "default_server_name")]
    pub server_name: String,

    #[serde(default)]
    pub log_level: Option<String>,
}

fn default_request_timeout() -> u64 {
    30
}

fn default_server_name() -> String {
    crate::APP_NAME.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            openproject_url: None,
            api_key: None,
            debug: false,
            request_timeout: default_request_timeout(),
            templates_dir: None,
            server_name: default_server_name(),
            log_level: None,
        }
    }
}

impl ServerConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> ValidationResult<Self> {
        toml::from_str(content).map_err(|e| ValidationError::ParseError(e.to_string()))
    }

    /// Read and parse a TOML config file.
    pub fn from_file(path: &Path) -> ValidationResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ValidationError::IoError(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Overlay values from the process environment.
    pub fn apply_env(&mut self) -> ValidationResult<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Overlay values from an arbitrary variable lookup.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> ValidationResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_URL) {
            self.openproject_url = Some(url);
        }
        if let Some(key) = lookup(ENV_API_KEY) {
            self.api_key = Some(key);
        }
        if let Some(raw) = lookup(ENV_DEBUG) {
            self.debug = parse_bool(&raw).ok_or_else(|| {
                ValidationError::invalid(ENV_DEBUG, format!("expected a boolean, got '{raw}'"))
            })?;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT) {
            self.request_timeout = raw.trim().parse().map_err(|_| {
                ValidationError::invalid(ENV_TIMEOUT, format!("expected seconds, got '{raw}'"))
            })?;
        }
        if let Some(dir) = lookup(ENV_TEMPLATES_DIR) {
            self.templates_dir = Some(PathBuf::from(dir));
        }
        if let Some(name) = lookup(ENV_SERVER_NAME) {
            self.server_name = name;
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.log_level = Some(level);
        }
        Ok(())
    }

    /// Overlay explicit CLI values.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(dir) = &overrides.templates_dir {
            self.templates_dir = Some(dir.clone());
        }
        if overrides.debug {
            self.debug = true;
        }
        if let Some(timeout) = overrides.request_timeout {
            self.request_timeout = timeout;
        }
    }

    /// Templates directory, falling back to the XDG default.
    pub fn templates_dir(&self) -> PathBuf {
        self.templates_dir
            .clone()
            .unwrap_or_else(default_templates_dir)
    }

    /// Copy safe to print: the API key is masked.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.api_key = copy.api_key.as_deref().map(mask_secret);
        copy
    }
}

/// Keep the last four characters of a secret.
fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{tail}")
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// Values supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub templates_dir: Option<PathBuf>,
    pub debug: bool,
    pub request_timeout: Option<u64>,
}

/// Options controlling [`load_config`].
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file (`--config`).
    pub config_path: Option<PathBuf>,
    /// Read `.env` from the working directory first.
    pub load_dotenv: bool,
    pub overrides: ConfigOverrides,
}

/// A loaded configuration plus where its file came from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: ServerConfig,
    pub source: ConfigSource,
    pub path: Option<PathBuf>,
}

/// Load configuration: CLI → env (and `.env`) → config file → defaults.
pub fn load_config(options: &LoadOptions) -> ValidationResult<LoadedConfig> {
    if options.load_dotenv {
        // A missing .env file is normal.
        let _ = dotenvy::dotenv();
    }

    let (path, source) = resolve_config_file(options.config_path.as_deref());
    let mut config = match &path {
        Some(p) => ServerConfig::from_file(p)?,
        None => ServerConfig::default(),
    };

    config.apply_env()?;
    config.apply_overrides(&options.overrides);

    Ok(LoadedConfig {
        config,
        source,
        path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.request_timeout, 30);
        assert_eq!(config.server_name, "openproject-mcp");
        assert!(!config.debug);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn toml_fills_missing_fields_with_defaults() {
        let config = ServerConfig::from_toml_str(
            r#"
            openproject_url = "https://op.example.com"
            debug = true
            "#,
        )
        .unwrap();
        assert_eq!(config.openproject_url.as_deref(), Some("https://op.example.com"));
        assert!(config.debug);
        assert_eq!(config.request_timeout, 30);
    }

    #[test]
    fn toml_rejects_unknown_keys() {
        let err = ServerConfig::from_toml_str("bogus = 1").unwrap_err();
        assert_eq!(err.code(), 61);
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = ServerConfig::from_toml_str("request_timeout = 10").unwrap();
        config
            .apply_env_from(lookup(&[
                (ENV_URL, "http://localhost:8080"),
                (ENV_API_KEY, "secret-key"),
                (ENV_DEBUG, "YES"),
                (ENV_TIMEOUT, "45"),
            ]))
            .unwrap();
        assert_eq!(config.openproject_url.as_deref(), Some("http://localhost:8080"));
        assert_eq!(config.api_key.as_deref(), Some("secret-key"));
        assert!(config.debug);
        assert_eq!(config.request_timeout, 45);
    }

    #[test]
    fn env_rejects_bad_values() {
        let mut config = ServerConfig::default();
        let err = config
            .apply_env_from(lookup(&[(ENV_TIMEOUT, "soon")]))
            .unwrap_err();
        assert_eq!(err.code(), 65);

        let err = config
            .apply_env_from(lookup(&[(ENV_DEBUG, "maybe")]))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_DEBUG));
    }

    #[test]
    fn overrides_win() {
        let mut config = ServerConfig::default();
        config.apply_overrides(&ConfigOverrides {
            templates_dir: Some(PathBuf::from("/tmp/tpl")),
            debug: true,
            request_timeout: Some(5),
        });
        assert_eq!(config.templates_dir(), PathBuf::from("/tmp/tpl"));
        assert!(config.debug);
        assert_eq!(config.request_timeout, 5);
    }

    #[test]
    fn redacted_masks_api_key() {
        let config = ServerConfig {
            api_key: Some("0123456789abcdef".into()),
            ..ServerConfig::default()
        };
        assert_eq!(config.redacted().api_key.as_deref(), Some("****cdef"));
        let short = ServerConfig {
            api_key: Some("abc".into()),
            ..ServerConfig::default()
        };
        assert_eq!(short.redacted().api_key.as_deref(), Some("****"));
    }

    #[test]
    fn parse_bool_variants() {
        assert_eq!(parse_bool("On"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("nah"), None);
    }
}
