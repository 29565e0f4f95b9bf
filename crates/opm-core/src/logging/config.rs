//! Logging configuration.
//!
//! Supports configuration via:
//! - Environment variables (`OPM_LOG` or `LOG_LEVEL`, `OPM_LOG_FORMAT` or `LOG_FORMAT`)
//! - CLI flags (`--log-level`, `--log-format`)
//!
//! `RUST_LOG`, when set, replaces the level filter entirely (see
//! [`init_logging`](super::init_logging)).

use serde::{Deserialize, Serialize};

pub const ENV_LOG: &str = "OPM_LOG";
pub const ENV_LOG_FALLBACK: &str = "LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "OPM_LOG_FORMAT";
pub const ENV_LOG_FORMAT_FALLBACK: &str = "LOG_FORMAT";

/// Where log events go and how they look. Logs always go to stderr; stdout
/// belongs to the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Human,
    /// One JSON object per line.
    Jsonl,
}

impl LogFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            LogFormat::Human => "human",
            LogFormat::Jsonl => "jsonl",
        }
    }
}

/// Minimum severity emitted by the server crates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Off,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        }
    }
}

// Accepted spellings, including the Python-style names operators tend to
// copy from existing `.env` files.
const LEVEL_ALIASES: &[(&str, LogLevel)] = &[
    ("trace", LogLevel::Trace),
    ("debug", LogLevel::Debug),
    ("info", LogLevel::Info),
    ("warn", LogLevel::Warn),
    ("warning", LogLevel::Warn),
    ("error", LogLevel::Error),
    ("critical", LogLevel::Error),
    ("off", LogLevel::Off),
    ("none", LogLevel::Off),
    ("quiet", LogLevel::Off),
];

const FORMAT_ALIASES: &[(&str, LogFormat)] = &[
    ("human", LogFormat::Human),
    ("console", LogFormat::Human),
    ("pretty", LogFormat::Human),
    ("text", LogFormat::Human),
    ("jsonl", LogFormat::Jsonl),
    ("json", LogFormat::Jsonl),
    ("structured", LogFormat::Jsonl),
];

fn lookup_alias<T: Copy>(table: &[(&str, T)], raw: &str, what: &str) -> Result<T, String> {
    let wanted = raw.trim().to_ascii_lowercase();
    table
        .iter()
        .find(|(name, _)| *name == wanted)
        .map(|(_, value)| *value)
        .ok_or_else(|| format!("unknown log {what}: {raw}"))
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup_alias(LEVEL_ALIASES, s, "level")
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup_alias(FORMAT_ALIASES, s, "format")
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved logging settings for the `opm` process.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub format: LogFormat,
    pub level: LogLevel,
    /// Timestamps on human output. JSON lines always carry one.
    pub timestamps: bool,
    /// File and line on every event; switched on at debug and below.
    pub source_location: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig::for_level(LogLevel::Info)
    }
}

impl LogConfig {
    fn for_level(level: LogLevel) -> Self {
        LogConfig {
            format: LogFormat::Human,
            level,
            timestamps: true,
            source_location: level <= LogLevel::Debug,
        }
    }

    /// Resolve from the process environment. CLI values, when given, win.
    pub fn from_env(cli_level: Option<LogLevel>, cli_format: Option<LogFormat>) -> Self {
        Self::from_lookup(|key| std::env::var(key).ok(), cli_level, cli_format)
    }

    /// [`LogConfig::from_env`] over an arbitrary lookup. Values that do not
    /// parse are skipped.
    pub fn from_lookup<F>(lookup: F, cli_level: Option<LogLevel>, cli_format: Option<LogFormat>) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let first_set = |keys: [&str; 2]| keys.into_iter().find_map(&lookup);

        let level = cli_level
            .or_else(|| first_set([ENV_LOG, ENV_LOG_FALLBACK]).and_then(|v| v.parse().ok()))
            .unwrap_or_default();
        let format = cli_format
            .or_else(|| {
                first_set([ENV_LOG_FORMAT, ENV_LOG_FORMAT_FALLBACK]).and_then(|v| v.parse().ok())
            })
            .unwrap_or_default();

        LogConfig::for_level(level).with_format(format)
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_level(self, level: LogLevel) -> Self {
        LogConfig::for_level(level).with_format(self.format)
    }

    /// Directive used when `RUST_LOG` is not set.
    pub fn filter_directive(&self) -> String {
        ["opm", "opm_core", "opm_report"]
            .iter()
            .map(|target| format!("{target}={}", self.level))
            .collect::<Vec<_>>()
            .join(",")
    }
}
