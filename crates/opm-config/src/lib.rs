//! OpenProject MCP configuration loading and validation.
//!
//! This crate provides:
//! - The typed [`ServerConfig`] shared by the server and CLI
//! - Config resolution (CLI → env/.env → config file → defaults)
//! - Semantic validation that reports every problem at once

pub mod resolve;
pub mod settings;
pub mod validate;

pub use resolve::{resolve_config_file, ConfigSource};
pub use settings::{load_config, ConfigOverrides, LoadOptions, LoadedConfig, ServerConfig};
pub use validate::{validate_config, ValidationError, ValidationResult};

/// Application name used for XDG directories.
pub const APP_NAME: &str = "openproject-mcp";
