//! Configuration validation errors and semantic validation.

use thiserror::Error;

use crate::settings::ServerConfig;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Upper bound for `request_timeout`, in seconds.
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Configuration validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::MissingField(_) => 64,
            ValidationError::InvalidValue { .. } => 65,
        }
    }

    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        ValidationError::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Check a configuration for use against the live backend.
///
/// Returns every problem found; an empty vector means the config is usable.
pub fn validate_config(config: &ServerConfig) -> Vec<ValidationError> {
    let mut problems = Vec::new();

    match config.openproject_url.as_deref().map(str::trim) {
        None | Some("") => problems.push(ValidationError::MissingField("openproject_url".into())),
        Some(url) => {
            if let Err(message) = check_url(url) {
                problems.push(ValidationError::invalid("openproject_url", message));
            }
        }
    }

    match config.api_key.as_deref().map(str::trim) {
        None | Some("") => problems.push(ValidationError::MissingField("api_key".into())),
        Some(_) => {}
    }

    if config.request_timeout == 0 {
        problems.push(ValidationError::invalid(
            "request_timeout",
            "must be at least 1 second",
        ));
    } else if config.request_timeout > MAX_REQUEST_TIMEOUT_SECS {
        problems.push(ValidationError::invalid(
            "request_timeout",
            format!(
                "must be at most {} seconds, got {}",
                MAX_REQUEST_TIMEOUT_SECS, config.request_timeout
            ),
        ));
    }

    if config.server_name.trim().is_empty() {
        problems.push(ValidationError::invalid("server_name", "must not be empty"));
    }

    problems
}

fn check_url(url: &str) -> Result<(), String> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .ok_or_else(|| format!("must start with http:// or https://, got '{url}'"))?;
    let host = rest.split('/').next().unwrap_or("");
    if host.is_empty() {
        return Err(format!("missing host in '{url}'"));
    }
    if url.chars().any(char::is_whitespace) {
        return Err("must not contain whitespace".to_string());
    }
    Ok(())
}
