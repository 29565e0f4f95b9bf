//! Error taxonomy for the OpenProject MCP server.
//!
//! Every failure that can reach a client maps to exactly one variant here,
//! and every variant carries a stable numeric code used on the wire:
//!
//! - `-32700..=-32600`: JSON-RPC protocol errors
//! - `-32001..=-32007`: domain errors (private range, below -32000)
//!
//! The router is the only component that turns an [`Error`] into a JSON-RPC
//! error object. Everything else propagates with `?`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for OpenProject MCP operations.
pub type Result<T> = std::result::Result<T, Error>;

// Standard JSON-RPC error codes
pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

// Domain error codes
pub const BACKEND_ERROR: i32 = -32001;
pub const AUTHENTICATION_ERROR: i32 = -32002;
pub const NOT_FOUND: i32 = -32003;
pub const TOOL_EXECUTION_ERROR: i32 = -32004;
pub const VALIDATION_ERROR: i32 = -32005;
pub const TEMPLATE_ERROR: i32 = -32006;
pub const CONFIGURATION_ERROR: i32 = -32007;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Malformed or unroutable protocol traffic.
    Protocol,
    /// Failures talking to the work-item backend.
    Backend,
    /// Bad documents or arguments at the data layer.
    Data,
    /// Server configuration problems.
    Config,
    /// Unexpected failures (I/O, serialization).
    Internal,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Protocol => write!(f, "protocol"),
            ErrorCategory::Backend => write!(f, "backend"),
            ErrorCategory::Data => write!(f, "data"),
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Internal => write!(f, "internal"),
        }
    }
}

/// Main error type.
#[derive(Error, Debug)]
pub enum Error {
    // Protocol layer
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid Request: {0}")]
    InvalidRequest(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("internal error: {0}")]
    Internal(String),

    // Backend interaction layer
    #[error("backend error: {message}")]
    Backend {
        message: String,
        status: Option<u16>,
    },

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("tool '{tool_name}' failed: {message}")]
    ToolExecution {
        tool_name: String,
        message: String,
        error_type: String,
    },

    // Data layer
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("template error: {0}")]
    Template(String),

    #[error("configuration error: {0}")]
    Config(String),

    // Unmapped lower-level failures
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Backend failure without an HTTP status (timeouts, refused connections).
    pub fn backend(message: impl Into<String>) -> Self {
        Error::Backend {
            message: message.into(),
            status: None,
        }
    }

    /// Entity lookup miss.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Wrap a downstream failure of a tool whose arguments were valid.
    pub fn tool_execution(tool_name: impl Into<String>, source: &Error) -> Self {
        Error::ToolExecution {
            tool_name: tool_name.into(),
            message: source.to_string(),
            error_type: source.kind().to_string(),
        }
    }

    /// Returns the wire code for this error.
    pub fn code(&self) -> i32 {
        match self {
            Error::Parse(_) => PARSE_ERROR,
            Error::InvalidRequest(_) => INVALID_REQUEST,
            Error::MethodNotFound(_) => METHOD_NOT_FOUND,
            Error::InvalidParams(_) => INVALID_PARAMS,
            Error::Internal(_) | Error::Io(_) | Error::Json(_) => INTERNAL_ERROR,
            Error::Backend { .. } => BACKEND_ERROR,
            Error::Authentication(_) => AUTHENTICATION_ERROR,
            Error::NotFound { .. } => NOT_FOUND,
            Error::ToolExecution { .. } => TOOL_EXECUTION_ERROR,
            Error::Validation(_) => VALIDATION_ERROR,
            Error::Template(_) => TEMPLATE_ERROR,
            Error::Config(_) => CONFIGURATION_ERROR,
        }
    }

    /// Stable type name, reported as `error_type` when a tool fails.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Parse(_) => "ParseError",
            Error::InvalidRequest(_) => "InvalidRequest",
            Error::MethodNotFound(_) => "MethodNotFound",
            Error::InvalidParams(_) => "InvalidParams",
            Error::Internal(_) => "InternalError",
            Error::Backend { .. } => "BackendError",
            Error::Authentication(_) => "AuthenticationError",
            Error::NotFound { .. } => "NotFoundError",
            Error::ToolExecution { .. } => "ToolExecutionError",
            Error::Validation(_) => "ValidationError",
            Error::Template(_) => "TemplateError",
            Error::Config(_) => "ConfigurationError",
            Error::Io(_) => "IoError",
            Error::Json(_) => "JsonError",
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Parse(_)
            | Error::InvalidRequest(_)
            | Error::MethodNotFound(_)
            | Error::InvalidParams(_) => ErrorCategory::Protocol,

            Error::Backend { .. }
            | Error::Authentication(_)
            | Error::NotFound { .. }
            | Error::ToolExecution { .. } => ErrorCategory::Backend,

            Error::Validation(_) | Error::Template(_) => ErrorCategory::Data,

            Error::Config(_) => ErrorCategory::Config,

            Error::Internal(_) | Error::Io(_) | Error::Json(_) => ErrorCategory::Internal,
        }
    }

    /// Internal errors must not leak their message unless debugging.
    pub fn is_internal(&self) -> bool {
        self.code() == INTERNAL_ERROR
    }

    /// Returns whether retrying the same request may succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Backend { status, .. } => match status {
                None => true,
                Some(code) => *code >= 500 || *code == 429,
            },
            Error::ToolExecution { error_type, .. } => error_type == "BackendError",
            _ => false,
        }
    }

    /// Client-facing message. Internal errors collapse to a generic string.
    pub fn public_message(&self) -> String {
        if self.is_internal() {
            "Internal error".to_string()
        } else {
            self.to_string()
        }
    }

    /// Structured `data` payload attached to the wire error, if any.
    pub fn data(&self) -> Option<serde_json::Value> {
        match self {
            Error::ToolExecution {
                tool_name,
                error_type,
                ..
            } => Some(serde_json::json!({
                "tool_name": tool_name,
                "error_type": error_type,
            })),
            Error::Backend {
                status: Some(status),
                ..
            } => Some(serde_json::json!({ "status": status })),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_codes_match_jsonrpc() {
        assert_eq!(Error::Parse("x".into()).code(), -32700);
        assert_eq!(Error::InvalidRequest("x".into()).code(), -32600);
        assert_eq!(Error::MethodNotFound("x".into()).code(), -32601);
        assert_eq!(Error::InvalidParams("x".into()).code(), -32602);
        assert_eq!(Error::Internal("x".into()).code(), -32603);
    }

    #[test]
    fn domain_codes_are_below_server_range_start() {
        let errors = vec![
            Error::backend("down"),
            Error::Authentication("bad key".into()),
            Error::not_found("project", "1"),
            Error::tool_execution("get_project", &Error::backend("down")),
            Error::Validation("x".into()),
            Error::Template("x".into()),
            Error::Config("x".into()),
        ];
        let mut codes: Vec<i32> = errors.iter().map(Error::code).collect();
        for code in &codes {
            assert!(*code < -32000 && *code > -32100, "code {code} out of range");
        }
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn tool_execution_carries_source_kind() {
        let source = Error::not_found("project", "42");
        let err = Error::tool_execution("get_project", &source);
        match &err {
            Error::ToolExecution {
                tool_name,
                message,
                error_type,
            } => {
                assert_eq!(tool_name, "get_project");
                assert_eq!(message, "project not found: 42");
                assert_eq!(error_type, "NotFoundError");
            }
            other => panic!("unexpected variant {other:?}"),
        }
        let data = err.data().unwrap();
        assert_eq!(data["tool_name"], "get_project");
        assert_eq!(data["error_type"], "NotFoundError");
    }

    #[test]
    fn internal_errors_hide_their_message() {
        let err = Error::Io(std::io::Error::other("disk exploded at /secret/path"));
        assert!(err.is_internal());
        assert_eq!(err.public_message(), "Internal error");
        assert_eq!(err.category(), ErrorCategory::Internal);

        let err = Error::Validation("missing title".into());
        assert!(!err.is_internal());
        assert!(err.public_message().contains("missing title"));
    }

    #[test]
    fn backend_recoverability() {
        assert!(Error::backend("request timeout").is_recoverable());
        assert!(Error::Backend {
            message: "bad gateway".into(),
            status: Some(502)
        }
        .is_recoverable());
        assert!(!Error::Backend {
            message: "bad request".into(),
            status: Some(400)
        }
        .is_recoverable());
        assert!(!Error::Authentication("nope".into()).is_recoverable());
    }

    #[test]
    fn category_display() {
        assert_eq!(ErrorCategory::Protocol.to_string(), "protocol");
        assert_eq!(ErrorCategory::Backend.to_string(), "backend");
        assert_eq!(ErrorCategory::Internal.to_string(), "internal");
    }
}
