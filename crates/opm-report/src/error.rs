//! Error types for report generation and templates.

use thiserror::Error;

/// Result type for report operations.
pub type Result<T> = std::result::Result<T, ReportError>;

/// Errors that can occur while generating reports or handling templates.
#[derive(Error, Debug)]
pub enum ReportError {
    /// Reporting window or calendar month is unusable.
    #[error("invalid period: {0}")]
    InvalidPeriod(String),

    /// No template stored under this id.
    #[error("template not found: {0}")]
    TemplateNotFound(String),

    /// Template document or id failed validation.
    #[error("invalid template: {0}")]
    InvalidTemplate(String),

    /// Substitution failed.
    #[error("render error: {0}")]
    Render(String),

    /// Stored template could not be parsed.
    #[error("YAML error in {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ReportError> for opm_common::Error {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::InvalidPeriod(msg) => opm_common::Error::InvalidParams(msg),
            ReportError::InvalidTemplate(msg) => opm_common::Error::Validation(msg),
            ReportError::TemplateNotFound(id) => {
                opm_common::Error::Template(format!("template not found: {id}"))
            }
            ReportError::Render(msg) => opm_common::Error::Template(msg),
            err @ ReportError::Yaml { .. } => opm_common::Error::Template(err.to_string()),
            ReportError::Json(e) => opm_common::Error::Json(e),
            ReportError::Io(e) => opm_common::Error::Io(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_into_wire_taxonomy() {
        let err: opm_common::Error = ReportError::InvalidPeriod("month 13".into()).into();
        assert_eq!(err.code(), -32602);

        let err: opm_common::Error = ReportError::TemplateNotFound("weekly".into()).into();
        assert_eq!(err.code(), -32006);
        assert!(err.to_string().contains("weekly"));

        let err: opm_common::Error = ReportError::InvalidTemplate("no sections".into()).into();
        assert_eq!(err.code(), -32005);
    }
}
