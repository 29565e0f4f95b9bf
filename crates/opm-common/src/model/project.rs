use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A project as reported by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    /// URL-safe token, `[A-Za-z0-9_-]+`.
    pub identifier: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<String>,
}

impl Project {
    pub fn new(id: impl Into<String>, name: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            identifier: identifier.into(),
            description: None,
            created_at: None,
            updated_at: None,
            status: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// `"{name} ({identifier})"`.
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.name, self.identifier)
    }

    pub fn is_valid_identifier(identifier: &str) -> bool {
        !identifier.is_empty()
            && identifier
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    }

    pub fn has_valid_identifier(&self) -> bool {
        Self::is_valid_identifier(&self.identifier)
    }
}
