use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::status::{PriorityClass, StatusClass};

/// A trackable unit of project work.
///
/// Status and priority are free-text labels from the backend; use
/// [`WorkItem::status_class`] and [`WorkItem::priority_class`] for logic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: String,
    pub subject: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, rename = "type")]
    pub type_name: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default, alias = "assigned_to")]
    pub assignee: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    /// Percent done, always within `0..=100`.
    #[serde(default, deserialize_with = "deserialize_progress")]
    pub progress: Option<u8>,
}

impl WorkItem {
    pub fn new(id: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            subject: subject.into(),
            description: None,
            status: None,
            type_name: None,
            priority: None,
            assignee: None,
            project_id: None,
            created_at: None,
            updated_at: None,
            start_date: None,
            due_date: None,
            progress: None,
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    pub fn with_assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = Some(assignee.into());
        self
    }

    pub fn with_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_due_date(mut self, due: NaiveDate) -> Self {
        self.due_date = Some(due);
        self
    }

    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    pub fn with_updated_at(mut self, at: DateTime<Utc>) -> Self {
        self.updated_at = Some(at);
        self
    }

    pub fn with_progress(mut self, progress: i64) -> Self {
        self.progress = Some(clamp_progress(progress));
        self
    }

    pub fn status_class(&self) -> StatusClass {
        StatusClass::of(self.status.as_deref())
    }

    pub fn priority_class(&self) -> PriorityClass {
        PriorityClass::of(self.priority.as_deref())
    }

    pub fn is_closed(&self) -> bool {
        self.status_class().is_closed()
    }

    pub fn is_completed(&self) -> bool {
        self.status_class() == StatusClass::Completed
    }

    pub fn is_assigned(&self) -> bool {
        self.assignee
            .as_deref()
            .map(|a| !a.trim().is_empty())
            .unwrap_or(false)
    }

    /// Due date strictly before `today` and still open.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.is_closed() && self.due_date.is_some_and(|due| due < today)
    }

    /// Whole days from `today` until the due date (negative when past).
    pub fn days_until_due(&self, today: NaiveDate) -> Option<i64> {
        self.due_date.map(|due| (due - today).num_days())
    }

    /// Subject must be non-empty.
    pub fn is_valid(&self) -> bool {
        !self.subject.trim().is_empty()
    }
}

/// Clamp any integer into the `0..=100` progress range.
pub fn clamp_progress(value: i64) -> u8 {
    value.clamp(0, 100) as u8
}

fn deserialize_progress<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<f64> = Option::deserialize(deserializer)?;
    Ok(raw.map(|v| clamp_progress(v.round() as i64)))
}

/// Fields for creating a work item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewWorkItem {
    pub project_id: String,
    pub subject: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub type_id: Option<String>,
}

/// Partial update for a work item; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkItemPatch {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub progress: Option<u8>,
}

impl WorkItemPatch {
    pub fn is_empty(&self) -> bool {
        self.subject.is_none() && self.description.is_none() && self.progress.is_none()
    }
}
