//! Normalization of free-text status and priority labels.
//!
//! The backend reports statuses and priorities as display titles chosen by
//! each installation ("Closed", "In progress", "Rejected", ...). These are
//! open sets, so every lookup falls back to an `Other` bucket.

use serde::{Deserialize, Serialize};

/// Coarse classification of a work item status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusClass {
    New,
    Scheduled,
    InProgress,
    OnHold,
    Completed,
    Rejected,
    Other,
}

impl StatusClass {
    /// Classify a backend status label (case-insensitive).
    pub fn classify(label: &str) -> Self {
        match canonical(label).as_str() {
            "closed" | "done" | "resolved" | "completed" | "complete" | "finished"
            | "delivered" => StatusClass::Completed,
            "in progress" | "active" | "working" | "ongoing" | "feedback" | "developed"
            | "in testing" | "tested" | "in development" => StatusClass::InProgress,
            "scheduled" | "planned" | "to be scheduled" => StatusClass::Scheduled,
            "new" | "open" | "created" | "todo" | "to do" | "backlog" | "not started" => {
                StatusClass::New
            }
            "on hold" | "blocked" => StatusClass::OnHold,
            "rejected" | "cancelled" | "canceled" => StatusClass::Rejected,
            _ => StatusClass::Other,
        }
    }

    /// Classify an optional label; a missing status counts as `Other`.
    pub fn of(label: Option<&str>) -> Self {
        label.map(Self::classify).unwrap_or(StatusClass::Other)
    }

    /// True for statuses that end a work item's lifecycle.
    pub fn is_closed(&self) -> bool {
        matches!(self, StatusClass::Completed | StatusClass::Rejected)
    }

    /// Progress weight used for weighted completion estimates.
    ///
    /// Returns `None` for `Other`, where the item's own progress is used.
    pub fn progress_weight(&self) -> Option<f64> {
        match self {
            StatusClass::Completed => Some(100.0),
            StatusClass::InProgress => Some(50.0),
            StatusClass::Scheduled => Some(10.0),
            StatusClass::New | StatusClass::OnHold | StatusClass::Rejected => Some(0.0),
            StatusClass::Other => None,
        }
    }
}

impl std::fmt::Display for StatusClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusClass::New => write!(f, "new"),
            StatusClass::Scheduled => write!(f, "scheduled"),
            StatusClass::InProgress => write!(f, "in_progress"),
            StatusClass::OnHold => write!(f, "on_hold"),
            StatusClass::Completed => write!(f, "completed"),
            StatusClass::Rejected => write!(f, "rejected"),
            StatusClass::Other => write!(f, "other"),
        }
    }
}

/// Coarse classification of a work item priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityClass {
    Immediate,
    High,
    Normal,
    Low,
    Other,
}

impl PriorityClass {
    /// Classify a backend priority label (case-insensitive).
    pub fn classify(label: &str) -> Self {
        match canonical(label).as_str() {
            "immediate" | "urgent" | "critical" => PriorityClass::Immediate,
            "high" => PriorityClass::High,
            "normal" | "medium" => PriorityClass::Normal,
            "low" => PriorityClass::Low,
            _ => PriorityClass::Other,
        }
    }

    pub fn of(label: Option<&str>) -> Self {
        label.map(Self::classify).unwrap_or(PriorityClass::Other)
    }

    /// High and immediate priorities.
    pub fn is_urgent(&self) -> bool {
        matches!(self, PriorityClass::Immediate | PriorityClass::High)
    }
}

/// Lowercase, trim, and fold `-`/`_` into spaces.
fn canonical(label: &str) -> String {
    label
        .trim()
        .to_lowercase()
        .replace(['-', '_'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
