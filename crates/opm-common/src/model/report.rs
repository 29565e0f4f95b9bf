use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Sort key used for sections without an explicit order.
pub const SECTION_ORDER_LAST: u32 = 999;

/// One titled block of a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSection {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub order: Option<u32>,
}

impl ReportSection {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into().trim().to_string(),
            content: content.into().trim().to_string(),
            order: None,
        }
    }

    pub fn with_order(mut self, order: u32) -> Self {
        self.order = Some(order);
        self
    }

    pub fn sort_key(&self) -> u32 {
        self.order.unwrap_or(SECTION_ORDER_LAST)
    }
}

/// A generated report. Built per request and discarded after serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub title: String,
    pub project_name: String,
    pub period: String,
    pub generated_at: DateTime<Utc>,
    pub summary: String,
    #[serde(default)]
    pub sections: Vec<ReportSection>,
    #[serde(default)]
    pub statistics: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub template_id: Option<String>,
}

impl Report {
    pub fn new(
        title: impl Into<String>,
        project_name: impl Into<String>,
        period: impl Into<String>,
        summary: impl Into<String>,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            title: title.into(),
            project_name: project_name.into(),
            period: period.into(),
            generated_at,
            summary: summary.into(),
            sections: Vec::new(),
            statistics: BTreeMap::new(),
            template_id: None,
        }
    }

    /// Append a section ordered after every section added so far.
    pub fn add_section(&mut self, title: impl Into<String>, content: impl Into<String>) {
        let order = self.sections.len() as u32 + 1;
        self.sections
            .push(ReportSection::new(title, content).with_order(order));
    }

    /// Append a section as given, keeping its (possibly missing) order.
    pub fn push_section(&mut self, section: ReportSection) {
        self.sections.push(section);
    }

    pub fn set_stat(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.statistics.insert(key.into(), value.into());
    }

    /// Sections by ascending order key; ties keep insertion order.
    pub fn sorted_sections(&self) -> Vec<&ReportSection> {
        let mut sections: Vec<&ReportSection> = self.sections.iter().collect();
        sections.sort_by_key(|s| s.sort_key());
        sections
    }

    pub fn section_by_title(&self, title: &str) -> Option<&ReportSection> {
        self.sections.iter().find(|s| s.title == title)
    }

    /// Rough word count over title, summary, and sections.
    pub fn word_count(&self) -> usize {
        let mut total = self.title.split_whitespace().count() + self.summary.split_whitespace().count();
        for section in &self.sections {
            total += section.title.split_whitespace().count();
            total += section.content.split_whitespace().count();
        }
        total
    }

    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::Validation("report title must not be empty".into()));
        }
        if self.project_name.trim().is_empty() {
            return Err(Error::Validation("report project name must not be empty".into()));
        }
        if self.summary.trim().is_empty() {
            return Err(Error::Validation("report summary must not be empty".into()));
        }
        for (idx, section) in self.sections.iter().enumerate() {
            if section.title.is_empty() {
                return Err(Error::Validation(format!("section {idx} has an empty title")));
            }
            if section.content.is_empty() {
                return Err(Error::Validation(format!(
                    "section '{}' has empty content",
                    section.title
                )));
            }
        }
        Ok(())
    }

    pub fn to_markdown(&self) -> String {
        crate::markdown::render_report(self)
    }
}
