//! Template documents.

use std::collections::HashSet;

use opm_common::SECTION_ORDER_LAST;
use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_kind", rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    /// RFC 3339 timestamp of the last save.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

fn default_kind() -> String {
    "custom".to_string()
}

fn default_version() -> String {
    "1.0".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSection {
    #[serde(default)]
    pub section_id: String,
    #[serde(default)]
    pub section_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default)]
    pub content_template: String,
    /// Inclusion condition for optional sections, e.g. `show_risks` or
    /// `report_type == monthly`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

fn default_required() -> bool {
    true
}

impl TemplateSection {
    pub fn new(id: impl Into<String>, name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            section_id: id.into(),
            section_name: name.into(),
            order: None,
            required: true,
            content_template: content.into(),
            condition: None,
        }
    }

    pub fn with_order(mut self, order: u32) -> Self {
        self.order = Some(order);
        self
    }

    pub fn optional(mut self, condition: impl Into<String>) -> Self {
        self.required = false;
        self.condition = Some(condition.into());
        self
    }

    pub fn sort_key(&self) -> u32 {
        self.order.unwrap_or(SECTION_ORDER_LAST)
    }
}

/// Where a group of template variables comes from. Informational only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSource {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub fields: Vec<String>,
}

/// A stored report template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportTemplate {
    #[serde(default)]
    pub template_info: TemplateInfo,
    #[serde(default)]
    pub title_template: String,
    #[serde(default)]
    pub sections: Vec<TemplateSection>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_sources: Vec<DataSource>,
}

impl ReportTemplate {
    pub fn new(info: TemplateInfo, title_template: impl Into<String>) -> Self {
        Self {
            template_info: info,
            title_template: title_template.into(),
            sections: Vec::new(),
            data_sources: Vec::new(),
        }
    }

    pub fn with_section(mut self, section: TemplateSection) -> Self {
        self.sections.push(section);
        self
    }

    /// Parse and validate a document received as JSON (e.g. a tool argument).
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        if !value.is_object() {
            return Err(ReportError::InvalidTemplate(
                "template must be an object".to_string(),
            ));
        }
        for field in ["template_info", "title_template", "sections"] {
            if value.get(field).is_none() {
                return Err(ReportError::InvalidTemplate(format!(
                    "missing required field '{field}'"
                )));
            }
        }
        let template: ReportTemplate = serde_json::from_value(value)
            .map_err(|e| ReportError::InvalidTemplate(e.to_string()))?;
        template.validate()?;
        Ok(template)
    }

    pub fn validate(&self) -> Result<()> {
        if self.title_template.trim().is_empty() {
            return Err(ReportError::InvalidTemplate(
                "title_template must not be empty".to_string(),
            ));
        }
        if self.sections.is_empty() {
            return Err(ReportError::InvalidTemplate(
                "sections must not be empty".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for (idx, section) in self.sections.iter().enumerate() {
            let id = section.section_id.trim();
            if id.is_empty() {
                return Err(ReportError::InvalidTemplate(format!(
                    "section {} is missing section_id",
                    idx + 1
                )));
            }
            if !seen.insert(id) {
                return Err(ReportError::InvalidTemplate(format!(
                    "duplicate section_id '{id}'"
                )));
            }
        }
        Ok(())
    }

    /// Sections by ascending order; ties keep declaration order.
    pub fn sorted_sections(&self) -> Vec<&TemplateSection> {
        let mut sections: Vec<&TemplateSection> = self.sections.iter().collect();
        sections.sort_by_key(|s| s.sort_key());
        sections
    }

    /// Variable names referenced by the title and every section, deduplicated
    /// in first-use order.
    pub fn referenced_variables(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let texts = std::iter::once(self.title_template.as_str())
            .chain(self.sections.iter().map(|s| s.content_template.as_str()));
        let mut names = Vec::new();
        for text in texts {
            for name in super::render::placeholders(text) {
                if seen.insert(name.clone()) {
                    names.push(name);
                }
            }
        }
        names
    }
}

/// Listing entry for a stored template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateSummary {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub version: String,
}

impl TemplateSummary {
    pub fn of(id: impl Into<String>, template: &ReportTemplate) -> Self {
        let info = &template.template_info;
        Self {
            id: id.into(),
            name: info.name.clone(),
            kind: info.kind.clone(),
            description: info.description.clone(),
            version: info.version.clone(),
        }
    }
}
