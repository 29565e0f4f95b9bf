//! Built-in templates written when the store is empty.

use super::model::{DataSource, ReportTemplate, TemplateInfo, TemplateSection};

pub const DEFAULT_WEEKLY_ID: &str = "default_weekly";
pub const DEFAULT_MONTHLY_ID: &str = "default_monthly";

fn info(name: &str, kind: &str, description: &str) -> TemplateInfo {
    TemplateInfo {
        name: name.to_string(),
        kind: kind.to_string(),
        description: description.to_string(),
        version: "1.0".to_string(),
        created_by: Some("system".to_string()),
        updated_at: None,
    }
}

pub fn weekly() -> ReportTemplate {
    let mut template = ReportTemplate::new(
        info("Standard weekly report", "weekly", "Weekly team status in a fixed layout"),
        "{{ project_name }} Weekly Report ({{ start_date }} - {{ end_date }})",
    )
    .with_section(
        TemplateSection::new(
            "overview",
            "Project Overview",
            "## Project Overview\n\n**Project**: {{ project_name }}\n**Period**: {{ start_date }} - {{ end_date }}\n**Completion**: {{ completion_rate }}%",
        )
        .with_order(1),
    )
    .with_section(
        TemplateSection::new(
            "progress",
            "Progress",
            "## Progress\n\n- Total: {{ total_work_packages }}\n- Completed: {{ completed_work_packages }}\n- In progress: {{ in_progress_work_packages }}\n- Remaining: {{ remaining_work_packages }}",
        )
        .with_order(2),
    )
    .with_section(
        TemplateSection::new(
            "risks",
            "Risks",
            "## Risks\n\nOverall risk level: **{{ risk_level }}**",
        )
        .with_order(3)
        .optional("risk_level != low"),
    );
    template.data_sources.push(DataSource {
        name: "project_basic".to_string(),
        description: "Project identity and reporting window".to_string(),
        fields: vec![
            "project_name".to_string(),
            "start_date".to_string(),
            "end_date".to_string(),
            "completion_rate".to_string(),
        ],
    });
    template
}

pub fn monthly() -> ReportTemplate {
    ReportTemplate::new(
        info("Standard monthly report", "monthly", "Monthly summary for stakeholders"),
        "{{ project_name }} Monthly Report ({{ report_date }})",
    )
    .with_section(
        TemplateSection::new(
            "summary",
            "Summary",
            "## Summary\n\n{{ project_name }} is at {{ completion_rate }}% weighted completion with {{ remaining_work_packages }} of {{ total_work_packages }} work packages remaining.",
        )
        .with_order(1),
    )
    .with_section(
        TemplateSection::new(
            "status",
            "Status Breakdown",
            "## Status Breakdown\n\n- New: {{ new_work_packages }}\n- Scheduled: {{ scheduled_work_packages }}\n- In progress: {{ in_progress_work_packages }}\n- Completed: {{ completed_work_packages }}",
        )
        .with_order(2),
    )
    .with_section(
        TemplateSection::new(
            "outlook",
            "Outlook",
            "## Outlook\n\nRisk level: {{ risk_level }}",
        )
        .with_order(3),
    )
}

/// Every built-in template with its id.
pub fn all() -> Vec<(&'static str, ReportTemplate)> {
    vec![(DEFAULT_WEEKLY_ID, weekly()), (DEFAULT_MONTHLY_ID, monthly())]
}
