//! Period (weekly) report: items updated inside a date window, by status.

use chrono::{DateTime, NaiveDate, Utc};
use opm_common::markdown::truncate;
use opm_common::{Project, Report, WorkItem};
use serde_json::json;

use super::{distribution, empty_report, status_label};
use crate::config::EngineConfig;
use crate::error::{ReportError, Result};

/// Items whose `updated_at` date lies in `[start, end]`, both days included.
pub fn updated_between(items: &[WorkItem], start: NaiveDate, end: NaiveDate) -> Vec<&WorkItem> {
    items
        .iter()
        .filter(|item| {
            item.updated_at
                .map(|at| {
                    let day = at.date_naive();
                    day >= start && day <= end
                })
                .unwrap_or(false)
        })
        .collect()
}

/// Group by display status, keeping first-seen order.
pub fn group_by_status<'a>(items: &[&'a WorkItem]) -> Vec<(String, Vec<&'a WorkItem>)> {
    let mut groups: Vec<(String, Vec<&'a WorkItem>)> = Vec::new();
    for item in items {
        let label = status_label(item);
        match groups.iter_mut().find(|(status, _)| status.as_str() == label) {
            Some((_, members)) => members.push(*item),
            None => groups.push((label.to_string(), vec![*item])),
        }
    }
    groups
}

fn render_item(item: &WorkItem, description_limit: usize) -> String {
    let mut lines = vec![
        format!("- **{}** (ID: {})", item.subject, item.id),
        format!(
            "  - Assignee: {}",
            item.assignee.as_deref().filter(|a| !a.trim().is_empty()).unwrap_or("Unassigned")
        ),
        format!("  - Progress: {}%", item.progress.unwrap_or(0)),
    ];
    if let Some(desc) = item.description.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        lines.push(format!("  - Description: {}", truncate(desc, description_limit)));
    }
    lines.join("\n")
}

pub fn generate(
    project: &Project,
    items: &[WorkItem],
    start: NaiveDate,
    end: NaiveDate,
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> Result<Report> {
    if start > end {
        return Err(ReportError::InvalidPeriod(format!(
            "start date {start} is after end date {end}"
        )));
    }

    let title = format!("{} Weekly Report", project.name);
    let period = format!("{start} to {end}");
    if items.is_empty() {
        return Ok(empty_report(title, project, period, now));
    }

    let updated = updated_between(items, start, end);
    let summary = format!(
        "{} of {} work packages were updated between {} and {}.",
        updated.len(),
        items.len(),
        start,
        end
    );
    let mut report = Report::new(title, project.name.clone(), period, summary, now);

    for (status, members) in group_by_status(&updated) {
        let title = format!("{status} Work Packages");
        let mut content = vec![format!("{} work package(s)", members.len()), String::new()];
        content.extend(
            members
                .iter()
                .map(|item| render_item(item, config.description_limit)),
        );
        report.add_section(title, content.join("\n"));
    }

    report.set_stat("total_work_packages", items.len());
    report.set_stat("updated_work_packages", updated.len());
    report.set_stat(
        "status_distribution",
        json!(distribution(updated.iter().copied(), status_label)),
    );
    Ok(report)
}
