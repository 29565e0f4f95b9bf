//! Pure analyses over a project's work items.
//!
//! Each module exposes a structured result (usable by prompts and tests) and
//! a function that turns it into a [`Report`](opm_common::Report).

pub mod health;
pub mod monthly;
pub mod risk;
pub mod weekly;
pub mod workload;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use opm_common::{Project, Report, WorkItem};

pub(crate) const UNKNOWN_STATUS: &str = "Unknown Status";
pub(crate) const UNKNOWN_PRIORITY: &str = "Unknown";

/// Round to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// `part / total * 100`, rounded to one decimal; 0 when `total` is 0.
pub fn percent(part: usize, total: usize) -> f64 {
    round1(raw_percent(part, total))
}

/// Unrounded share in percent, for threshold comparisons.
pub fn raw_percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    part as f64 / total as f64 * 100.0
}

/// Period label for point-in-time reports.
pub fn as_of_label(now: DateTime<Utc>) -> String {
    format!("As of {}", now.format("%Y-%m-%d %H:%M"))
}

/// Report returned when a project has no work items at all.
pub(crate) fn empty_report(
    title: String,
    project: &Project,
    period: String,
    now: DateTime<Utc>,
) -> Report {
    let mut report = Report::new(
        title,
        project.name.clone(),
        period,
        format!("Project {} has no work packages.", project.name),
        now,
    );
    report.set_stat("total_work_packages", 0);
    report
}

/// Display status of an item, with blank labels folded into the unknown bucket.
pub(crate) fn status_label(item: &WorkItem) -> &str {
    label_or(item.status.as_deref(), UNKNOWN_STATUS)
}

pub(crate) fn priority_label(item: &WorkItem) -> &str {
    label_or(item.priority.as_deref(), UNKNOWN_PRIORITY)
}

fn label_or<'a>(label: Option<&'a str>, fallback: &'a str) -> &'a str {
    match label.map(str::trim) {
        Some(l) if !l.is_empty() => l,
        _ => fallback,
    }
}

/// Count items per label.
pub(crate) fn distribution<'a, I, F>(items: I, label: F) -> BTreeMap<String, usize>
where
    I: IntoIterator<Item = &'a WorkItem>,
    F: Fn(&'a WorkItem) -> &'a str,
{
    let mut counts = BTreeMap::new();
    for item in items {
        *counts.entry(label(item).to_string()).or_insert(0) += 1;
    }
    counts
}

/// Bullet list of `- label: count`.
pub(crate) fn bullet_counts(counts: &BTreeMap<String, usize>) -> String {
    counts
        .iter()
        .map(|(label, n)| format!("- {label}: {n}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_handles_zero_total() {
        assert_eq!(percent(0, 0), 0.0);
        assert_eq!(percent(1, 3), 33.3);
        assert_eq!(percent(2, 3), 66.7);
    }

    #[test]
    fn blank_status_is_unknown() {
        let item = WorkItem::new("1", "a").with_status("  ");
        assert_eq!(status_label(&item), UNKNOWN_STATUS);
        assert_eq!(status_label(&WorkItem::new("2", "b")), UNKNOWN_STATUS);
        assert_eq!(status_label(&WorkItem::new("3", "c").with_status("New")), "New");
    }
}
