//! Composite project health score.
//!
//! The score starts at 100 and loses points in four independent dimensions
//! (completion, overdue, assignment, open high-priority backlog). Each
//! dimension applies at most one band from [`HealthBands`]. The result is
//! clamped to `0..=100`.

use chrono::{DateTime, Utc};
use opm_common::{Project, Report, StatusClass, WorkItem};
use serde::Serialize;

use super::{as_of_label, empty_report, raw_percent, round1};
use crate::config::{deduct_above, deduct_below, EngineConfig, HealthBands};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthLevel {
    Excellent,
    Good,
    Fair,
    NeedsAttention,
}

impl HealthLevel {
    pub fn from_score(score: u32, bands: &HealthBands) -> Self {
        if score >= bands.excellent {
            HealthLevel::Excellent
        } else if score >= bands.good {
            HealthLevel::Good
        } else if score >= bands.fair {
            HealthLevel::Fair
        } else {
            HealthLevel::NeedsAttention
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HealthLevel::Excellent => "excellent",
            HealthLevel::Good => "good",
            HealthLevel::Fair => "fair",
            HealthLevel::NeedsAttention => "needs attention",
        }
    }
}

impl std::fmt::Display for HealthLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthMetrics {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub overdue: usize,
    pub unassigned: usize,
    pub high_priority_open: usize,
    pub completion_rate: f64,
    pub overdue_rate: f64,
    pub assignment_rate: f64,
    pub score: u32,
    pub level: HealthLevel,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Score a project's items. `None` when there is nothing to score.
pub fn compute(items: &[WorkItem], now: DateTime<Utc>, config: &EngineConfig) -> Option<HealthMetrics> {
    if items.is_empty() {
        return None;
    }
    let today = now.date_naive();
    let bands = &config.health;
    let total = items.len();
    let completed = items.iter().filter(|i| i.is_completed()).count();
    let in_progress = items
        .iter()
        .filter(|i| i.status_class() == StatusClass::InProgress)
        .count();
    let overdue = items.iter().filter(|i| i.is_overdue(today)).count();
    let unassigned = items.iter().filter(|i| !i.is_assigned()).count();
    let high_priority_open = items
        .iter()
        .filter(|i| !i.is_closed() && i.priority_class().is_urgent())
        .count();

    // Bands compare the exact shares; only the reported figures are rounded.
    let completion_exact = raw_percent(completed, total);
    let overdue_exact = raw_percent(overdue, total);
    let assignment_exact = raw_percent(total - unassigned, total);
    let completion_rate = round1(completion_exact);
    let overdue_rate = round1(overdue_exact);
    let assignment_rate = round1(assignment_exact);

    let mut issues = Vec::new();
    let mut recommendations = Vec::new();
    let mut deducted = 0u32;

    let d = deduct_below(completion_exact, &bands.completion);
    if d > 0 {
        deducted += d;
        issues.push(format!("Low completion rate ({completion_rate}%)"));
        recommendations.push("Review blockers on open work and narrow the active scope".to_string());
    }
    let d = deduct_above(overdue_exact, &bands.overdue);
    if d > 0 {
        deducted += d;
        issues.push(format!("{overdue} overdue work package(s) ({overdue_rate}%)"));
        recommendations.push("Re-plan overdue work packages and update their due dates".to_string());
    }
    let d = deduct_below(assignment_exact, &bands.assignment);
    if d > 0 {
        deducted += d;
        issues.push(format!("{unassigned} unassigned work package(s)"));
        recommendations.push("Assign an owner to every open work package".to_string());
    }
    let d = deduct_above(high_priority_open as f64, &bands.high_priority);
    if d > 0 {
        deducted += d;
        issues.push(format!("{high_priority_open} open high-priority work package(s)"));
        recommendations.push("Focus the team on high-priority items first".to_string());
    }

    let score = 100u32.saturating_sub(deducted).min(100);
    Some(HealthMetrics {
        total,
        completed,
        in_progress,
        overdue,
        unassigned,
        high_priority_open,
        completion_rate,
        overdue_rate,
        assignment_rate,
        score,
        level: HealthLevel::from_score(score, bands),
        issues,
        recommendations,
    })
}

fn bullets(lines: &[String]) -> String {
    lines
        .iter()
        .map(|l| format!("- {l}"))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn generate(
    project: &Project,
    items: &[WorkItem],
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> Report {
    let title = format!("{} Health Check", project.name);
    let Some(metrics) = compute(items, now, config) else {
        return empty_report(title, project, as_of_label(now), now);
    };

    let summary = format!(
        "Health score {}/100 ({}).",
        metrics.score, metrics.level
    );
    let mut report = Report::new(title, project.name.clone(), as_of_label(now), summary, now);

    report.add_section(
        "Health Overview",
        format!(
            "- Score: {}/100 ({})\n- Completion rate: {}%\n- Overdue rate: {}%\n- Assignment rate: {}%\n- Open high-priority: {}",
            metrics.score,
            metrics.level,
            metrics.completion_rate,
            metrics.overdue_rate,
            metrics.assignment_rate,
            metrics.high_priority_open
        ),
    );
    if metrics.issues.is_empty() {
        report.add_section("Status", "No health issues found.");
    } else {
        report.add_section("Issues", bullets(&metrics.issues));
        report.add_section("Recommendations", bullets(&metrics.recommendations));
    }

    report.set_stat("health_score", metrics.score);
    report.set_stat("health_level", metrics.level.label());
    report.set_stat("completion_rate", metrics.completion_rate);
    report.set_stat("overdue_rate", metrics.overdue_rate);
    report.set_stat("assignment_rate", metrics.assignment_rate);
    report.set_stat("total_work_packages", metrics.total);
    report.set_stat("completed_work_packages", metrics.completed);
    report.set_stat("in_progress_work_packages", metrics.in_progress);
    report.set_stat("overdue_work_packages", metrics.overdue);
    report.set_stat("unassigned_work_packages", metrics.unassigned);
    report.set_stat("high_priority_open", metrics.high_priority_open);
    report.set_stat("issues_count", metrics.issues.len());
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn empty_list_is_not_scored() {
        assert!(compute(&[], now(), &EngineConfig::default()).is_none());
        let report = generate(&Project::new("1", "P", "p"), &[], now(), &EngineConfig::default());
        assert!(!report.statistics.contains_key("health_score"));
    }

    #[test]
    fn perfect_project_scores_100() {
        let items: Vec<WorkItem> = (0..4)
            .map(|i| WorkItem::new(i.to_string(), "t").with_status("Closed").with_assignee("Ada"))
            .collect();
        let m = compute(&items, now(), &EngineConfig::default()).unwrap();
        assert_eq!(m.score, 100);
        assert_eq!(m.level, HealthLevel::Excellent);
        assert!(m.issues.is_empty());
        let report = generate(&Project::new("1", "P", "p"), &items, now(), &EngineConfig::default());
        assert!(report.section_by_title("Status").is_some());
    }

    #[test]
    fn completion_rate_is_rounded_to_one_decimal() {
        let items = vec![
            WorkItem::new("1", "a").with_status("Closed").with_assignee("A"),
            WorkItem::new("2", "b").with_status("New").with_assignee("A"),
            WorkItem::new("3", "c").with_status("New").with_assignee("A"),
        ];
        let m = compute(&items, now(), &EngineConfig::default()).unwrap();
        assert_eq!(m.completion_rate, 33.3);
        assert_eq!(m.score, 80);
        assert_eq!(m.level, HealthLevel::Good);
    }

    #[test]
    fn bands_use_exact_rates_not_rounded_ones() {
        // 6 of 119 overdue is 5.04%, shown as 5.0 but still past the 5% edge.
        let mut items: Vec<WorkItem> = (0..113)
            .map(|i| WorkItem::new(i.to_string(), "done").with_status("Closed").with_assignee("A"))
            .collect();
        let past_due = now().date_naive() - chrono::Duration::days(2);
        items.extend((113..119).map(|i| {
            WorkItem::new(i.to_string(), "late")
                .with_status("New")
                .with_assignee("A")
                .with_due_date(past_due)
        }));
        let m = compute(&items, now(), &EngineConfig::default()).unwrap();
        assert_eq!(m.overdue_rate, 5.0);
        assert_eq!(m.score, 90);
        assert_eq!(m.issues.len(), 1);
        assert!(m.issues[0].contains("6 overdue"));
    }

    #[test]
    fn rejected_is_closed_but_not_completed() {
        let items = vec![
            WorkItem::new("1", "a").with_status("Rejected").with_assignee("A"),
            WorkItem::new("2", "b").with_status("Closed").with_assignee("A"),
        ];
        let m = compute(&items, now(), &EngineConfig::default()).unwrap();
        assert_eq!(m.completed, 1);
        assert_eq!(m.completion_rate, 50.0);
    }

    #[test]
    fn deductions_clamp_at_zero() {
        let bands = HealthBands {
            completion: vec![crate::config::Band::new(101.0, 90)],
            assignment: vec![crate::config::Band::new(101.0, 90)],
            ..HealthBands::default()
        };
        let cfg = EngineConfig::default().with_health_bands(bands);
        let items = vec![WorkItem::new("1", "a").with_status("New")];
        let m = compute(&items, now(), &cfg).unwrap();
        assert_eq!(m.score, 0);
        assert_eq!(m.level, HealthLevel::NeedsAttention);
    }
}
