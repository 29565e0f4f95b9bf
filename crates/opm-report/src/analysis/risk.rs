//! Per-item risk assessment.
//!
//! Each factor raises an item's level to at least its own level; levels are
//! never lowered, so an item hit by several factors keeps the highest one and
//! appears once.

use chrono::{DateTime, NaiveDate, Utc};
use opm_common::{Project, Report, StatusClass, WorkItem};
use serde::Serialize;

use super::{as_of_label, empty_report, percent};
use crate::config::EngineConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFactor {
    Overdue,
    DueSoon,
    BehindSchedule,
    Unassigned,
    HighPriorityOpen,
    Stalled,
}

impl RiskFactor {
    /// Minimum level this factor implies.
    pub fn level(&self) -> RiskLevel {
        match self {
            RiskFactor::Overdue => RiskLevel::High,
            RiskFactor::DueSoon
            | RiskFactor::BehindSchedule
            | RiskFactor::Unassigned
            | RiskFactor::HighPriorityOpen => RiskLevel::Medium,
            RiskFactor::Stalled => RiskLevel::Low,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskFactor::Overdue => "overdue",
            RiskFactor::DueSoon => "due_soon",
            RiskFactor::BehindSchedule => "behind_schedule",
            RiskFactor::Unassigned => "unassigned",
            RiskFactor::HighPriorityOpen => "high_priority_open",
            RiskFactor::Stalled => "stalled",
        }
    }
}

impl std::fmt::Display for RiskFactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A work item with at least one triggered factor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskItem {
    pub id: String,
    pub subject: String,
    pub level: RiskLevel,
    pub factors: Vec<RiskFactor>,
    pub status: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub assignee: Option<String>,
    /// Days past the due date, for overdue items.
    pub days_overdue: Option<i64>,
}

/// Factors triggered by one item. Date pressure and urgency only count while
/// the item is open; missing ownership and low progress count regardless.
pub fn risk_factors(item: &WorkItem, now: DateTime<Utc>, config: &EngineConfig) -> Vec<RiskFactor> {
    let today = now.date_naive();
    let open = !item.is_closed();
    let mut factors = Vec::new();
    let days_left = item.days_until_due(today);

    if item.is_overdue(today) {
        factors.push(RiskFactor::Overdue);
    }
    if open && days_left.is_some_and(|d| (0..=config.due_soon_days).contains(&d)) {
        factors.push(RiskFactor::DueSoon);
    }
    if days_left.is_some_and(|d| d <= config.behind_schedule_days)
        && item.progress.unwrap_or(0) < config.behind_schedule_progress
    {
        factors.push(RiskFactor::BehindSchedule);
    }
    if !item.is_assigned() {
        factors.push(RiskFactor::Unassigned);
    }
    if open && item.priority_class().is_urgent() {
        factors.push(RiskFactor::HighPriorityOpen);
    }
    if open
        && item.status_class() == StatusClass::InProgress
        && item
            .updated_at
            .is_some_and(|at| (now - at).num_days() > config.stall_days)
    {
        factors.push(RiskFactor::Stalled);
    }
    factors
}

/// Risk entry for one item, or `None` when no factor fires.
pub fn assess_item(item: &WorkItem, now: DateTime<Utc>, config: &EngineConfig) -> Option<RiskItem> {
    let factors = risk_factors(item, now, config);
    let level = factors.iter().map(RiskFactor::level).max()?;
    let today = now.date_naive();
    Some(RiskItem {
        id: item.id.clone(),
        subject: item.subject.clone(),
        level,
        days_overdue: if factors.contains(&RiskFactor::Overdue) {
            item.days_until_due(today).map(|d| -d)
        } else {
            None
        },
        factors,
        status: item.status.clone(),
        due_date: item.due_date,
        assignee: item.assignee.clone().filter(|a| !a.trim().is_empty()),
    })
}

/// Result of assessing a whole item list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RiskAssessment {
    /// Highest level first; input order within a level.
    pub items: Vec<RiskItem>,
    pub total_items: usize,
}

impl RiskAssessment {
    pub fn at_level(&self, level: RiskLevel) -> impl Iterator<Item = &RiskItem> {
        self.items.iter().filter(move |r| r.level == level)
    }

    pub fn count(&self, level: RiskLevel) -> usize {
        self.at_level(level).count()
    }

    pub fn risk_percentage(&self) -> f64 {
        percent(self.items.len(), self.total_items)
    }
}

pub fn assess(items: &[WorkItem], now: DateTime<Utc>, config: &EngineConfig) -> RiskAssessment {
    let mut risks: Vec<RiskItem> = items
        .iter()
        .filter_map(|item| assess_item(item, now, config))
        .collect();
    risks.sort_by(|a, b| b.level.cmp(&a.level));
    RiskAssessment {
        items: risks,
        total_items: items.len(),
    }
}

fn factor_list(factors: &[RiskFactor]) -> String {
    factors
        .iter()
        .map(RiskFactor::label)
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_risk_item(risk: &RiskItem) -> String {
    let mut lines = vec![format!(
        "- **{}** (ID: {}): {}",
        risk.subject,
        risk.id,
        factor_list(&risk.factors)
    )];
    if let Some(due) = risk.due_date {
        match risk.days_overdue {
            Some(days) => lines.push(format!("  - Due: {due} ({days} days overdue)")),
            None => lines.push(format!("  - Due: {due}")),
        }
    }
    lines.push(format!(
        "  - Assignee: {}",
        risk.assignee.as_deref().unwrap_or("Unassigned")
    ));
    lines.join("\n")
}

pub fn generate(
    project: &Project,
    items: &[WorkItem],
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> Report {
    let title = format!("{} Risk Assessment", project.name);
    if items.is_empty() {
        return empty_report(title, project, as_of_label(now), now);
    }

    let assessment = assess(items, now, config);
    let high = assessment.count(RiskLevel::High);
    let medium = assessment.count(RiskLevel::Medium);
    let low = assessment.count(RiskLevel::Low);
    let at_risk = assessment.items.len();

    let summary = if at_risk == 0 {
        format!("No risks found across {} work packages.", items.len())
    } else {
        format!(
            "{at_risk} of {} work packages carry risk: {high} high, {medium} medium, {low} low.",
            items.len()
        )
    };
    let mut report = Report::new(title, project.name.clone(), as_of_label(now), summary, now);

    report.add_section(
        "Risk Overview",
        format!(
            "- High: {high}\n- Medium: {medium}\n- Low: {low}\n- At risk: {at_risk} of {} ({}%)",
            items.len(),
            assessment.risk_percentage()
        ),
    );

    if high > 0 {
        let body: Vec<String> = assessment.at_level(RiskLevel::High).map(render_risk_item).collect();
        report.add_section("High Risk Items", body.join("\n"));
    }

    if medium > 0 {
        let mut body: Vec<String> = assessment
            .at_level(RiskLevel::Medium)
            .take(config.medium_risk_cap)
            .map(render_risk_item)
            .collect();
        if medium > config.medium_risk_cap {
            body.push(format!("+{} more", medium - config.medium_risk_cap));
        }
        report.add_section("Medium Risk Items", body.join("\n"));
    }

    if low > 0 {
        report.add_section(
            "Low Risk Items",
            format!("{low} work package(s) at low risk (stalled in progress)."),
        );
    }

    report.set_stat("total_work_packages", items.len());
    report.set_stat("high_risk_count", high);
    report.set_stat("medium_risk_count", medium);
    report.set_stat("low_risk_count", low);
    report.set_stat("at_risk_count", at_risk);
    report.set_stat("risk_percentage", assessment.risk_percentage());
    report
}
