//! Team workload per assignee.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use opm_common::{Project, Report, StatusClass, WorkItem};
use serde::Serialize;

use super::{as_of_label, empty_report, percent};
use crate::config::EngineConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadClass {
    Light,
    Normal,
    Overloaded,
}

impl LoadClass {
    pub fn classify(total: usize, config: &EngineConfig) -> Self {
        if total > config.overload_threshold {
            LoadClass::Overloaded
        } else if total < config.light_threshold {
            LoadClass::Light
        } else {
            LoadClass::Normal
        }
    }
}

impl std::fmt::Display for LoadClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadClass::Light => write!(f, "light"),
            LoadClass::Normal => write!(f, "normal"),
            LoadClass::Overloaded => write!(f, "overloaded"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberWorkload {
    pub name: String,
    pub total: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub overdue: usize,
    /// Open items with high or immediate priority.
    pub high_priority: usize,
    pub load: LoadClass,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorkloadAnalysis {
    /// Sorted by total descending, then name.
    pub members: Vec<MemberWorkload>,
    pub unassigned: usize,
    pub total_items: usize,
}

impl WorkloadAnalysis {
    pub fn assigned(&self) -> usize {
        self.total_items - self.unassigned
    }

    pub fn with_load(&self, load: LoadClass) -> impl Iterator<Item = &MemberWorkload> {
        self.members.iter().filter(move |m| m.load == load)
    }

    pub fn assignment_rate(&self) -> f64 {
        percent(self.assigned(), self.total_items)
    }
}

#[derive(Default)]
struct Tally {
    total: usize,
    in_progress: usize,
    completed: usize,
    overdue: usize,
    high_priority: usize,
}

pub fn analyze(items: &[WorkItem], now: DateTime<Utc>, config: &EngineConfig) -> WorkloadAnalysis {
    let today = now.date_naive();
    let mut tallies: HashMap<&str, Tally> = HashMap::new();
    let mut unassigned = 0;

    for item in items {
        let Some(name) = item.assignee.as_deref().map(str::trim).filter(|a| !a.is_empty()) else {
            unassigned += 1;
            continue;
        };
        let tally = tallies.entry(name).or_default();
        tally.total += 1;
        match item.status_class() {
            StatusClass::InProgress => tally.in_progress += 1,
            StatusClass::Completed => tally.completed += 1,
            _ => {}
        }
        if item.is_overdue(today) {
            tally.overdue += 1;
        }
        if !item.is_closed() && item.priority_class().is_urgent() {
            tally.high_priority += 1;
        }
    }

    let mut members: Vec<MemberWorkload> = tallies
        .into_iter()
        .map(|(name, t)| MemberWorkload {
            name: name.to_string(),
            total: t.total,
            in_progress: t.in_progress,
            completed: t.completed,
            overdue: t.overdue,
            high_priority: t.high_priority,
            load: LoadClass::classify(t.total, config),
        })
        .collect();
    members.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.name.cmp(&b.name)));

    WorkloadAnalysis {
        members,
        unassigned,
        total_items: items.len(),
    }
}

fn suggestions(analysis: &WorkloadAnalysis) -> Vec<String> {
    let overloaded: Vec<&str> = analysis
        .with_load(LoadClass::Overloaded)
        .map(|m| m.name.as_str())
        .collect();
    let light: Vec<&str> = analysis
        .with_load(LoadClass::Light)
        .map(|m| m.name.as_str())
        .collect();

    let mut out = Vec::new();
    if !overloaded.is_empty() {
        out.push(format!(
            "- Overloaded: {}. Consider moving work to teammates with spare capacity.",
            overloaded.join(", ")
        ));
    }
    if !light.is_empty() {
        out.push(format!(
            "- Light load: {}. These members can take on more work.",
            light.join(", ")
        ));
    }
    if analysis.unassigned > 0 {
        out.push(format!(
            "- {} work package(s) are unassigned. Assign owners to avoid stalls.",
            analysis.unassigned
        ));
    }
    out
}

pub fn generate(
    project: &Project,
    items: &[WorkItem],
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> Report {
    let title = format!("{} Team Workload", project.name);
    if items.is_empty() {
        return empty_report(title, project, as_of_label(now), now);
    }

    let analysis = analyze(items, now, config);
    let overloaded = analysis.with_load(LoadClass::Overloaded).count();
    let light = analysis.with_load(LoadClass::Light).count();

    let summary = format!(
        "{} members share {} assigned work packages; {} unassigned.",
        analysis.members.len(),
        analysis.assigned(),
        analysis.unassigned
    );
    let mut report = Report::new(title, project.name.clone(), as_of_label(now), summary, now);

    report.add_section(
        "Team Overview",
        format!(
            "- Members: {}\n- Assigned: {}\n- Unassigned: {}\n- Assignment rate: {}%\n- Overloaded: {overloaded}\n- Light load: {light}",
            analysis.members.len(),
            analysis.assigned(),
            analysis.unassigned,
            analysis.assignment_rate()
        ),
    );

    if !analysis.members.is_empty() {
        let rows: Vec<String> = analysis
            .members
            .iter()
            .map(|m| {
                format!(
                    "- **{}** ({}): {} total, {} in progress, {} completed, {} overdue, {} high priority",
                    m.name, m.load, m.total, m.in_progress, m.completed, m.overdue, m.high_priority
                )
            })
            .collect();
        report.add_section("Member Workload", rows.join("\n"));
    }

    let advice = suggestions(&analysis);
    if !advice.is_empty() {
        report.add_section("Rebalancing Suggestions", advice.join("\n"));
    }

    report.set_stat("total_members", analysis.members.len());
    report.set_stat("total_work_packages", analysis.total_items);
    report.set_stat("assigned_work_packages", analysis.assigned());
    report.set_stat("unassigned_work_packages", analysis.unassigned);
    report.set_stat("overloaded_members", overloaded);
    report.set_stat("underloaded_members", light);
    report.set_stat("assignment_rate", analysis.assignment_rate());
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
    }

    fn items_for(name: &str, n: usize) -> Vec<WorkItem> {
        (0..n)
            .map(|i| WorkItem::new(format!("{name}-{i}"), "task").with_assignee(name).with_status("New"))
            .collect()
    }

    #[test]
    fn classifies_load_bounds() {
        let cfg = EngineConfig::default();
        assert_eq!(LoadClass::classify(11, &cfg), LoadClass::Overloaded);
        assert_eq!(LoadClass::classify(10, &cfg), LoadClass::Normal);
        assert_eq!(LoadClass::classify(3, &cfg), LoadClass::Normal);
        assert_eq!(LoadClass::classify(2, &cfg), LoadClass::Light);
    }

    #[test]
    fn unassigned_items_are_counted_apart() {
        let mut items = items_for("Ada", 4);
        items.push(WorkItem::new("x", "orphan"));
        items.push(WorkItem::new("y", "blank").with_assignee(" "));
        let analysis = analyze(&items, now(), &EngineConfig::default());
        assert_eq!(analysis.unassigned, 2);
        assert_eq!(analysis.members.len(), 1);
        assert_eq!(analysis.members[0].total, 4);
        assert_eq!(analysis.assignment_rate(), 66.7);
    }

    #[test]
    fn members_sorted_by_total_then_name() {
        let mut items = items_for("Cy", 2);
        items.extend(items_for("Bo", 5));
        items.extend(items_for("Al", 2));
        let analysis = analyze(&items, now(), &EngineConfig::default());
        let names: Vec<&str> = analysis.members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Bo", "Al", "Cy"]);
    }

    #[test]
    fn counts_status_and_priority() {
        let items = vec![
            WorkItem::new("1", "a").with_assignee("Ada").with_status("In progress"),
            WorkItem::new("2", "b").with_assignee("Ada").with_status("Closed").with_priority("High"),
            WorkItem::new("3", "c")
                .with_assignee("Ada")
                .with_status("New")
                .with_priority("Immediate")
                .with_due_date(now().date_naive() - chrono::Duration::days(1)),
        ];
        let m = &analyze(&items, now(), &EngineConfig::default()).members[0];
        assert_eq!((m.in_progress, m.completed, m.overdue, m.high_priority), (1, 1, 1, 1));
    }

    #[test]
    fn report_suggests_rebalancing() {
        let mut items = items_for("Busy", 12);
        items.extend(items_for("Idle", 1));
        items.push(WorkItem::new("z", "orphan"));
        let report = generate(&Project::new("1", "P", "p"), &items, now(), &EngineConfig::default());
        let advice = report.section_by_title("Rebalancing Suggestions").unwrap();
        assert!(advice.content.contains("Overloaded: Busy"));
        assert!(advice.content.contains("Light load: Idle"));
        assert!(advice.content.contains("1 work package(s) are unassigned"));
        assert_eq!(report.statistics["overloaded_members"], 1);
        assert_eq!(report.statistics["underloaded_members"], 1);
        assert_eq!(report.statistics["unassigned_work_packages"], 1);
    }

    #[test]
    fn balanced_team_has_no_suggestions() {
        let mut items = items_for("Ada", 5);
        items.extend(items_for("Bo", 4));
        let report = generate(&Project::new("1", "P", "p"), &items, now(), &EngineConfig::default());
        assert!(report.section_by_title("Rebalancing Suggestions").is_none());
        assert!(report.section_by_title("Member Workload").is_some());
    }
}
