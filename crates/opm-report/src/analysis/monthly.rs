//! Calendar-month report.

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use opm_common::{Project, Report, StatusClass, WorkItem};
use serde_json::json;

use super::{bullet_counts, distribution, empty_report, percent, priority_label, status_label};
use crate::error::{ReportError, Result};

/// First and last day of a calendar month.
pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| ReportError::InvalidPeriod(format!("no such month: {year}-{month:02}")))?;
    let next = start
        .checked_add_months(Months::new(1))
        .ok_or_else(|| ReportError::InvalidPeriod(format!("month out of range: {year}-{month:02}")))?;
    let end = next
        .pred_opt()
        .ok_or_else(|| ReportError::InvalidPeriod(format!("month out of range: {year}-{month:02}")))?;
    Ok((start, end))
}

/// Activity within one month.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthlyActivity {
    pub created: usize,
    /// Completed items last updated inside the month.
    pub completed: usize,
    pub updated: usize,
}

fn in_range(at: Option<DateTime<Utc>>, start: NaiveDate, end: NaiveDate) -> bool {
    at.map(|t| {
        let day = t.date_naive();
        day >= start && day <= end
    })
    .unwrap_or(false)
}

pub fn activity(items: &[WorkItem], start: NaiveDate, end: NaiveDate) -> MonthlyActivity {
    let mut activity = MonthlyActivity::default();
    for item in items {
        if in_range(item.created_at, start, end) {
            activity.created += 1;
        }
        if in_range(item.updated_at, start, end) {
            activity.updated += 1;
            if item.is_completed() {
                activity.completed += 1;
            }
        }
    }
    activity
}

pub fn generate(
    project: &Project,
    items: &[WorkItem],
    year: i32,
    month: u32,
    now: DateTime<Utc>,
) -> Result<Report> {
    let (start, end) = month_bounds(year, month)?;
    let period = format!("{:04}-{:02}", start.year(), start.month());
    let title = format!("{} Monthly Report", project.name);
    if items.is_empty() {
        return Ok(empty_report(title, project, period, now));
    }

    let month_activity = activity(items, start, end);
    let total = items.len();
    let completed_total = items.iter().filter(|i| i.is_completed()).count();
    let in_progress_total = items
        .iter()
        .filter(|i| i.status_class() == StatusClass::InProgress)
        .count();
    let completion_rate = percent(completed_total, total);

    let summary = format!(
        "In {period}, {} work packages were created, {} completed and {} updated. \
         Overall completion is {completion_rate}%.",
        month_activity.created, month_activity.completed, month_activity.updated
    );
    let mut report = Report::new(title, project.name.clone(), period, summary, now);

    report.add_section(
        "Monthly Overview",
        format!(
            "- Created this month: {}\n- Completed this month: {}\n- Updated this month: {}",
            month_activity.created, month_activity.completed, month_activity.updated
        ),
    );
    report.add_section(
        "Overall Progress",
        format!(
            "- Total work packages: {total}\n- Completed: {completed_total}\n- In progress: {in_progress_total}\n- Completion rate: {completion_rate}%"
        ),
    );

    let statuses = distribution(items, status_label);
    let priorities = distribution(items, priority_label);
    report.add_section("Status Distribution", bullet_counts(&statuses));
    report.add_section("Priority Distribution", bullet_counts(&priorities));

    report.set_stat("total_work_packages", total);
    report.set_stat("created_this_month", month_activity.created);
    report.set_stat("completed_this_month", month_activity.completed);
    report.set_stat("updated_this_month", month_activity.updated);
    report.set_stat("completed_work_packages", completed_total);
    report.set_stat("in_progress_work_packages", in_progress_total);
    report.set_stat("completion_rate", completion_rate);
    report.set_stat("status_distribution", json!(statuses));
    report.set_stat("priority_distribution", json!(priorities));
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 10, 0, 0).unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn bounds_roll_over_december() {
        assert_eq!(month_bounds(2024, 12).unwrap(), (day(2024, 12, 1), day(2024, 12, 31)));
        assert_eq!(month_bounds(2024, 2).unwrap(), (day(2024, 2, 1), day(2024, 2, 29)));
        assert_eq!(month_bounds(2025, 2).unwrap().1, day(2025, 2, 28));
    }

    #[test]
    fn bad_month_is_invalid_period() {
        assert!(matches!(month_bounds(2025, 13), Err(ReportError::InvalidPeriod(_))));
        assert!(matches!(month_bounds(2025, 0), Err(ReportError::InvalidPeriod(_))));
    }

    #[test]
    fn completed_this_month_requires_update_in_range() {
        let items = vec![
            WorkItem::new("1", "a")
                .with_status("Closed")
                .with_created_at(at(2025, 1, 20))
                .with_updated_at(at(2025, 2, 3)),
            WorkItem::new("2", "b")
                .with_status("closed")
                .with_created_at(at(2025, 2, 5))
                .with_updated_at(at(2025, 3, 1)),
            WorkItem::new("3", "c")
                .with_status("In progress")
                .with_created_at(at(2025, 2, 10))
                .with_updated_at(at(2025, 2, 28)),
        ];
        let (start, end) = month_bounds(2025, 2).unwrap();
        let a = activity(&items, start, end);
        assert_eq!(
            a,
            MonthlyActivity {
                created: 2,
                completed: 1,
                updated: 2
            }
        );

        let report = generate(&Project::new("1", "P", "p"), &items, 2025, 2, at(2025, 3, 2)).unwrap();
        assert_eq!(report.period, "2025-02");
        assert_eq!(report.statistics["completion_rate"], 66.7);
        assert_eq!(report.statistics["priority_distribution"]["Unknown"], 3);
        let titles: Vec<&str> = report.sorted_sections().iter().map(|s| s.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Monthly Overview",
                "Overall Progress",
                "Status Distribution",
                "Priority Distribution"
            ]
        );
    }

    #[test]
    fn empty_project_has_zero_total() {
        let report = generate(&Project::new("1", "P", "p"), &[], 2025, 2, at(2025, 3, 2)).unwrap();
        assert_eq!(report.statistics["total_work_packages"], 0);
        assert!(report.sections.is_empty());
    }
}
