//! Variables derived from live project data for template rendering.

use chrono::{Duration, NaiveDate};
use opm_common::{Project, StatusClass, WorkItem};
use serde_json::{json, Value};

use super::render::Variables;
use crate::analysis::{round1, status_label};

/// Mean of per-item progress weights: each item counts with its status
/// weight, or with its own progress when the status is unrecognized.
pub fn weighted_completion(items: &[WorkItem]) -> f64 {
    if items.is_empty() {
        return 0.0;
    }
    let sum: f64 = items
        .iter()
        .map(|item| {
            item.status_class()
                .progress_weight()
                .unwrap_or_else(|| f64::from(item.progress.unwrap_or(0)))
        })
        .sum();
    round1(sum / items.len() as f64)
}

/// `low` at 70% weighted completion and above, `medium` from 30%, else `high`.
pub fn risk_level_for(completion_rate: f64) -> &'static str {
    if completion_rate >= 70.0 {
        "low"
    } else if completion_rate >= 30.0 {
        "medium"
    } else {
        "high"
    }
}

/// Build the variable bag for `project`, overlaid with `custom` values.
pub fn build_template_variables(
    project: &Project,
    items: &[WorkItem],
    today: NaiveDate,
    custom: Option<&Variables>,
) -> Variables {
    let count = |class: StatusClass| items.iter().filter(|i| i.status_class() == class).count();
    let completed = count(StatusClass::Completed);
    let completion_rate = weighted_completion(items);

    let mut distribution = serde_json::Map::new();
    for item in items {
        let entry = distribution
            .entry(status_label(item).to_string())
            .or_insert(Value::from(0u64));
        *entry = Value::from(entry.as_u64().unwrap_or(0) + 1);
    }

    let mut vars = Variables::new();
    vars.insert("project_name".into(), json!(project.name));
    vars.insert("project_id".into(), json!(project.id));
    vars.insert(
        "project_description".into(),
        json!(project.description.clone().unwrap_or_default()),
    );
    vars.insert(
        "start_date".into(),
        json!((today - Duration::days(7)).format("%Y-%m-%d").to_string()),
    );
    vars.insert("end_date".into(), json!(today.format("%Y-%m-%d").to_string()));
    vars.insert("report_date".into(), json!(today.format("%Y-%m-%d").to_string()));
    vars.insert("completion_rate".into(), json!(completion_rate));
    vars.insert("total_work_packages".into(), json!(items.len()));
    vars.insert("completed_work_packages".into(), json!(completed));
    vars.insert(
        "in_progress_work_packages".into(),
        json!(count(StatusClass::InProgress)),
    );
    vars.insert(
        "scheduled_work_packages".into(),
        json!(count(StatusClass::Scheduled)),
    );
    vars.insert("new_work_packages".into(), json!(count(StatusClass::New)));
    vars.insert(
        "remaining_work_packages".into(),
        json!(items.len() - completed),
    );
    vars.insert("status_distribution".into(), Value::Object(distribution));
    vars.insert("risk_level".into(), json!(risk_level_for(completion_rate)));

    if let Some(custom) = custom {
        for (key, value) in custom {
            vars.insert(key.clone(), value.clone());
        }
    }
    vars
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn items() -> Vec<WorkItem> {
        vec![
            WorkItem::new("1", "a").with_status("Closed"),
            WorkItem::new("2", "b").with_status("In progress"),
            WorkItem::new("3", "c").with_status("Scheduled"),
            WorkItem::new("4", "d").with_status("Waiting on vendor").with_progress(20),
        ]
    }

    #[test]
    fn weighted_completion_uses_status_weights() {
        // (100 + 50 + 10 + 20) / 4
        assert_eq!(weighted_completion(&items()), 45.0);
        assert_eq!(weighted_completion(&[]), 0.0);
    }

    #[test]
    fn risk_level_bands() {
        assert_eq!(risk_level_for(70.0), "low");
        assert_eq!(risk_level_for(69.9), "medium");
        assert_eq!(risk_level_for(30.0), "medium");
        assert_eq!(risk_level_for(29.9), "high");
    }

    #[test]
    fn builds_counts_dates_and_distribution() {
        let project = Project::new("7", "Apollo", "apollo").with_description("Moonshot");
        let vars = build_template_variables(&project, &items(), day(2025, 3, 10), None);
        assert_eq!(vars["project_name"], "Apollo");
        assert_eq!(vars["project_description"], "Moonshot");
        assert_eq!(vars["start_date"], "2025-03-03");
        assert_eq!(vars["end_date"], "2025-03-10");
        assert_eq!(vars["total_work_packages"], 4);
        assert_eq!(vars["completed_work_packages"], 1);
        assert_eq!(vars["remaining_work_packages"], 3);
        assert_eq!(vars["scheduled_work_packages"], 1);
        assert_eq!(vars["status_distribution"]["Closed"], 1);
        assert_eq!(vars["risk_level"], "medium");
    }

    #[test]
    fn custom_data_wins() {
        let project = Project::new("7", "Apollo", "apollo");
        let mut custom = Variables::new();
        custom.insert("project_name".into(), json!("Renamed"));
        custom.insert("author".into(), json!("Ada"));
        let vars = build_template_variables(&project, &[], day(2025, 3, 10), Some(&custom));
        assert_eq!(vars["project_name"], "Renamed");
        assert_eq!(vars["author"], "Ada");
        assert_eq!(vars["completion_rate"], 0.0);
    }
}
