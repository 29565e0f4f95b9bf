//! Markdown rendering for reports.
//!
//! The layout is a contract consumed by clients that parse it:
//!
//! ```text
//! # {title}
//!
//! **Project**: {project_name}
//! **Period**: {period}
//! **Generated**: {YYYY-MM-DD HH:MM:SS}
//!
//! ## Summary
//! {summary}
//!
//! ## {section title}
//! {section content}
//!
//! ## Statistics
//!
//! - key: value
//! **nested_key**:
//! - sub_key: sub_value
//! ```

use std::collections::BTreeMap;

use serde_json::Value;

use crate::model::Report;

/// Render a full report.
pub fn render_report(report: &Report) -> String {
    let mut lines = render_header(report);

    for section in report.sorted_sections() {
        lines.push(format!("## {}", section.title));
        lines.push(section.content.clone());
        lines.push(String::new());
    }

    if !report.statistics.is_empty() {
        lines.push("## Statistics".to_string());
        lines.push(String::new());
        lines.extend(render_statistics(&report.statistics));
        lines.push(String::new());
    }

    lines.join("\n")
}

/// Title, metadata lines, and the summary block.
pub fn render_header(report: &Report) -> Vec<String> {
    vec![
        format!("# {}", report.title),
        String::new(),
        format!("**Project**: {}", report.project_name),
        format!("**Period**: {}", report.period),
        format!(
            "**Generated**: {}",
            report.generated_at.format("%Y-%m-%d %H:%M:%S")
        ),
        String::new(),
        "## Summary".to_string(),
        report.summary.clone(),
        String::new(),
    ]
}

/// Scalars as `- key: value`, maps as a bold key followed by their entries.
pub fn render_statistics(stats: &BTreeMap<String, Value>) -> Vec<String> {
    let mut lines = Vec::new();
    for (key, value) in stats {
        match value {
            Value::Object(map) => {
                lines.push(format!("**{key}**:"));
                for (sub_key, sub_value) in map {
                    lines.push(format!("- {}: {}", sub_key, format_scalar(sub_value)));
                }
            }
            other => lines.push(format!("- {}: {}", key, format_scalar(other))),
        }
    }
    lines
}

/// Strings render bare; everything else uses its JSON form.
pub fn format_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "n/a".to_string(),
        other => other.to_string(),
    }
}

/// Truncate to `max` characters, appending `...` when cut.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    format!("{cut}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ReportSection;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn sample() -> Report {
        let at = Utc.with_ymd_and_hms(2025, 1, 31, 9, 30, 0).unwrap();
        Report::new("Demo Weekly", "Demo", "2025-01-24 to 2025-01-31", "All good.", at)
    }

    #[test]
    fn header_layout_is_exact() {
        let md = sample().to_markdown();
        let expected = "# Demo Weekly\n\n**Project**: Demo\n**Period**: 2025-01-24 to 2025-01-31\n**Generated**: 2025-01-31 09:30:00\n\n## Summary\nAll good.\n";
        assert_eq!(md, expected);
    }

    #[test]
    fn sections_render_in_order_with_missing_last() {
        let mut r = sample();
        r.push_section(ReportSection::new("Third", "c").with_order(3));
        r.push_section(ReportSection::new("Unordered", "z"));
        r.push_section(ReportSection::new("First", "a").with_order(1));
        let md = r.to_markdown();
        let first = md.find("## First").unwrap();
        let third = md.find("## Third").unwrap();
        let last = md.find("## Unordered").unwrap();
        assert!(first < third && third < last);
    }

    #[test]
    fn statistics_flatten_nested_maps() {
        let mut r = sample();
        r.set_stat("total_work_packages", 3);
        r.set_stat("status_distribution", json!({"Closed": 2, "New": 1}));
        r.set_stat("completion_rate", 66.7);
        let md = r.to_markdown();
        assert!(md.contains("## Statistics\n\n"));
        assert!(md.contains("- completion_rate: 66.7\n"));
        assert!(md.contains("**status_distribution**:\n- Closed: 2\n- New: 1\n"));
        assert!(md.contains("- total_work_packages: 3\n"));
    }

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc...");
        assert_eq!(truncate("ééééé", 2), "éé...");
    }

    #[test]
    fn format_scalar_strings_are_bare() {
        assert_eq!(format_scalar(&json!("good")), "good");
        assert_eq!(format_scalar(&json!(12)), "12");
        assert_eq!(format_scalar(&json!(null)), "n/a");
    }
}
