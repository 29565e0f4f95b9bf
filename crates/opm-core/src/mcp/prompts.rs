//! MCP prompts: role-tagged messages seeded with live project data.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde_json::{Map, Value};

use opm_common::markdown::truncate;
use opm_common::{Error, PriorityClass, Project, Result, StatusClass, WorkItem};

use crate::mcp::context::ServerContext;
use crate::mcp::protocol::{PromptArgument, PromptDefinition, PromptMessage, PromptResult};

/// Items listed by `work_package_summary`.
const SUMMARY_LIMIT: usize = 20;

const SYSTEM_PM: &str = "You are an experienced project manager reviewing OpenProject data. \
Be concise, concrete and base every statement on the data provided.";

type Generator = fn(&ServerContext, &PromptArgs) -> Result<PromptResult>;

/// Prompt arguments, all strings as MCP delivers them.
pub struct PromptArgs {
    prompt: &'static str,
    values: HashMap<String, String>,
}

impl PromptArgs {
    fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str).filter(|v| !v.trim().is_empty())
    }

    fn require(&self, name: &str) -> Result<&str> {
        self.get(name).ok_or_else(|| {
            Error::Validation(format!(
                "prompt '{}' requires argument '{name}'",
                self.prompt
            ))
        })
    }
}

struct PromptSpec {
    name: &'static str,
    description: &'static str,
    arguments: &'static [(&'static str, &'static str, bool)],
    generate: Generator,
}

impl PromptSpec {
    fn definition(&self) -> PromptDefinition {
        PromptDefinition {
            name: self.name.to_string(),
            description: self.description.to_string(),
            arguments: self
                .arguments
                .iter()
                .map(|(name, description, required)| PromptArgument {
                    name: name.to_string(),
                    description: description.to_string(),
                    required: *required,
                })
                .collect(),
        }
    }
}

/// The prompt catalog.
pub struct PromptRegistry {
    prompts: Vec<PromptSpec>,
}

impl Default for PromptRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PromptRegistry {
    pub fn builtin() -> Self {
        Self {
            prompts: vec![
                PromptSpec {
                    name: "project_analysis",
                    description: "Analyze a project's status, risks and next steps.",
                    arguments: &[
                        ("project_id", "Project id", true),
                        ("focus_area", "Aspect to emphasize, e.g. schedule or quality", false),
                    ],
                    generate: project_analysis,
                },
                PromptSpec {
                    name: "work_package_summary",
                    description: "Summarize work packages, optionally filtered by status or priority.",
                    arguments: &[
                        ("project_id", "Project id (all projects when omitted)", false),
                        ("status_filter", "Only items with this status", false),
                        ("priority_filter", "Only items with this priority", false),
                    ],
                    generate: work_package_summary,
                },
                PromptSpec {
                    name: "project_report_generator",
                    description: "Draft a stakeholder report for a project.",
                    arguments: &[
                        ("project_id", "Project id", true),
                        ("report_type", "Report flavor, e.g. status or executive (default status)", false),
                        ("include_metrics", "Include the metrics block (true/false, default true)", false),
                    ],
                    generate: project_report_generator,
                },
                PromptSpec {
                    name: "task_prioritization",
                    description: "Propose an order for the open work packages of a project.",
                    arguments: &[
                        ("project_id", "Project id", true),
                        ("criteria", "Prioritization criteria (default deadlines and priority)", false),
                    ],
                    generate: task_prioritization,
                },
                PromptSpec {
                    name: "project_health_check",
                    description: "Interpret the project's health score and suggest actions.",
                    arguments: &[
                        ("project_id", "Project id", true),
                        ("check_areas", "Comma-separated areas to focus on", false),
                    ],
                    generate: project_health_check,
                },
            ],
        }
    }

    pub fn definitions(&self) -> Vec<PromptDefinition> {
        self.prompts.iter().map(PromptSpec::definition).collect()
    }

    /// Render a prompt. Unknown names and missing required arguments are
    /// validation errors; a missing project is NotFound.
    pub fn get(&self, ctx: &ServerContext, name: &str, arguments: &Value) -> Result<PromptResult> {
        let spec = self
            .prompts
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| Error::Validation(format!("unknown prompt '{name}'")))?;

        let args = PromptArgs {
            prompt: spec.name,
            values: string_map(arguments.as_object()),
        };
        for (arg, _, required) in spec.arguments {
            if *required {
                args.require(arg)?;
            }
        }
        (spec.generate)(ctx, &args)
    }
}

fn string_map(map: Option<&Map<String, Value>>) -> HashMap<String, String> {
    map.into_iter()
        .flatten()
        .filter_map(|(k, v)| {
            let text = match v {
                Value::String(s) => s.clone(),
                Value::Null => return None,
                other => other.to_string(),
            };
            Some((k.clone(), text))
        })
        .collect()
}

fn label(value: Option<&str>) -> &str {
    value.filter(|v| !v.trim().is_empty()).unwrap_or("n/a")
}

fn item_line(item: &WorkItem) -> String {
    let mut line = format!(
        "- #{} {} [status: {}, priority: {}, assignee: {}",
        item.id,
        item.subject,
        label(item.status.as_deref()),
        label(item.priority.as_deref()),
        item.assignee.as_deref().unwrap_or("unassigned"),
    );
    if let Some(due) = item.due_date {
        line.push_str(&format!(", due: {due}"));
    }
    if let Some(progress) = item.progress {
        line.push_str(&format!(", progress: {progress}%"));
    }
    line.push(']');
    line
}

fn project_header(project: &Project) -> String {
    format!(
        "Project: {}\nDescription: {}\n",
        project.display_name(),
        project.description.as_deref().map(|d| truncate(d, 300)).unwrap_or_else(|| "none".into())
    )
}

fn status_counts(items: &[WorkItem]) -> String {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for item in items {
        let status = label(item.status.as_deref()).to_string();
        match counts.iter_mut().find(|(s, _)| *s == status) {
            Some((_, n)) => *n += 1,
            None => counts.push((status, 1)),
        }
    }
    counts.sort();
    counts
        .iter()
        .map(|(s, n)| format!("- {s}: {n}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn project_analysis(ctx: &ServerContext, args: &PromptArgs) -> Result<PromptResult> {
    let (project, items) = ctx.project_with_items(args.require("project_id")?)?;
    let focus = args.get("focus_area").unwrap_or("overall progress");
    let mut user = project_header(&project);
    user.push_str(&format!("\nWork packages: {}\n{}\n", items.len(), status_counts(&items)));
    user.push_str(&format!(
        "\nAnalyze this project with a focus on {focus}. Cover current status, risks, \
         bottlenecks and recommended next steps."
    ));
    Ok(PromptResult {
        description: format!("Analysis of project {}", project.name),
        messages: vec![PromptMessage::system(SYSTEM_PM), PromptMessage::user(user)],
    })
}

fn work_package_summary(ctx: &ServerContext, args: &PromptArgs) -> Result<PromptResult> {
    let project = match args.get("project_id") {
        Some(id) => Some(ctx.backend.require_project(id)?),
        None => None,
    };
    let items = ctx.backend.get_work_items(project.as_ref().map(|p| p.id.as_str()))?;

    let matches_filter = |value: Option<&str>, filter: Option<&str>| match filter {
        Some(f) => value.is_some_and(|v| v.trim().eq_ignore_ascii_case(f.trim())),
        None => true,
    };
    let status_filter = args.get("status_filter");
    let priority_filter = args.get("priority_filter");
    let selected: Vec<&WorkItem> = items
        .iter()
        .filter(|w| matches_filter(w.status.as_deref(), status_filter))
        .filter(|w| matches_filter(w.priority.as_deref(), priority_filter))
        .collect();

    let scope = project
        .as_ref()
        .map(|p| format!("project {}", p.display_name()))
        .unwrap_or_else(|| "all projects".into());
    let mut user = format!("Work packages in {scope}");
    if let Some(f) = status_filter {
        user.push_str(&format!(", status '{f}'"));
    }
    if let Some(f) = priority_filter {
        user.push_str(&format!(", priority '{f}'"));
    }
    user.push_str(&format!(": {} total\n\n", selected.len()));
    for item in selected.iter().take(SUMMARY_LIMIT) {
        user.push_str(&item_line(item));
        user.push('\n');
    }
    if selected.len() > SUMMARY_LIMIT {
        user.push_str(&format!("... and {} more\n", selected.len() - SUMMARY_LIMIT));
    }
    user.push_str("\nSummarize these work packages: themes, progress, blockers and anything that needs attention.");

    Ok(PromptResult {
        description: format!("Summary of work packages in {scope}"),
        messages: vec![PromptMessage::system(SYSTEM_PM), PromptMessage::user(user)],
    })
}

fn project_report_generator(ctx: &ServerContext, args: &PromptArgs) -> Result<PromptResult> {
    let (project, items) = ctx.project_with_items(args.require("project_id")?)?;
    let report_type = args.get("report_type").unwrap_or("status");
    let include_metrics = !matches!(
        args.get("include_metrics").map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("false" | "0" | "no" | "off")
    );

    let mut user = project_header(&project);
    if include_metrics {
        let completed = items
            .iter()
            .filter(|w| StatusClass::of(w.status.as_deref()) == StatusClass::Completed)
            .count();
        let overdue = items.iter().filter(|w| w.is_overdue(ctx.today())).count();
        user.push_str(&format!(
            "\nMetrics:\n- Total work packages: {}\n- Completed: {completed}\n- Overdue: {overdue}\n{}\n",
            items.len(),
            status_counts(&items)
        ));
    }
    user.push_str(&format!(
        "\nWrite a {report_type} report for stakeholders: executive summary, progress, \
         risks and next steps."
    ));
    Ok(PromptResult {
        description: format!("{report_type} report for project {}", project.name),
        messages: vec![PromptMessage::system(SYSTEM_PM), PromptMessage::user(user)],
    })
}

fn priority_rank(item: &WorkItem) -> u8 {
    match PriorityClass::of(item.priority.as_deref()) {
        PriorityClass::Immediate => 0,
        PriorityClass::High => 1,
        PriorityClass::Normal => 2,
        PriorityClass::Low => 3,
        PriorityClass::Other => 4,
    }
}

/// Due date first (undated last), then priority, then id.
fn by_due_then_priority(a: &&WorkItem, b: &&WorkItem) -> Ordering {
    let due = match (a.due_date, b.due_date) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    due.then_with(|| priority_rank(a).cmp(&priority_rank(b)))
        .then_with(|| a.id.cmp(&b.id))
}

fn task_prioritization(ctx: &ServerContext, args: &PromptArgs) -> Result<PromptResult> {
    let (project, items) = ctx.project_with_items(args.require("project_id")?)?;
    let criteria = args.get("criteria").unwrap_or("deadlines and priority");
    let mut open: Vec<&WorkItem> = items.iter().filter(|w| !w.is_closed()).collect();
    open.sort_by(by_due_then_priority);

    let mut user = project_header(&project);
    user.push_str(&format!("\nOpen work packages ({}):\n", open.len()));
    for item in &open {
        user.push_str(&item_line(item));
        user.push('\n');
    }
    user.push_str(&format!(
        "\nPropose a priority order for these tasks based on {criteria}, and explain the top five."
    ));
    Ok(PromptResult {
        description: format!("Task prioritization for project {}", project.name),
        messages: vec![PromptMessage::system(SYSTEM_PM), PromptMessage::user(user)],
    })
}

fn project_health_check(ctx: &ServerContext, args: &PromptArgs) -> Result<PromptResult> {
    let (project, items) = ctx.project_with_items(args.require("project_id")?)?;
    let areas = args.get("check_areas").unwrap_or("schedule, workload, scope");

    let mut user = project_header(&project);
    match ctx.engine.health_metrics(&items, ctx.now()) {
        Some(m) => {
            user.push_str(&format!(
                "\nHealth score: {}/100 ({})\n- Total: {}\n- Completed: {}\n- In progress: {}\n\
                 - Overdue: {}\n- Unassigned: {}\n- Open high priority: {}\n\
                 - Completion rate: {:.1}%\n- Overdue rate: {:.1}%\n- Assignment rate: {:.1}%\n",
                m.score,
                m.level.label(),
                m.total,
                m.completed,
                m.in_progress,
                m.overdue,
                m.unassigned,
                m.high_priority_open,
                m.completion_rate,
                m.overdue_rate,
                m.assignment_rate,
            ));
            if !m.issues.is_empty() {
                user.push_str("\nDetected issues:\n");
                for issue in &m.issues {
                    user.push_str(&format!("- {issue}\n"));
                }
            }
        }
        None => user.push_str("\nThe project has no work packages; no health score is available.\n"),
    }
    user.push_str(&format!(
        "\nAssess the health of this project with attention to {areas} and recommend concrete actions."
    ));
    Ok(PromptResult {
        description: format!("Health check for project {}", project.name),
        messages: vec![PromptMessage::system(SYSTEM_PM), PromptMessage::user(user)],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use opm_config::ServerConfig;
    use opm_report::{EngineConfig, FileTemplateStore, ReportEngine};
    use serde_json::json;

    use crate::backend::InMemoryBackend;

    fn ctx() -> ServerContext {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
        ServerContext::new(
            Arc::new(InMemoryBackend::demo(now)),
            ReportEngine::new(EngineConfig::default()),
            FileTemplateStore::new(std::env::temp_dir().join("opm-prompts-unused")),
            ServerConfig::default(),
        )
        .with_fixed_time(now)
    }

    fn user_text(result: &PromptResult) -> &str {
        &result.messages[1].content.text
    }

    #[test]
    fn catalog_lists_five_prompts() {
        let names: Vec<String> = PromptRegistry::builtin()
            .definitions()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(
            names,
            [
                "project_analysis",
                "work_package_summary",
                "project_report_generator",
                "task_prioritization",
                "project_health_check"
            ]
        );
    }

    #[test]
    fn messages_are_system_then_user() {
        let result = PromptRegistry::builtin()
            .get(&ctx(), "project_analysis", &json!({"project_id": "1"}))
            .unwrap();
        let roles: Vec<&str> = result.messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, ["system", "user"]);
        assert!(user_text(&result).contains("Demo Project (demo-project)"));
    }

    #[test]
    fn missing_argument_names_prompt_and_argument() {
        let err = PromptRegistry::builtin()
            .get(&ctx(), "task_prioritization", &json!({}))
            .unwrap_err();
        assert_eq!(err.code(), -32005);
        let msg = err.to_string();
        assert!(msg.contains("task_prioritization") && msg.contains("project_id"), "{msg}");
    }

    #[test]
    fn unknown_prompt_and_missing_project() {
        let registry = PromptRegistry::builtin();
        assert_eq!(registry.get(&ctx(), "nope", &json!({})).unwrap_err().code(), -32005);
        let err = registry
            .get(&ctx(), "project_analysis", &json!({"project_id": "99"}))
            .unwrap_err();
        assert_eq!(err.code(), -32003);
    }

    #[test]
    fn prioritization_orders_open_items_by_due_date() {
        let result = PromptRegistry::builtin()
            .get(&ctx(), "task_prioritization", &json!({"project_id": "1"}))
            .unwrap();
        let text = user_text(&result);
        let pos = |id: &str| text.find(id).unwrap();
        // 103 overdue, 102 due in 2 days, 105 in 14, 104 undated
        assert!(pos("#103") < pos("#102"));
        assert!(pos("#102") < pos("#105"));
        assert!(pos("#105") < pos("#104"));
        assert!(!text.contains("#101"));
    }

    #[test]
    fn summary_filters_by_status() {
        let result = PromptRegistry::builtin()
            .get(
                &ctx(),
                "work_package_summary",
                &json!({"project_id": "1", "status_filter": "in progress"}),
            )
            .unwrap();
        let text = user_text(&result);
        assert!(text.contains("2 total"));
        assert!(text.contains("#102") && text.contains("#103"));
        assert!(!text.contains("#104"));
    }

    #[test]
    fn health_check_embeds_score() {
        let result = PromptRegistry::builtin()
            .get(&ctx(), "project_health_check", &json!({"project_id": 1}))
            .unwrap();
        assert!(user_text(&result).contains("Health score: "));
    }
}
