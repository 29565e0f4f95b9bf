//! MCP tool registry and implementations.
//!
//! Each tool is a [`ToolSpec`]: name, description, argument contract and a
//! handler. The registry is the single source for `tools/list` and for
//! argument validation in `tools/call`.

use std::collections::HashMap;
use std::time::Instant;

use chrono::NaiveDate;
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use opm_common::markdown::truncate;
use opm_common::{Error, NewWorkItem, Result, WorkItem, WorkItemPatch};
use opm_report::template::store::validate_template_id;
use opm_report::{
    build_template_variables, condition_predicate, render_template_with, ReportError,
    ReportTemplate, Variables,
};

use crate::mcp::context::ServerContext;
use crate::mcp::protocol::{ToolContent, ToolDefinition};

/// Items shown by `get_work_packages` when no limit is given.
const DEFAULT_LIST_LIMIT: i64 = 10;

/// Primitive type of a tool argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// Any string. Numbers are accepted and converted, since clients often
    /// send ids as numbers.
    String,
    /// `YYYY-MM-DD`.
    Date,
    /// Integer within `[min, max]`.
    Integer { min: i64, max: i64 },
    Object,
}

/// One declared argument.
#[derive(Debug, Clone)]
pub struct ArgSpec {
    pub name: &'static str,
    pub kind: ArgKind,
    pub required: bool,
    pub description: &'static str,
}

impl ArgSpec {
    fn new(name: &'static str, kind: ArgKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: false,
            description,
        }
    }

    pub fn string(name: &'static str, description: &'static str) -> Self {
        Self::new(name, ArgKind::String, description)
    }

    pub fn date(name: &'static str, description: &'static str) -> Self {
        Self::new(name, ArgKind::Date, description)
    }

    pub fn integer(name: &'static str, min: i64, max: i64, description: &'static str) -> Self {
        Self::new(name, ArgKind::Integer { min, max }, description)
    }

    pub fn object(name: &'static str, description: &'static str) -> Self {
        Self::new(name, ArgKind::Object, description)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn schema(&self) -> Value {
        match self.kind {
            ArgKind::String => json!({ "type": "string", "description": self.description }),
            ArgKind::Date => json!({
                "type": "string",
                "format": "date",
                "description": self.description,
            }),
            ArgKind::Integer { min, max } => json!({
                "type": "integer",
                "minimum": min,
                "maximum": max,
                "description": self.description,
            }),
            ArgKind::Object => json!({ "type": "object", "description": self.description }),
        }
    }

    /// Check one supplied value, returning its normalized form.
    fn check(&self, value: &Value) -> Result<Value> {
        let bad = |expected: &str| {
            Error::InvalidParams(format!("argument '{}' must be {expected}", self.name))
        };
        match self.kind {
            ArgKind::String => match value {
                Value::String(_) => Ok(value.clone()),
                Value::Number(n) => Ok(Value::String(n.to_string())),
                _ => Err(bad("a string")),
            },
            ArgKind::Date => {
                let text = value.as_str().ok_or_else(|| bad("a date (YYYY-MM-DD)"))?;
                parse_date(self.name, text)?;
                Ok(value.clone())
            }
            ArgKind::Integer { min, max } => {
                let n = value.as_i64().ok_or_else(|| bad("an integer"))?;
                if n < min || n > max {
                    return Err(Error::InvalidParams(format!(
                        "argument '{}' must be between {min} and {max}, got {n}",
                        self.name
                    )));
                }
                Ok(value.clone())
            }
            ArgKind::Object => match value {
                Value::Object(_) => Ok(value.clone()),
                _ => Err(bad("an object")),
            },
        }
    }
}

/// Validated tool arguments.
#[derive(Debug, Clone, Default)]
pub struct Arguments(Map<String, Value>);

impl Arguments {
    pub fn str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    pub fn require_str(&self, name: &str) -> Result<&str> {
        self.str(name)
            .ok_or_else(|| Error::InvalidParams(format!("missing required argument '{name}'")))
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.0.get(name).and_then(Value::as_i64)
    }

    pub fn require_int(&self, name: &str) -> Result<i64> {
        self.int(name)
            .ok_or_else(|| Error::InvalidParams(format!("missing required argument '{name}'")))
    }

    pub fn require_date(&self, name: &str) -> Result<NaiveDate> {
        parse_date(name, self.require_str(name)?)
    }

    pub fn object(&self, name: &str) -> Option<&Map<String, Value>> {
        self.0.get(name).and_then(Value::as_object)
    }
}

type Handler = fn(&ServerContext, &Arguments) -> Result<String>;

/// A registered tool.
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub args: Vec<ArgSpec>,
    handler: Handler,
}

impl ToolSpec {
    pub fn new(name: &'static str, description: &'static str, args: Vec<ArgSpec>, handler: Handler) -> Self {
        Self {
            name,
            description,
            args,
            handler,
        }
    }

    pub fn definition(&self) -> ToolDefinition {
        let properties: Map<String, Value> = self
            .args
            .iter()
            .map(|a| (a.name.to_string(), a.schema()))
            .collect();
        let required: Vec<&str> = self.args.iter().filter(|a| a.required).map(|a| a.name).collect();
        ToolDefinition {
            name: self.name.to_string(),
            description: self.description.to_string(),
            input_schema: json!({
                "type": "object",
                "properties": properties,
                "required": required,
                "additionalProperties": false,
            }),
        }
    }

    /// Check `arguments` against the declared contract.
    ///
    /// Unknown keys, missing required keys and wrongly typed values are all
    /// InvalidParams. A `null` optional argument counts as absent.
    pub fn validate(&self, arguments: &Value) -> Result<Arguments> {
        let supplied = match arguments {
            Value::Null => Map::new(),
            Value::Object(map) => map.clone(),
            _ => {
                return Err(Error::InvalidParams(format!(
                    "arguments for '{}' must be an object",
                    self.name
                )))
            }
        };

        if let Some(unknown) = supplied
            .keys()
            .find(|key| !self.args.iter().any(|a| a.name == key.as_str()))
        {
            return Err(Error::InvalidParams(format!(
                "unexpected argument '{unknown}' for tool '{}'",
                self.name
            )));
        }

        let mut checked = Map::new();
        for spec in &self.args {
            match supplied.get(spec.name) {
                None | Some(Value::Null) if spec.required => {
                    return Err(Error::InvalidParams(format!(
                        "missing required argument '{}' for tool '{}'",
                        spec.name, self.name
                    )));
                }
                None | Some(Value::Null) => {}
                Some(value) => {
                    checked.insert(spec.name.to_string(), spec.check(value)?);
                }
            }
        }
        Ok(Arguments(checked))
    }
}

/// Name-indexed tool catalog.
pub struct ToolRegistry {
    tools: Vec<ToolSpec>,
    index: HashMap<&'static str, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register a tool; a later registration under the same name replaces it.
    pub fn register(&mut self, spec: ToolSpec) {
        match self.index.get(spec.name) {
            Some(&pos) => self.tools[pos] = spec,
            None => {
                self.index.insert(spec.name, self.tools.len());
                self.tools.push(spec);
            }
        }
    }

    /// The full built-in catalog.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for spec in builtin_tools() {
            registry.register(spec);
        }
        registry
    }

    pub fn get(&self, name: &str) -> Option<&ToolSpec> {
        self.index.get(name).map(|&pos| &self.tools[pos])
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Definitions in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(ToolSpec::definition).collect()
    }

    /// Validate and run a tool.
    ///
    /// Argument problems are InvalidParams. Any other failure of the handler
    /// becomes a ToolExecution error naming the tool and the underlying kind.
    pub fn call(&self, ctx: &ServerContext, name: &str, arguments: &Value) -> Result<Vec<ToolContent>> {
        let spec = self
            .get(name)
            .ok_or_else(|| Error::InvalidParams(format!("Unknown tool: {name}")))?;
        let args = spec.validate(arguments)?;

        let logged = ctx.redactor.redact(arguments);
        let started = Instant::now();
        let outcome = (spec.handler)(ctx, &args);
        let duration_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(text) => {
                info!(tool = name, arguments = %logged, duration_ms, "tool call succeeded");
                Ok(vec![ToolContent::text(text)])
            }
            Err(err @ Error::InvalidParams(_)) => {
                warn!(tool = name, arguments = %logged, duration_ms, error = %err, "tool call rejected");
                Err(err)
            }
            Err(err) => {
                warn!(
                    tool = name,
                    arguments = %logged,
                    duration_ms,
                    error_type = err.kind(),
                    error = %err,
                    "tool call failed"
                );
                Err(Error::tool_execution(name, &err))
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn parse_date(name: &str, text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").map_err(|_| {
        Error::InvalidParams(format!("argument '{name}' must be a date (YYYY-MM-DD), got '{text}'"))
    })
}

fn builtin_tools() -> Vec<ToolSpec> {
    let project_id = || ArgSpec::string("project_id", "Project id");
    let template_id = || ArgSpec::string("template_id", "Report template id ([A-Za-z0-9_-]+)");
    vec![
        ToolSpec::new("get_projects", "List all projects.", vec![], get_projects),
        ToolSpec::new(
            "get_project",
            "Show the details of one project.",
            vec![project_id().required()],
            get_project,
        ),
        ToolSpec::new(
            "get_work_packages",
            "List work packages, optionally limited to one project.",
            vec![
                project_id(),
                ArgSpec::integer("limit", 1, 1000, "Maximum number of work packages to show (default 10)"),
            ],
            get_work_packages,
        ),
        ToolSpec::new(
            "get_work_package",
            "Show the details of one work package.",
            vec![ArgSpec::string("work_package_id", "Work package id").required()],
            get_work_package,
        ),
        ToolSpec::new(
            "create_work_package",
            "Create a work package in a project.",
            vec![
                project_id().required(),
                ArgSpec::string("subject", "Work package subject").required(),
                ArgSpec::string("description", "Work package description"),
                ArgSpec::string("type_id", "Work package type id (default 1)"),
            ],
            create_work_package,
        ),
        ToolSpec::new(
            "update_work_package",
            "Update the subject, description or progress of a work package.",
            vec![
                ArgSpec::string("work_package_id", "Work package id").required(),
                ArgSpec::string("subject", "New subject"),
                ArgSpec::string("description", "New description"),
                ArgSpec::integer("progress", 0, 100, "Percent done"),
            ],
            update_work_package,
        ),
        ToolSpec::new("get_users", "List users.", vec![], get_users),
        ToolSpec::new(
            "generate_weekly_report",
            "Weekly report of the work packages updated between two dates.",
            vec![
                project_id().required(),
                ArgSpec::date("start_date", "First day of the period (YYYY-MM-DD)").required(),
                ArgSpec::date("end_date", "Last day of the period (YYYY-MM-DD)").required(),
            ],
            generate_weekly_report,
        ),
        ToolSpec::new(
            "generate_monthly_report",
            "Monthly report: activity, completion rate, status and priority distribution.",
            vec![
                project_id().required(),
                ArgSpec::integer("year", 1970, 9999, "Calendar year").required(),
                ArgSpec::integer("month", 1, 12, "Calendar month (1-12)").required(),
            ],
            generate_monthly_report,
        ),
        ToolSpec::new(
            "assess_project_risks",
            "Risk assessment of the open work packages of a project.",
            vec![project_id().required()],
            assess_project_risks,
        ),
        ToolSpec::new(
            "analyze_team_workload",
            "Workload per assignee with rebalancing suggestions.",
            vec![project_id().required()],
            analyze_team_workload,
        ),
        ToolSpec::new(
            "check_project_health",
            "Composite 0-100 health score with issues and recommendations.",
            vec![project_id().required()],
            check_project_health,
        ),
        ToolSpec::new(
            "list_report_templates",
            "List stored report templates.",
            vec![],
            list_report_templates,
        ),
        ToolSpec::new(
            "get_report_template",
            "Show a stored report template as JSON.",
            vec![template_id().required()],
            get_report_template,
        ),
        ToolSpec::new(
            "save_report_template",
            "Create or replace a report template.",
            vec![
                template_id().required(),
                ArgSpec::object(
                    "template_data",
                    "Template document: template_info, title_template, sections",
                )
                .required(),
            ],
            save_report_template,
        ),
        ToolSpec::new(
            "delete_report_template",
            "Delete a stored report template.",
            vec![template_id().required()],
            delete_report_template,
        ),
        ToolSpec::new(
            "generate_report_from_template",
            "Render a stored template with live project data and optional custom variables.",
            vec![
                template_id().required(),
                project_id().required(),
                ArgSpec::object("custom_data", "Extra variables, overriding computed ones"),
            ],
            generate_report_from_template,
        ),
    ]
}

fn or_unknown(value: Option<&str>) -> &str {
    value.filter(|v| !v.trim().is_empty()).unwrap_or("unknown")
}

fn work_item_lines(item: &WorkItem) -> String {
    let mut text = format!("- **{}** (ID: {})\n", item.subject, item.id);
    text.push_str(&format!("  - Status: {}\n", or_unknown(item.status.as_deref())));
    if let Some(assignee) = item.assignee.as_deref().filter(|a| !a.trim().is_empty()) {
        text.push_str(&format!("  - Assignee: {assignee}\n"));
    }
    if let Some(progress) = item.progress {
        text.push_str(&format!("  - Progress: {progress}%\n"));
    }
    text
}

fn get_projects(ctx: &ServerContext, _args: &Arguments) -> Result<String> {
    let projects = ctx.backend.get_projects()?;
    if projects.is_empty() {
        return Ok("No projects found.".to_string());
    }
    let mut text = format!("Found {} project(s):\n\n", projects.len());
    for project in &projects {
        text.push_str(&format!(
            "- {} [ID: {}]: {}\n",
            project.display_name(),
            project.id,
            project.description.as_deref().unwrap_or("No description")
        ));
    }
    Ok(text)
}

fn get_project(ctx: &ServerContext, args: &Arguments) -> Result<String> {
    let project = ctx.backend.require_project(args.require_str("project_id")?)?;
    let stamp = |at: Option<chrono::DateTime<chrono::Utc>>| {
        at.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "unknown".to_string())
    };
    Ok(format!(
        "Project details:\n\n- Name: {}\n- ID: {}\n- Identifier: {}\n- Status: {}\n- Description: {}\n- Created: {}\n- Updated: {}\n",
        project.name,
        project.id,
        project.identifier,
        or_unknown(project.status.as_deref()),
        project.description.as_deref().unwrap_or("No description"),
        stamp(project.created_at),
        stamp(project.updated_at),
    ))
}

fn get_work_packages(ctx: &ServerContext, args: &Arguments) -> Result<String> {
    let project_id = args.str("project_id");
    if let Some(id) = project_id {
        ctx.backend.require_project(id)?;
    }
    let items = ctx.backend.get_work_items(project_id)?;
    if items.is_empty() {
        return Ok("No work packages found.".to_string());
    }

    let limit = args.int("limit").unwrap_or(DEFAULT_LIST_LIMIT) as usize;
    let mut text = format!("Found {} work package(s):\n\n", items.len());
    for item in items.iter().take(limit) {
        text.push_str(&work_item_lines(item));
    }
    if items.len() > limit {
        text.push_str(&format!("\n... and {} more\n", items.len() - limit));
    }
    Ok(text)
}

fn get_work_package(ctx: &ServerContext, args: &Arguments) -> Result<String> {
    let item = ctx
        .backend
        .require_work_item(args.require_str("work_package_id")?)?;
    let mut text = format!("Work package #{}: {}\n\n", item.id, item.subject);
    text.push_str(&format!("- Status: {}\n", or_unknown(item.status.as_deref())));
    text.push_str(&format!("- Type: {}\n", or_unknown(item.type_name.as_deref())));
    text.push_str(&format!("- Priority: {}\n", or_unknown(item.priority.as_deref())));
    text.push_str(&format!("- Assignee: {}\n", item.assignee.as_deref().unwrap_or("unassigned")));
    text.push_str(&format!(
        "- Progress: {}\n",
        item.progress.map(|p| format!("{p}%")).unwrap_or_else(|| "n/a".into())
    ));
    if let Some(start) = item.start_date {
        text.push_str(&format!("- Start date: {start}\n"));
    }
    if let Some(due) = item.due_date {
        text.push_str(&format!("- Due date: {due}\n"));
    }
    if let Some(description) = &item.description {
        text.push_str(&format!("\n{}\n", truncate(description, 500)));
    }
    Ok(text)
}

fn create_work_package(ctx: &ServerContext, args: &Arguments) -> Result<String> {
    let subject = args.require_str("subject")?;
    if subject.trim().is_empty() {
        return Err(Error::InvalidParams("subject must not be empty".into()));
    }
    let created = ctx.backend.create_work_item(&NewWorkItem {
        project_id: args.require_str("project_id")?.to_string(),
        subject: subject.to_string(),
        description: args.str("description").map(str::to_string),
        type_id: args.str("type_id").map(str::to_string),
    })?;
    Ok(format!("Created work package #{}: {}", created.id, created.subject))
}

fn update_work_package(ctx: &ServerContext, args: &Arguments) -> Result<String> {
    let patch = WorkItemPatch {
        subject: args.str("subject").map(str::to_string),
        description: args.str("description").map(str::to_string),
        progress: args.int("progress").map(|p| p.clamp(0, 100) as u8),
    };
    if patch.is_empty() {
        return Err(Error::InvalidParams(
            "nothing to update: pass subject, description or progress".into(),
        ));
    }
    let updated = ctx
        .backend
        .update_work_item(args.require_str("work_package_id")?, &patch)?;
    Ok(format!("Updated work package #{}: {}\n\n{}", updated.id, updated.subject, work_item_lines(&updated)))
}

fn get_users(ctx: &ServerContext, _args: &Arguments) -> Result<String> {
    let users = ctx.backend.get_users()?;
    if users.is_empty() {
        return Ok("No users found.".to_string());
    }
    let mut text = format!("Found {} user(s):\n\n", users.len());
    for user in &users {
        text.push_str(&format!("- {} ({}) [ID: {}]\n", user.display_name(), user.login, user.id));
    }
    Ok(text)
}

fn generate_weekly_report(ctx: &ServerContext, args: &Arguments) -> Result<String> {
    let start = args.require_date("start_date")?;
    let end = args.require_date("end_date")?;
    if start > end {
        return Err(Error::InvalidParams(format!(
            "start_date {start} is after end_date {end}"
        )));
    }
    let (project, items) = ctx.project_with_items(args.require_str("project_id")?)?;
    let report = ctx.engine.weekly(&project, &items, start, end, ctx.now())?;
    Ok(report.to_markdown())
}

fn generate_monthly_report(ctx: &ServerContext, args: &Arguments) -> Result<String> {
    let year = args.require_int("year")? as i32;
    let month = args.require_int("month")? as u32;
    let (project, items) = ctx.project_with_items(args.require_str("project_id")?)?;
    let report = ctx.engine.monthly(&project, &items, year, month, ctx.now())?;
    Ok(report.to_markdown())
}

fn assess_project_risks(ctx: &ServerContext, args: &Arguments) -> Result<String> {
    let (project, items) = ctx.project_with_items(args.require_str("project_id")?)?;
    Ok(ctx.engine.risk(&project, &items, ctx.now()).to_markdown())
}

fn analyze_team_workload(ctx: &ServerContext, args: &Arguments) -> Result<String> {
    let (project, items) = ctx.project_with_items(args.require_str("project_id")?)?;
    Ok(ctx.engine.workload(&project, &items, ctx.now()).to_markdown())
}

fn check_project_health(ctx: &ServerContext, args: &Arguments) -> Result<String> {
    let (project, items) = ctx.project_with_items(args.require_str("project_id")?)?;
    Ok(ctx.engine.health(&project, &items, ctx.now()).to_markdown())
}

fn list_report_templates(ctx: &ServerContext, _args: &Arguments) -> Result<String> {
    let templates = ctx.templates.list()?;
    if templates.is_empty() {
        return Ok("No report templates found.".to_string());
    }
    let mut text = "Available report templates:\n\n".to_string();
    for summary in &templates {
        text.push_str(&format!(
            "- {} (ID: {}, type: {}, version: {})\n",
            summary.name, summary.id, summary.kind, summary.version
        ));
        if !summary.description.is_empty() {
            text.push_str(&format!("  {}\n", summary.description));
        }
    }
    Ok(text)
}

fn get_report_template(ctx: &ServerContext, args: &Arguments) -> Result<String> {
    let id = template_id_arg(args)?;
    let template = ctx.templates.get(id)?;
    let mut doc = serde_json::to_value(&template)?;
    doc["template_id"] = json!(id);
    Ok(serde_json::to_string_pretty(&doc)?)
}

fn save_report_template(ctx: &ServerContext, args: &Arguments) -> Result<String> {
    let id = template_id_arg(args)?;
    let data = args
        .object("template_data")
        .cloned()
        .ok_or_else(|| Error::InvalidParams("missing required argument 'template_data'".into()))?;
    let template = ReportTemplate::from_value(Value::Object(data))?;
    let stored = ctx.templates.save(id, &template)?;
    Ok(format!(
        "Template '{}' saved ({} section(s)).",
        id,
        stored.sections.len()
    ))
}

fn delete_report_template(ctx: &ServerContext, args: &Arguments) -> Result<String> {
    let id = template_id_arg(args)?;
    if ctx.templates.delete(id)? {
        Ok(format!("Template '{id}' deleted."))
    } else {
        Err(ReportError::TemplateNotFound(id.to_string()).into())
    }
}

fn generate_report_from_template(ctx: &ServerContext, args: &Arguments) -> Result<String> {
    let id = template_id_arg(args)?;
    let template = ctx.templates.get(id)?;
    let (project, items) = ctx.project_with_items(args.require_str("project_id")?)?;
    let custom: Option<Variables> = args.object("custom_data").cloned();
    let vars = build_template_variables(&project, &items, ctx.today(), custom.as_ref());
    Ok(render_template_with(&template, &vars, condition_predicate)?)
}

/// Template ids become file names, so they are checked before any store call.
fn template_id_arg(args: &Arguments) -> Result<&str> {
    let id = args.require_str("template_id")?;
    validate_template_id(id)?;
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_is_complete() {
        let registry = ToolRegistry::builtin();
        let names: Vec<String> = registry.definitions().into_iter().map(|d| d.name).collect();
        for expected in [
            "get_projects",
            "get_project",
            "get_work_packages",
            "get_work_package",
            "create_work_package",
            "update_work_package",
            "get_users",
            "generate_weekly_report",
            "generate_monthly_report",
            "assess_project_risks",
            "analyze_team_workload",
            "check_project_health",
            "list_report_templates",
            "get_report_template",
            "save_report_template",
            "delete_report_template",
            "generate_report_from_template",
        ] {
            assert!(names.iter().any(|n| n == expected), "missing {expected}");
        }
        assert_eq!(registry.len(), 17);
    }

    #[test]
    fn schemas_are_closed_objects() {
        for def in ToolRegistry::builtin().definitions() {
            assert_eq!(def.input_schema["type"], "object", "{}", def.name);
            assert_eq!(def.input_schema["additionalProperties"], false, "{}", def.name);
            assert!(def.input_schema["required"].is_array(), "{}", def.name);
        }
    }

    #[test]
    fn monthly_schema_declares_ranges() {
        let registry = ToolRegistry::builtin();
        let def = registry.get("generate_monthly_report").unwrap().definition();
        assert_eq!(def.input_schema["properties"]["month"]["minimum"], 1);
        assert_eq!(def.input_schema["properties"]["month"]["maximum"], 12);
        assert_eq!(
            def.input_schema["required"],
            json!(["project_id", "year", "month"])
        );
    }

    #[test]
    fn validate_rejects_unknown_and_missing_arguments() {
        let registry = ToolRegistry::builtin();
        let spec = registry.get("get_project").unwrap();

        let err = spec.validate(&json!({"project_id": "1", "verbose": true})).unwrap_err();
        assert_eq!(err.code(), -32602);
        assert!(err.to_string().contains("verbose"));

        let err = spec.validate(&json!({})).unwrap_err();
        assert!(err.to_string().contains("project_id"));

        let err = spec.validate(&json!({"project_id": null})).unwrap_err();
        assert_eq!(err.code(), -32602);

        assert!(spec.validate(&json!("1")).is_err());
    }

    #[test]
    fn validate_normalizes_numeric_ids() {
        let registry = ToolRegistry::builtin();
        let args = registry
            .get("get_project")
            .unwrap()
            .validate(&json!({"project_id": 42}))
            .unwrap();
        assert_eq!(args.str("project_id"), Some("42"));
    }

    #[test]
    fn validate_checks_types_and_ranges() {
        let registry = ToolRegistry::builtin();
        let monthly = registry.get("generate_monthly_report").unwrap();
        assert!(monthly
            .validate(&json!({"project_id": "1", "year": 2025, "month": 13}))
            .is_err());
        assert!(monthly
            .validate(&json!({"project_id": "1", "year": "2025", "month": 1}))
            .is_err());
        assert!(monthly
            .validate(&json!({"project_id": "1", "year": 2025, "month": 12}))
            .is_ok());

        let weekly = registry.get("generate_weekly_report").unwrap();
        let err = weekly
            .validate(&json!({"project_id": "1", "start_date": "03/01/2025", "end_date": "2025-03-07"}))
            .unwrap_err();
        assert!(err.to_string().contains("start_date"));

        let save = registry.get("save_report_template").unwrap();
        assert!(save
            .validate(&json!({"template_id": "x", "template_data": "not an object"}))
            .is_err());
    }

    #[test]
    fn optional_null_is_absent() {
        let registry = ToolRegistry::builtin();
        let args = registry
            .get("get_work_packages")
            .unwrap()
            .validate(&json!({"project_id": null}))
            .unwrap();
        assert!(args.str("project_id").is_none());
    }

    #[test]
    fn register_replaces_by_name() {
        fn stub(_: &ServerContext, _: &Arguments) -> Result<String> {
            Ok("stub".into())
        }
        let mut registry = ToolRegistry::builtin();
        registry.register(ToolSpec::new("get_users", "Replaced.", vec![], stub));
        assert_eq!(registry.len(), 17);
        assert_eq!(registry.get("get_users").unwrap().description, "Replaced.");
    }
}
