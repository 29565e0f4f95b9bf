//! MCP resources: static documents and URI-template addressed views.

use std::collections::HashMap;

use chrono::{Duration, SecondsFormat};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};

use opm_common::{Error, Result, WorkItem};

use crate::mcp::context::ServerContext;
use crate::mcp::protocol::{ResourceContent, ResourceDefinition, ResourceTemplateDefinition};

const JSON: &str = "application/json";
const MARKDOWN: &str = "text/markdown";

const INFO_URI: &str = "openproject://info";
const DOCS_URI: &str = "openproject://docs";

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\\{([A-Za-z_][A-Za-z0-9_]*)\\\}").unwrap());

/// A URI pattern with `{name}` segments, compiled to an anchored regex.
///
/// Placeholders match one path segment, so a value never contains `/`.
#[derive(Debug, Clone)]
pub struct UriTemplate {
    template: String,
    pattern: Regex,
    names: Vec<String>,
}

impl UriTemplate {
    pub fn new(template: &str) -> Result<Self> {
        let escaped = regex::escape(template);
        let mut names = Vec::new();
        let body = PLACEHOLDER.replace_all(&escaped, |caps: &regex::Captures<'_>| {
            names.push(caps[1].to_string());
            format!("(?P<{}>[^/]+)", &caps[1])
        });
        let pattern = Regex::new(&format!("^{body}$"))
            .map_err(|e| Error::Internal(format!("bad URI template '{template}': {e}")))?;
        Ok(Self {
            template: template.to_string(),
            pattern,
            names,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Placeholder values when `uri` matches the whole template.
    pub fn matches(&self, uri: &str) -> Option<HashMap<String, String>> {
        let caps = self.pattern.captures(uri)?;
        Some(
            self.names
                .iter()
                .filter_map(|n| caps.name(n).map(|m| (n.clone(), m.as_str().to_string())))
                .collect(),
        )
    }

    /// Fill the placeholders, the inverse of [`UriTemplate::matches`].
    pub fn expand(&self, values: &HashMap<String, String>) -> String {
        let mut uri = self.template.clone();
        for name in &self.names {
            if let Some(value) = values.get(name) {
                uri = uri.replace(&format!("{{{name}}}"), value);
            }
        }
        uri
    }
}

type Reader = fn(&ServerContext, &str, &HashMap<String, String>) -> Result<ResourceContent>;

struct StaticResource {
    definition: ResourceDefinition,
    read: Reader,
}

struct TemplatedResource {
    definition: ResourceTemplateDefinition,
    template: UriTemplate,
    read: Reader,
}

/// Static and templated resource catalog.
pub struct ResourceRegistry {
    statics: Vec<StaticResource>,
    templates: Vec<TemplatedResource>,
}

impl ResourceRegistry {
    pub fn builtin() -> Result<Self> {
        let statics = vec![
            StaticResource {
                definition: definition(INFO_URI, "Server Info", "Service, version, capabilities and backend URL.", JSON),
                read: read_info,
            },
            StaticResource {
                definition: definition(DOCS_URI, "Usage Guide", "How to use the tools and resources of this server.", MARKDOWN),
                read: read_docs,
            },
        ];

        let templated: [(&str, &str, &str, &str, Reader); 4] = [
            (
                "openproject://projects/{project_id}",
                "Project",
                "Project details as JSON.",
                JSON,
                read_project,
            ),
            (
                "openproject://projects/{project_id}/work_packages",
                "Project Work Packages",
                "All work packages of a project, with total_count.",
                JSON,
                read_project_work_packages,
            ),
            (
                "openproject://projects/{project_id}/report",
                "Project Weekly Report",
                "Weekly report of the last seven days as Markdown.",
                MARKDOWN,
                read_project_report,
            ),
            (
                "openproject://work_packages/{work_package_id}",
                "Work Package",
                "Work package details as JSON.",
                JSON,
                read_work_package,
            ),
        ];
        let mut templates = Vec::with_capacity(templated.len());
        for (uri, name, description, mime, read) in templated {
            templates.push(TemplatedResource {
                definition: ResourceTemplateDefinition {
                    uri_template: uri.to_string(),
                    name: name.to_string(),
                    description: description.to_string(),
                    mime_type: mime.to_string(),
                },
                template: UriTemplate::new(uri)?,
                read,
            });
        }
        Ok(Self { statics, templates })
    }

    pub fn definitions(&self) -> Vec<ResourceDefinition> {
        self.statics.iter().map(|r| r.definition.clone()).collect()
    }

    pub fn template_definitions(&self) -> Vec<ResourceTemplateDefinition> {
        self.templates.iter().map(|r| r.definition.clone()).collect()
    }

    pub fn templates(&self) -> impl Iterator<Item = &UriTemplate> {
        self.templates.iter().map(|r| &r.template)
    }

    /// Read a resource. Static URIs win; otherwise the first matching template.
    pub fn read(&self, ctx: &ServerContext, uri: &str) -> Result<Vec<ResourceContent>> {
        if let Some(res) = self.statics.iter().find(|r| r.definition.uri == uri) {
            return Ok(vec![(res.read)(ctx, uri, &HashMap::new())?]);
        }
        for res in &self.templates {
            if let Some(params) = res.template.matches(uri) {
                return Ok(vec![(res.read)(ctx, uri, &params)?]);
            }
        }
        Err(Error::not_found("resource", uri))
    }
}

fn definition(uri: &str, name: &str, description: &str, mime: &str) -> ResourceDefinition {
    ResourceDefinition {
        uri: uri.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        mime_type: mime.to_string(),
    }
}

fn json_content(uri: &str, value: &Value) -> Result<ResourceContent> {
    Ok(ResourceContent {
        uri: uri.to_string(),
        mime_type: JSON.to_string(),
        text: serde_json::to_string_pretty(value)?,
    })
}

fn markdown_content(uri: &str, text: String) -> ResourceContent {
    ResourceContent {
        uri: uri.to_string(),
        mime_type: MARKDOWN.to_string(),
        text,
    }
}

fn param<'a>(params: &'a HashMap<String, String>, name: &str) -> Result<&'a str> {
    params
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| Error::InvalidParams(format!("missing URI parameter '{name}'")))
}

fn work_item_json(item: &WorkItem) -> Value {
    json!({
        "id": item.id,
        "subject": item.subject,
        "description": item.description,
        "status": item.status,
        "type": item.type_name,
        "priority": item.priority,
        "assignee": item.assignee,
        "project_id": item.project_id,
        "progress": item.progress,
        "start_date": item.start_date,
        "due_date": item.due_date,
        "created_at": item.created_at,
        "updated_at": item.updated_at,
    })
}

fn read_info(ctx: &ServerContext, uri: &str, _: &HashMap<String, String>) -> Result<ResourceContent> {
    let info = json!({
        "service": ctx.config.server_name,
        "version": env!("CARGO_PKG_VERSION"),
        "description": "MCP server exposing OpenProject projects, work packages and reports",
        "capabilities": ["tools", "resources", "prompts"],
        "openproject_url": ctx.backend.base_url(),
        "timestamp": ctx.now().to_rfc3339_opts(SecondsFormat::Secs, true),
    });
    json_content(uri, &info)
}

fn read_docs(_ctx: &ServerContext, uri: &str, _: &HashMap<String, String>) -> Result<ResourceContent> {
    let text = "# OpenProject MCP Server\n\n\
## Tools\n\n\
- `get_projects`, `get_project`: browse projects\n\
- `get_work_packages`, `get_work_package`: browse work packages\n\
- `create_work_package`, `update_work_package`: change work packages\n\
- `get_users`: list users\n\
- `generate_weekly_report`, `generate_monthly_report`: periodic reports\n\
- `assess_project_risks`, `analyze_team_workload`, `check_project_health`: analysis\n\
- `list_report_templates`, `get_report_template`, `save_report_template`, \
`delete_report_template`, `generate_report_from_template`: report templates\n\n\
## Resources\n\n\
- `openproject://info`: server info\n\
- `openproject://docs`: this guide\n\
- `openproject://projects/{project_id}`: project details\n\
- `openproject://projects/{project_id}/work_packages`: work packages of a project\n\
- `openproject://projects/{project_id}/report`: weekly report of the last seven days\n\
- `openproject://work_packages/{work_package_id}`: work package details\n\n\
## Prompts\n\n\
`project_analysis`, `work_package_summary`, `project_report_generator`, \
`task_prioritization`, `project_health_check`\n";
    Ok(markdown_content(uri, text.to_string()))
}

fn read_project(ctx: &ServerContext, uri: &str, params: &HashMap<String, String>) -> Result<ResourceContent> {
    let project = ctx.backend.require_project(param(params, "project_id")?)?;
    json_content(uri, &serde_json::to_value(&project)?)
}

fn read_project_work_packages(
    ctx: &ServerContext,
    uri: &str,
    params: &HashMap<String, String>,
) -> Result<ResourceContent> {
    let (project, items) = ctx.project_with_items(param(params, "project_id")?)?;
    let doc = json!({
        "project_id": project.id,
        "project_name": project.name,
        "total_count": items.len(),
        "work_packages": items.iter().map(work_item_json).collect::<Vec<_>>(),
    });
    json_content(uri, &doc)
}

fn read_project_report(
    ctx: &ServerContext,
    uri: &str,
    params: &HashMap<String, String>,
) -> Result<ResourceContent> {
    let (project, items) = ctx.project_with_items(param(params, "project_id")?)?;
    let end = ctx.today();
    let start = end - Duration::days(7);
    let report = ctx.engine.weekly(&project, &items, start, end, ctx.now())?;
    Ok(markdown_content(uri, report.to_markdown()))
}

fn read_work_package(
    ctx: &ServerContext,
    uri: &str,
    params: &HashMap<String, String>,
) -> Result<ResourceContent> {
    let item = ctx
        .backend
        .require_work_item(param(params, "work_package_id")?)?;
    json_content(uri, &work_item_json(&item))
}
