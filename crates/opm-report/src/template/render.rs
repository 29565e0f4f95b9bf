//! `{{ name }}` substitution and section assembly.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::warn;

use super::model::{ReportTemplate, TemplateSection};
use crate::error::{ReportError, Result};

/// Variable bag passed to the renderer.
pub type Variables = serde_json::Map<String, Value>;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z0-9_]+)*)\s*\}\}").unwrap()
});

/// Values used when the caller does not supply them.
pub fn default_variables() -> Variables {
    let mut vars = Variables::new();
    vars.insert("project_name".into(), Value::from("Unknown Project"));
    vars.insert("project_id".into(), Value::from(""));
    vars.insert("project_description".into(), Value::from(""));
    vars.insert("start_date".into(), Value::from("n/a"));
    vars.insert("end_date".into(), Value::from("n/a"));
    vars.insert("report_date".into(), Value::from("n/a"));
    vars.insert("completion_rate".into(), Value::from(0.0));
    for key in [
        "total_work_packages",
        "completed_work_packages",
        "in_progress_work_packages",
        "scheduled_work_packages",
        "new_work_packages",
        "remaining_work_packages",
    ] {
        vars.insert(key.into(), Value::from(0));
    }
    vars
}

/// Placeholder names in `text`, in order of appearance.
pub fn placeholders(text: &str) -> Vec<String> {
    PLACEHOLDER
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Resolve a dotted path (`a.b.c`) through nested maps.
pub fn lookup<'a>(vars: &'a Variables, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = vars.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

/// Text form of a value inside rendered output.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 => format!("{f:.1}"),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

fn check_literal(text: &str) -> Result<()> {
    if let Some(pos) = text.find("{{") {
        let snippet: String = text[pos..].chars().take(24).collect();
        return Err(ReportError::Render(format!(
            "unterminated or malformed placeholder at '{snippet}'"
        )));
    }
    Ok(())
}

/// Replace every placeholder in `template`. Unknown names and stray `{{`
/// are errors.
pub fn substitute(template: &str, vars: &Variables) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;
    for caps in PLACEHOLDER.captures_iter(template) {
        let Some(whole) = caps.get(0) else { continue };
        let literal = &template[last..whole.start()];
        check_literal(literal)?;
        out.push_str(literal);

        let name = &caps[1];
        let value = lookup(vars, name)
            .ok_or_else(|| ReportError::Render(format!("undefined variable '{name}'")))?;
        out.push_str(&format_value(value));
        last = whole.end();
    }
    let tail = &template[last..];
    check_literal(tail)?;
    out.push_str(tail);
    Ok(out)
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty() && s != "false" && s != "0",
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
    }
}

fn compare_operands<'a>(condition: &'a str, op: &str) -> Option<(&'a str, &'a str)> {
    let (lhs, rhs) = condition.split_once(op)?;
    Some((lhs.trim(), rhs.trim().trim_matches(|c| c == '\'' || c == '"')))
}

/// Built-in inclusion predicate: evaluates a section's `condition`.
///
/// Supports `name`, `!name`, `name == value` and `name != value`. A section
/// without a condition is included.
pub fn condition_predicate(section: &TemplateSection, vars: &Variables) -> bool {
    let Some(condition) = section.condition.as_deref().map(str::trim) else {
        return true;
    };
    if condition.is_empty() {
        return true;
    }

    if let Some(rest) = condition.strip_prefix('!') {
        if !rest.starts_with('=') {
            return !truthy(lookup(vars, rest.trim()));
        }
    }
    if let Some((name, expected)) = compare_operands(condition, "==") {
        let actual = lookup(vars, name).map(format_value).unwrap_or_default();
        return actual == expected;
    }
    if let Some((name, expected)) = compare_operands(condition, "!=") {
        let actual = lookup(vars, name).map(format_value).unwrap_or_default();
        return actual != expected;
    }
    truthy(lookup(vars, condition))
}

/// Render with every section included.
pub fn render_template(template: &ReportTemplate, vars: &Variables) -> Result<String> {
    render_template_with(template, vars, |_, _| true)
}

/// Render `template` against `vars` merged over [`default_variables`].
///
/// Non-required sections are skipped when `include` returns false. A section
/// that fails to render is replaced by a `[render error: ...]` line; a title
/// that fails to render falls back to `"{project_name} Report"`.
pub fn render_template_with<P>(template: &ReportTemplate, vars: &Variables, include: P) -> Result<String>
where
    P: Fn(&TemplateSection, &Variables) -> bool,
{
    let mut merged = default_variables();
    for (key, value) in vars {
        merged.insert(key.clone(), value.clone());
    }

    let title = substitute(&template.title_template, &merged).unwrap_or_else(|e| {
        warn!(error = %e, "title render failed, using fallback title");
        fallback_title(&merged)
    });
    let mut out = format!("# {title}\n\n");

    for section in template.sorted_sections() {
        if !section.required && !include(section, &merged) {
            continue;
        }
        match substitute(&section.content_template, &merged) {
            Ok(text) => out.push_str(&text),
            Err(e) => {
                warn!(section = %section.section_id, error = %e, "section render failed");
                out.push_str(&format!("[render error: {e}]"));
            }
        }
        out.push_str("\n\n");
    }
    Ok(out)
}

fn fallback_title(vars: &Variables) -> String {
    let project = lookup(vars, "project_name")
        .map(format_value)
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| "Unknown Project".to_string());
    format!("{project} Report")
}
