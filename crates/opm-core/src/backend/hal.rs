//! Mapping from OpenProject HAL+JSON documents to the domain model.
//!
//! Collections carry their members under `_embedded.elements`; linked
//! resources (status, type, assignee, ...) are read from `_links.*.title`.
//! Fields the domain model does not need are ignored, and malformed optional
//! fields (bad dates, wrong types) map to `None` instead of failing the call.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{json, Value};

use opm_common::model::clamp_progress;
use opm_common::{Error, NewWorkItem, Project, Result, User, WorkItem, WorkItemPatch};

/// Members of a HAL collection; empty when the document has none.
pub fn elements(doc: &Value) -> &[Value] {
    doc.pointer("/_embedded/elements")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Size of the whole collection as reported by the server, across pages.
pub fn total(doc: &Value) -> Option<usize> {
    doc.get("total").and_then(Value::as_u64).map(|t| t as usize)
}

pub fn project(doc: &Value) -> Result<Project> {
    let id = required_id(doc, "project")?;
    let mut project = Project::new(
        id,
        str_field(doc, "name").unwrap_or_default(),
        str_field(doc, "identifier").unwrap_or_default(),
    );
    project.description = formattable(doc, "description");
    project.created_at = timestamp(doc, "createdAt");
    project.updated_at = timestamp(doc, "updatedAt");
    project.status = Some(match doc.get("active").and_then(Value::as_bool) {
        Some(false) => "archived".to_string(),
        _ => "active".to_string(),
    });
    Ok(project)
}

pub fn work_item(doc: &Value) -> Result<WorkItem> {
    let id = required_id(doc, "work package")?;
    let mut item = WorkItem::new(id, str_field(doc, "subject").unwrap_or_default());
    item.description = formattable(doc, "description");
    item.status = link_title(doc, "status");
    item.type_name = link_title(doc, "type");
    item.priority = link_title(doc, "priority");
    item.assignee = link_title(doc, "assignee");
    item.project_id = link_id(doc, "project");
    item.created_at = timestamp(doc, "createdAt");
    item.updated_at = timestamp(doc, "updatedAt");
    item.start_date = date(doc, "startDate");
    item.due_date = date(doc, "dueDate");
    item.progress = doc
        .get("percentageDone")
        .and_then(Value::as_f64)
        .map(|p| clamp_progress(p.round() as i64));
    Ok(item)
}

pub fn user(doc: &Value) -> Result<User> {
    let id = required_id(doc, "user")?;
    let mut user = User::new(id, str_field(doc, "login").unwrap_or_default());
    user.name = str_field(doc, "name");
    user.email = str_field(doc, "email");
    user.status = str_field(doc, "status");
    Ok(user)
}

/// Body for `POST /api/v3/work_packages`.
pub fn create_payload(item: &NewWorkItem) -> Value {
    let type_id = item.type_id.as_deref().unwrap_or("1");
    let mut payload = json!({
        "subject": item.subject,
        "_links": {
            "project": { "href": format!("/api/v3/projects/{}", item.project_id) },
            "type": { "href": format!("/api/v3/types/{}", type_id) },
        },
    });
    if let Some(description) = &item.description {
        payload["description"] = json!({ "raw": description });
    }
    payload
}

/// Body for `PATCH /api/v3/work_packages/{id}`.
pub fn update_payload(lock_version: i64, patch: &WorkItemPatch) -> Value {
    let mut payload = json!({ "lockVersion": lock_version });
    if let Some(subject) = &patch.subject {
        payload["subject"] = json!(subject);
    }
    if let Some(description) = &patch.description {
        payload["description"] = json!({ "raw": description });
    }
    if let Some(progress) = patch.progress {
        payload["percentageDone"] = json!(progress);
    }
    payload
}

/// `lockVersion` of a work package document, 0 when absent.
pub fn lock_version(doc: &Value) -> i64 {
    doc.get("lockVersion").and_then(Value::as_i64).unwrap_or(0)
}

/// Ids arrive as numbers but the domain uses strings.
fn required_id(doc: &Value, entity: &str) -> Result<String> {
    match doc.get("id") {
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        _ => Err(Error::backend(format!("malformed response: {entity} without id"))),
    }
}

fn str_field(doc: &Value, key: &str) -> Option<String> {
    doc.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Formattable text (`{"raw": ..., "html": ...}`); blank text maps to `None`.
fn formattable(doc: &Value, key: &str) -> Option<String> {
    doc.get(key)
        .and_then(|v| v.get("raw"))
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

fn link_title(doc: &Value, rel: &str) -> Option<String> {
    doc.get("_links")
        .and_then(|links| links.get(rel))
        .and_then(|link| link.get("title"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Trailing path segment of a link href (`/api/v3/projects/7` → `7`).
fn link_id(doc: &Value, rel: &str) -> Option<String> {
    doc.get("_links")
        .and_then(|links| links.get(rel))
        .and_then(|link| link.get("href"))
        .and_then(Value::as_str)
        .and_then(|href| href.trim_end_matches('/').rsplit('/').next())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn timestamp(doc: &Value, key: &str) -> Option<DateTime<Utc>> {
    doc.get(key)
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn date(doc: &Value, key: &str) -> Option<NaiveDate> {
    doc.get(key)
        .and_then(Value::as_str)
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wp_doc() -> Value {
        json!({
            "_type": "WorkPackage",
            "id": 42,
            "lockVersion": 3,
            "subject": "Fix login",
            "description": { "format": "markdown", "raw": "Users cannot log in", "html": "<p>..</p>" },
            "startDate": "2025-03-01",
            "dueDate": "2025-03-14",
            "percentageDone": 130,
            "createdAt": "2025-02-28T10:00:00Z",
            "updatedAt": "2025-03-05T08:30:00+01:00",
            "_links": {
                "self": { "href": "/api/v3/work_packages/42" },
                "project": { "href": "/api/v3/projects/7", "title": "Demo" },
                "status": { "href": "/api/v3/statuses/7", "title": "In progress" },
                "type": { "href": "/api/v3/types/1", "title": "Task" },
                "priority": { "href": "/api/v3/priorities/8", "title": "High" },
                "assignee": { "href": "/api/v3/users/3", "title": "Ada Lovelace" }
            }
        })
    }

    #[test]
    fn maps_work_package() {
        let item = work_item(&wp_doc()).unwrap();
        assert_eq!(item.id, "42");
        assert_eq!(item.subject, "Fix login");
        assert_eq!(item.description.as_deref(), Some("Users cannot log in"));
        assert_eq!(item.status.as_deref(), Some("In progress"));
        assert_eq!(item.type_name.as_deref(), Some("Task"));
        assert_eq!(item.priority.as_deref(), Some("High"));
        assert_eq!(item.assignee.as_deref(), Some("Ada Lovelace"));
        assert_eq!(item.project_id.as_deref(), Some("7"));
        assert_eq!(item.progress, Some(100));
        assert_eq!(item.due_date, NaiveDate::from_ymd_opt(2025, 3, 14));
        assert_eq!(
            item.updated_at.unwrap().to_rfc3339(),
            "2025-03-05T07:30:00+00:00"
        );
        assert_eq!(lock_version(&wp_doc()), 3);
    }

    #[test]
    fn tolerates_missing_and_malformed_fields() {
        let item = work_item(&json!({
            "id": "9",
            "subject": "Bare",
            "dueDate": "not a date",
            "description": { "raw": "   " },
            "_links": { "assignee": { "href": null } }
        }))
        .unwrap();
        assert_eq!(item.id, "9");
        assert!(item.due_date.is_none());
        assert!(item.description.is_none());
        assert!(item.assignee.is_none());
        assert!(item.progress.is_none());
    }

    #[test]
    fn missing_id_is_a_backend_error() {
        let err = project(&json!({ "name": "x" })).unwrap_err();
        assert_eq!(err.kind(), "BackendError");
    }

    #[test]
    fn maps_project_and_collection() {
        let doc = json!({
            "_type": "Collection",
            "total": 2,
            "_embedded": { "elements": [
                { "id": 1, "name": "Demo", "identifier": "demo", "active": true,
                  "description": { "raw": "Demo project" } },
                { "id": 2, "name": "Old", "identifier": "old", "active": false }
            ]}
        });
        let projects: Vec<Project> = elements(&doc).iter().map(|d| project(d).unwrap()).collect();
        assert_eq!(projects.len(), 2);
        assert_eq!(projects[0].description.as_deref(), Some("Demo project"));
        assert_eq!(projects[0].status.as_deref(), Some("active"));
        assert_eq!(projects[1].status.as_deref(), Some("archived"));
        assert!(elements(&json!({})).is_empty());
        assert_eq!(total(&doc), Some(2));
        assert_eq!(total(&json!({"total": "many"})), None);
    }

    #[test]
    fn maps_user() {
        let u = user(&json!({ "id": 3, "login": "ada", "name": "Ada Lovelace", "status": "active" })).unwrap();
        assert_eq!(u.id, "3");
        assert_eq!(u.display_name(), "Ada Lovelace");
    }

    #[test]
    fn payloads() {
        let new_item = NewWorkItem {
            project_id: "7".into(),
            subject: "Write docs".into(),
            description: Some("All of them".into()),
            type_id: None,
        };
        let body = create_payload(&new_item);
        assert_eq!(body["_links"]["project"]["href"], "/api/v3/projects/7");
        assert_eq!(body["_links"]["type"]["href"], "/api/v3/types/1");
        assert_eq!(body["description"]["raw"], "All of them");

        let patch = WorkItemPatch {
            progress: Some(60),
            ..WorkItemPatch::default()
        };
        let body = update_payload(4, &patch);
        assert_eq!(body, json!({ "lockVersion": 4, "percentageDone": 60 }));
    }
}
