//! Blocking client for the OpenProject API v3.

use std::time::{Duration, Instant};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::Value;
use tracing::{debug, warn};

use opm_common::markdown::truncate;
use opm_common::{Error, NewWorkItem, Project, Result, User, WorkItem, WorkItemPatch};
use opm_config::ServerConfig;

use super::{hal, WorkItemBackend};

/// Page size requested for work package collections.
const PAGE_SIZE: usize = 1000;

/// Upper bound on pages fetched for one collection.
const MAX_PAGES: usize = 50;

/// OpenProject REST client.
///
/// Authenticates with HTTP basic auth, user `apikey` and the API key as
/// password. Every call is bounded by the agent timeout.
pub struct OpenProjectClient {
    base_url: String,
    auth_header: String,
    agent: ureq::Agent,
}

impl std::fmt::Debug for OpenProjectClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenProjectClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl OpenProjectClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(&format!("opm/{}", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            auth_header: basic_auth("apikey", api_key),
            agent,
        }
    }

    /// Build a client from server configuration.
    ///
    /// URL and API key must both be set.
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        let url = config
            .openproject_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| Error::Config("OpenProject URL is not configured".into()))?;
        let api_key = config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::Config("OpenProject API key is not configured".into()))?;
        Ok(Self::new(
            url,
            api_key,
            Duration::from_secs(config.request_timeout),
        ))
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/api/v3{}", self.base_url, endpoint)
    }

    fn execute(
        &self,
        method: &str,
        endpoint: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Value> {
        let started = Instant::now();
        let mut request = self
            .agent
            .request(method, &self.url(endpoint))
            .set("Authorization", &self.auth_header)
            .set("Content-Type", "application/json")
            .set("Accept", "application/hal+json, application/json");
        for (key, value) in query {
            request = request.query(key, value);
        }

        let outcome = match body {
            Some(body) => request.send_json(body),
            None => request.call(),
        };
        let duration_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(response) => {
                debug!(endpoint, method, status = response.status(), duration_ms, "backend call");
                response.into_json::<Value>().map_err(|e| {
                    Error::backend(format!("invalid JSON from {endpoint}: {e}"))
                })
            }
            Err(ureq::Error::Status(status, response)) => {
                warn!(endpoint, method, status, duration_ms, "backend call failed");
                let text = response.into_string().unwrap_or_default();
                Err(status_error(status, endpoint, &text))
            }
            Err(ureq::Error::Transport(transport)) => {
                warn!(endpoint, method, duration_ms, error = %transport, "backend unreachable");
                Err(transport_error(endpoint, &transport.to_string()))
            }
        }
    }

    fn get(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<Value> {
        self.execute("GET", endpoint, query, None)
    }

    /// Every member of a paged collection, following `offset` until the
    /// server's `total` is reached or a page comes back empty.
    fn get_all(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<Vec<Value>> {
        let page_size = PAGE_SIZE.to_string();
        let mut members = Vec::new();
        let mut reported_total = None;
        for offset in 1..=MAX_PAGES {
            let offset = offset.to_string();
            let mut paged = query.to_vec();
            paged.push(("pageSize", page_size.as_str()));
            paged.push(("offset", offset.as_str()));

            let doc = self.get(endpoint, &paged)?;
            let page = hal::elements(&doc);
            members.extend_from_slice(page);
            reported_total = hal::total(&doc);
            if page.is_empty() || members.len() >= reported_total.unwrap_or(members.len()) {
                return Ok(members);
            }
        }
        warn!(
            endpoint,
            fetched = members.len(),
            total = reported_total,
            max_pages = MAX_PAGES,
            "collection truncated, reports cover a partial list"
        );
        Ok(members)
    }

    /// GET that maps a 404 to `None`.
    fn get_optional(&self, endpoint: &str) -> Result<Option<Value>> {
        match self.get(endpoint, &[]) {
            Ok(doc) => Ok(Some(doc)),
            Err(Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl WorkItemBackend for OpenProjectClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get_projects(&self) -> Result<Vec<Project>> {
        let doc = self.get("/projects", &[])?;
        hal::elements(&doc).iter().map(hal::project).collect()
    }

    fn get_project(&self, id: &str) -> Result<Option<Project>> {
        let id = path_segment(id, "project_id")?;
        self.get_optional(&format!("/projects/{id}"))?
            .map(|doc| hal::project(&doc))
            .transpose()
    }

    fn get_work_items(&self, project_id: Option<&str>) -> Result<Vec<WorkItem>> {
        let members = match project_id {
            Some(id) => {
                let filters = project_filter(path_segment(id, "project_id")?);
                self.get_all("/work_packages", &[("filters", filters.as_str())])?
            }
            None => self.get_all("/work_packages", &[])?,
        };
        members.iter().map(hal::work_item).collect()
    }

    fn get_work_item(&self, id: &str) -> Result<Option<WorkItem>> {
        let id = path_segment(id, "work_package_id")?;
        self.get_optional(&format!("/work_packages/{id}"))?
            .map(|doc| hal::work_item(&doc))
            .transpose()
    }

    fn create_work_item(&self, item: &NewWorkItem) -> Result<WorkItem> {
        path_segment(&item.project_id, "project_id")?;
        let doc = self.execute("POST", "/work_packages", &[], Some(&hal::create_payload(item)))?;
        hal::work_item(&doc)
    }

    fn update_work_item(&self, id: &str, patch: &WorkItemPatch) -> Result<WorkItem> {
        let id = path_segment(id, "work_package_id")?;
        let endpoint = format!("/work_packages/{id}");
        let current = self.get(&endpoint, &[])?;
        let body = hal::update_payload(hal::lock_version(&current), patch);
        let doc = self.execute("PATCH", &endpoint, &[], Some(&body))?;
        hal::work_item(&doc)
    }

    fn get_users(&self) -> Result<Vec<User>> {
        let doc = self.get("/users", &[])?;
        hal::elements(&doc).iter().map(hal::user).collect()
    }
}

fn basic_auth(user: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{user}:{password}")))
}

/// `filters` query value selecting one project.
fn project_filter(project_id: &str) -> String {
    format!(r#"[{{"project":{{"operator":"=","values":["{project_id}"]}}}}]"#)
}

/// Ids are interpolated into URL paths, so only `[A-Za-z0-9_-]` is allowed.
fn path_segment<'a>(id: &'a str, field: &str) -> Result<&'a str> {
    if Project::is_valid_identifier(id) {
        Ok(id)
    } else {
        Err(Error::InvalidParams(format!("{field} '{id}' is not a valid id")))
    }
}

/// Map a non-2xx HTTP status to the error taxonomy.
fn status_error(status: u16, endpoint: &str, body: &str) -> Error {
    match status {
        401 => Error::Authentication("OpenProject API rejected the credentials".into()),
        404 => Error::not_found("resource", endpoint),
        _ => Error::Backend {
            message: format!(
                "OpenProject API error {status} on {endpoint}: {}",
                truncate(body.trim(), 200)
            ),
            status: Some(status),
        },
    }
}

fn transport_error(endpoint: &str, detail: &str) -> Error {
    let lower = detail.to_lowercase();
    if lower.contains("timed out") || lower.contains("timeout") {
        Error::backend(format!("request timeout for {endpoint}"))
    } else {
        Error::backend(format!("connection error for {endpoint}: {detail}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serve canned HTTP responses, one connection each, on a random local
    /// port. The handle yields the request heads in arrival order.
    fn serve(responses: Vec<(&'static str, String)>) -> (String, thread::JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let mut heads = Vec::new();
            for (status_line, body) in responses {
                let (stream, _) = listener.accept().unwrap();
                let mut reader = BufReader::new(stream.try_clone().unwrap());
                let mut head = String::new();
                loop {
                    let mut line = String::new();
                    if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
                        break;
                    }
                    head.push_str(&line);
                }
                let mut stream = stream;
                write!(
                    stream,
                    "HTTP/1.1 {status_line}\r\nContent-Type: application/hal+json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                )
                .unwrap();
                stream.flush().unwrap();
                heads.push(head);
            }
            heads
        });
        (format!("http://{addr}/"), handle)
    }

    fn serve_once(status_line: &'static str, body: &'static str) -> (String, thread::JoinHandle<String>) {
        let (url, handle) = serve(vec![(status_line, body.to_string())]);
        let first = thread::spawn(move || handle.join().unwrap().remove(0));
        (url, first)
    }

    fn client(url: &str) -> OpenProjectClient {
        OpenProjectClient::new(url, "secret", Duration::from_secs(5))
    }

    #[test]
    fn base_url_is_trimmed() {
        let c = client("https://op.example.com/ ");
        assert_eq!(c.base_url(), "https://op.example.com");
        assert_eq!(c.url("/projects"), "https://op.example.com/api/v3/projects");
    }

    #[test]
    fn basic_auth_uses_apikey_user() {
        assert_eq!(basic_auth("apikey", "secret"), "Basic YXBpa2V5OnNlY3JldA==");
    }

    #[test]
    fn debug_hides_credentials() {
        let rendered = format!("{:?}", client("https://op.example.com"));
        assert!(!rendered.contains("YXBpa2V5"));
    }

    #[test]
    fn from_config_requires_url_and_key() {
        let mut config = ServerConfig::default();
        assert!(matches!(OpenProjectClient::from_config(&config), Err(Error::Config(_))));
        config.openproject_url = Some("https://op.example.com".into());
        assert!(matches!(OpenProjectClient::from_config(&config), Err(Error::Config(_))));
        config.api_key = Some("k".into());
        assert!(OpenProjectClient::from_config(&config).is_ok());
    }

    #[test]
    fn status_mapping() {
        assert_eq!(status_error(401, "/projects", "").kind(), "AuthenticationError");
        assert_eq!(status_error(404, "/projects/9", "").kind(), "NotFoundError");
        let err = status_error(503, "/projects", "maintenance");
        assert_eq!(err.kind(), "BackendError");
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn transport_mapping() {
        assert!(transport_error("/projects", "io: timed out")
            .to_string()
            .contains("request timeout"));
        assert!(transport_error("/projects", "Connection refused")
            .to_string()
            .contains("connection error"));
    }

    #[test]
    fn project_filter_shape() {
        assert_eq!(
            project_filter("7"),
            r#"[{"project":{"operator":"=","values":["7"]}}]"#
        );
    }

    #[test]
    fn ids_with_path_characters_are_rejected() {
        let c = client("http://127.0.0.1:9");
        let err = c.get_project("../users").unwrap_err();
        assert_eq!(err.kind(), "InvalidParams");
    }

    #[test]
    fn fetches_projects_with_basic_auth() {
        let (url, server) = serve_once(
            "200 OK",
            r#"{"_embedded":{"elements":[{"id":1,"name":"Demo","identifier":"demo","active":true}]}}"#,
        );
        let projects = client(&url).get_projects().unwrap();
        let head = server.join().unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].identifier, "demo");
        assert!(head.starts_with("GET /api/v3/projects"));
        assert!(head.contains("Basic YXBpa2V5OnNlY3JldA=="));
    }

    fn work_package_page(total: usize, ids: &[u32]) -> String {
        let elements: Vec<Value> = ids
            .iter()
            .map(|id| serde_json::json!({"id": id, "subject": format!("Task {id}")}))
            .collect();
        serde_json::json!({"total": total, "count": ids.len(), "_embedded": {"elements": elements}})
            .to_string()
    }

    #[test]
    fn work_packages_follow_pages_until_total() {
        let (url, server) = serve(vec![
            ("200 OK", work_package_page(3, &[1, 2])),
            ("200 OK", work_package_page(3, &[3])),
        ]);
        let items = client(&url).get_work_items(Some("7")).unwrap();
        let heads = server.join().unwrap();

        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(heads.len(), 2);
        assert!(heads[0].contains("offset=1"));
        assert!(heads[0].contains("pageSize=1000"));
        assert!(heads[0].contains("filters="));
        assert!(heads[1].contains("offset=2"));
    }

    #[test]
    fn empty_page_ends_paging_early() {
        let (url, server) = serve(vec![
            ("200 OK", work_package_page(5, &[1])),
            ("200 OK", work_package_page(5, &[])),
        ]);
        let items = client(&url).get_work_items(None).unwrap();
        assert_eq!(server.join().unwrap().len(), 2);
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn single_page_without_total_is_one_request() {
        let (url, server) = serve_once(
            "200 OK",
            r#"{"_embedded":{"elements":[{"id":4,"subject":"Only"}]}}"#,
        );
        let items = client(&url).get_work_items(None).unwrap();
        server.join().unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn unauthorized_maps_to_authentication_error() {
        let (url, server) = serve_once("401 Unauthorized", "");
        let err = client(&url).get_projects().unwrap_err();
        server.join().unwrap();
        assert!(matches!(err, Error::Authentication(_)));
    }

    #[test]
    fn missing_project_is_none() {
        let (url, server) = serve_once("404 Not Found", r#"{"_type":"Error"}"#);
        let project = client(&url).get_project("99").unwrap();
        server.join().unwrap();
        assert!(project.is_none());
    }

    #[test]
    fn unreachable_backend_is_backend_error() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let err = client(&format!("http://127.0.0.1:{port}"))
            .get_projects()
            .unwrap_err();
        assert_eq!(err.kind(), "BackendError");
    }
}
