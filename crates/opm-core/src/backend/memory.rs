//! In-memory backend used by tests and `opm serve --demo`.

use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};

use opm_common::{Error, NewWorkItem, Project, Result, User, WorkItem, WorkItemPatch};

use super::WorkItemBackend;

#[derive(Debug, Default)]
struct Store {
    projects: Vec<Project>,
    work_items: Vec<WorkItem>,
    users: Vec<User>,
    next_id: u64,
}

/// Failure injected into every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    /// Backend unreachable.
    Unavailable,
    /// Credentials rejected.
    Unauthorized,
}

impl FailureMode {
    fn to_error(self) -> Error {
        match self {
            FailureMode::Unavailable => Error::backend("connection error: backend unavailable"),
            FailureMode::Unauthorized => {
                Error::Authentication("OpenProject API rejected the credentials".into())
            }
        }
    }
}

/// Thread-safe fixture store implementing [`WorkItemBackend`].
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    store: RwLock<Store>,
    failure: RwLock<Option<FailureMode>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_project(self, project: Project) -> Self {
        self.insert_project(project);
        self
    }

    pub fn with_work_item(self, item: WorkItem) -> Self {
        self.insert_work_item(item);
        self
    }

    pub fn with_user(self, user: User) -> Self {
        if let Ok(mut store) = self.store.write() {
            store.users.push(user);
        }
        self
    }

    pub fn insert_project(&self, project: Project) {
        if let Ok(mut store) = self.store.write() {
            store.projects.retain(|p| p.id != project.id);
            store.projects.push(project);
        }
    }

    pub fn insert_work_item(&self, item: WorkItem) {
        if let Ok(mut store) = self.store.write() {
            if let Ok(n) = item.id.parse::<u64>() {
                store.next_id = store.next_id.max(n);
            }
            store.work_items.retain(|w| w.id != item.id);
            store.work_items.push(item);
        }
    }

    /// Make every subsequent call fail (`None` restores normal behavior).
    pub fn set_failure(&self, mode: Option<FailureMode>) {
        if let Ok(mut failure) = self.failure.write() {
            *failure = mode;
        }
    }

    /// A sample project with a realistic spread of work items, relative to `now`.
    pub fn demo(now: DateTime<Utc>) -> Self {
        let today = now.date_naive();
        let days = Duration::days;
        let project = Project::new("1", "Demo Project", "demo-project")
            .with_description("Sample project served by `opm serve --demo`")
            .with_status("active");

        let items = vec![
            WorkItem::new("101", "Set up CI pipeline")
                .with_status("Closed")
                .with_priority("Normal")
                .with_assignee("Ada Lovelace")
                .with_progress(100)
                .with_created_at(now - days(20))
                .with_updated_at(now - days(2)),
            WorkItem::new("102", "Design login page")
                .with_status("In progress")
                .with_priority("High")
                .with_assignee("Grace Hopper")
                .with_progress(40)
                .with_due_date(today + days(2))
                .with_created_at(now - days(12))
                .with_updated_at(now - days(1)),
            WorkItem::new("103", "Migrate database")
                .with_status("In progress")
                .with_priority("Immediate")
                .with_assignee("Ada Lovelace")
                .with_progress(20)
                .with_due_date(today - days(3))
                .with_description("Move the reporting tables to the new cluster and verify row counts.")
                .with_created_at(now - days(30))
                .with_updated_at(now - days(10)),
            WorkItem::new("104", "Write user documentation")
                .with_status("New")
                .with_priority("Low")
                .with_created_at(now - days(5))
                .with_updated_at(now - days(5)),
            WorkItem::new("105", "Plan release 1.2")
                .with_status("Scheduled")
                .with_priority("Normal")
                .with_assignee("Linus Torvalds")
                .with_progress(0)
                .with_due_date(today + days(14))
                .with_created_at(now - days(3))
                .with_updated_at(now - days(3)),
            WorkItem::new("106", "Fix flaky integration test")
                .with_status("Closed")
                .with_priority("High")
                .with_assignee("Grace Hopper")
                .with_progress(100)
                .with_created_at(now - days(8))
                .with_updated_at(now - days(4)),
        ];

        let backend = Self::new()
            .with_project(project)
            .with_user(User::new("1", "ada").with_name("Ada Lovelace"))
            .with_user(User::new("2", "grace").with_name("Grace Hopper"))
            .with_user(User::new("3", "linus").with_name("Linus Torvalds"));
        for item in items {
            backend.insert_work_item(item.with_project("1"));
        }
        backend
    }

    fn check(&self) -> Result<()> {
        match self.failure.read().ok().and_then(|f| *f) {
            Some(mode) => Err(mode.to_error()),
            None => Ok(()),
        }
    }

    fn read<T>(&self, f: impl FnOnce(&Store) -> T) -> Result<T> {
        self.check()?;
        let store = self
            .store
            .read()
            .map_err(|_| Error::Internal("in-memory store lock poisoned".into()))?;
        Ok(f(&store))
    }

    fn write<T>(&self, f: impl FnOnce(&mut Store) -> Result<T>) -> Result<T> {
        self.check()?;
        let mut store = self
            .store
            .write()
            .map_err(|_| Error::Internal("in-memory store lock poisoned".into()))?;
        f(&mut store)
    }
}

impl WorkItemBackend for InMemoryBackend {
    fn base_url(&self) -> &str {
        "memory://"
    }

    fn get_projects(&self) -> Result<Vec<Project>> {
        self.read(|s| s.projects.clone())
    }

    fn get_project(&self, id: &str) -> Result<Option<Project>> {
        self.read(|s| s.projects.iter().find(|p| p.id == id).cloned())
    }

    fn get_work_items(&self, project_id: Option<&str>) -> Result<Vec<WorkItem>> {
        self.read(|s| {
            s.work_items
                .iter()
                .filter(|w| project_id.is_none() || w.project_id.as_deref() == project_id)
                .cloned()
                .collect()
        })
    }

    fn get_work_item(&self, id: &str) -> Result<Option<WorkItem>> {
        self.read(|s| s.work_items.iter().find(|w| w.id == id).cloned())
    }

    fn create_work_item(&self, item: &NewWorkItem) -> Result<WorkItem> {
        self.write(|s| {
            if !s.projects.iter().any(|p| p.id == item.project_id) {
                return Err(Error::not_found("project", item.project_id.clone()));
            }
            s.next_id += 1;
            let now = Utc::now();
            let mut created = WorkItem::new(s.next_id.to_string(), item.subject.clone())
                .with_status("New")
                .with_project(item.project_id.clone())
                .with_created_at(now)
                .with_updated_at(now);
            created.description = item.description.clone();
            created.type_name = Some(item.type_id.clone().unwrap_or_else(|| "Task".into()));
            s.work_items.push(created.clone());
            Ok(created)
        })
    }

    fn update_work_item(&self, id: &str, patch: &WorkItemPatch) -> Result<WorkItem> {
        self.write(|s| {
            let item = s
                .work_items
                .iter_mut()
                .find(|w| w.id == id)
                .ok_or_else(|| Error::not_found("work package", id))?;
            if let Some(subject) = &patch.subject {
                item.subject = subject.clone();
            }
            if let Some(description) = &patch.description {
                item.description = Some(description.clone());
            }
            if let Some(progress) = patch.progress {
                item.progress = Some(progress.min(100));
            }
            item.updated_at = Some(Utc::now());
            Ok(item.clone())
        })
    }

    fn get_users(&self) -> Result<Vec<User>> {
        self.read(|s| s.users.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn demo_is_populated() {
        let backend = InMemoryBackend::demo(now());
        assert_eq!(backend.get_projects().unwrap().len(), 1);
        let items = backend.get_work_items(Some("1")).unwrap();
        assert_eq!(items.len(), 6);
        assert!(items.iter().all(|w| w.project_id.as_deref() == Some("1")));
        assert!(backend.get_work_items(Some("2")).unwrap().is_empty());
        assert_eq!(backend.get_users().unwrap().len(), 3);
    }

    #[test]
    fn create_assigns_fresh_ids() {
        let backend = InMemoryBackend::demo(now());
        let created = backend
            .create_work_item(&NewWorkItem {
                project_id: "1".into(),
                subject: "New task".into(),
                description: None,
                type_id: None,
            })
            .unwrap();
        assert_eq!(created.id, "107");
        assert_eq!(created.status.as_deref(), Some("New"));
        assert!(backend.get_work_item("107").unwrap().is_some());
    }

    #[test]
    fn create_in_unknown_project_fails() {
        let backend = InMemoryBackend::new();
        let err = backend
            .create_work_item(&NewWorkItem {
                project_id: "9".into(),
                subject: "x".into(),
                description: None,
                type_id: None,
            })
            .unwrap_err();
        assert_eq!(err.kind(), "NotFoundError");
    }

    #[test]
    fn update_applies_patch() {
        let backend = InMemoryBackend::demo(now());
        let patch = WorkItemPatch {
            subject: Some("Renamed".into()),
            progress: Some(75),
            ..WorkItemPatch::default()
        };
        let updated = backend.update_work_item("102", &patch).unwrap();
        assert_eq!(updated.subject, "Renamed");
        assert_eq!(updated.progress, Some(75));
        assert!(backend.update_work_item("999", &patch).is_err());
    }

    #[test]
    fn failure_mode_applies_to_every_call() {
        let backend = InMemoryBackend::demo(now());
        backend.set_failure(Some(FailureMode::Unavailable));
        assert_eq!(backend.get_projects().unwrap_err().kind(), "BackendError");
        backend.set_failure(Some(FailureMode::Unauthorized));
        assert_eq!(
            backend.get_project("1").unwrap_err().kind(),
            "AuthenticationError"
        );
        backend.set_failure(None);
        assert!(backend.require_project("1").is_ok());
        assert_eq!(backend.require_project("2").unwrap_err().kind(), "NotFoundError");
    }
}
