//! Work-item backend contract and its implementations.
//!
//! The router and capability managers only ever talk to a
//! [`WorkItemBackend`]. Two implementations ship with the crate:
//!
//! - [`OpenProjectClient`]: blocking HTTP client for the OpenProject API v3
//! - [`InMemoryBackend`]: fixture store for tests and `opm serve --demo`

pub mod hal;
pub mod memory;
pub mod openproject;

pub use memory::{FailureMode, InMemoryBackend};
pub use openproject::OpenProjectClient;

use opm_common::{Error, NewWorkItem, Project, Result, User, WorkItem, WorkItemPatch};

/// Source of projects, work items and users.
///
/// Lookups by id return `Ok(None)` for a missing entity. Rejected
/// credentials surface as [`Error::Authentication`], unreachable or slow
/// backends as [`Error::Backend`].
pub trait WorkItemBackend: Send + Sync {
    /// Base URL of the backend, reported by the info resource.
    fn base_url(&self) -> &str;

    fn get_projects(&self) -> Result<Vec<Project>>;

    fn get_project(&self, id: &str) -> Result<Option<Project>>;

    /// All work items, or only those of one project.
    fn get_work_items(&self, project_id: Option<&str>) -> Result<Vec<WorkItem>>;

    fn get_work_item(&self, id: &str) -> Result<Option<WorkItem>>;

    fn create_work_item(&self, item: &NewWorkItem) -> Result<WorkItem>;

    fn update_work_item(&self, id: &str, patch: &WorkItemPatch) -> Result<WorkItem>;

    fn get_users(&self) -> Result<Vec<User>>;

    /// Project by id, or a NotFound error.
    fn require_project(&self, id: &str) -> Result<Project> {
        self.get_project(id)?
            .ok_or_else(|| Error::not_found("project", id))
    }

    /// Work item by id, or a NotFound error.
    fn require_work_item(&self, id: &str) -> Result<WorkItem> {
        self.get_work_item(id)?
            .ok_or_else(|| Error::not_found("work package", id))
    }
}
