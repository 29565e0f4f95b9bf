//! Services shared by the router and the capability managers.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};

use opm_common::{Project, Result, WorkItem};
use opm_config::ServerConfig;
use opm_redact::Redactor;
use opm_report::{FileTemplateStore, ReportEngine};

use crate::backend::WorkItemBackend;

/// Everything a request handler needs, built once at start-up.
pub struct ServerContext {
    pub backend: Arc<dyn WorkItemBackend>,
    pub engine: ReportEngine,
    pub templates: FileTemplateStore,
    pub config: ServerConfig,
    pub redactor: Redactor,
    fixed_now: Option<DateTime<Utc>>,
}

impl ServerContext {
    pub fn new(
        backend: Arc<dyn WorkItemBackend>,
        engine: ReportEngine,
        templates: FileTemplateStore,
        config: ServerConfig,
    ) -> Self {
        Self {
            backend,
            engine,
            templates,
            config,
            redactor: Redactor::default(),
            fixed_now: None,
        }
    }

    /// Pin the clock, for reproducible reports.
    pub fn with_fixed_time(mut self, now: DateTime<Utc>) -> Self {
        self.fixed_now = Some(now);
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.fixed_now.unwrap_or_else(Utc::now)
    }

    pub fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    pub fn debug(&self) -> bool {
        self.config.debug
    }

    /// A project and all of its work items; NotFound when the project is missing.
    pub fn project_with_items(&self, project_id: &str) -> Result<(Project, Vec<WorkItem>)> {
        let project = self.backend.require_project(project_id)?;
        let items = self.backend.get_work_items(Some(&project.id))?;
        Ok((project, items))
    }
}

impl std::fmt::Debug for ServerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerContext")
            .field("backend", &self.backend.base_url())
            .field("templates", &self.templates.dir())
            .field("config", &self.config.redacted())
            .finish_non_exhaustive()
    }
}
