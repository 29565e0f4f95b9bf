//! Report generator facade.

use chrono::{DateTime, NaiveDate, Utc};
use opm_common::{Project, Report, WorkItem};
use tracing::debug;

use crate::analysis::{health, monthly, risk, weekly, workload};
use crate::config::EngineConfig;
use crate::error::Result;

/// Builds every report type from a project and its work items.
///
/// Holds only configuration; each call builds its own [`Report`], so one
/// engine can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct ReportEngine {
    config: EngineConfig,
}

impl ReportEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Items updated between `start` and `end` (inclusive), grouped by status.
    pub fn weekly(
        &self,
        project: &Project,
        items: &[WorkItem],
        start: NaiveDate,
        end: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Report> {
        debug!(project_id = %project.id, %start, %end, items = items.len(), "building weekly report");
        weekly::generate(project, items, start, end, now, &self.config)
    }

    pub fn monthly(
        &self,
        project: &Project,
        items: &[WorkItem],
        year: i32,
        month: u32,
        now: DateTime<Utc>,
    ) -> Result<Report> {
        debug!(project_id = %project.id, year, month, items = items.len(), "building monthly report");
        monthly::generate(project, items, year, month, now)
    }

    pub fn risk(&self, project: &Project, items: &[WorkItem], now: DateTime<Utc>) -> Report {
        debug!(project_id = %project.id, items = items.len(), "assessing risks");
        risk::generate(project, items, now, &self.config)
    }

    pub fn workload(&self, project: &Project, items: &[WorkItem], now: DateTime<Utc>) -> Report {
        debug!(project_id = %project.id, items = items.len(), "analyzing workload");
        workload::generate(project, items, now, &self.config)
    }

    pub fn health(&self, project: &Project, items: &[WorkItem], now: DateTime<Utc>) -> Report {
        debug!(project_id = %project.id, items = items.len(), "checking health");
        health::generate(project, items, now, &self.config)
    }

    pub fn assess_risks(&self, items: &[WorkItem], now: DateTime<Utc>) -> risk::RiskAssessment {
        risk::assess(items, now, &self.config)
    }

    pub fn analyze_workload(&self, items: &[WorkItem], now: DateTime<Utc>) -> workload::WorkloadAnalysis {
        workload::analyze(items, now, &self.config)
    }

    pub fn health_metrics(&self, items: &[WorkItem], now: DateTime<Utc>) -> Option<health::HealthMetrics> {
        health::compute(items, now, &self.config)
    }
}
