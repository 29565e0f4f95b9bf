//! Report engine and template rendering for OpenProject MCP.
//!
//! Turns a project and its work items into [`Report`]s and renders
//! user-defined report templates.
//!
//! # Reports
//!
//! - Weekly: items updated in a date window, grouped by status
//! - Monthly: created/completed/updated counts and distributions for a calendar month
//! - Risk: per-item risk factors and levels
//! - Workload: per-assignee load and rebalancing suggestions
//! - Health: a 0-100 composite score with issues and recommendations
//!
//! Every generator takes the reference instant as an argument and keeps no
//! state between calls.
//!
//! # Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use opm_common::{Project, WorkItem};
//! use opm_report::{EngineConfig, ReportEngine};
//!
//! let project = Project::new("1", "Demo", "demo");
//! let items = vec![WorkItem::new("10", "Write docs").with_status("Closed")];
//! let now = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
//!
//! let engine = ReportEngine::new(EngineConfig::default());
//! let report = engine.health(&project, &items, now);
//! assert_eq!(report.statistics["completion_rate"], 100.0);
//! ```
//!
//! [`Report`]: opm_common::Report

pub mod analysis;
pub mod config;
pub mod engine;
pub mod error;
pub mod template;

pub use analysis::health::{HealthLevel, HealthMetrics};
pub use analysis::risk::{RiskAssessment, RiskFactor, RiskItem, RiskLevel};
pub use analysis::workload::{LoadClass, MemberWorkload, WorkloadAnalysis};
pub use config::{Band, EngineConfig, HealthBands};
pub use engine::ReportEngine;
pub use error::{ReportError, Result};
pub use template::{
    build_template_variables, condition_predicate, render_template, render_template_with,
    FileTemplateStore, ReportTemplate, TemplateInfo, TemplateSection, TemplateSummary, Variables,
};
