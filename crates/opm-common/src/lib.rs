//! OpenProject MCP common types and errors.
//!
//! This crate provides the foundational types shared by every other crate:
//! - Domain value objects (projects, work items, users, reports)
//! - Status and priority normalization for free-text backend labels
//! - The error taxonomy with stable JSON-RPC wire codes
//! - The Markdown formatter for reports

pub mod error;
pub mod markdown;
pub mod model;
pub mod status;

pub use error::{Error, ErrorCategory, Result};
pub use model::{
    NewWorkItem, Project, Report, ReportSection, User, WorkItem, WorkItemPatch,
    SECTION_ORDER_LAST,
};
pub use status::{PriorityClass, StatusClass};
