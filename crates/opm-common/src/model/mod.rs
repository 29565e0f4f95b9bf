//! Domain value objects.
//!
//! These types carry no behavior beyond validation and derived predicates.
//! Backend adapters build them, the report engine consumes them.

mod project;
mod report;
mod user;
mod work_item;

pub use project::Project;
pub use report::{Report, ReportSection, SECTION_ORDER_LAST};
pub use user::User;
pub use work_item::{clamp_progress, NewWorkItem, WorkItem, WorkItemPatch};
