//! Report templates: documents, storage, variables and rendering.

pub mod defaults;
pub mod model;
pub mod render;
pub mod store;
pub mod variables;

pub use model::{DataSource, ReportTemplate, TemplateInfo, TemplateSection, TemplateSummary};
pub use render::{
    condition_predicate, default_variables, render_template, render_template_with, substitute,
    Variables,
};
pub use store::{validate_template_id, FileTemplateStore};
pub use variables::{build_template_variables, weighted_completion};
