//! API layer - HTTP endpoint handlers organized by domain.

mod health;
mod routes;
mod template;

// Re-export all handlers for use in server/app.rs
pub use health::{health, stats};
pub use routes::api_routes;
pub use template::{
    create_template, delete_template, get_template, list_templates, render_template,
    restore_template, send_template, update_template,
};
pub use template::{TemplateErrorInfo, TemplateErrorResponse};
