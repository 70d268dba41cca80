//! Message template system.
//!
//! This module provides:
//! - Template definition with variable placeholders ({{variable}})
//! - Variable extraction in first-occurrence order
//! - In-memory template storage with CRUD and soft delete
//! - Substitution engine for rendering templates
//!
//! # Example
//!
//! ```ignore
//! let store = TemplateStore::new();
//!
//! let request = CreateTemplateRequest {
//!     id: "order-shipped".to_string(),
//!     name: "Order Shipped".to_string(),
//!     content: "Pedido {{pedido}} enviado via {{transportadora}}".to_string(),
//!     description: None,
//! };
//!
//! let template = store.create(request.into())?;
//! assert_eq!(template.variables, vec!["pedido", "transportadora"]);
//!
//! let variables = json!({
//!     "pedido": "ORD-123",
//!     "transportadora": "Jadlog"
//! });
//!
//! let rendered = store.render("order-shipped", variables.as_object().unwrap())?;
//! ```

mod engine;
mod store;
mod types;

pub use engine::{extract_variables, render_template};
pub use store::{create_template_store, TemplateStore};
pub use types::{
    CreateTemplateRequest, RenderedMessage, Template, TemplateError, TemplateListResponse,
    TemplateResult, UpdateTemplateRequest,
};
