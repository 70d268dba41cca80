//! Template types and error definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::engine::extract_variables;

/// Template-specific error type
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Template already exists: {0}")]
    AlreadyExists(String),

    #[error("Template is not deleted: {0}")]
    NotDeleted(String),

    #[error("Invalid template ID: {0}")]
    InvalidId(String),

    #[error("Invalid template: {0}")]
    InvalidTemplate(String),
}

/// Result type for template operations
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Maximum accepted template content length in characters
const MAX_CONTENT_LEN: usize = 65_536;

/// A message template definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    /// Unique template identifier (alphanumeric, dash, underscore)
    pub id: String,

    /// Human-readable template name
    pub name: String,

    /// Message text with {{variable}} placeholders
    pub content: String,

    /// Placeholder identifiers in first-occurrence order, derived from content
    #[serde(default)]
    pub variables: Vec<String>,

    /// Template description (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Creation timestamp
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,

    /// Soft-delete marker; a deleted template is invisible to reads
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Template {
    /// Validate the template
    pub fn validate(&self) -> TemplateResult<()> {
        // Validate ID
        if self.id.is_empty() || self.id.len() > 64 {
            return Err(TemplateError::InvalidId(
                "ID must be 1-64 characters".to_string(),
            ));
        }

        if !self
            .id
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
        {
            return Err(TemplateError::InvalidId(
                "ID must contain only alphanumeric, dash, or underscore".to_string(),
            ));
        }

        // Validate name
        if self.name.is_empty() || self.name.len() > 256 {
            return Err(TemplateError::InvalidTemplate(
                "Name must be 1-256 characters".to_string(),
            ));
        }

        // Validate content
        if self.content.is_empty() {
            return Err(TemplateError::InvalidTemplate(
                "Content must not be empty".to_string(),
            ));
        }

        if self.content.chars().count() > MAX_CONTENT_LEN {
            return Err(TemplateError::InvalidTemplate(
                "Content exceeds maximum length".to_string(),
            ));
        }

        Ok(())
    }

    /// Whether the template has been soft-deleted
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Request to create a new template
#[derive(Debug, Deserialize)]
pub struct CreateTemplateRequest {
    /// Unique template identifier
    pub id: String,

    /// Human-readable template name
    pub name: String,

    /// Message text with {{variable}} placeholders
    pub content: String,

    /// Template description (optional)
    pub description: Option<String>,
}

impl From<CreateTemplateRequest> for Template {
    fn from(req: CreateTemplateRequest) -> Self {
        let now = Utc::now();
        let variables = extract_variables(&req.content);
        Template {
            id: req.id,
            name: req.name,
            content: req.content,
            variables,
            description: req.description,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

/// Request to update an existing template
#[derive(Debug, Deserialize)]
pub struct UpdateTemplateRequest {
    /// Human-readable template name (optional)
    pub name: Option<String>,

    /// Message text (optional; changing it recomputes the variable list)
    pub content: Option<String>,

    /// Template description (optional, use null to clear)
    pub description: Option<Option<String>>,
}

/// Response for listing templates
#[derive(Debug, Serialize)]
pub struct TemplateListResponse {
    /// List of live templates
    pub templates: Vec<Template>,

    /// Total count
    pub total: usize,
}

/// A rendered template ready for delivery
#[derive(Debug, Clone, Serialize)]
pub struct RenderedMessage {
    /// Source template identifier
    pub template_id: String,

    /// Rendered message text
    pub content: String,

    /// Variable list of the source template
    pub variables: Vec<String>,
}
