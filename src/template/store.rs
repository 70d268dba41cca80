//! Template storage with CRUD, soft delete, and rendering

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;

use super::engine::{extract_variables, render_template};
use super::types::{
    RenderedMessage, Template, TemplateError, TemplateResult, UpdateTemplateRequest,
};

/// In-memory template storage with soft-delete semantics.
///
/// Deleting marks `deleted_at` instead of removing the row, so the id stays
/// reserved and the template can be restored.
pub struct TemplateStore {
    templates: DashMap<String, Template>,
}

impl Default for TemplateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateStore {
    /// Create a new template store
    pub fn new() -> Self {
        Self {
            templates: DashMap::new(),
        }
    }

    /// Create a new template
    pub fn create(&self, template: Template) -> TemplateResult<Template> {
        template.validate()?;

        // Soft-deleted rows keep their id reserved
        if self.templates.contains_key(&template.id) {
            return Err(TemplateError::AlreadyExists(template.id));
        }

        let id = template.id.clone();
        self.templates.insert(id, template.clone());

        Ok(template)
    }

    /// Get a live template by ID
    pub fn get(&self, id: &str) -> TemplateResult<Template> {
        self.templates
            .get(id)
            .filter(|t| !t.is_deleted())
            .map(|t| t.clone())
            .ok_or_else(|| TemplateError::NotFound(id.to_string()))
    }

    /// List all live templates
    pub fn list(&self) -> Vec<Template> {
        self.templates
            .iter()
            .filter(|entry| !entry.value().is_deleted())
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Update an existing template
    pub fn update(&self, id: &str, updates: UpdateTemplateRequest) -> TemplateResult<Template> {
        let mut template = self.get(id)?;

        if let Some(name) = updates.name {
            template.name = name;
        }

        if let Some(content) = updates.content {
            if content != template.content {
                template.variables = extract_variables(&content);
                template.content = content;
            }
        }

        if let Some(description) = updates.description {
            template.description = description;
        }

        template.updated_at = Utc::now();
        template.validate()?;

        self.templates.insert(id.to_string(), template.clone());

        Ok(template)
    }

    /// Soft-delete a template by ID
    pub fn delete(&self, id: &str) -> TemplateResult<()> {
        let mut entry = self
            .templates
            .get_mut(id)
            .ok_or_else(|| TemplateError::NotFound(id.to_string()))?;

        if entry.is_deleted() {
            return Err(TemplateError::NotFound(id.to_string()));
        }

        entry.deleted_at = Some(Utc::now());
        Ok(())
    }

    /// Restore a soft-deleted template
    pub fn restore(&self, id: &str) -> TemplateResult<Template> {
        let mut entry = self
            .templates
            .get_mut(id)
            .ok_or_else(|| TemplateError::NotFound(id.to_string()))?;

        if !entry.is_deleted() {
            return Err(TemplateError::NotDeleted(id.to_string()));
        }

        entry.deleted_at = None;
        entry.updated_at = Utc::now();
        Ok(entry.clone())
    }

    /// Check if a live template exists
    pub fn exists(&self, id: &str) -> bool {
        self.templates
            .get(id)
            .map(|t| !t.is_deleted())
            .unwrap_or(false)
    }

    /// Number of live templates
    pub fn count(&self) -> usize {
        self.templates
            .iter()
            .filter(|entry| !entry.value().is_deleted())
            .count()
    }

    /// Number of soft-deleted templates
    pub fn count_deleted(&self) -> usize {
        self.templates
            .iter()
            .filter(|entry| entry.value().is_deleted())
            .count()
    }

    /// Render a live template with a substitution map
    pub fn render(
        &self,
        id: &str,
        variables: &serde_json::Map<String, serde_json::Value>,
    ) -> TemplateResult<RenderedMessage> {
        let template = self.get(id)?;

        Ok(RenderedMessage {
            template_id: template.id,
            content: render_template(&template.content, variables),
            variables: template.variables,
        })
    }
}

/// Create an Arc-wrapped template store
pub fn create_template_store() -> Arc<TemplateStore> {
    Arc::new(TemplateStore::new())
}
