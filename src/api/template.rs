//! Template CRUD, render, and send endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::server::AppState;
use crate::template::{
    CreateTemplateRequest, RenderedMessage, Template, TemplateError, TemplateListResponse,
    UpdateTemplateRequest,
};
use crate::webhook::DeliveryError;

#[derive(Debug, Serialize)]
pub struct TemplateErrorResponse {
    pub error: TemplateErrorInfo,
}

#[derive(Debug, Serialize)]
pub struct TemplateErrorInfo {
    pub code: String,
    pub message: String,
}

fn error_response(
    status: StatusCode,
    code: &str,
    message: String,
) -> (StatusCode, Json<TemplateErrorResponse>) {
    (
        status,
        Json(TemplateErrorResponse {
            error: TemplateErrorInfo {
                code: code.to_string(),
                message,
            },
        }),
    )
}

impl From<TemplateError> for (StatusCode, Json<TemplateErrorResponse>) {
    fn from(err: TemplateError) -> Self {
        let (status, code) = match &err {
            TemplateError::NotFound(_) => (StatusCode::NOT_FOUND, "TEMPLATE_NOT_FOUND"),
            TemplateError::AlreadyExists(_) => (StatusCode::CONFLICT, "TEMPLATE_EXISTS"),
            TemplateError::NotDeleted(_) => (StatusCode::CONFLICT, "TEMPLATE_NOT_DELETED"),
            TemplateError::InvalidId(_) => (StatusCode::BAD_REQUEST, "INVALID_ID"),
            TemplateError::InvalidTemplate(_) => (StatusCode::BAD_REQUEST, "INVALID_TEMPLATE"),
        };

        error_response(status, code, err.to_string())
    }
}

impl From<DeliveryError> for (StatusCode, Json<TemplateErrorResponse>) {
    fn from(err: DeliveryError) -> Self {
        let (status, code) = match &err {
            DeliveryError::Cancelled => (StatusCode::CONFLICT, "DELIVERY_CANCELLED"),
            DeliveryError::Request(_) | DeliveryError::Status(_) => {
                (StatusCode::BAD_GATEWAY, "DELIVERY_FAILED")
            }
        };

        error_response(status, code, err.to_string())
    }
}

/// Request body for rendering a template
#[derive(Debug, Deserialize)]
pub struct RenderTemplateRequest {
    /// Substitution map; placeholders without a key stay intact
    #[serde(default)]
    pub variables: serde_json::Map<String, serde_json::Value>,
}

/// Request body for rendering and delivering a template
#[derive(Debug, Deserialize)]
pub struct SendTemplateRequest {
    /// Destination webhook URL
    pub url: String,

    /// Substitution map
    #[serde(default)]
    pub variables: serde_json::Map<String, serde_json::Value>,
}

/// Response for a delivered template
#[derive(Debug, Serialize)]
pub struct SendTemplateResponse {
    pub template_id: String,
    pub url: String,
    /// Attempts spent, including the successful one
    pub attempts: u32,
}

/// POST /api/v1/templates - Create a new template
#[tracing::instrument(
    name = "http.create_template",
    skip(state, request),
    fields(template_id = %request.id)
)]
pub async fn create_template(
    State(state): State<AppState>,
    Json(request): Json<CreateTemplateRequest>,
) -> Result<(StatusCode, Json<Template>), (StatusCode, Json<TemplateErrorResponse>)> {
    let template: Template = request.into();

    match state.template_store.create(template) {
        Ok(created) => Ok((StatusCode::CREATED, Json(created))),
        Err(e) => Err(e.into()),
    }
}

/// GET /api/v1/templates - List all live templates
#[tracing::instrument(name = "http.list_templates", skip(state))]
pub async fn list_templates(State(state): State<AppState>) -> Json<TemplateListResponse> {
    let templates = state.template_store.list();
    let total = templates.len();

    Json(TemplateListResponse { templates, total })
}

/// GET /api/v1/templates/{id} - Get a specific template
#[tracing::instrument(name = "http.get_template", skip(state))]
pub async fn get_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Template>, (StatusCode, Json<TemplateErrorResponse>)> {
    match state.template_store.get(&id) {
        Ok(template) => Ok(Json(template)),
        Err(e) => Err(e.into()),
    }
}

/// PUT /api/v1/templates/{id} - Update an existing template
#[tracing::instrument(name = "http.update_template", skip(state, request))]
pub async fn update_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateTemplateRequest>,
) -> Result<Json<Template>, (StatusCode, Json<TemplateErrorResponse>)> {
    match state.template_store.update(&id, request) {
        Ok(updated) => Ok(Json(updated)),
        Err(e) => Err(e.into()),
    }
}

/// DELETE /api/v1/templates/{id} - Soft-delete a template
#[tracing::instrument(name = "http.delete_template", skip(state))]
pub async fn delete_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, Json<TemplateErrorResponse>)> {
    match state.template_store.delete(&id) {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => Err(e.into()),
    }
}

/// POST /api/v1/templates/{id}/restore - Restore a soft-deleted template
#[tracing::instrument(name = "http.restore_template", skip(state))]
pub async fn restore_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Template>, (StatusCode, Json<TemplateErrorResponse>)> {
    match state.template_store.restore(&id) {
        Ok(restored) => Ok(Json(restored)),
        Err(e) => Err(e.into()),
    }
}

/// POST /api/v1/templates/{id}/render - Render a template with variables
#[tracing::instrument(name = "http.render_template", skip(state, request))]
pub async fn render_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<RenderTemplateRequest>,
) -> Result<Json<RenderedMessage>, (StatusCode, Json<TemplateErrorResponse>)> {
    match state.template_store.render(&id, &request.variables) {
        Ok(rendered) => Ok(Json(rendered)),
        Err(e) => Err(e.into()),
    }
}

/// POST /api/v1/templates/{id}/send - Render and deliver to a webhook
#[tracing::instrument(
    name = "http.send_template",
    skip(state, request),
    fields(url = %request.url)
)]
pub async fn send_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SendTemplateRequest>,
) -> Result<Json<SendTemplateResponse>, (StatusCode, Json<TemplateErrorResponse>)> {
    if !request.url.starts_with("http://") && !request.url.starts_with("https://") {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "INVALID_URL",
            "URL must use http or https".to_string(),
        ));
    }

    let rendered = state.template_store.render(&id, &request.variables)?;

    let payload = serde_json::json!({
        "template_id": rendered.template_id,
        "content": rendered.content,
    });

    match state.dispatcher.deliver(&request.url, &payload).await {
        Ok(receipt) => Ok(Json(SendTemplateResponse {
            template_id: id,
            url: request.url,
            attempts: receipt.attempts,
        })),
        Err(e) => Err(e.into()),
    }
}
