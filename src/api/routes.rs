use axum::{
    routing::{get, post},
    Router,
};

use crate::server::AppState;

use super::health::{health, stats};
use super::template::{
    create_template, delete_template, get_template, list_templates, render_template,
    restore_template, send_template, update_template,
};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health & Stats
        .route("/health", get(health))
        .route("/stats", get(stats))
        // Template endpoints
        .nest(
            "/api/v1",
            Router::new()
                .route("/templates", post(create_template).get(list_templates))
                .route(
                    "/templates/{id}",
                    get(get_template)
                        .put(update_template)
                        .delete(delete_template),
                )
                .route("/templates/{id}/restore", post(restore_template))
                .route("/templates/{id}/render", post(render_template))
                .route("/templates/{id}/send", post(send_template)),
        )
}
