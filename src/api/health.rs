//! Health check and statistics endpoints.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::server::AppState;
use crate::webhook::DeliveryStatsSnapshot;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub templates: TemplateHealthResponse,
}

#[derive(Debug, Serialize)]
pub struct TemplateHealthResponse {
    pub total: usize,
    pub deleted: usize,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub templates: TemplateStats,
    pub deliveries: DeliveryStatsSnapshot,
}

#[derive(Debug, Serialize)]
pub struct TemplateStats {
    pub total: usize,
    pub deleted: usize,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime_seconds = state.start_time.elapsed().as_secs();

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds,
        templates: TemplateHealthResponse {
            total: state.template_store.count(),
            deleted: state.template_store.count_deleted(),
        },
    })
}

pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        templates: TemplateStats {
            total: state.template_store.count(),
            deleted: state.template_store.count_deleted(),
        },
        deliveries: state.dispatcher.stats(),
    })
}
