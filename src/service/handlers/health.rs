//! Health and metadata endpoints

use axum::{extract::State, response::Json};

use crate::service::{
    server::AppState,
    types::{HealthResponse, InfoResponse},
};

/// Check overall service health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        cache: state.annotator.cache_stats().into(),
    })
}

/// Service metadata: version plus the configured data sources
pub async fn service_info(State(state): State<AppState>) -> Json<InfoResponse> {
    Json(InfoResponse {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        enrichment_sources: state.enrichment_sources.clone(),
        override_sources: state.override_sources.clone(),
    })
}
