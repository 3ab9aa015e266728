//! Web server setup using the Axum framework

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};

use crate::annotator::Annotator;
use crate::canonical::StaticOverrideTable;
use crate::enrich::{EnrichmentSource, HotspotSource, MutationImpactSource, VariantInfoSource};
use crate::provider::HttpAnnotationProvider;
use crate::service::{
    config::{ServiceConfig, SourceConfig},
    handlers,
    types::{ErrorResponse, ServiceError},
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Annotation pipeline
    pub annotator: Arc<Annotator>,
    /// Service configuration
    pub config: Arc<ServiceConfig>,
    /// Names of the loaded override sources, for the info endpoint
    pub override_sources: Vec<String>,
    /// Names of the enabled enrichment sources, for the info endpoint
    pub enrichment_sources: Vec<String>,
}

/// Create the Axum application with all routes and middleware
pub fn create_app(config: ServiceConfig) -> Result<(Router, AppState), ServiceError> {
    let provider = Arc::new(
        HttpAnnotationProvider::new(
            &config.provider.base_url,
            Duration::from_secs(config.provider.timeout_seconds),
        )
        .map_err(|e| ServiceError::ConfigError(e.to_string()))?,
    );

    // Load the isoform override table if one is configured
    let overrides = if let Some(path) = &config.overrides.path {
        if path.exists() {
            tracing::info!("Loading isoform overrides from {}", path.display());
            match StaticOverrideTable::from_json_file(path) {
                Ok(table) => table,
                Err(e) => {
                    tracing::warn!(
                        "Failed to load isoform overrides: {}. Override resolution will be unavailable.",
                        e
                    );
                    StaticOverrideTable::new()
                }
            }
        } else {
            tracing::warn!(
                "Isoform override path {} does not exist. Override resolution will be unavailable.",
                path.display()
            );
            StaticOverrideTable::new()
        }
    } else {
        tracing::debug!("No isoform override table configured.");
        StaticOverrideTable::new()
    };
    let override_sources = {
        use crate::canonical::IsoformOverrideSource;
        overrides.sources()
    };

    let mut annotator = Annotator::with_cache_capacity(
        provider,
        Arc::new(overrides),
        config.provider.cache_capacity,
    );

    // Register the enabled enrichment sources
    let mut enrichment_sources = Vec::new();
    for source in build_enrichment_sources(&config)? {
        enrichment_sources.push(source.name().to_string());
        annotator = annotator.with_source(source);
    }
    if enrichment_sources.is_empty() {
        tracing::debug!("No enrichment sources enabled.");
    } else {
        tracing::info!("Enrichment sources enabled: {}", enrichment_sources.join(", "));
    }

    let state = AppState {
        annotator: Arc::new(annotator),
        config: Arc::new(config.clone()),
        override_sources,
        enrichment_sources,
    };

    let max_size = parse_size(&config.server.max_request_size)
        .map_err(|e| ServiceError::ConfigError(format!("Invalid max_request_size: {}", e)))?;

    let app = Router::new()
        // Health and metadata endpoints
        .route("/health", get(handlers::health::health_check))
        .route("/api/v1/health", get(handlers::health::health_check))
        .route("/api/v1/info", get(handlers::health::service_info))
        // Annotation endpoints
        .route("/api/v1/annotate", post(handlers::annotate::annotate_single))
        .route(
            "/api/v1/annotate/batch",
            post(handlers::annotate::annotate_batch),
        )
        // Handle 404s
        .fallback(handle_404)
        .with_state(state.clone())
        .layer(DefaultBodyLimit::max(max_size));

    Ok((app, state))
}

/// Build the enrichment source clients enabled in the configuration
fn build_enrichment_sources(
    config: &ServiceConfig,
) -> Result<Vec<Arc<dyn EnrichmentSource>>, ServiceError> {
    fn enabled(source: &Option<SourceConfig>) -> Option<&SourceConfig> {
        source.as_ref().filter(|s| s.enabled)
    }

    let mut sources: Vec<Arc<dyn EnrichmentSource>> = Vec::new();

    if let Some(source) = enabled(&config.enrichment.mutation_impact) {
        let client =
            MutationImpactSource::new(&source.base_url, Duration::from_secs(source.timeout_seconds))
                .map_err(|e| ServiceError::ConfigError(e.to_string()))?;
        sources.push(Arc::new(client));
    }
    if let Some(source) = enabled(&config.enrichment.variant_info) {
        let client =
            VariantInfoSource::new(&source.base_url, Duration::from_secs(source.timeout_seconds))
                .map_err(|e| ServiceError::ConfigError(e.to_string()))?;
        sources.push(Arc::new(client));
    }
    if let Some(source) = enabled(&config.enrichment.hotspots) {
        let client =
            HotspotSource::new(&source.base_url, Duration::from_secs(source.timeout_seconds))
                .map_err(|e| ServiceError::ConfigError(e.to_string()))?;
        sources.push(Arc::new(client));
    }

    Ok(sources)
}

/// Handle 404 errors
async fn handle_404() -> (StatusCode, Json<ErrorResponse>) {
    let error = ServiceError::NotFound("Endpoint not found".to_string());
    (StatusCode::NOT_FOUND, Json(error.to_response()))
}

/// Parse size strings like "2MB", "1GB", etc.
fn parse_size(size_str: &str) -> Result<usize, String> {
    let size_str = size_str.to_uppercase();

    // Check longer suffixes first to avoid partial matches
    if let Some(num_str) = size_str.strip_suffix("GB") {
        let num: usize = num_str
            .parse()
            .map_err(|_| format!("Invalid size format: {}", size_str))?;
        return Ok(num * 1024 * 1024 * 1024);
    }

    if let Some(num_str) = size_str.strip_suffix("MB") {
        let num: usize = num_str
            .parse()
            .map_err(|_| format!("Invalid size format: {}", size_str))?;
        return Ok(num * 1024 * 1024);
    }

    if let Some(num_str) = size_str.strip_suffix("KB") {
        let num: usize = num_str
            .parse()
            .map_err(|_| format!("Invalid size format: {}", size_str))?;
        return Ok(num * 1024);
    }

    if let Some(num_str) = size_str.strip_suffix("B") {
        return num_str
            .parse::<usize>()
            .map_err(|_| format!("Invalid size format: {}", size_str));
    }

    size_str
        .parse::<usize>()
        .map_err(|_| format!("Invalid size format: {}", size_str))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("100").unwrap(), 100);
        assert_eq!(parse_size("100B").unwrap(), 100);
        assert_eq!(parse_size("1KB").unwrap(), 1024);
        assert_eq!(parse_size("2MB").unwrap(), 2 * 1024 * 1024);
        assert_eq!(parse_size("1GB").unwrap(), 1024 * 1024 * 1024);
        assert_eq!(parse_size("2mb").unwrap(), 2 * 1024 * 1024);

        assert!(parse_size("invalid").is_err());
        assert!(parse_size("10XB").is_err());
    }

    #[test]
    fn test_create_app_with_defaults() {
        let (_, state) = create_app(ServiceConfig::default()).unwrap();
        assert!(state.enrichment_sources.is_empty());
        assert!(state.override_sources.is_empty());
    }

    #[test]
    fn test_create_app_rejects_bad_request_size() {
        let mut config = ServiceConfig::default();
        config.server.max_request_size = "lots".to_string();
        assert!(create_app(config).is_err());
    }

    #[test]
    fn test_create_app_with_enrichment_sources() {
        let mut config = ServiceConfig::sample();
        if let Some(source) = config.enrichment.mutation_impact.as_mut() {
            source.enabled = true;
        }
        // sample override path does not exist; the app degrades gracefully
        let (_, state) = create_app(config).unwrap();
        assert_eq!(state.enrichment_sources, vec!["mutation_impact"]);
    }
}
