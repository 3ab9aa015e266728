//! Request and response types for the annotation web service

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cache::CacheStats;
use crate::error::AnnotateError;
use crate::model::VariantAnnotation;

/// Request for single variant annotation
#[derive(Debug, Clone, Deserialize)]
pub struct AnnotateRequest {
    /// Raw variant descriptor, e.g. `7:g.140453136A>T`
    pub variant: String,
    /// Isoform override ranking source, e.g. `mskcc`
    #[serde(default)]
    pub isoform_override_source: Option<String>,
    /// Enrichment fields to attach; unknown names are ignored
    #[serde(default)]
    pub fields: Vec<String>,
}

/// Request for batch variant annotation
#[derive(Debug, Clone, Deserialize)]
pub struct BatchAnnotateRequest {
    /// Raw variant descriptors, annotated in order
    pub variants: Vec<String>,
    #[serde(default)]
    pub isoform_override_source: Option<String>,
    #[serde(default)]
    pub fields: Vec<String>,
}

/// One element of a batch annotation response
#[derive(Debug, Clone, Serialize)]
pub struct AnnotationResult {
    /// The normalized descriptor this element answers
    pub variant: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation: Option<VariantAnnotation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Batch annotation response with per-element outcomes
#[derive(Debug, Clone, Serialize)]
pub struct BatchAnnotateResponse {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub results: Vec<AnnotationResult>,
}

/// Health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub cache: CacheStatsResponse,
}

/// Service metadata response
#[derive(Debug, Clone, Serialize)]
pub struct InfoResponse {
    pub name: String,
    pub version: String,
    pub enrichment_sources: Vec<String>,
    pub override_sources: Vec<String>,
}

/// Cache statistics as reported by the health endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsResponse {
    pub hits: u64,
    pub misses: u64,
    pub collapsed: u64,
    pub size: usize,
    pub capacity: usize,
    pub evictions: u64,
}

impl From<CacheStats> for CacheStatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
            collapsed: stats.collapsed,
            size: stats.size,
            capacity: stats.capacity,
            evictions: stats.evictions,
        }
    }
}

/// Error payload returned to clients
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub category: String,
}

/// Service-level errors with HTTP status mapping
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ServiceError {
    /// HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::BadRequest(_) => 400,
            ServiceError::NotFound(_) => 404,
            ServiceError::UpstreamUnavailable(_) => 503,
            ServiceError::ConfigError(_) => 500,
            ServiceError::InternalError(_) => 500,
        }
    }

    /// Convert to a response payload
    pub fn to_response(&self) -> ErrorResponse {
        let category = match self {
            ServiceError::BadRequest(_) => "bad_request",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::UpstreamUnavailable(_) => "upstream_unavailable",
            ServiceError::ConfigError(_) => "config_error",
            ServiceError::InternalError(_) => "internal_error",
        };
        ErrorResponse {
            error: self.to_string(),
            category: category.to_string(),
        }
    }
}

impl From<AnnotateError> for ServiceError {
    fn from(err: AnnotateError) -> Self {
        match err {
            AnnotateError::VariantNotFound { .. } | AnnotateError::OverrideSourceNotFound { .. } => {
                ServiceError::NotFound(err.to_string())
            }
            AnnotateError::Upstream { .. } => ServiceError::UpstreamUnavailable(err.to_string()),
            AnnotateError::Io { .. } | AnnotateError::Json { .. } => {
                ServiceError::InternalError(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ServiceError::BadRequest("x".into()).status_code(), 400);
        assert_eq!(ServiceError::NotFound("x".into()).status_code(), 404);
        assert_eq!(
            ServiceError::UpstreamUnavailable("x".into()).status_code(),
            503
        );
        assert_eq!(ServiceError::ConfigError("x".into()).status_code(), 500);
    }

    #[test]
    fn test_annotate_error_mapping() {
        let err: ServiceError = AnnotateError::VariantNotFound {
            variant: "7:g.1A>T".to_string(),
        }
        .into();
        assert_eq!(err.status_code(), 404);

        let err: ServiceError = AnnotateError::upstream("vep", "down").into();
        assert_eq!(err.status_code(), 503);
    }

    #[test]
    fn test_error_response_payload() {
        let response = ServiceError::NotFound("no such variant".into()).to_response();
        assert_eq!(response.category, "not_found");
        assert!(response.error.contains("no such variant"));
    }

    #[test]
    fn test_request_defaults() {
        let request: AnnotateRequest =
            serde_json::from_str(r#"{"variant": "7:g.140453136A>T"}"#).unwrap();
        assert!(request.isoform_override_source.is_none());
        assert!(request.fields.is_empty());
    }
}
