//! Variant annotation endpoints

use axum::{extract::State, http::StatusCode, response::Json};

use crate::annotator::ItemOutcome;
use crate::model::VariantAnnotation;
use crate::service::{
    server::AppState,
    types::{
        AnnotateRequest, AnnotationResult, BatchAnnotateRequest, BatchAnnotateResponse,
        ErrorResponse, ServiceError,
    },
    validation::{validate_batch, validate_variant},
};

type HandlerError = (StatusCode, Json<ErrorResponse>);

fn reject(error: ServiceError) -> HandlerError {
    let status =
        StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(error.to_response()))
}

/// Annotate a single variant
pub async fn annotate_single(
    State(state): State<AppState>,
    Json(request): Json<AnnotateRequest>,
) -> Result<Json<VariantAnnotation>, HandlerError> {
    if let Err(msg) = validate_variant(&request.variant) {
        return Err(reject(ServiceError::BadRequest(msg)));
    }

    state
        .annotator
        .annotate(
            &request.variant,
            request.isoform_override_source.as_deref(),
            &request.fields,
        )
        .await
        .map(Json)
        .map_err(|e| reject(e.into()))
}

/// Annotate a batch of variants, preserving input order
///
/// Per-element failures are embedded in the response; only a failing
/// upstream batch fetch fails the whole request.
pub async fn annotate_batch(
    State(state): State<AppState>,
    Json(request): Json<BatchAnnotateRequest>,
) -> Result<Json<BatchAnnotateResponse>, HandlerError> {
    if let Err(msg) = validate_batch(&request.variants, state.config.server.max_batch_size) {
        return Err(reject(ServiceError::BadRequest(msg)));
    }

    let outcomes = state
        .annotator
        .annotate_batch(
            &request.variants,
            request.isoform_override_source.as_deref(),
            &request.fields,
        )
        .await
        .map_err(|e| reject(e.into()))?;

    let results: Vec<AnnotationResult> = outcomes
        .into_iter()
        .map(|outcome| match outcome {
            ItemOutcome::Ok(annotation) => AnnotationResult {
                variant: annotation.variant.clone(),
                annotation: Some(annotation),
                error: None,
            },
            ItemOutcome::Err { input, error } => AnnotationResult {
                variant: input,
                annotation: None,
                error: Some(error.to_string()),
            },
        })
        .collect();

    let success = results.iter().filter(|r| r.annotation.is_some()).count();
    Ok(Json(BatchAnnotateResponse {
        total: results.len(),
        success,
        failed: results.len() - success,
        results,
    }))
}
