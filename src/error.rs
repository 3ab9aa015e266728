//! Error types for ferro-annotate
//!
//! The taxonomy separates "the variant simply is not known" from "an
//! upstream service misbehaved" so callers can decide whether a retry
//! makes sense: annotation fetches are side-effect-free reads, so
//! upstream failures are always safe to retry.

/// Main error type for ferro-annotate operations
///
/// `Display`/`Error` are implemented by hand rather than via
/// `thiserror`'s derive because `OverrideSourceNotFound` carries a
/// data field literally named `source`, which the derive would
/// unconditionally treat as the error's `std::error::Error` source
/// (requiring the field type to implement `Error`). The hand-written
/// impls reproduce the same `Display` strings and leave `source()` as
/// `None` for every variant, exactly as the derive would have.
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotateError {
    /// The primary provider has no annotation for this variant
    VariantNotFound { variant: String },

    /// The requested isoform override source is not loaded
    OverrideSourceNotFound { source: String },

    /// An upstream annotation or enrichment service failed
    Upstream { service: String, msg: String },

    /// IO error (for override table loading)
    Io { msg: String },

    /// JSON parsing error
    Json { msg: String },
}

impl std::fmt::Display for AnnotateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnnotateError::VariantNotFound { variant } => {
                write!(f, "Variant not found: {variant}")
            }
            AnnotateError::OverrideSourceNotFound { source } => {
                write!(f, "Isoform override source not found: {source}")
            }
            AnnotateError::Upstream { service, msg } => {
                write!(f, "Upstream service error ({service}): {msg}")
            }
            AnnotateError::Io { msg } => write!(f, "IO error: {msg}"),
            AnnotateError::Json { msg } => write!(f, "JSON error: {msg}"),
        }
    }
}

impl std::error::Error for AnnotateError {}

impl AnnotateError {
    /// Create an upstream error for a named service
    pub fn upstream(service: impl Into<String>, msg: impl Into<String>) -> Self {
        AnnotateError::Upstream {
            service: service.into(),
            msg: msg.into(),
        }
    }

    /// Whether a retry against upstream could succeed
    ///
    /// Not-found results are authoritative answers and are not retried;
    /// transport-level failures are.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AnnotateError::Upstream { .. } | AnnotateError::Io { .. }
        )
    }
}

impl From<std::io::Error> for AnnotateError {
    fn from(err: std::io::Error) -> Self {
        AnnotateError::Io {
            msg: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for AnnotateError {
    fn from(err: serde_json::Error) -> Self {
        AnnotateError::Json {
            msg: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = AnnotateError::VariantNotFound {
            variant: "X:g.100A>T".to_string(),
        };
        assert!(err.to_string().contains("X:g.100A>T"));

        let err = AnnotateError::upstream("vep", "connection refused");
        assert!(err.to_string().contains("vep"));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_is_retryable() {
        assert!(AnnotateError::upstream("vep", "timeout").is_retryable());
        assert!(!AnnotateError::VariantNotFound {
            variant: "7:g.1A>T".to_string()
        }
        .is_retryable());
        assert!(!AnnotateError::OverrideSourceNotFound {
            source: "mskcc".to_string()
        }
        .is_retryable());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: AnnotateError = io_err.into();
        assert!(matches!(err, AnnotateError::Io { .. }));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_equality() {
        let a = AnnotateError::upstream("vep", "boom");
        let b = AnnotateError::upstream("vep", "boom");
        assert_eq!(a, b);
        let c = AnnotateError::upstream("vep", "other");
        assert_ne!(a, c);
    }
}
