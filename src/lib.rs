// Copyright (c) 2024-2025 Fulcrum Genomics LLC
// SPDX-License-Identifier: MIT

//! ferro-annotate: variant annotation resolution and enrichment
//!
//! Part of the ferro bioinformatics toolkit.
//!
//! Resolves genomic variant descriptors into standardized protein-change
//! annotations: canonical transcript selection, variant classification,
//! and multi-tier HGVSp-short derivation, fronted by a request-collapsing
//! cache over the external annotation provider, with optional enrichment
//! from secondary data sources.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use ferro_annotate::{Annotator, MockProvider, StaticOverrideTable};
//!
//! # let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! # rt.block_on(async {
//! let annotator = Annotator::new(
//!     Arc::new(MockProvider::with_test_data()),
//!     Arc::new(StaticOverrideTable::with_test_data()),
//! );
//!
//! // chr prefixes and numeric sex-chromosome aliases are normalized away
//! let annotation = annotator
//!     .annotate("chr7:g.140453136A>T", Some("mskcc"), &[])
//!     .await
//!     .unwrap();
//!
//! let summary = annotation.annotation_summary.unwrap();
//! assert_eq!(summary.hgvsp_short.as_deref(), Some("p.V600E"));
//! assert_eq!(summary.variant_classification.as_deref(), Some("Missense_Mutation"));
//! # });
//! ```

pub mod annotator;
pub mod cache;
pub mod canonical;
pub mod classification;
pub mod enrich;
pub mod error;
pub mod model;
pub mod notation;
pub mod protein_change;
pub mod provider;
#[cfg(feature = "web-service")]
pub mod service;

// Re-export commonly used types
pub use annotator::{Annotator, ItemOutcome};
pub use cache::{AnnotationCache, CacheStats};
pub use canonical::{CanonicalTranscriptResolver, IsoformOverrideSource, StaticOverrideTable};
pub use error::AnnotateError;
pub use model::{
    AnnotationSummary, CanonicalFlag, TranscriptConsequence, VariantAnnotation,
};
pub use protein_change::resolve_short;
pub use provider::{AnnotationProvider, HttpAnnotationProvider, MockProvider};

/// Result type alias for ferro-annotate operations
pub type Result<T> = std::result::Result<T, AnnotateError>;
