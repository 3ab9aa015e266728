//! Top-level annotation orchestration
//!
//! [`Annotator`] ties the pipeline together: normalize the raw
//! descriptor, fetch the base annotation through the cache, mark the
//! canonical transcript, compute the summary, and attach any requested
//! enrichment side-cars. Batch annotation repeats the pipeline per
//! element with per-item error isolation: only a failure of the
//! underlying batch fetch fails the whole call.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use ferro_annotate::annotator::Annotator;
//! use ferro_annotate::canonical::StaticOverrideTable;
//! use ferro_annotate::provider::MockProvider;
//!
//! # let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! # rt.block_on(async {
//! let annotator = Annotator::new(
//!     Arc::new(MockProvider::with_test_data()),
//!     Arc::new(StaticOverrideTable::with_test_data()),
//! );
//!
//! let annotation = annotator
//!     .annotate("chr7:g.140453136A>T", Some("mskcc"), &[])
//!     .await
//!     .unwrap();
//! let summary = annotation.annotation_summary.unwrap();
//! assert_eq!(summary.hgvsp_short.as_deref(), Some("p.V600E"));
//! # });
//! ```

use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{debug, warn};

use crate::cache::{AnnotationCache, CacheStats};
use crate::canonical::{CanonicalTranscriptResolver, IsoformOverrideSource};
use crate::enrich::{Enrichment, EnrichmentSource, FIELD_ISOFORM_OVERRIDES};
use crate::error::AnnotateError;
use crate::model::{AnnotationSummary, VariantAnnotation};
use crate::provider::AnnotationProvider;
use crate::{classification, notation, protein_change, Result};

/// Result of one element in a batch annotation
#[derive(Debug, Clone)]
pub enum ItemOutcome {
    /// Successfully annotated
    Ok(VariantAnnotation),
    /// Failed annotation with the normalized input that caused it
    Err {
        input: String,
        error: AnnotateError,
    },
}

impl ItemOutcome {
    /// Check if this is a success
    pub fn is_ok(&self) -> bool {
        matches!(self, ItemOutcome::Ok(_))
    }

    /// Check if this is an error
    pub fn is_err(&self) -> bool {
        matches!(self, ItemOutcome::Err { .. })
    }

    /// Get the annotation if present
    pub fn ok(self) -> Option<VariantAnnotation> {
        match self {
            ItemOutcome::Ok(annotation) => Some(annotation),
            ItemOutcome::Err { .. } => None,
        }
    }

    /// Get the error if present
    pub fn err(self) -> Option<AnnotateError> {
        match self {
            ItemOutcome::Ok(_) => None,
            ItemOutcome::Err { error, .. } => Some(error),
        }
    }
}

/// Orchestrates annotation resolution and enrichment
pub struct Annotator {
    cache: AnnotationCache,
    canonical: CanonicalTranscriptResolver,
    sources: Vec<Arc<dyn EnrichmentSource>>,
}

impl Annotator {
    /// Create an annotator over a provider and an override source
    pub fn new(
        provider: Arc<dyn AnnotationProvider>,
        overrides: Arc<dyn IsoformOverrideSource>,
    ) -> Self {
        Self {
            cache: AnnotationCache::new(provider),
            canonical: CanonicalTranscriptResolver::new(overrides),
            sources: Vec::new(),
        }
    }

    /// Create an annotator with a bounded cache
    pub fn with_cache_capacity(
        provider: Arc<dyn AnnotationProvider>,
        overrides: Arc<dyn IsoformOverrideSource>,
        capacity: usize,
    ) -> Self {
        Self {
            cache: AnnotationCache::with_capacity(provider, capacity),
            canonical: CanonicalTranscriptResolver::new(overrides),
            sources: Vec::new(),
        }
    }

    /// Register a secondary enrichment source
    pub fn with_source(mut self, source: Arc<dyn EnrichmentSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Cache usage statistics
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Annotate a single raw variant descriptor
    ///
    /// `fields` selects the enrichment side-cars to attach; entries that
    /// name no known source are ignored. A failing enrichment source
    /// leaves its field absent without failing the call.
    pub async fn annotate(
        &self,
        raw_variant: &str,
        override_source: Option<&str>,
        fields: &[String],
    ) -> Result<VariantAnnotation> {
        let key = notation::normalize(raw_variant);
        let annotation = self.cache.fetch(&key).await?;
        Ok(self.finish(annotation, override_source, fields).await)
    }

    /// Annotate a batch of raw descriptors, preserving input order
    ///
    /// Fails as a whole only when the underlying batch fetch fails;
    /// per-element failures are reported in place.
    pub async fn annotate_batch(
        &self,
        raw_variants: &[String],
        override_source: Option<&str>,
        fields: &[String],
    ) -> Result<Vec<ItemOutcome>> {
        let keys = notation::normalize_all(raw_variants);
        let fetched = self.cache.fetch_batch(&keys).await?;

        let mut outcomes = Vec::with_capacity(keys.len());
        for (key, result) in keys.into_iter().zip(fetched) {
            match result {
                Ok(annotation) => {
                    let annotation = self.finish(annotation, override_source, fields).await;
                    outcomes.push(ItemOutcome::Ok(annotation));
                }
                Err(error) => {
                    debug!(variant = %key, "batch element failed: {}", error);
                    outcomes.push(ItemOutcome::Err { input: key, error });
                }
            }
        }
        Ok(outcomes)
    }

    /// Canonical marking, summary, and enrichment on an owned annotation
    async fn finish(
        &self,
        mut annotation: VariantAnnotation,
        override_source: Option<&str>,
        fields: &[String],
    ) -> VariantAnnotation {
        let canonical_idx = self.canonical.mark(&mut annotation, override_source);
        annotation.annotation_summary = Some(summarize(&annotation, canonical_idx));
        self.enrich(&mut annotation, override_source, fields).await;
        annotation
    }

    /// Attach the requested enrichment side-cars
    ///
    /// Sources are independent, so their fetches run concurrently and
    /// join before the annotation is returned.
    async fn enrich(
        &self,
        annotation: &mut VariantAnnotation,
        override_source: Option<&str>,
        fields: &[String],
    ) {
        if fields.iter().any(|field| field == FIELD_ISOFORM_OVERRIDES) {
            match override_source {
                Some(source) => match self.canonical.override_record(annotation, source) {
                    Ok(record) => annotation.isoform_override = Some(record),
                    Err(error) => {
                        warn!(variant = %annotation.variant, "isoform override unavailable: {}", error)
                    }
                },
                None => debug!("isoform_overrides requested without an override source"),
            }
        }

        let requested: Vec<&Arc<dyn EnrichmentSource>> = self
            .sources
            .iter()
            .filter(|source| fields.iter().any(|field| field == source.name()))
            .collect();
        if requested.is_empty() {
            return;
        }

        let snapshot = annotation.clone();
        let fetches = requested.into_iter().map(|source| {
            let snapshot = &snapshot;
            async move { (source.name(), source.fetch(snapshot).await) }
        });

        for (name, result) in join_all(fetches).await {
            match result {
                Ok(Enrichment::MutationImpact(record)) => {
                    annotation.mutation_impact = Some(record)
                }
                Ok(Enrichment::VariantInfo(record)) => annotation.variant_info = Some(record),
                Ok(Enrichment::Hotspots(records)) => annotation.hotspots = Some(records),
                Err(error) => {
                    warn!(source = name, variant = %annotation.variant, "enrichment failed: {}", error)
                }
            }
        }
    }
}

/// Summary of the canonical transcript's resolved effect
fn summarize(annotation: &VariantAnnotation, canonical_idx: Option<usize>) -> AnnotationSummary {
    let Some(idx) = canonical_idx else {
        return AnnotationSummary::default();
    };
    let transcript = &annotation.transcript_consequences[idx];

    AnnotationSummary {
        transcript_id: Some(transcript.transcript_id.clone()),
        variant_classification: classification::resolve(Some(annotation), transcript),
        hgvsp_short: protein_change::resolve_short(annotation, transcript),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::StaticOverrideTable;
    use crate::provider::MockProvider;

    fn annotator() -> Annotator {
        Annotator::new(
            Arc::new(MockProvider::with_test_data()),
            Arc::new(StaticOverrideTable::with_test_data()),
        )
    }

    #[tokio::test]
    async fn test_annotate_computes_summary() {
        let annotation = annotator()
            .annotate("7:g.140453136A>T", None, &[])
            .await
            .unwrap();

        let summary = annotation.annotation_summary.unwrap();
        assert_eq!(summary.transcript_id.as_deref(), Some("ENST00000288602.6"));
        assert_eq!(
            summary.variant_classification.as_deref(),
            Some("Missense_Mutation")
        );
        assert_eq!(summary.hgvsp_short.as_deref(), Some("p.V600E"));
    }

    #[tokio::test]
    async fn test_annotate_normalizes_input() {
        let annotator = annotator();

        let annotation = annotator
            .annotate("chrX:g.41242962_41242963insGA", None, &[])
            .await
            .unwrap();
        assert_eq!(annotation.variant, "X:g.41242962_41242963insGA");

        // chr7 resolves to the same cached entry as 7
        annotator.annotate("7:g.140453136A>T", None, &[]).await.unwrap();
        annotator
            .annotate("chr7:g.140453136A>T", None, &[])
            .await
            .unwrap();
        assert_eq!(annotator.cache_stats().misses, 2);
        assert_eq!(annotator.cache_stats().hits, 1);
    }

    #[tokio::test]
    async fn test_annotate_not_found() {
        let err = annotator().annotate("1:g.1A>T", None, &[]).await.unwrap_err();
        assert!(matches!(err, AnnotateError::VariantNotFound { .. }));
    }

    #[tokio::test]
    async fn test_frameshift_without_protein_fields() {
        let annotation = annotator()
            .annotate("X:g.41242962_41242963insGA", None, &[])
            .await
            .unwrap();

        let summary = annotation.annotation_summary.unwrap();
        // coding position 1573 maps to protein position 525
        assert_eq!(summary.hgvsp_short.as_deref(), Some("*525fs*"));
        assert_eq!(
            summary.variant_classification.as_deref(),
            Some("Frame_Shift_Ins")
        );
    }

    #[tokio::test]
    async fn test_batch_preserves_order_and_isolates_failures() {
        let raws = vec![
            "12:g.25398285C>A".to_string(),
            "1:g.1A>T".to_string(),
            "chr7:g.140453136A>T".to_string(),
        ];
        let outcomes = annotator().annotate_batch(&raws, None, &[]).await.unwrap();

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].is_ok());
        assert!(outcomes[1].is_err());
        assert!(outcomes[2].is_ok());

        match &outcomes[1] {
            ItemOutcome::Err { input, error } => {
                assert_eq!(input, "1:g.1A>T");
                assert!(matches!(error, AnnotateError::VariantNotFound { .. }));
            }
            ItemOutcome::Ok(_) => panic!("expected per-item failure"),
        }

        let braf = outcomes[2].clone().ok().unwrap();
        assert_eq!(braf.variant, "7:g.140453136A>T");
    }

    #[tokio::test]
    async fn test_annotate_is_idempotent() {
        let annotator = annotator();
        let first = annotator
            .annotate("7:g.140453136A>T", Some("mskcc"), &[])
            .await
            .unwrap();
        let second = annotator
            .annotate("7:g.140453136A>T", Some("mskcc"), &[])
            .await
            .unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_unknown_fields_ignored() {
        let fields = vec!["no_such_source".to_string()];
        let annotation = annotator()
            .annotate("7:g.140453136A>T", None, &fields)
            .await
            .unwrap();
        assert!(annotation.mutation_impact.is_none());
        assert!(annotation.variant_info.is_none());
        assert!(annotation.hotspots.is_none());
    }
}
