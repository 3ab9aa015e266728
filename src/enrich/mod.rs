//! Secondary enrichment sources
//!
//! Each source answers a named field on the composite annotation.
//! Sources are independent: the annotator fetches any requested subset
//! concurrently and a failure in one never blocks another. Every record
//! is keyed by a fingerprint derivable from the annotation itself.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::AnnotateError;
use crate::model::{HotspotRecord, MutationImpact, VariantAnnotation, VariantInfo};
use crate::Result;

pub mod http;

pub use http::{HotspotSource, MutationImpactSource, VariantInfoSource};

/// Requested-field name served by the mutation-impact source
pub const FIELD_MUTATION_IMPACT: &str = "mutation_impact";
/// Requested-field name served by the variant-info source
pub const FIELD_VARIANT_INFO: &str = "variant_info";
/// Requested-field name served by the hotspot source
pub const FIELD_HOTSPOTS: &str = "hotspots";
/// Requested-field name for the canonical transcript's override record
pub const FIELD_ISOFORM_OVERRIDES: &str = "isoform_overrides";

/// One enrichment result, tagged by kind
#[derive(Debug, Clone, PartialEq)]
pub enum Enrichment {
    MutationImpact(MutationImpact),
    VariantInfo(VariantInfo),
    Hotspots(Vec<HotspotRecord>),
}

/// A secondary data source answering one requested field
#[async_trait]
pub trait EnrichmentSource: Send + Sync {
    /// The requested-field name this source serves
    fn name(&self) -> &'static str;

    /// Fetch the enrichment record for an annotation
    async fn fetch(&self, annotation: &VariantAnnotation) -> Result<Enrichment>;
}

/// Fingerprint for mutation-impact lookups: `chromosome,start,ref,alt`
pub fn mutation_impact_key(annotation: &VariantAnnotation) -> Option<String> {
    let chromosome = annotation.seq_region_name.as_deref()?;
    let start = annotation.start?;
    let (reference, alternate) = annotation.allele_string.as_deref()?.split_once('/')?;
    Some(format!("{},{},{},{}", chromosome, start, reference, alternate))
}

/// Fingerprint for hotspot lookups: the canonical transcript accession
pub fn hotspot_key(annotation: &VariantAnnotation) -> Option<String> {
    annotation
        .canonical_transcript()
        .map(|tc| tc.transcript_id.clone())
}

/// In-memory source with fixed responses, for tests and offline use
#[derive(Debug, Clone)]
pub struct StaticEnrichmentSource {
    name: &'static str,
    records: HashMap<String, Enrichment>,
}

impl StaticEnrichmentSource {
    /// Create an empty source serving the given field name
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            records: HashMap::new(),
        }
    }

    /// Register a record under a variant descriptor
    pub fn insert(&mut self, variant: impl Into<String>, enrichment: Enrichment) {
        self.records.insert(variant.into(), enrichment);
    }
}

#[async_trait]
impl EnrichmentSource for StaticEnrichmentSource {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch(&self, annotation: &VariantAnnotation) -> Result<Enrichment> {
        self.records
            .get(&annotation.variant)
            .cloned()
            .ok_or_else(|| AnnotateError::VariantNotFound {
                variant: annotation.variant.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CanonicalFlag, TranscriptConsequence};

    #[test]
    fn test_mutation_impact_key() {
        let mut annotation = VariantAnnotation::new("7:g.140453136A>T");
        assert!(mutation_impact_key(&annotation).is_none());

        annotation.seq_region_name = Some("7".to_string());
        annotation.start = Some(140453136);
        annotation.allele_string = Some("A/T".to_string());
        assert_eq!(
            mutation_impact_key(&annotation).as_deref(),
            Some("7,140453136,A,T")
        );
    }

    #[test]
    fn test_hotspot_key_requires_canonical_transcript() {
        let mut annotation = VariantAnnotation::new("7:g.140453136A>T");
        assert!(hotspot_key(&annotation).is_none());

        let mut tc = TranscriptConsequence::new("ENST00000288602");
        tc.canonical = CanonicalFlag::Marked;
        annotation.transcript_consequences = vec![tc];
        assert_eq!(hotspot_key(&annotation).as_deref(), Some("ENST00000288602"));
    }

    #[tokio::test]
    async fn test_static_source() {
        let mut source = StaticEnrichmentSource::new(FIELD_MUTATION_IMPACT);
        source.insert(
            "7:g.140453136A>T",
            Enrichment::MutationImpact(MutationImpact {
                variant: "7,140453136,A,T".to_string(),
                functional_impact: Some("high".to_string()),
                functional_impact_score: Some(3.5),
            }),
        );

        let annotation = VariantAnnotation::new("7:g.140453136A>T");
        let enrichment = source.fetch(&annotation).await.unwrap();
        assert!(matches!(enrichment, Enrichment::MutationImpact(_)));

        let missing = VariantAnnotation::new("1:g.1A>T");
        assert!(source.fetch(&missing).await.is_err());
    }
}
