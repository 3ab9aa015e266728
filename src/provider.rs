//! Primary annotation provider boundary
//!
//! The core talks to the external effect predictor through
//! [`AnnotationProvider`]. Two implementations are provided: an HTTP
//! client for a VEP-style JSON endpoint, and an in-memory
//! [`MockProvider`] with test data for offline use.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};

use crate::error::AnnotateError;
use crate::model::VariantAnnotation;
use crate::Result;

/// Order-preserving lookups against the external annotation service
///
/// `None` means the service authoritatively knows nothing about the
/// variant; transport and decode problems are errors.
#[async_trait]
pub trait AnnotationProvider: Send + Sync {
    /// Fetch the annotation for one normalized variant descriptor
    async fn fetch_one(&self, variant: &str) -> Result<Option<VariantAnnotation>>;

    /// Fetch annotations for many descriptors, preserving input order
    async fn fetch_many(&self, variants: &[String]) -> Result<Vec<Option<VariantAnnotation>>>;
}

/// HTTP client for a VEP-style annotation endpoint
pub struct HttpAnnotationProvider {
    client: Client,
    base_url: Url,
}

impl HttpAnnotationProvider {
    /// Create a provider against a base URL with a per-request timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| AnnotateError::upstream("annotation-provider", e.to_string()))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AnnotateError::upstream("annotation-provider", e.to_string()))?;

        Ok(Self { client, base_url })
    }

    fn single_url(&self, variant: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                AnnotateError::upstream("annotation-provider", "base URL cannot carry a path")
            })?
            .push("annotation")
            .push(variant);
        Ok(url)
    }

    fn batch_url(&self) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                AnnotateError::upstream("annotation-provider", "base URL cannot carry a path")
            })?
            .push("annotation");
        Ok(url)
    }
}

#[async_trait]
impl AnnotationProvider for HttpAnnotationProvider {
    async fn fetch_one(&self, variant: &str) -> Result<Option<VariantAnnotation>> {
        let url = self.single_url(variant)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AnnotateError::upstream("annotation-provider", e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(AnnotateError::upstream(
                "annotation-provider",
                format!("unexpected status {}", response.status()),
            ));
        }

        let annotation: VariantAnnotation = response
            .json()
            .await
            .map_err(|e| AnnotateError::upstream("annotation-provider", e.to_string()))?;
        Ok(Some(annotation))
    }

    async fn fetch_many(&self, variants: &[String]) -> Result<Vec<Option<VariantAnnotation>>> {
        let url = self.batch_url()?;
        let response = self
            .client
            .post(url)
            .json(&variants)
            .send()
            .await
            .map_err(|e| AnnotateError::upstream("annotation-provider", e.to_string()))?;

        if !response.status().is_success() {
            return Err(AnnotateError::upstream(
                "annotation-provider",
                format!("unexpected status {}", response.status()),
            ));
        }

        let annotations: Vec<VariantAnnotation> = response
            .json()
            .await
            .map_err(|e| AnnotateError::upstream("annotation-provider", e.to_string()))?;

        // the service echoes each request under the annotation's variant
        // field; match responses back rather than trusting positions
        let mut by_variant: HashMap<String, VariantAnnotation> = annotations
            .into_iter()
            .map(|annotation| (annotation.variant.clone(), annotation))
            .collect();

        Ok(variants
            .iter()
            .map(|variant| by_variant.remove(variant))
            .collect())
    }
}

/// In-memory provider with fixed responses, for tests and examples
#[derive(Debug, Clone, Default)]
pub struct MockProvider {
    annotations: HashMap<String, VariantAnnotation>,
}

impl MockProvider {
    /// Create an empty provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an annotation under its variant descriptor
    pub fn insert(&mut self, annotation: VariantAnnotation) {
        self.annotations
            .insert(annotation.variant.clone(), annotation);
    }

    /// A provider pre-loaded with a handful of well-known variants
    pub fn with_test_data() -> Self {
        use crate::model::{CanonicalFlag, TranscriptConsequence};

        let mut provider = Self::new();

        // BRAF V600E
        let mut annotation = VariantAnnotation::new("7:g.140453136A>T");
        annotation.assembly_name = Some("GRCh37".to_string());
        annotation.seq_region_name = Some("7".to_string());
        annotation.start = Some(140453136);
        annotation.end = Some(140453136);
        annotation.allele_string = Some("A/T".to_string());
        annotation.strand = Some(1);
        annotation.most_severe_consequence = Some("missense_variant".to_string());
        let mut canonical = TranscriptConsequence::new("ENST00000288602.6");
        canonical.canonical = CanonicalFlag::Marked;
        canonical.hgvsp = Some("ENSP00000288602.6:p.Val600Glu".to_string());
        canonical.hgvsc = Some("ENST00000288602.6:c.1799T>A".to_string());
        canonical.amino_acids = Some("V/E".to_string());
        canonical.protein_start = Some(600);
        canonical.protein_end = Some(600);
        canonical.consequence_terms = vec!["missense_variant".to_string()];
        let mut secondary = TranscriptConsequence::new("ENST00000479537.1");
        secondary.canonical = CanonicalFlag::Unmarked;
        secondary.consequence_terms = vec!["upstream_gene_variant".to_string()];
        annotation.transcript_consequences = vec![canonical, secondary];
        provider.insert(annotation);

        // KRAS G12C
        let mut annotation = VariantAnnotation::new("12:g.25398285C>A");
        annotation.assembly_name = Some("GRCh37".to_string());
        annotation.seq_region_name = Some("12".to_string());
        annotation.start = Some(25398285);
        annotation.end = Some(25398285);
        annotation.allele_string = Some("C/A".to_string());
        annotation.strand = Some(1);
        annotation.most_severe_consequence = Some("missense_variant".to_string());
        let mut canonical = TranscriptConsequence::new("ENST00000256078.8");
        canonical.canonical = CanonicalFlag::Marked;
        canonical.hgvsp = Some("ENSP00000256078.4:p.Gly12Cys".to_string());
        canonical.hgvsc = Some("ENST00000256078.8:c.34G>T".to_string());
        canonical.amino_acids = Some("G/C".to_string());
        canonical.protein_start = Some(12);
        canonical.protein_end = Some(12);
        canonical.consequence_terms = vec!["missense_variant".to_string()];
        annotation.transcript_consequences = vec![canonical];
        provider.insert(annotation);

        // BRCA1 frameshift insertion, protein-level fields absent
        let mut annotation = VariantAnnotation::new("X:g.41242962_41242963insGA");
        annotation.assembly_name = Some("GRCh37".to_string());
        annotation.seq_region_name = Some("X".to_string());
        annotation.start = Some(41242962);
        annotation.end = Some(41242963);
        annotation.allele_string = Some("-/GA".to_string());
        annotation.strand = Some(1);
        annotation.most_severe_consequence = Some("frameshift_variant".to_string());
        let mut canonical = TranscriptConsequence::new("ENST00000378119.7");
        canonical.canonical = CanonicalFlag::Marked;
        canonical.hgvsc = Some("ENST00000378119.7:c.1573_1574insTC".to_string());
        canonical.consequence_terms = vec!["frameshift_variant".to_string()];
        annotation.transcript_consequences = vec![canonical];
        provider.insert(annotation);

        provider
    }
}

#[async_trait]
impl AnnotationProvider for MockProvider {
    async fn fetch_one(&self, variant: &str) -> Result<Option<VariantAnnotation>> {
        Ok(self.annotations.get(variant).cloned())
    }

    async fn fetch_many(&self, variants: &[String]) -> Result<Vec<Option<VariantAnnotation>>> {
        Ok(variants
            .iter()
            .map(|variant| self.annotations.get(variant).cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_provider_fetch_one() {
        let provider = MockProvider::with_test_data();

        let annotation = provider
            .fetch_one("7:g.140453136A>T")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(annotation.seq_region_name.as_deref(), Some("7"));
        assert_eq!(annotation.transcript_consequences.len(), 2);

        assert!(provider.fetch_one("1:g.1A>T").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mock_provider_fetch_many_order() {
        let provider = MockProvider::with_test_data();

        let keys = vec![
            "12:g.25398285C>A".to_string(),
            "1:g.1A>T".to_string(),
            "7:g.140453136A>T".to_string(),
        ];
        let results = provider.fetch_many(&keys).await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(
            results[0].as_ref().unwrap().seq_region_name.as_deref(),
            Some("12")
        );
        assert!(results[1].is_none());
        assert_eq!(
            results[2].as_ref().unwrap().seq_region_name.as_deref(),
            Some("7")
        );
    }

    #[test]
    fn test_single_url_encodes_variant() {
        let provider =
            HttpAnnotationProvider::new("http://localhost:8000", Duration::from_secs(5)).unwrap();
        let url = provider.single_url("7:g.140453136A>T").unwrap();
        let path = url.path();
        assert!(path.starts_with("/annotation/"));
        assert!(!path.contains('>'), "unencoded '>' in {}", path);
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(HttpAnnotationProvider::new("not a url", Duration::from_secs(5)).is_err());
    }
}
