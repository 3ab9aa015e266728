//! Canonical transcript resolution
//!
//! Selects exactly one canonical transcript consequence from a variant's
//! candidate list. An isoform-override source, when supplied and loaded,
//! takes full precedence over the provider's own canonical flags; the
//! override applies only when it matches exactly one transcript in the
//! list. Resolution is idempotent and never mutates shared state: the
//! flag-rewriting variant operates on a caller-owned annotation.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::error::AnnotateError;
use crate::model::{CanonicalFlag, IsoformOverride, TranscriptConsequence, VariantAnnotation};
use crate::Result;

/// Read-only table of per-source canonical transcript designations
pub trait IsoformOverrideSource: Send + Sync {
    /// Whether the named ranking source has any override data loaded
    fn has_data(&self, source: &str) -> bool;

    /// Override record for `(source, transcript_id)`, if one exists
    ///
    /// Transcript ids are compared ignoring a trailing version suffix,
    /// so `ENST00000357654.3` matches an override stored for
    /// `ENST00000357654`.
    fn lookup(&self, source: &str, transcript_id: &str) -> Option<IsoformOverride>;

    /// Names of all loaded sources
    fn sources(&self) -> Vec<String>;
}

/// Strip a trailing `.N` version suffix from a transcript accession
fn base_transcript_id(transcript_id: &str) -> &str {
    match transcript_id.split_once('.') {
        Some((base, _)) => base,
        None => transcript_id,
    }
}

/// In-memory override table keyed by source name
#[derive(Debug, Clone, Default)]
pub struct StaticOverrideTable {
    sources: HashMap<String, HashMap<String, IsoformOverride>>,
}

impl StaticOverrideTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one override record under a source name
    pub fn add(&mut self, source: impl Into<String>, record: IsoformOverride) {
        let key = base_transcript_id(&record.transcript_id).to_string();
        self.sources
            .entry(source.into())
            .or_default()
            .insert(key, record);
    }

    /// Load a table from a JSON file of shape
    /// `{ "source": [ { "transcript_id": ... }, ... ], ... }`
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let parsed: HashMap<String, Vec<IsoformOverride>> = serde_json::from_str(&content)?;

        let mut table = Self::new();
        for (source, records) in parsed {
            for record in records {
                table.add(source.clone(), record);
            }
        }
        Ok(table)
    }

    /// A small table for tests and examples
    pub fn with_test_data() -> Self {
        let mut table = Self::new();
        table.add(
            "mskcc",
            IsoformOverride {
                transcript_id: "ENST00000288602".to_string(),
                gene_symbol: Some("BRAF".to_string()),
                refseq_id: Some("NM_004333".to_string()),
                ccds_id: None,
            },
        );
        table.add(
            "mskcc",
            IsoformOverride {
                transcript_id: "ENST00000256078".to_string(),
                gene_symbol: Some("KRAS".to_string()),
                refseq_id: Some("NM_033360".to_string()),
                ccds_id: None,
            },
        );
        table
    }
}

impl IsoformOverrideSource for StaticOverrideTable {
    fn has_data(&self, source: &str) -> bool {
        self.sources
            .get(source)
            .map(|records| !records.is_empty())
            .unwrap_or(false)
    }

    fn lookup(&self, source: &str, transcript_id: &str) -> Option<IsoformOverride> {
        self.sources
            .get(source)?
            .get(base_transcript_id(transcript_id))
            .cloned()
    }

    fn sources(&self) -> Vec<String> {
        self.sources.keys().cloned().collect()
    }
}

/// Resolves the single canonical transcript for an annotation
pub struct CanonicalTranscriptResolver {
    overrides: Arc<dyn IsoformOverrideSource>,
}

impl CanonicalTranscriptResolver {
    /// Create a resolver backed by an override source
    pub fn new(overrides: Arc<dyn IsoformOverrideSource>) -> Self {
        Self { overrides }
    }

    /// Resolve the canonical transcript without touching the annotation
    pub fn resolve<'a>(
        &self,
        annotation: &'a VariantAnnotation,
        override_source: Option<&str>,
    ) -> Option<&'a TranscriptConsequence> {
        self.resolve_index(annotation, override_source)
            .map(|idx| &annotation.transcript_consequences[idx])
    }

    /// Resolve and rewrite the canonical flags on a caller-owned copy
    ///
    /// The winning transcript is flagged marked and, when an override
    /// decided the outcome, every other transcript is flagged unmarked.
    /// Returns the winning index. Idempotent: repeating the call yields
    /// the same index and the same flags.
    pub fn mark(
        &self,
        annotation: &mut VariantAnnotation,
        override_source: Option<&str>,
    ) -> Option<usize> {
        let decided_by_override = self.override_index(annotation, override_source).is_some();
        let winner = self.resolve_index(annotation, override_source)?;

        for (idx, tc) in annotation.transcript_consequences.iter_mut().enumerate() {
            if idx == winner {
                tc.canonical = CanonicalFlag::Marked;
            } else if decided_by_override || tc.canonical.is_marked() {
                tc.canonical = CanonicalFlag::Unmarked;
            }
        }

        Some(winner)
    }

    /// The override record for the canonical transcript, for callers that
    /// requested it as an enrichment field
    pub fn override_record(
        &self,
        annotation: &VariantAnnotation,
        override_source: &str,
    ) -> Result<IsoformOverride> {
        if !self.overrides.has_data(override_source) {
            return Err(AnnotateError::OverrideSourceNotFound {
                source: override_source.to_string(),
            });
        }

        annotation
            .canonical_transcript()
            .and_then(|tc| self.overrides.lookup(override_source, &tc.transcript_id))
            .ok_or_else(|| AnnotateError::OverrideSourceNotFound {
                source: override_source.to_string(),
            })
    }

    fn resolve_index(
        &self,
        annotation: &VariantAnnotation,
        override_source: Option<&str>,
    ) -> Option<usize> {
        if let Some(idx) = self.override_index(annotation, override_source) {
            return Some(idx);
        }

        annotation
            .transcript_consequences
            .iter()
            .position(|tc| tc.canonical.is_marked())
    }

    /// Index decided by the override source: applies only when exactly one
    /// transcript in the list has an override record
    fn override_index(
        &self,
        annotation: &VariantAnnotation,
        override_source: Option<&str>,
    ) -> Option<usize> {
        let source = override_source?;
        if !self.overrides.has_data(source) {
            return None;
        }

        let mut matched = None;
        for (idx, tc) in annotation.transcript_consequences.iter().enumerate() {
            if self.overrides.lookup(source, &tc.transcript_id).is_some() {
                if matched.is_some() {
                    // ambiguous override, fall back to the default flags
                    return None;
                }
                matched = Some(idx);
            }
        }
        matched
    }
}
