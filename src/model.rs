//! Data model for variant annotations
//!
//! The field names mirror the JSON emitted by the upstream effect
//! predictor (`seq_region_name`, `transcript_consequences`, ...), so the
//! structs deserialize straight from provider responses. Enrichment
//! records are optional side-cars on [`VariantAnnotation`]; they never
//! replace base fields.

use serde::{Deserialize, Serialize};

/// Canonical designation of a transcript as reported by the provider
///
/// Modeled as an explicit tri-state rather than `Option<bool>` so the
/// isoform-override precedence logic stays unambiguous: the provider may
/// mark a transcript, leave it unmarked, or omit the field entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CanonicalFlag {
    /// Designated canonical
    Marked,
    /// Explicitly not canonical
    Unmarked,
    /// Provider did not report the field
    #[default]
    Absent,
}

impl CanonicalFlag {
    /// Whether this transcript is designated canonical
    pub fn is_marked(&self) -> bool {
        matches!(self, CanonicalFlag::Marked)
    }

    /// Whether the provider omitted the field
    pub fn is_absent(&self) -> bool {
        matches!(self, CanonicalFlag::Absent)
    }
}

/// Serde mapping for the provider's numeric canonical field
///
/// The wire format is `1` for marked, `0` for unmarked, absent otherwise.
mod canonical_flag_serde {
    use super::CanonicalFlag;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(flag: &CanonicalFlag, ser: S) -> Result<S::Ok, S::Error> {
        match flag {
            CanonicalFlag::Marked => ser.serialize_some(&1),
            CanonicalFlag::Unmarked => ser.serialize_some(&0),
            CanonicalFlag::Absent => ser.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<CanonicalFlag, D::Error> {
        let value: Option<i64> = Option::deserialize(de)?;
        Ok(match value {
            Some(1) => CanonicalFlag::Marked,
            Some(_) => CanonicalFlag::Unmarked,
            None => CanonicalFlag::Absent,
        })
    }
}

/// One transcript's predicted effect for a variant
///
/// Owned exclusively by its parent [`VariantAnnotation`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptConsequence {
    /// Transcript accession
    pub transcript_id: String,
    /// Protein-level change notation, if the provider reported one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hgvsp: Option<String>,
    /// Coding-sequence change notation, if the provider reported one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hgvsc: Option<String>,
    /// Amino acid pair as `"REF/ALT"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amino_acids: Option<String>,
    /// Protein-level start coordinate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein_start: Option<i64>,
    /// Protein-level end coordinate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein_end: Option<i64>,
    /// Ordered consequence-term labels, most relevant first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub consequence_terms: Vec<String>,
    /// Canonical designation (tri-state)
    #[serde(
        default,
        with = "canonical_flag_serde",
        skip_serializing_if = "CanonicalFlag::is_absent"
    )]
    pub canonical: CanonicalFlag,
}

impl TranscriptConsequence {
    /// Create a consequence with only the transcript id set
    pub fn new(transcript_id: impl Into<String>) -> Self {
        Self {
            transcript_id: transcript_id.into(),
            hgvsp: None,
            hgvsc: None,
            amino_acids: None,
            protein_start: None,
            protein_end: None,
            consequence_terms: Vec::new(),
            canonical: CanonicalFlag::Absent,
        }
    }

    /// First consequence term, if any
    pub fn first_consequence_term(&self) -> Option<&str> {
        self.consequence_terms.first().map(String::as_str)
    }
}

/// One resolved variant with its per-transcript consequences
///
/// Invariant: after canonical resolution at most one transcript in
/// `transcript_consequences` carries [`CanonicalFlag::Marked`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VariantAnnotation {
    /// The normalized variant descriptor this annotation answers
    #[serde(default, alias = "input", alias = "id")]
    pub variant: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assembly_name: Option<String>,
    /// Chromosome name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq_region_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<i64>,
    /// Reference/alternate alleles as `"REF/ALT"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allele_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strand: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub most_severe_consequence: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transcript_consequences: Vec<TranscriptConsequence>,

    /// Canonical-transcript summary computed by the annotator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation_summary: Option<AnnotationSummary>,
    /// Mutation-impact enrichment side-car
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutation_impact: Option<MutationImpact>,
    /// Variant-info enrichment side-car
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_info: Option<VariantInfo>,
    /// Hotspot recurrence enrichment side-car
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotspots: Option<Vec<HotspotRecord>>,
    /// Isoform override record for the canonical transcript
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isoform_override: Option<IsoformOverride>,
}

impl VariantAnnotation {
    /// Create an empty annotation for a variant descriptor
    pub fn new(variant: impl Into<String>) -> Self {
        Self {
            variant: variant.into(),
            ..Default::default()
        }
    }

    /// The transcript currently flagged canonical, if any
    pub fn canonical_transcript(&self) -> Option<&TranscriptConsequence> {
        self.transcript_consequences
            .iter()
            .find(|tc| tc.canonical.is_marked())
    }

    /// Genomic fingerprint `chromosome:start-end` used as an enrichment key
    pub fn genomic_location(&self) -> Option<String> {
        match (&self.seq_region_name, self.start, self.end) {
            (Some(chr), Some(start), Some(end)) => Some(format!("{}:{}-{}", chr, start, end)),
            _ => None,
        }
    }
}

/// Summary of the canonical transcript's resolved effect
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnnotationSummary {
    /// Canonical transcript accession
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_id: Option<String>,
    /// Coarse-grained variant classification label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_classification: Option<String>,
    /// Short protein-change notation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hgvsp_short: Option<String>,
}

/// Maps a transcript to its canonical designation under a named source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsoformOverride {
    /// Transcript accession (may carry a version suffix)
    pub transcript_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gene_symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refseq_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ccds_id: Option<String>,
}

/// Functional impact score from the mutation-impact service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationImpact {
    /// The variant or protein-change key this score answers
    #[serde(default)]
    pub variant: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub functional_impact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub functional_impact_score: Option<f64>,
}

/// Aggregated variant-info blob (population frequencies, clinical flags)
///
/// The payload shape varies by upstream release, so everything beyond the
/// key is kept as raw JSON.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VariantInfo {
    #[serde(default)]
    pub variant: String,
    #[serde(flatten)]
    pub data: serde_json::Map<String, serde_json::Value>,
}

/// One recurrence record from the hotspot service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotspotRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hugo_symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_id: Option<String>,
    /// Recurrently mutated residue, e.g. `V600`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub residue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tumor_count: Option<u32>,
}
