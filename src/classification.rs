//! Variant classification inference
//!
//! Maps a transcript's first consequence term to a coarse-grained
//! MAF-style classification label through a fixed precedence table.
//! Indel-direction-sensitive terms (`frameshift_variant`,
//! `protein_altering_variant`) additionally consult the parent
//! annotation's allele string to pick the insertion or deletion form.

use crate::model::{TranscriptConsequence, VariantAnnotation};

/// Fixed consequence-term table, consulted in order
///
/// Terms absent from this table classify as `Targeted_Region`.
static TERM_CLASSIFICATIONS: &[(&str, &str)] = &[
    ("transcript_ablation", "Splice_Site"),
    ("exon_loss_variant", "Splice_Site"),
    ("splice_acceptor_variant", "Splice_Site"),
    ("splice_donor_variant", "Splice_Site"),
    ("splice_region_variant", "Splice_Region"),
    ("stop_gained", "Nonsense_Mutation"),
    ("stop_lost", "Nonstop_Mutation"),
    ("start_lost", "Translation_Start_Site"),
    ("initiator_codon_variant", "Translation_Start_Site"),
    ("inframe_insertion", "In_Frame_Ins"),
    ("disruptive_inframe_insertion", "In_Frame_Ins"),
    ("inframe_deletion", "In_Frame_Del"),
    ("disruptive_inframe_deletion", "In_Frame_Del"),
    ("missense_variant", "Missense_Mutation"),
    ("conservative_missense_variant", "Missense_Mutation"),
    ("rare_amino_acid_variant", "Missense_Mutation"),
    ("coding_sequence_variant", "Missense_Mutation"),
    ("synonymous_variant", "Silent"),
    ("stop_retained_variant", "Silent"),
    ("start_retained_variant", "Silent"),
    ("incomplete_terminal_codon_variant", "Silent"),
    ("mature_miRNA_variant", "RNA"),
    ("exon_variant", "RNA"),
    ("non_coding_transcript_exon_variant", "RNA"),
    ("non_coding_transcript_variant", "RNA"),
    ("5_prime_UTR_variant", "5'UTR"),
    ("3_prime_UTR_variant", "3'UTR"),
    ("intron_variant", "Intron"),
    ("intragenic_variant", "Intron"),
    ("upstream_gene_variant", "5'Flank"),
    ("downstream_gene_variant", "3'Flank"),
    ("intergenic_variant", "IGR"),
    ("regulatory_region_variant", "IGR"),
    ("TF_binding_site_variant", "IGR"),
];

/// Classification for any unrecognized consequence term
const DEFAULT_CLASSIFICATION: &str = "Targeted_Region";

/// Direction of an indel inferred from the annotation's allele string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IndelDirection {
    Insertion,
    Deletion,
}

/// Resolve the classification label for a transcript consequence
///
/// Uses the transcript's first consequence term. The `annotation`
/// argument supplies indel context for frameshift-like terms; passing
/// `None` falls back to the deletion form. Returns `None` when the
/// transcript carries no consequence terms.
pub fn resolve(
    annotation: Option<&VariantAnnotation>,
    transcript: &TranscriptConsequence,
) -> Option<String> {
    let term = transcript.first_consequence_term()?;

    let label = match term {
        "frameshift_variant" => match indel_direction(annotation) {
            Some(IndelDirection::Insertion) => "Frame_Shift_Ins",
            _ => "Frame_Shift_Del",
        },
        "protein_altering_variant" => protein_altering_label(annotation),
        _ => TERM_CLASSIFICATIONS
            .iter()
            .find(|(t, _)| *t == term)
            .map(|(_, label)| *label)
            .unwrap_or(DEFAULT_CLASSIFICATION),
    };

    Some(label.to_string())
}

/// `protein_altering_variant` is in-frame when the allele length delta is
/// divisible by three, frame-shifting otherwise
fn protein_altering_label(annotation: Option<&VariantAnnotation>) -> &'static str {
    let Some((ref_len, alt_len)) = allele_lengths(annotation) else {
        return "In_Frame_Del";
    };

    let in_frame = ref_len.abs_diff(alt_len) % 3 == 0;
    match (in_frame, indel_direction(annotation)) {
        (true, Some(IndelDirection::Insertion)) => "In_Frame_Ins",
        (true, _) => "In_Frame_Del",
        (false, Some(IndelDirection::Insertion)) => "Frame_Shift_Ins",
        (false, _) => "Frame_Shift_Del",
    }
}

fn indel_direction(annotation: Option<&VariantAnnotation>) -> Option<IndelDirection> {
    let (ref_len, alt_len) = allele_lengths(annotation)?;
    if alt_len > ref_len {
        Some(IndelDirection::Insertion)
    } else if ref_len > alt_len {
        Some(IndelDirection::Deletion)
    } else {
        None
    }
}

/// Allele lengths from a `REF/ALT` allele string; `-` counts as empty
fn allele_lengths(annotation: Option<&VariantAnnotation>) -> Option<(usize, usize)> {
    let allele_string = annotation?.allele_string.as_deref()?;
    let (reference, alternate) = allele_string.split_once('/')?;
    let len = |allele: &str| if allele == "-" { 0 } else { allele.len() };
    Some((len(reference), len(alternate)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::VariantAnnotation;

    fn transcript_with_term(term: &str) -> TranscriptConsequence {
        let mut tc = TranscriptConsequence::new("ENST1");
        tc.consequence_terms = vec![term.to_string()];
        tc
    }

    fn annotation_with_alleles(alleles: &str) -> VariantAnnotation {
        let mut annotation = VariantAnnotation::new("test");
        annotation.allele_string = Some(alleles.to_string());
        annotation
    }

    #[test]
    fn test_no_terms_resolves_none() {
        let tc = TranscriptConsequence::new("ENST1");
        assert_eq!(resolve(None, &tc), None);
    }

    #[test]
    fn test_table_lookups() {
        for (term, expected) in [
            ("splice_acceptor_variant", "Splice_Site"),
            ("splice_donor_variant", "Splice_Site"),
            ("splice_region_variant", "Splice_Region"),
            ("stop_gained", "Nonsense_Mutation"),
            ("stop_lost", "Nonstop_Mutation"),
            ("missense_variant", "Missense_Mutation"),
            ("inframe_insertion", "In_Frame_Ins"),
            ("inframe_deletion", "In_Frame_Del"),
            ("synonymous_variant", "Silent"),
            ("intron_variant", "Intron"),
            ("5_prime_UTR_variant", "5'UTR"),
            ("intergenic_variant", "IGR"),
        ] {
            let tc = transcript_with_term(term);
            assert_eq!(resolve(None, &tc).as_deref(), Some(expected), "{}", term);
        }
    }

    #[test]
    fn test_only_first_term_considered() {
        let mut tc = transcript_with_term("synonymous_variant");
        tc.consequence_terms.push("stop_gained".to_string());
        assert_eq!(resolve(None, &tc).as_deref(), Some("Silent"));
    }

    #[test]
    fn test_unknown_term_defaults() {
        let tc = transcript_with_term("feature_truncation");
        assert_eq!(resolve(None, &tc).as_deref(), Some("Targeted_Region"));
    }

    #[test]
    fn test_frameshift_direction_from_alleles() {
        let tc = transcript_with_term("frameshift_variant");

        let insertion = annotation_with_alleles("-/AA");
        assert_eq!(
            resolve(Some(&insertion), &tc).as_deref(),
            Some("Frame_Shift_Ins")
        );

        let deletion = annotation_with_alleles("AA/-");
        assert_eq!(
            resolve(Some(&deletion), &tc).as_deref(),
            Some("Frame_Shift_Del")
        );
    }

    #[test]
    fn test_frameshift_without_context() {
        let tc = transcript_with_term("frameshift_variant");
        assert_eq!(resolve(None, &tc).as_deref(), Some("Frame_Shift_Del"));

        // substitution alleles give no direction either
        let sub = annotation_with_alleles("A/T");
        assert_eq!(resolve(Some(&sub), &tc).as_deref(), Some("Frame_Shift_Del"));
    }

    #[test]
    fn test_protein_altering_variant() {
        let tc = transcript_with_term("protein_altering_variant");

        let inframe_ins = annotation_with_alleles("-/AAA");
        assert_eq!(
            resolve(Some(&inframe_ins), &tc).as_deref(),
            Some("In_Frame_Ins")
        );

        let inframe_del = annotation_with_alleles("AAA/-");
        assert_eq!(
            resolve(Some(&inframe_del), &tc).as_deref(),
            Some("In_Frame_Del")
        );

        let shifted = annotation_with_alleles("-/AAAA");
        assert_eq!(
            resolve(Some(&shifted), &tc).as_deref(),
            Some("Frame_Shift_Ins")
        );

        assert_eq!(resolve(None, &tc).as_deref(), Some("In_Frame_Del"));
    }

    #[test]
    fn test_label_shapes() {
        // frameshift labels begin with Frame_Shift, splice labels contain Splice
        let fs = resolve(None, &transcript_with_term("frameshift_variant")).unwrap();
        assert!(fs.to_lowercase().starts_with("frame_shift"));

        for term in [
            "splice_acceptor_variant",
            "splice_donor_variant",
            "splice_region_variant",
        ] {
            let label = resolve(None, &transcript_with_term(term)).unwrap();
            assert!(label.to_lowercase().contains("splice"), "{}", term);
        }
    }
}
