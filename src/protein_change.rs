//! Short protein-change (HGVSp-short) derivation
//!
//! Derives the one-letter protein-change notation for a (variant,
//! transcript) pair through an ordered three-tier fallback:
//!
//! 1. from the transcript's protein-change notation (unless the
//!    transcript classifies as a splice variant),
//! 2. from the coding-sequence change notation,
//! 3. salvage from the amino-acid pair, protein coordinates, and
//!    consequence terms.
//!
//! The first tier that yields a value wins; if none does, the resolver
//! returns `None`. Missing sub-parts in the salvage tier are recoverable
//! "cannot salvage" outcomes, never errors.
//!
//! # Example
//!
//! ```
//! use ferro_annotate::model::{TranscriptConsequence, VariantAnnotation};
//! use ferro_annotate::protein_change::resolve_short;
//!
//! let annotation = VariantAnnotation::new("7:g.140453136A>T");
//! let mut transcript = TranscriptConsequence::new("ENST00000288602");
//! transcript.hgvsp = Some("ENSP00000288602.6:p.Val600Glu".to_string());
//! transcript.consequence_terms = vec!["missense_variant".to_string()];
//!
//! assert_eq!(resolve_short(&annotation, &transcript).as_deref(), Some("p.V600E"));
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

use crate::classification;
use crate::model::{TranscriptConsequence, VariantAnnotation};

/// Three-letter to one-letter amino-acid codes, consulted in this order
///
/// The substitution is a blind substring replace over the notation, not a
/// token-aware rewrite; a three-letter code occurring inside an unrelated
/// substring is rewritten too.
pub static AA3TO1: [(&str, &str); 24] = [
    ("Ala", "A"),
    ("Arg", "R"),
    ("Asn", "N"),
    ("Asp", "D"),
    ("Asx", "B"),
    ("Cys", "C"),
    ("Glu", "E"),
    ("Gln", "Q"),
    ("Glx", "Z"),
    ("Gly", "G"),
    ("His", "H"),
    ("Ile", "I"),
    ("Leu", "L"),
    ("Lys", "K"),
    ("Met", "M"),
    ("Phe", "F"),
    ("Pro", "P"),
    ("Ser", "S"),
    ("Thr", "T"),
    ("Trp", "W"),
    ("Tyr", "Y"),
    ("Val", "V"),
    ("Xxx", "X"),
    ("Ter", "*"),
];

/// Consequence terms that place the change at a splice site
static SPLICE_SITE_TERMS: [&str; 3] = [
    "splice_acceptor_variant",
    "splice_donor_variant",
    "splice_region_variant",
];

/// Extracts the numeric coding position from an HGVSc-style notation
static CDNA_POSITION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^.*[cn]\.-?\*?(\d+).*$").expect("valid cDNA position pattern"));

/// Derive the short protein-change notation for a transcript consequence
///
/// Pure and deterministic; returns `None` when no tier can produce a
/// value.
pub fn resolve_short(
    annotation: &VariantAnnotation,
    transcript: &TranscriptConsequence,
) -> Option<String> {
    let mut short = match applicable_hgvsp(transcript) {
        Some(hgvsp) => Some(from_hgvsp(hgvsp)),
        None => transcript
            .hgvsc
            .as_deref()
            .and_then(|hgvsc| from_hgvsc(hgvsc, annotation, transcript)),
    };

    if short.is_none() && transcript.amino_acids.is_some() {
        short = salvage_from_amino_acids(transcript);
    }

    short
}

/// The protein-change notation, if present and usable
///
/// Splice-classified transcripts never use their protein-change field;
/// their notation describes an effect the coding-position tier reports
/// more faithfully.
fn applicable_hgvsp(transcript: &TranscriptConsequence) -> Option<&str> {
    let hgvsp = transcript.hgvsp.as_deref()?;

    let is_splice = classification::resolve(None, transcript)
        .map(|label| label.to_lowercase().contains("splice"))
        .unwrap_or(false);

    if is_splice {
        None
    } else {
        Some(hgvsp)
    }
}

/// Tier A: normalize a protein-change notation to its short form
fn from_hgvsp(hgvsp: &str) -> String {
    let remainder = match hgvsp.find(':') {
        Some(idx) => &hgvsp[idx + 1..],
        None => hgvsp,
    };

    // URL-encoded synonymous marker
    if remainder.contains("(p.%3D)") {
        return "p.=".to_string();
    }

    // Each code is tested against the original notation but replaced in
    // the accumulating result, matching the upstream substitution order.
    let mut short = remainder.to_string();
    for (three, one) in AA3TO1 {
        if remainder.contains(three) {
            short = short.replace(three, one);
        }
    }
    short
}

/// Tier B: derive from the coding-sequence change notation
fn from_hgvsc(
    hgvsc: &str,
    annotation: &VariantAnnotation,
    transcript: &TranscriptConsequence,
) -> Option<String> {
    let captures = CDNA_POSITION.captures(hgvsc)?;
    let coding_pos: i64 = captures[1].parse().ok()?;
    let coding_pos = coding_pos.max(1);
    let protein_pos = (coding_pos + 2) / 3;

    let first_term = transcript.first_consequence_term();
    if first_term
        .map(|term| SPLICE_SITE_TERMS.contains(&term))
        .unwrap_or(false)
    {
        return Some(format!("p.X{}_splice", protein_pos));
    }

    if transcript.amino_acids.is_none() {
        let is_frame_shift = classification::resolve(Some(annotation), transcript)
            .map(|label| label.to_lowercase().starts_with("frame_shift"))
            .unwrap_or(false);

        let short = if is_frame_shift {
            format!("*{}fs*", protein_pos)
        } else {
            format!("*{}*", protein_pos)
        };
        return Some(short);
    }

    None
}

/// Tier C: salvage from amino acids, protein coordinates, and terms
///
/// Every missing sub-part branches to `None` explicitly. The
/// inframe-insertion branches read the position characters from the
/// alternate half of the pair; that mirrors the upstream notation mapping
/// and is preserved as-is even though it looks like it should read the
/// reference half.
fn salvage_from_amino_acids(transcript: &TranscriptConsequence) -> Option<String> {
    let amino_acids = transcript.amino_acids.as_deref()?;
    let mut parts = amino_acids.splitn(2, '/');
    let reference = parts.next().unwrap_or("");
    let alternate = parts.next();

    let first_term = transcript
        .first_consequence_term()
        .map(str::to_lowercase)
        .unwrap_or_default();

    if first_term.contains("inframe_insertion") {
        let alternate = alternate?;
        let has_dup = transcript
            .hgvsc
            .as_deref()
            .map(|hgvsc| hgvsc.contains("dup"))
            .unwrap_or(false);

        if has_dup {
            let head = alternate.get(0..1)?;
            let start = transcript.protein_start?;
            Some(format!("{}{}dup", head, start - 1))
        } else {
            let head = alternate.get(0..1)?;
            let second = alternate.get(1..2)?;
            let tail = alternate.get(2..)?;
            let start = transcript.protein_start?;
            let end = transcript.protein_end?;
            Some(format!("{}{}_{}ins{}{}", head, start, second, end, tail))
        }
    } else if first_term.contains("inframe_deletion") {
        Some(format!("{}del", reference))
    } else {
        let start = transcript.protein_start?;
        if first_term.contains("frameshift_variant") {
            Some(format!("{}{}fs", reference, start))
        } else {
            let alternate = alternate?;
            Some(format!("{}{}{}", reference, start, alternate))
        }
    }
}
