//! Variant notation normalization
//!
//! Rewrites chromosome tokens before any lookup: a leading `chr` prefix
//! (any case) is stripped, and the numeric aliases `23`/`24` map to the
//! sex chromosomes `X`/`Y`. Anything else passes through untouched;
//! structural validation belongs to the request surface, not here.

/// Normalize a raw variant descriptor
///
/// ```
/// use ferro_annotate::notation::normalize;
///
/// assert_eq!(normalize("chr23:g.100A>T"), "X:g.100A>T");
/// assert_eq!(normalize("chr7:g.140453136A>T"), "7:g.140453136A>T");
/// assert_eq!(normalize("17:g.41242962G>A"), "17:g.41242962G>A");
/// ```
pub fn normalize(raw: &str) -> String {
    let stripped = strip_chr_prefix(raw);

    if stripped.len() == raw.len() {
        // no chromosome prefix, pass through unchanged
        return raw.to_string();
    }

    let (token, rest) = match stripped.find(':') {
        Some(idx) => (&stripped[..idx], &stripped[idx..]),
        None => (stripped, ""),
    };

    match token {
        "23" => format!("X{}", rest),
        "24" => format!("Y{}", rest),
        _ => stripped.to_string(),
    }
}

/// Normalize a batch of descriptors, preserving order
pub fn normalize_all(raws: &[String]) -> Vec<String> {
    raws.iter().map(|raw| normalize(raw)).collect()
}

fn strip_chr_prefix(raw: &str) -> &str {
    match raw.get(..3) {
        Some(prefix) if prefix.eq_ignore_ascii_case("chr") => &raw[3..],
        _ => raw,
    }
}
