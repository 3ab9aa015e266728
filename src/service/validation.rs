//! Request validation for the annotation web service

/// Maximum accepted length of a single variant descriptor
const MAX_VARIANT_LENGTH: usize = 1024;

/// Validate a single variant descriptor
pub fn validate_variant(variant: &str) -> Result<(), String> {
    if variant.trim().is_empty() {
        return Err("variant must not be empty".to_string());
    }
    if variant.len() > MAX_VARIANT_LENGTH {
        return Err(format!(
            "variant exceeds maximum length of {} characters",
            MAX_VARIANT_LENGTH
        ));
    }
    if variant.chars().any(|c| c.is_control()) {
        return Err("variant must not contain control characters".to_string());
    }
    Ok(())
}

/// Validate a batch of variant descriptors
pub fn validate_batch(variants: &[String], max_batch_size: usize) -> Result<(), String> {
    if variants.is_empty() {
        return Err("variants must not be empty".to_string());
    }
    if variants.len() > max_batch_size {
        return Err(format!(
            "batch size {} exceeds maximum of {}",
            variants.len(),
            max_batch_size
        ));
    }
    for (idx, variant) in variants.iter().enumerate() {
        validate_variant(variant).map_err(|msg| format!("variant {}: {}", idx, msg))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_variants() {
        assert!(validate_variant("7:g.140453136A>T").is_ok());
        assert!(validate_variant("chrX:g.41242962_41242963insGA").is_ok());
    }

    #[test]
    fn test_empty_variant_rejected() {
        assert!(validate_variant("").is_err());
        assert!(validate_variant("   ").is_err());
    }

    #[test]
    fn test_oversized_variant_rejected() {
        let long = "A".repeat(MAX_VARIANT_LENGTH + 1);
        assert!(validate_variant(&long).is_err());
    }

    #[test]
    fn test_control_characters_rejected() {
        assert!(validate_variant("7:g.1A>T\n").is_err());
        assert!(validate_variant("7:g.1\x00A>T").is_err());
    }

    #[test]
    fn test_batch_limits() {
        let variants = vec!["7:g.1A>T".to_string(); 3];
        assert!(validate_batch(&variants, 3).is_ok());
        assert!(validate_batch(&variants, 2).is_err());
        assert!(validate_batch(&[], 10).is_err());
    }

    #[test]
    fn test_batch_reports_offending_index() {
        let variants = vec!["7:g.1A>T".to_string(), "".to_string()];
        let err = validate_batch(&variants, 10).unwrap_err();
        assert!(err.contains("variant 1"));
    }
}
