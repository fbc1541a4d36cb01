use crate::error::IngestError;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref KEY_PATTERN: Regex = Regex::new(r"^[A-Za-z0-9_.\-]+$").unwrap();
}

/// Lower-cases and validates a series key against `^[A-Za-z0-9_.\-]+$`,
/// matching the grammar used by both the ingest boundary and the store
/// facade's query path.
pub fn normalize_key(key: &str) -> Result<String, IngestError> {
    if !KEY_PATTERN.is_match(key) {
        return Err(IngestError::InvalidKey(key.to_string()));
    }
    Ok(key.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_allowed_characters() {
        assert_eq!(normalize_key("CPU.load-1_min").unwrap(), "cpu.load-1_min");
    }

    #[test]
    fn test_rejects_disallowed_characters() {
        assert!(normalize_key("cpu load").is_err());
        assert!(normalize_key("cpu/load").is_err());
        assert!(normalize_key("").is_err());
    }
}
