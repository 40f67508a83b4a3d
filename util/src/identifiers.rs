use regex::Regex;
use std::sync::OnceLock;

/// Errors raised validating identifiers used verbatim as path components.
#[derive(Debug, thiserror::Error)]
pub enum UtilError {
    #[error("{field} is not a safe identifier: {value:?}")]
    InvalidIdentifier { field: String, value: String },
}

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap())
}

/// Validates that `value` is safe to use verbatim as a path component
/// (`assignment_id`/`exercise_id` per the corpus layout contract):
/// letters, digits, underscore and hyphen only, non-empty.
pub fn validate_identifier(field: &str, value: &str) -> Result<(), UtilError> {
    if value.is_empty() || !identifier_pattern().is_match(value) {
        return Err(UtilError::InvalidIdentifier {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_safe_identifiers() {
        assert!(validate_identifier("assignment_id", "hw1-part_A").is_ok());
    }

    #[test]
    fn rejects_path_traversal() {
        assert!(validate_identifier("assignment_id", "../etc").is_err());
        assert!(validate_identifier("exercise_id", "a/b").is_err());
        assert!(validate_identifier("exercise_id", "").is_err());
    }
}
