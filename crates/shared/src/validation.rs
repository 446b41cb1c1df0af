//! Common validation utilities for request payloads.

use validator::ValidationError;

/// Maximum length of a stored SQL statement.
pub const MAX_QUERY_TEXT_LENGTH: usize = 10_000;

/// Maximum length of a saved query description.
pub const MAX_DESCRIPTION_LENGTH: usize = 1_000;

/// Validates that a TCP port is within the usable range (1 to 65535).
pub fn validate_port(port: i32) -> Result<(), ValidationError> {
    if (1..=65_535).contains(&port) {
        Ok(())
    } else {
        let mut err = ValidationError::new("port_range");
        err.message = Some("Port must be between 1 and 65535".into());
        Err(err)
    }
}

/// Validates that a SQL statement is non-empty after trimming and within
/// the stored-statement size limit.
pub fn validate_query_text(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        let mut err = ValidationError::new("query_text_empty");
        err.message = Some("Query text must not be empty".into());
        return Err(err);
    }
    if text.len() > MAX_QUERY_TEXT_LENGTH {
        let mut err = ValidationError::new("query_text_length");
        err.message = Some("Query text must be at most 10000 characters".into());
        return Err(err);
    }
    Ok(())
}

/// Validates that a display name / identifier field is non-blank.
///
/// Length bounds are enforced by `#[validate(length)]` on the payloads;
/// this catches whitespace-only values those bounds accept.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value must not be blank".into());
        Err(err)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_port() {
        assert!(validate_port(1).is_ok());
        assert!(validate_port(1433).is_ok());
        assert!(validate_port(65_535).is_ok());
        assert!(validate_port(0).is_err());
        assert!(validate_port(-1).is_err());
        assert!(validate_port(65_536).is_err());
    }

    #[test]
    fn test_validate_query_text_empty() {
        assert!(validate_query_text("").is_err());
        assert!(validate_query_text("   \n\t").is_err());
    }

    #[test]
    fn test_validate_query_text_ok() {
        assert!(validate_query_text("SELECT 1").is_ok());
    }

    #[test]
    fn test_validate_query_text_too_long() {
        let long = "S".repeat(MAX_QUERY_TEXT_LENGTH + 1);
        assert!(validate_query_text(&long).is_err());
    }

    #[test]
    fn test_validate_query_text_at_limit() {
        let at_limit = "S".repeat(MAX_QUERY_TEXT_LENGTH);
        assert!(validate_query_text(&at_limit).is_ok());
    }

    #[test]
    fn test_validate_not_blank() {
        assert!(validate_not_blank("db01").is_ok());
        assert!(validate_not_blank("  ").is_err());
    }
}
