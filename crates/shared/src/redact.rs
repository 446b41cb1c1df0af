//! Credential redaction for error messages surfaced to callers.
//!
//! Driver and network errors can echo back connection strings. Everything
//! that leaves the execution layer passes through here first.

use lazy_static::lazy_static;
use regex::Regex;

/// Replacement inserted wherever a credential is scrubbed.
pub const REDACTED: &str = "***";

lazy_static! {
    /// Matches `password=...` / `pwd: ...` style fragments in connection
    /// strings and driver messages, up to the next delimiter.
    static ref PASSWORD_PATTERN: Regex =
        Regex::new(r"(?i)\b(password|pwd)\s*[=:]\s*[^;,\s]*").expect("valid redaction pattern");
}

/// Scrubs `password=...` patterns from a message.
pub fn redact_password_patterns(message: &str) -> String {
    PASSWORD_PATTERN
        .replace_all(message, format!("$1={REDACTED}"))
        .into_owned()
}

/// Scrubs both `password=...` patterns and any literal occurrence of the
/// given secret from a message.
///
/// Secrets shorter than two characters are not searched for literally; a
/// one-character replacement would mangle unrelated text without hiding
/// anything meaningful.
pub fn redact_secret(message: &str, secret: &str) -> String {
    let scrubbed = redact_password_patterns(message);
    if secret.len() < 2 {
        return scrubbed;
    }
    scrubbed.replace(secret, REDACTED)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redacts_password_equals() {
        let msg = "login failed: Server=db;User Id=sa;Password=hunter2;";
        let out = redact_password_patterns(msg);
        assert!(!out.contains("hunter2"));
        assert!(out.contains("Password=***"));
    }

    #[test]
    fn test_redacts_pwd_colon() {
        let out = redact_password_patterns("pwd: s3cret, host: db01");
        assert!(!out.contains("s3cret"));
        assert!(out.contains("host: db01"));
    }

    #[test]
    fn test_redacts_case_insensitive() {
        let out = redact_password_patterns("PASSWORD=TopSecret;");
        assert!(!out.contains("TopSecret"));
    }

    #[test]
    fn test_redacts_literal_secret() {
        let out = redact_secret("auth rejected for sa with hunter2", "hunter2");
        assert!(!out.contains("hunter2"));
        assert!(out.contains(REDACTED));
    }

    #[test]
    fn test_short_secret_not_replaced_literally() {
        let out = redact_secret("connection to a failed", "a");
        assert_eq!(out, "connection to a failed");
    }

    #[test]
    fn test_message_without_credentials_unchanged() {
        let msg = "connection refused (os error 111)";
        assert_eq!(redact_password_patterns(msg), msg);
    }

    #[test]
    fn test_redacts_both_pattern_and_literal() {
        let out = redact_secret("Password=hunter2; retry with hunter2", "hunter2");
        assert!(!out.contains("hunter2"));
    }
}
