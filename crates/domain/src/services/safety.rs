//! Query safety validation.
//!
//! Statements are screened with plain substring containment on an
//! uppercased copy, reproducing the legacy dashboard's behavior: a column
//! named `UPDATED_AT` trips the `UPDATE` deny rule. That false positive is
//! deliberate; execution compatibility wins over tokenized cleverness here.
//! The statement handed downstream is never modified.

use std::fmt;

/// Keywords a statement may begin with.
const ALLOWED_LEADING: &[&str] = &["SELECT", "WITH"];

/// Keywords that fail a statement wherever they appear.
///
/// EXEC/EXECUTE are always denied: the deny-list wins over any allow-list,
/// so stored-procedure invocation is rejected on both the ad-hoc and the
/// saved-query path.
const FORBIDDEN: &[&str] = &[
    "DELETE", "DROP", "UPDATE", "INSERT", "ALTER", "CREATE", "TRUNCATE", "EXEC", "EXECUTE",
];

/// A safety policy violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SafetyViolation {
    MissingLeadingKeyword,
    ForbiddenKeyword(String),
}

impl fmt::Display for SafetyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SafetyViolation::MissingLeadingKeyword => {
                write!(f, "missing required leading keyword")
            }
            SafetyViolation::ForbiddenKeyword(keyword) => {
                write!(f, "contains forbidden keyword: {keyword}")
            }
        }
    }
}

/// The statement allow/deny policy applied before any connection attempt.
#[derive(Debug, Clone)]
pub struct SafetyPolicy {
    allowed_leading: Vec<&'static str>,
    forbidden: Vec<&'static str>,
}

impl Default for SafetyPolicy {
    fn default() -> Self {
        Self {
            allowed_leading: ALLOWED_LEADING.to_vec(),
            forbidden: FORBIDDEN.to_vec(),
        }
    }
}

impl SafetyPolicy {
    /// Validates a statement against the policy.
    ///
    /// Pure and deterministic. Scanning happens on a trimmed, uppercased
    /// copy; the original text is left untouched for execution.
    pub fn validate(&self, query_text: &str) -> Result<(), SafetyViolation> {
        let scan = query_text.trim().to_uppercase();

        for keyword in &self.forbidden {
            if scan.contains(keyword) {
                return Err(SafetyViolation::ForbiddenKeyword((*keyword).to_string()));
            }
        }

        if !self.allowed_leading.iter().any(|kw| scan.starts_with(kw)) {
            return Err(SafetyViolation::MissingLeadingKeyword);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> SafetyPolicy {
        SafetyPolicy::default()
    }

    #[test]
    fn test_select_is_allowed() {
        assert!(policy().validate("SELECT * FROM orders").is_ok());
    }

    #[test]
    fn test_with_cte_is_allowed() {
        assert!(policy()
            .validate("WITH t AS (SELECT 1 AS n) SELECT n FROM t")
            .is_ok());
    }

    #[test]
    fn test_lowercase_and_whitespace_are_normalized_for_scanning() {
        assert!(policy().validate("  select id from users  ").is_ok());
    }

    #[test]
    fn test_missing_leading_keyword() {
        let err = policy().validate("SHOW TABLES").unwrap_err();
        assert_eq!(err, SafetyViolation::MissingLeadingKeyword);
        assert_eq!(err.to_string(), "missing required leading keyword");
    }

    #[test]
    fn test_forbidden_keywords_rejected_anywhere() {
        for kw in ["DELETE", "DROP", "UPDATE", "INSERT", "ALTER", "CREATE", "TRUNCATE"] {
            let statement = format!("SELECT 1 WHERE x = '{kw}'");
            let err = policy().validate(&statement).unwrap_err();
            assert_eq!(err, SafetyViolation::ForbiddenKeyword(kw.to_string()));
        }
    }

    #[test]
    fn test_forbidden_wins_over_leading_check() {
        // "DROP TABLE x" fails both checks; the forbidden keyword is reported.
        let err = policy().validate("DROP TABLE x").unwrap_err();
        assert_eq!(err, SafetyViolation::ForbiddenKeyword("DROP".to_string()));
        assert_eq!(err.to_string(), "contains forbidden keyword: DROP");
    }

    #[test]
    fn test_exec_is_never_allowed() {
        let err = policy().validate("EXEC sp_report").unwrap_err();
        assert_eq!(err, SafetyViolation::ForbiddenKeyword("EXEC".to_string()));

        let err = policy().validate("EXECUTE sp_report").unwrap_err();
        // EXEC is scanned first and is a substring of EXECUTE.
        assert_eq!(err, SafetyViolation::ForbiddenKeyword("EXEC".to_string()));
    }

    #[test]
    fn test_substring_false_positive_is_reproduced() {
        // Substring containment, not tokenized matching: a table named
        // DROPBOX_TABLE is rejected. Known quirk, asserted on purpose.
        let err = policy()
            .validate("SELECT * FROM DROPBOX_TABLE")
            .unwrap_err();
        assert_eq!(err, SafetyViolation::ForbiddenKeyword("DROP".to_string()));
    }

    #[test]
    fn test_updated_at_column_false_positive() {
        let err = policy()
            .validate("SELECT UPDATED_AT FROM audit")
            .unwrap_err();
        assert_eq!(err, SafetyViolation::ForbiddenKeyword("UPDATE".to_string()));
    }

    #[test]
    fn test_validate_is_deterministic() {
        let statement = "SELECT a, b FROM t WHERE c > 5";
        let first = policy().validate(statement);
        for _ in 0..10 {
            assert_eq!(policy().validate(statement), first);
        }
    }

    #[test]
    fn test_empty_statement_rejected() {
        assert_eq!(
            policy().validate("").unwrap_err(),
            SafetyViolation::MissingLeadingKeyword
        );
    }
}
